use rand::{distributions::Alphanumeric, Rng};

pub const TOKEN_LEN: usize = 48;

/// Random alphanumeric bearer token. The value is the credential; nothing is
/// encoded inside it, validity comes from the row in the token store.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
