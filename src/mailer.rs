use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("reset instructions were already sent recently for this address")]
    Throttled,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Notification collaborator for password recovery. The actual delivery
/// channel lives outside this service.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset(&self, email: &str, token: &str) -> Result<(), MailerError>;
}

/// Default mailer: emits the reset token to the log and throttles repeat
/// sends to the same address inside a configurable window.
pub struct LogMailer {
    window: Duration,
    last_sent: Mutex<HashMap<String, OffsetDateTime>>,
}

impl LogMailer {
    pub fn new(throttle_seconds: i64) -> Self {
        Self {
            window: Duration::seconds(throttle_seconds),
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    fn tracked_addresses(&self) -> usize {
        self.last_sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_reset(&self, email: &str, token: &str) -> Result<(), MailerError> {
        let now = OffsetDateTime::now_utc();
        {
            let mut last_sent = self.last_sent.lock().unwrap();
            // Drop expired entries so the map tracks only addresses still
            // inside the window; whatever survives is throttled.
            last_sent.retain(|_, sent| now - *sent < self.window);
            if last_sent.contains_key(email) {
                return Err(MailerError::Throttled);
            }
            last_sent.insert(email.to_string(), now);
        }

        info!(email = %email, token = %token, "password reset dispatched");
        Ok(())
    }
}
