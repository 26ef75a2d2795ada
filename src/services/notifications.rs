use async_trait::async_trait;
use tracing::info;

use crate::errors::ServiceError;

/// Outbound notification delivery. The automation engine only knows
/// this trait, so deployments can plug in a real mailer while tests
/// record or fail sends deliberately.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), ServiceError>;
}

/// Default transport: writes the message to the log and reports success.
#[derive(Debug, Default, Clone)]
pub struct LoggingEmailTransport;

#[async_trait]
impl EmailTransport for LoggingEmailTransport {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        info!(recipient, subject, body, "Delivering notification");
        Ok(())
    }
}
