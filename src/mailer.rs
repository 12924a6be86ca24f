use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("message assembly failed: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport failed: {0}")]
    Transport(String),
}

/// One delivery attempt. No retry logic lives here; the escalation engine
/// owns every retry decision.
#[async_trait::async_trait]
pub trait Mailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), DeliveryError>;
}

/// Plain-text mail over an implicit-TLS SMTP relay with password auth,
/// matching the deployed mail setup (submission port 465).
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(relay: &str, sender: &str, password: &str) -> Result<Self, DeliveryError> {
        let sender_mailbox: Mailbox = sender.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|error| DeliveryError::Transport(error.to_string()))?
            .credentials(Credentials::new(sender.to_owned(), password.to_owned()))
            .build();
        Ok(Self {
            transport,
            sender: sender_mailbox,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())?;

        self.transport
            .send(message)
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;
        Ok(())
    }
}
