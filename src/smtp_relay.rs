//! Dispatcher relaying contact messages through an SMTP server.

use crate::config::Config;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::error::Error;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sends each contact message as a plain text mail to `to_email`, with
/// `Reply-To` pointing at the person who filled in the form.
#[derive(Debug, Clone)]
pub struct SmtpRelayDispatcher {
    host: String,
    port: u16,
    sender: String,
}

impl SmtpRelayDispatcher {
    /// Relay at `host:port`, sending as `sender`.
    pub fn new(host: impl Into<String>, port: u16, sender: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            sender: sender.into(),
        }
    }

    /// Relay configured by the `relay_*` settings.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.relay_host, config.relay_port, config.relay_sender())
    }

    /// Renders the request into the mail that goes out.
    pub fn build_message(&self, request: &DispatchRequest) -> Result<Message, Error> {
        let param = |name: &str| {
            request
                .param(name)
                .ok_or_else(|| Error::Dispatch(format!("missing parameter {name}")))
        };

        let from_name = request.param("from_name").unwrap_or_default();
        let from_email = param("from_email")?;
        let to_email = param("to_email")?;

        let body = format!(
            "From: {from_name} <{from_email}>\nSent: {}\nSession: {}\n\n{}\n",
            request.param("submission_time").unwrap_or_default(),
            request.param("session_token").unwrap_or_default(),
            request.param("message").unwrap_or_default(),
        );

        Message::builder()
            .from(mailbox(None, &self.sender)?)
            .reply_to(mailbox(Some(from_name), from_email)?)
            .to(mailbox(None, to_email)?)
            .subject(request.param("subject").unwrap_or_default())
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| Error::Dispatch(format!("Failed to build message: {e}")))
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, Error> {
    let address: Address = address
        .parse()
        .map_err(|_| Error::InvalidAddress(address.to_string()))?;
    let name = name.filter(|n| !n.is_empty()).map(str::to_string);
    Ok(Mailbox::new(name, address))
}

#[async_trait]
impl Dispatcher for SmtpRelayDispatcher {
    async fn send(&self, request: &DispatchRequest) -> Result<(), Error> {
        log::debug!(
            "Relaying message for service {} template {} via {}:{}",
            request.service_id,
            request.template_id,
            self.host,
            self.port
        );

        let message = self.build_message(request)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
            .port(self.port)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| Error::Dispatch(e.to_string()))?;

        Ok(())
    }
}
