//! Handing accepted messages to the mail relay.

use crate::error::Error;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Everything the relay needs to send one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Relay account the message is sent under.
    pub service_id: String,
    /// Template the relay renders the parameters into.
    pub template_id: String,
    /// Flat template parameters: `from_name`, `from_email`, `subject`,
    /// `message`, `to_email`, `submission_time` and `session_token`.
    pub params: BTreeMap<String, String>,
    /// Credential identifying the site to the relay.
    pub public_key: String,
}

impl DispatchRequest {
    /// Looks up one template parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Message transport. Only success or failure matters to the caller.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Sends one message, returning once the relay accepted or refused it.
    async fn send(&self, request: &DispatchRequest) -> Result<(), Error>;
}
