//! Built-in tools for the email assistant.
//!
//! The only tool is `send_email`. Deliveries are recorded in an [`Outbox`]
//! instead of being handed to a mail server, so the assistant can be run and
//! tested without credentials.
//!
//! # Usage
//!
//! ```rust
//! use mailgate::tools::builtin::{all_tools, Outbox};
//!
//! let outbox = Outbox::new();
//! let tools = all_tools(&outbox);
//! assert!(tools.contains("send_email"));
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MailgateError;
use crate::tools::registry::ToolRegistry;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

/// Name under which the email tool is registered.
pub const SEND_EMAIL: &str = "send_email";

/// An email accepted by `send_email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(default = "Utc::now")]
    pub sent_at: DateTime<Utc>,
}

/// In-memory record of delivered emails. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, email: SentEmail) -> Result<(), MailgateError> {
        self.sent
            .lock()
            .map_err(|_| MailgateError::ToolExecution {
                tool_name: SEND_EMAIL.into(),
                message: "outbox lock poisoned".into(),
            })?
            .push(email);
        Ok(())
    }

    /// Snapshot of everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parameter schema of `send_email`: recipient, subject and body, all required.
pub fn send_email_parameters() -> ToolParameters {
    ToolParameters::object()
        .string("recipient", "Email address of the recipient.", true)
        .string("subject", "Subject line of the email.", true)
        .string("body", "Body content of the email.", true)
        .build()
}

/// Create the `send_email` tool, delivering into `outbox`.
pub fn send_email_tool(outbox: &Outbox) -> Arc<dyn Tool> {
    let outbox = outbox.clone();
    Arc::new(AgentTool::new(
        SEND_EMAIL,
        "Send an email to a recipient.",
        send_email_parameters(),
        move |args, ctx: ToolExecutionContext| {
            let outbox = outbox.clone();
            async move {
                let recipient = args.get_str("recipient")?.to_string();
                let subject = args.get_str("subject")?.to_string();
                let body = args.get_str("body")?.to_string();

                if !recipient.contains('@') {
                    return Err(MailgateError::ToolExecution {
                        tool_name: SEND_EMAIL.into(),
                        message: format!("'{recipient}' is not an email address"),
                    });
                }

                tracing::info!(
                    thread_id = ctx.thread_id.as_deref().unwrap_or(""),
                    recipient = %recipient,
                    subject = %subject,
                    "email delivered to outbox"
                );
                let confirmation =
                    format!("Email sent successfully to {recipient}, regarding '{subject}'.");
                outbox.push(SentEmail {
                    recipient,
                    subject,
                    body,
                    sent_at: Utc::now(),
                })?;
                Ok(confirmation)
            }
        },
    ))
}

/// Every built-in tool, registered by name.
pub fn all_tools(outbox: &Outbox) -> ToolRegistry {
    ToolRegistry::new().with(send_email_tool(outbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::arguments::ToolArguments;
    use serde_json::json;

    #[tokio::test]
    async fn send_email_records_delivery_and_confirms() {
        let outbox = Outbox::new();
        let tool = send_email_tool(&outbox);
        let args = ToolArguments::from_value(json!({
            "recipient": "a@x.com",
            "subject": "Hi",
            "body": "Hello",
        }))
        .unwrap();

        let confirmation = tool
            .execute(&args, &ToolExecutionContext::default())
            .await
            .unwrap();

        assert_eq!(confirmation, "Email sent successfully to a@x.com, regarding 'Hi'.");
        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "Hello");
    }

    #[tokio::test]
    async fn send_email_rejects_address_without_at_sign() {
        let outbox = Outbox::new();
        let tool = send_email_tool(&outbox);
        let args = ToolArguments::from_value(json!({
            "recipient": "nobody",
            "subject": "Hi",
            "body": "Hello",
        }))
        .unwrap();

        let err = tool
            .execute(&args, &ToolExecutionContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, MailgateError::ToolExecution { .. }));
        assert!(outbox.is_empty());
    }

    #[test]
    fn schema_requires_all_three_fields() {
        let params = send_email_parameters();
        assert_eq!(params.required_names(), vec!["recipient", "subject", "body"]);
    }
}
