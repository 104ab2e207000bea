//! The tool contract and a closure-backed implementation.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::MailgateError;

/// Where a tool call comes from.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    pub thread_id: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolExecutionContext {
    /// Context for call `call_id` on `thread_id`; empty ids are dropped.
    pub fn for_call(thread_id: impl Into<String>, call_id: &str) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            tool_call_id: (!call_id.is_empty()).then(|| call_id.to_string()),
        }
    }
}

/// A side-effecting action the agent may ask to run.
///
/// `execute` only runs once the call has cleared the interrupt policy. It
/// returns the confirmation text the agent reports back to the user.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the runtime proposes calls under.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments; edits are checked against it.
    fn parameters(&self) -> &ToolParameters;

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<String, MailgateError>;
}

type HandlerFuture = BoxFuture<'static, Result<String, MailgateError>>;

type Handler = dyn Fn(ToolArguments, ToolExecutionContext) -> HandlerFuture + Send + Sync;

/// [`Tool`] backed by an async closure.
///
/// ```
/// use mailgate::tools::{AgentTool, Tool, ToolParameters};
///
/// let echo = AgentTool::new(
///     "echo",
///     "Repeat the text back.",
///     ToolParameters::object().string("text", "What to repeat.", true).build(),
///     |args, _ctx| async move { Ok(args.get_str("text")?.to_string()) },
/// );
/// assert_eq!(echo.name(), "echo");
/// ```
pub struct AgentTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<Handler>,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, MailgateError>> + Send + 'static,
    {
        let handler: Arc<Handler> = Arc::new(move |args, ctx| Box::pin(handler(args, ctx)));
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler,
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<String, MailgateError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolArgs;

    #[test]
    fn context_drops_empty_call_id() {
        let ctx = ToolExecutionContext::for_call("t-1", "");
        assert_eq!(ctx.thread_id.as_deref(), Some("t-1"));
        assert!(ctx.tool_call_id.is_none());
    }

    #[tokio::test]
    async fn closure_tool_sees_arguments_and_context() {
        let tool = AgentTool::new(
            "whoami",
            "Report the calling thread.",
            ToolParameters::empty(),
            |_args, ctx: ToolExecutionContext| async move {
                Ok(ctx.thread_id.unwrap_or_default())
            },
        );

        let out = tool
            .execute(
                &ToolArguments::new(ToolArgs::new()),
                &ToolExecutionContext::for_call("t-9", "call_1"),
            )
            .await
            .unwrap();
        assert_eq!(out, "t-9");
    }
}
