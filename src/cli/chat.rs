//! `mailgate chat`: a read-eval loop around a [`ChatSession`].
//!
//! Free text goes to the agent. While a call is pending the shell shows the
//! draft and reads a decision instead: `approve`, `reject [reason]`, `edit`
//! or `quit`.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::decision::{DecisionInput, DecisionKind, ToolCallRequest};
use crate::error::Result;
use crate::runtime::{AgentRuntime, Checkpointer, RuntimeResponse};
use crate::session::{ChatSession, ConversationState, ThreadId};
use crate::tools::{ToolArgs, SEND_EMAIL};

const DECISION_HELP: &str = "approve | reject [reason] | edit | quit";

/// Conversation for `--thread`: the stored thread when `checkpointer` has
/// one, otherwise a new conversation under that id. `None` starts fresh.
pub fn resume_thread(
    checkpointer: &dyn Checkpointer,
    thread: Option<&str>,
) -> Result<ConversationState> {
    let Some(thread) = thread else {
        return Ok(ConversationState::new());
    };
    let thread_id = ThreadId::from(thread);
    Ok(match checkpointer.load(&thread_id)? {
        Some(checkpoint) => checkpoint.into_conversation(),
        None => ConversationState::with_thread_id(thread_id),
    })
}

/// Run the shell until `quit` or end of input.
pub async fn run<R, I, O>(session: &mut ChatSession<R>, input: I, output: &mut O) -> Result<()>
where
    R: AgentRuntime,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    say(
        output,
        &format!("Thread {}. Type `quit` to leave.\n", session.state().thread_id()),
    )
    .await?;

    loop {
        let pending = session.state().pending().cloned();
        if let Some(request) = &pending {
            say(output, &render_pending(request)).await?;
            say(output, &format!("{DECISION_HELP}\n")).await?;
        }
        say(output, "> ").await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let result = match &pending {
            None => session.send(line).await.map(Some),
            Some(request) => match parse_command(line) {
                Some((DecisionKind::Edit, _)) => {
                    match prompt_edit(session, request, &mut lines, output).await? {
                        Some(args) => session
                            .decide(DecisionKind::Edit, DecisionInput::edit(args))
                            .await
                            .map(Some),
                        None => break,
                    }
                }
                Some((kind, reason)) => {
                    let input = DecisionInput {
                        reason,
                        edit_args: None,
                    };
                    session.decide(kind, input).await.map(Some)
                }
                None => {
                    say(output, &format!("Please answer {DECISION_HELP}.\n")).await?;
                    Ok(None)
                }
            },
        };

        match result {
            Ok(Some(RuntimeResponse::Final { message })) => {
                say(output, &format!("{message}\n")).await?;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(error = %err, "turn failed");
                say(output, &format!("error: {err}\n")).await?;
            }
        }
    }
    Ok(())
}

/// Human-readable draft of a pending call.
pub fn render_pending(request: &ToolCallRequest) -> String {
    if request.name != SEND_EMAIL {
        return format!("{request}\n");
    }
    format!(
        "The agent wants to send this email:\nTo: {}\nSubject: {}\nBody:\n{}\n",
        request.arg_str("recipient").unwrap_or(""),
        request.arg_str("subject").unwrap_or(""),
        request.arg_str("body").unwrap_or(""),
    )
}

fn parse_command(line: &str) -> Option<(DecisionKind, Option<String>)> {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let kind: DecisionKind = word.parse().ok()?;
    let reason = (kind == DecisionKind::Reject && !rest.is_empty()).then(|| rest.to_string());
    Some((kind, reason))
}

/// Ask for every parameter, offering the pending value as default.
/// Returns `None` when input ends mid-form.
async fn prompt_edit<R, I, O>(
    session: &ChatSession<R>,
    request: &ToolCallRequest,
    lines: &mut Lines<I>,
    output: &mut O,
) -> Result<Option<ToolArgs>>
where
    R: AgentRuntime,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let names: Vec<String> = match session.protocol().tools().parameters(&request.name) {
        Some(params) if !params.property_names().is_empty() => {
            params.property_names().into_iter().map(String::from).collect()
        }
        _ => request.args.keys().cloned().collect(),
    };

    say(output, "Press enter to keep a value.\n").await?;
    let mut args = ToolArgs::new();
    for name in names {
        let current = request.args.get(&name);
        let shown = match current {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        say(output, &format!("{name} [{shown}]: ")).await?;

        let Some(answer) = lines.next_line().await? else {
            return Ok(None);
        };
        let answer = answer.trim();
        let value = match (answer.is_empty(), current) {
            (true, Some(current)) => current.clone(),
            (true, None) => continue,
            (false, Some(Value::String(_)) | None) => Value::String(answer.to_string()),
            (false, Some(_)) => serde_json::from_str(answer)
                .unwrap_or_else(|_| Value::String(answer.to_string())),
        };
        args.insert(name, value);
    }
    Ok(Some(args))
}

async fn say<O: AsyncWrite + Unpin>(output: &mut O, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionProtocol;
    use crate::runtime::{DirectivePlanner, FileCheckpointer, LocalRuntime};
    use crate::tools::builtin::{all_tools, Outbox};
    use std::sync::Arc;
    use tempfile::TempDir;

    const DRAFT: &str = "to: a@b.com; subject: Hi; body: Hello";

    async fn drive(script: &str) -> (Outbox, String) {
        let outbox = Outbox::new();
        let tools = all_tools(&outbox);
        let runtime = LocalRuntime::new(tools.clone(), Arc::new(DirectivePlanner::new()));
        let mut session = ChatSession::new(runtime, DecisionProtocol::new(tools));
        let mut output = Vec::new();

        run(&mut session, script.as_bytes(), &mut output).await.unwrap();
        (outbox, String::from_utf8(output).unwrap())
    }

    #[test]
    fn renders_email_draft() {
        let mut args = ToolArgs::new();
        args.insert("recipient".into(), "a@b.com".into());
        args.insert("subject".into(), "Hi".into());
        args.insert("body".into(), "Hello".into());
        let rendered = render_pending(&ToolCallRequest::new(SEND_EMAIL, args));

        assert!(rendered.contains("To: a@b.com\nSubject: Hi\nBody:\nHello"));
    }

    #[test]
    fn parses_decision_commands() {
        assert_eq!(parse_command("approve"), Some((DecisionKind::Approve, None)));
        assert_eq!(
            parse_command("Reject  not yet"),
            Some((DecisionKind::Reject, Some("not yet".into())))
        );
        assert_eq!(parse_command("edit now"), Some((DecisionKind::Edit, None)));
        assert_eq!(parse_command("send it"), None);
    }

    #[tokio::test]
    async fn approve_sends_the_draft() {
        let (outbox, output) = drive(&format!("{DRAFT}\napprove\nquit\n")).await;

        assert_eq!(outbox.len(), 1);
        assert!(output.contains("To: a@b.com"));
        assert!(output.contains("Email sent successfully to a@b.com, regarding 'Hi'."));
    }

    #[tokio::test]
    async fn reject_with_reason_sends_nothing() {
        let (outbox, output) = drive(&format!("{DRAFT}\nreject too vague\nquit\n")).await;

        assert!(outbox.is_empty());
        assert!(output.contains("I did not run `send_email`. too vague"));
    }

    #[tokio::test]
    async fn edit_keeps_defaults_and_applies_changes() {
        let (outbox, _) = drive(&format!("{DRAFT}\nedit\n\n\nHello again\nquit\n")).await;

        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "a@b.com");
        assert_eq!(sent[0].subject, "Hi");
        assert_eq!(sent[0].body, "Hello again");
    }

    #[tokio::test]
    async fn unknown_answer_keeps_call_pending() {
        let (outbox, output) = drive(&format!("{DRAFT}\nsure\napprove\n")).await;

        assert!(output.contains("Please answer approve"));
        assert_eq!(outbox.len(), 1);
    }

    #[tokio::test]
    async fn named_thread_resumes_from_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileCheckpointer::new(dir.path()));
        let tools = all_tools(&Outbox::new());
        let first = LocalRuntime::new(tools.clone(), Arc::new(DirectivePlanner::new()))
            .with_checkpointer(store.clone());
        let mut session = ChatSession::with_state(
            first,
            DecisionProtocol::new(tools),
            resume_thread(store.as_ref(), Some("budget")).unwrap(),
        );
        run(&mut session, format!("{DRAFT}\nquit\n").as_bytes(), &mut Vec::<u8>::new())
            .await
            .unwrap();
        drop(session);

        let outbox = Outbox::new();
        let tools = all_tools(&outbox);
        let second = LocalRuntime::new(tools.clone(), Arc::new(DirectivePlanner::new()))
            .with_checkpointer(store.clone());
        let state = resume_thread(store.as_ref(), Some("budget")).unwrap();
        assert_eq!(state.thread_id().as_str(), "budget");
        assert!(state.approval_state().is_awaiting_decision());

        let mut session = ChatSession::with_state(second, DecisionProtocol::new(tools), state);
        let mut output = Vec::new();
        run(&mut session, "approve\nquit\n".as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(outbox.len(), 1);
        assert!(String::from_utf8(output).unwrap().contains("To: a@b.com"));
    }

    #[test]
    fn unknown_thread_starts_empty_under_that_id() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointer::new(dir.path());

        let state = resume_thread(&store, Some("fresh")).unwrap();

        assert_eq!(state.thread_id().as_str(), "fresh");
        assert!(state.history().is_empty());
        assert!(state.pending().is_none());
    }
}
