//! Agent execution contract
//!
//! Every agent implements identity, validation and `execute_impl`. The
//! provided `execute` wraps that with the per-execution state machine:
//!
//! IDLE → RUNNING → COMPLETED | FAILED | TIMEOUT

pub mod extract;

use crate::error::AgentError;
use crate::gemini::{Generation, GenerationRequest, ModelClient};
use crate::models::{AgentContext, AgentOutput, AgentStatus, AgentType};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// A self-contained analysis unit.
///
/// Instances are cheap to build and hold no request-scoped state; the
/// registry constructs a fresh one for every lookup.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier, used as the registry key.
    fn agent_id(&self) -> &str;

    fn agent_type(&self) -> AgentType;

    fn description(&self) -> &str;

    // Optional identity, checked in order by the registry when it builds
    // display metadata.

    fn persona_name(&self) -> Option<&str> {
        None
    }

    fn display_name(&self) -> Option<&str> {
        None
    }

    fn emoji(&self) -> Option<&str> {
        None
    }

    fn requires_premium(&self) -> bool {
        false
    }

    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Validation messages for `context`; empty means valid. No I/O.
    fn validate_context(&self, context: &AgentContext) -> Vec<String>;

    /// The unit of work. Natural-language agents put their reply under `raw_text`.
    async fn execute_impl(&self, context: &AgentContext) -> Result<Map<String, Value>>;

    /// Validate, run bounded by `context.timeout_seconds`, and build the output.
    async fn execute(&self, context: &AgentContext) -> Result<AgentOutput> {
        run(self, context).await
    }
}

/// Status of a single execution. A fresh tracker starts at `Idle` for every call.
struct ExecutionState<'a> {
    agent_id: &'a str,
    request_id: &'a str,
    status: AgentStatus,
}

impl<'a> ExecutionState<'a> {
    fn new(agent_id: &'a str, request_id: &'a str) -> Self {
        Self {
            agent_id,
            request_id,
            status: AgentStatus::Idle,
        }
    }

    fn advance(&mut self, next: AgentStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal transition {} -> {}",
            self.status,
            next
        );
        debug!(
            agent_id = self.agent_id,
            request_id = self.request_id,
            from = %self.status,
            to = %next,
            "Agent status transition"
        );
        self.status = next;
    }
}

/// Orchestrate one execution of `agent`.
///
/// On timeout the in-flight `execute_impl` future is dropped. Any side effects
/// it already started are not rolled back, and a late result or error is never
/// observed.
pub async fn run<A>(agent: &A, context: &AgentContext) -> Result<AgentOutput>
where
    A: Agent + ?Sized,
{
    let agent_id = agent.agent_id();
    let request_id = context.request_id.as_str();
    let mut state = ExecutionState::new(agent_id, request_id);

    let started_at = Utc::now();
    let start = Instant::now();
    state.advance(AgentStatus::Running);

    info!(agent_id, request_id, "Starting agent execution");

    let errors = agent.validate_context(context);
    if !errors.is_empty() {
        state.advance(AgentStatus::Failed);
        warn!(agent_id, request_id, errors = ?errors, "Context validation failed");
        return Err(AgentError::validation(errors));
    }

    let bound = Duration::from_secs(context.timeout_seconds);
    let work = AssertUnwindSafe(agent.execute_impl(context)).catch_unwind();

    let outcome = match tokio::time::timeout(bound, work).await {
        Err(_) => {
            state.advance(AgentStatus::TimedOut);
            warn!(
                agent_id,
                request_id,
                timeout_seconds = context.timeout_seconds,
                "Agent execution timed out"
            );
            return Err(AgentError::timeout(agent_id, context.timeout_seconds));
        }
        Ok(Err(panic)) => Err(AgentError::Unknown(panic_message(panic))),
        Ok(Ok(result)) => result,
    };

    match outcome {
        Ok(content) => {
            let execution_time_ms = start.elapsed().as_millis() as u64;
            state.advance(AgentStatus::Completed);

            let output = AgentOutput::completed(
                agent_id,
                agent.agent_type(),
                content,
                execution_time_ms,
                started_at,
            );

            info!(
                agent_id,
                request_id,
                execution_time_ms,
                tokens_used = output.tokens_used.unwrap_or(0),
                "Agent execution completed"
            );

            Ok(output)
        }
        Err(e) => {
            state.advance(AgentStatus::Failed);
            let e = surface_error(e);
            error!(agent_id, request_id, error = %e, "Agent execution failed");
            Err(e)
        }
    }
}

/// Unrecognized failures leave `execute` as provider errors; everything else
/// is passed through unchanged.
fn surface_error(error: AgentError) -> AgentError {
    match error {
        AgentError::Unknown(message) => AgentError::provider(message),
        other => other,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("agent panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("agent panicked: {}", s)
    } else {
        "agent panicked".to_string()
    }
}

/// Call the model client on behalf of an agent.
///
/// Non-provider failures (configuration, serialization) are rewrapped as
/// provider errors with the original message kept.
pub async fn generate(client: &dyn ModelClient, request: GenerationRequest) -> Result<Generation> {
    client.generate_text(request).await.map_err(|e| match e {
        AgentError::Provider { .. } => e,
        other => AgentError::Provider {
            service: "Gemini AI".to_string(),
            message: other.to_string(),
            retryable: other.is_retryable(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gemini::MockModelClient;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    /// Minimal agent whose behavior is chosen per test.
    struct ScriptedAgent {
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    enum Behavior {
        Reply(&'static str),
        Sleep(Duration),
        Fail(AgentError),
        SleepThenFail(Duration, AgentError),
        Panic,
        NoRawText,
    }

    impl ScriptedAgent {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        fn agent_id(&self) -> &str {
            "scripted"
        }

        fn agent_type(&self) -> AgentType {
            AgentType::Utility
        }

        fn description(&self) -> &str {
            "Test agent"
        }

        fn validate_context(&self, context: &AgentContext) -> Vec<String> {
            if context.has_ticker() {
                Vec::new()
            } else {
                vec!["Missing required field: ticker".to_string()]
            }
        }

        async fn execute_impl(&self, _context: &AgentContext) -> Result<Map<String, Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut content = Map::new();
            match &self.behavior {
                Behavior::Reply(text) => {
                    content.insert("raw_text".into(), json!(text));
                    content.insert("tokens_used".into(), json!(12));
                }
                Behavior::Sleep(d) => {
                    tokio::time::sleep(*d).await;
                    content.insert("raw_text".into(), json!("late"));
                }
                Behavior::Fail(e) => return Err(e.clone()),
                Behavior::SleepThenFail(d, e) => {
                    tokio::time::sleep(*d).await;
                    return Err(e.clone());
                }
                Behavior::Panic => panic!("index out of bounds"),
                Behavior::NoRawText => {
                    content.insert("score".into(), json!(3));
                }
            }
            Ok(content)
        }
    }

    fn ctx() -> AgentContext {
        AgentContext::new("req-test").with_ticker("ACME")
    }

    #[tokio::test]
    async fn test_completed_execution() {
        let agent = ScriptedAgent::new(Behavior::Reply("hello"));
        let output = assert_ok!(agent.execute(&ctx()).await);

        assert_eq!(output.status, AgentStatus::Completed);
        assert_eq!(output.raw_text, "hello");
        assert_eq!(output.tokens_used, Some(12));
        assert_eq!(output.agent_id, "scripted");
        assert!(output.completed_at.is_some());
        assert!(output.completed_at.unwrap() >= output.started_at);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_execute_impl() {
        let agent = ScriptedAgent::new(Behavior::Reply("unused"));
        let err = assert_err!(agent.execute(&AgentContext::new("req")).await);

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("Missing required field: ticker"));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_within_bound() {
        let agent = ScriptedAgent::new(Behavior::Sleep(Duration::from_secs(600)));
        let start = Instant::now();

        let err = assert_err!(agent.execute(&ctx().with_timeout(2)).await);

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(err.to_string().contains("scripted"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_wins_over_late_error() {
        let agent = ScriptedAgent::new(Behavior::SleepThenFail(
            Duration::from_secs(5),
            AgentError::provider("HTTP 503"),
        ));

        let err = assert_err!(agent.execute(&ctx().with_timeout(2)).await);

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(!err.to_string().contains("503"));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execution_time_reflects_elapsed() {
        let agent = ScriptedAgent::new(Behavior::Sleep(Duration::from_millis(1500)));
        let output = assert_ok!(agent.execute(&ctx()).await);
        assert!(output.execution_time_ms >= 1500);
        assert!(output.execution_time_ms < 2500);
    }

    #[tokio::test]
    async fn test_application_error_passes_through() {
        let agent = ScriptedAgent::new(Behavior::Fail(AgentError::timeout("FMP", 5)));
        let err = assert_err!(agent.execute(&ctx()).await);
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("FMP"));
    }

    #[tokio::test]
    async fn test_unknown_error_becomes_provider() {
        let agent = ScriptedAgent::new(Behavior::Fail(AgentError::Unknown("KeyError: 'x'".into())));
        let err = assert_err!(agent.execute(&ctx()).await);
        assert!(matches!(err, AgentError::Provider { .. }));
        assert!(err.to_string().contains("KeyError: 'x'"));
    }

    #[tokio::test]
    async fn test_panic_becomes_provider() {
        let agent = ScriptedAgent::new(Behavior::Panic);
        let err = assert_err!(agent.execute(&ctx()).await);
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.to_string().contains("index out of bounds"));
    }

    #[tokio::test]
    async fn test_missing_raw_text_defaults_to_empty() {
        let agent = ScriptedAgent::new(Behavior::NoRawText);
        let output = assert_ok!(agent.execute(&ctx()).await);
        assert_eq!(output.raw_text, "");
        assert_eq!(output.field("score"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_repeat_execution_is_independent() {
        let agent = ScriptedAgent::new(Behavior::Reply("again"));
        assert_err!(agent.execute(&AgentContext::new("r1")).await);
        let output = assert_ok!(agent.execute(&ctx()).await);
        assert_eq!(output.status, AgentStatus::Completed);
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_rewraps_configuration_error() {
        struct Unconfigured;

        #[async_trait]
        impl ModelClient for Unconfigured {
            async fn generate_text(&self, _request: GenerationRequest) -> Result<Generation> {
                Err(AgentError::Configuration("GEMINI_API_KEY not configured".into()))
            }

            fn model_name(&self) -> &str {
                "none"
            }
        }

        let request = GenerationRequest {
            prompt: "p".into(),
            system_instruction: None,
            max_tokens: 16,
            temperature: 0.5,
        };
        let err = assert_err!(generate(&Unconfigured, request.clone()).await);
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let ok = assert_ok!(generate(&MockModelClient::with_reply("fine"), request).await);
        assert_eq!(ok.text, "fine");
    }
}
