//! Core data models for agent execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Persona,
    Analysis,
    Utility,
    Education,
}

/// Per-execution state. `Idle` is the only start state; the last three are
/// terminal for that execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Running,
    Completed,
    Failed,
    #[serde(rename = "timeout")]
    TimedOut,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::Completed | AgentStatus::Failed | AgentStatus::TimedOut
        )
    }

    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (AgentStatus::Idle, AgentStatus::Running)
                | (AgentStatus::Running, AgentStatus::Completed)
                | (AgentStatus::Running, AgentStatus::Failed)
                | (AgentStatus::Running, AgentStatus::TimedOut)
        )
    }
}

//
// ================= Context =================
//

/// Input envelope for one execution.
///
/// Agents only read it; they never fetch additional data themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub request_id: String,

    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,

    #[serde(default)]
    pub financial_data: Option<Value>,
    #[serde(default)]
    pub market_data: Option<Value>,

    #[serde(default)]
    pub news_articles: Option<Vec<Value>>,
    #[serde(default)]
    pub content_chunks: Option<Vec<Value>>,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl AgentContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user_id: None,
            ticker: None,
            company_name: None,
            financial_data: None,
            market_data: None,
            news_articles: None,
            content_chunks: None,
            parameters: Map::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    pub fn with_financial_data(mut self, data: Value) -> Self {
        self.financial_data = Some(data);
        self
    }

    pub fn with_news_articles(mut self, articles: Vec<Value>) -> Self {
        self.news_articles = Some(articles);
        self
    }

    pub fn with_content_chunks(mut self, chunks: Vec<Value>) -> Self {
        self.content_chunks = Some(chunks);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_generation(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn get_param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// String parameter; blank strings count as absent.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.get_param(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Null and empty objects count as missing.
    pub fn has_financial_data(&self) -> bool {
        match &self.financial_data {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Violations of the generation/timeout constraints shared by every agent.
    pub fn constraint_violations(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.temperature) {
            errors.push(format!(
                "temperature must be between 0 and 1 (got {})",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            errors.push("max_tokens must be greater than 0".to_string());
        }
        if self.timeout_seconds == 0 {
            errors.push("timeout_seconds must be greater than 0".to_string());
        }

        errors
    }
}

//
// ================= Output =================
//

/// Result envelope, built once per completed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub content: Map<String, Value>,
    pub raw_text: String,

    pub agent_id: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,

    pub execution_time_ms: u64,
    pub tokens_used: Option<u64>,
    pub model_version: Option<String>,

    pub error_message: Option<String>,
    #[serde(skip)]
    pub error_code: Option<String>,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AgentOutput {
    /// Build a completed output from the map an agent returned.
    ///
    /// Missing `raw_text` defaults to an empty string.
    pub fn completed(
        agent_id: &str,
        agent_type: AgentType,
        content: Map<String, Value>,
        execution_time_ms: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        let raw_text = content
            .get("raw_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tokens_used = content.get("tokens_used").and_then(Value::as_u64);
        let model_version = content
            .get("model_version")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            content,
            raw_text,
            agent_id: agent_id.to_string(),
            agent_type,
            status: AgentStatus::Completed,
            execution_time_ms,
            tokens_used,
            model_version,
            error_message: None,
            error_code: None,
            started_at,
            completed_at: Some(Utc::now()),
        }
    }

    /// Convenience accessor into `content`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentType::Persona => "persona",
            AgentType::Analysis => "analysis",
            AgentType::Utility => "utility",
            AgentType::Education => "education",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Running => "running",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
            AgentStatus::TimedOut => "timeout",
        };
        write!(f, "{}", s)
    }
}
