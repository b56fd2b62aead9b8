//! Investor persona agents
//!
//! A persona is a static `PersonaConfig` plus a system prompt and an analysis
//! template. `PersonaAgent<P>` turns any persona into an `Agent`:
//!
//! financial data → prompt → model → section/bullet extraction

pub mod format;

mod ackman;
mod buffett;
mod graham;
mod lynch;
mod munger;

pub use ackman::Ackman;
pub use buffett::Buffett;
pub use graham::Graham;
pub use lynch::Lynch;
pub use munger::Munger;

use crate::agent::extract::{extract_section, extract_section_bullets};
use crate::agent::{self, Agent};
use crate::gemini::{GenerationRequest, ModelClient};
use crate::models::{AgentContext, AgentType};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub type BuffettAgent = PersonaAgent<Buffett>;
pub type MungerAgent = PersonaAgent<Munger>;
pub type LynchAgent = PersonaAgent<Lynch>;
pub type GrahamAgent = PersonaAgent<Graham>;
pub type AckmanAgent = PersonaAgent<Ackman>;

/// Static, display-only description of a persona.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PersonaConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    pub focus_areas: &'static [&'static str],
    pub key_metrics: &'static [&'static str],
    pub investment_style: &'static str,
    pub time_horizon: &'static str,
    pub risk_tolerance: &'static str,
    pub requires_premium: bool,
    pub tags: &'static [&'static str],
}

/// Declarative persona definition.
pub trait Persona: Send + Sync + 'static {
    fn config() -> &'static PersonaConfig;

    fn system_prompt() -> &'static str;

    /// Labeled-section skeleton the model is asked to follow.
    fn analysis_template() -> &'static str {
        DEFAULT_ANALYSIS_TEMPLATE
    }
}

pub const DEFAULT_ANALYSIS_TEMPLATE: &str = "# {company_name} ({ticker}) - {persona_name} Analysis

## Executive Summary
{executive_summary}

## The Business
{business_description}

## Competitive Position
{competitive_analysis}

## Financial Analysis
{financial_analysis}

## Investment Case

### Pros
{pros}

### Cons
{cons}

## Valuation Assessment
{valuation}

## Risk Factors
{risks}

## Recommendation
{recommendation}

---
*Analysis generated using {persona_name} methodology*";

// ================= Extraction aliases =================

const EXECUTIVE_SUMMARY: &[&str] = &["Executive Summary", "Summary", "Overview"];
const PROS: &[&str] = &["Pros", "Strengths", "What I Like"];
const CONS: &[&str] = &["Cons", "Weaknesses", "Concerns"];
const MOAT: &[&str] = &["Moat", "Competitive Advantage", "Competitive Position"];
const VALUATION: &[&str] = &["Valuation", "Fair Value", "Price Analysis"];
const RISK: &[&str] = &["Risk", "Concerns", "What Could Go Wrong"];
const RECOMMENDATION: &[&str] = &["Recommendation", "Verdict", "Final Take", "Action"];

/// Generic agent driving one persona.
pub struct PersonaAgent<P: Persona> {
    client: Arc<dyn ModelClient>,
    persona: PhantomData<fn() -> P>,
}

impl<P: Persona> PersonaAgent<P> {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            persona: PhantomData,
        }
    }

    pub fn config() -> &'static PersonaConfig {
        P::config()
    }

    /// Assemble the full analysis prompt.
    pub fn build_prompt(
        ticker: &str,
        company_name: &str,
        financial_context: &str,
        custom_instructions: Option<&str>,
    ) -> String {
        let config = P::config();
        let template = P::analysis_template()
            .replace("{company_name}", company_name)
            .replace("{ticker}", ticker)
            .replace("{persona_name}", config.name);

        let instructions = custom_instructions
            .map(|text| format!("ADDITIONAL INSTRUCTIONS: {}", text))
            .unwrap_or_default();

        format!(
            "Analyze {company} ({ticker}) and provide a comprehensive research report.

FINANCIAL DATA:
{financial}

{instructions}

Provide your analysis using this structure:
{template}

Be thorough, specific, and true to {persona}'s investment philosophy.
Focus on long-term business fundamentals. Ignore short-term price volatility.
",
            company = company_name,
            ticker = ticker,
            financial = financial_context,
            instructions = instructions,
            template = template,
            persona = config.name,
        )
    }
}

/// Structured fields pulled out of a persona reply.
///
/// Bullet fields are `null` when their section is absent and a (possibly
/// empty) list when it is present.
pub fn extract_structured_data(text: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("executive_summary".into(), json!(extract_section(text, EXECUTIVE_SUMMARY)));
    fields.insert("pros".into(), json!(extract_section_bullets(text, PROS)));
    fields.insert("cons".into(), json!(extract_section_bullets(text, CONS)));
    fields.insert("moat_analysis".into(), json!(extract_section(text, MOAT)));
    fields.insert("valuation_notes".into(), json!(extract_section(text, VALUATION)));
    fields.insert("risk_factors".into(), json!(extract_section_bullets(text, RISK)));
    fields.insert("recommendation".into(), json!(extract_section(text, RECOMMENDATION)));
    fields
}

#[async_trait]
impl<P: Persona> Agent for PersonaAgent<P> {
    fn agent_id(&self) -> &str {
        P::config().id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Persona
    }

    fn description(&self) -> &str {
        P::config().description
    }

    fn persona_name(&self) -> Option<&str> {
        Some(P::config().name)
    }

    fn emoji(&self) -> Option<&str> {
        Some(P::config().emoji)
    }

    fn requires_premium(&self) -> bool {
        P::config().requires_premium
    }

    fn tags(&self) -> Vec<String> {
        P::config().tags.iter().map(|t| t.to_string()).collect()
    }

    fn validate_context(&self, context: &AgentContext) -> Vec<String> {
        let mut errors = Vec::new();
        if !context.has_ticker() {
            errors.push("Missing required field: ticker".to_string());
        }
        if !context.has_financial_data() {
            errors.push("Missing required field: financial_data".to_string());
        }
        errors.extend(context.constraint_violations());
        errors
    }

    async fn execute_impl(&self, context: &AgentContext) -> Result<Map<String, Value>> {
        let config = P::config();
        let ticker = context.ticker.as_deref().unwrap_or_default().trim();
        let company_name = context
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ticker);

        let financial_context = context
            .financial_data
            .as_ref()
            .map(format::format_financial_data)
            .unwrap_or_default();

        let prompt = Self::build_prompt(
            ticker,
            company_name,
            &financial_context,
            context.param_str("custom_instructions"),
        );

        debug!(
            persona = config.id,
            prompt_chars = prompt.len(),
            "Persona prompt assembled"
        );

        let generation = agent::generate(
            self.client.as_ref(),
            GenerationRequest {
                prompt,
                system_instruction: Some(P::system_prompt().to_string()),
                max_tokens: context.max_tokens,
                temperature: context.temperature,
            },
        )
        .await?;

        let mut result = Map::new();
        result.insert("raw_text".into(), json!(generation.text));
        result.insert("tokens_used".into(), json!(generation.tokens_used));
        result.insert("model_version".into(), json!(generation.model_version));
        result.insert("persona_id".into(), json!(config.id));
        result.insert("persona_name".into(), json!(config.name));
        result.insert("persona_emoji".into(), json!(config.emoji));
        result.extend(extract_structured_data(&generation.text));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gemini::MockModelClient;
    use crate::models::AgentStatus;
    use tokio_test::{assert_err, assert_ok};

    fn acme() -> AgentContext {
        AgentContext::new("req-acme")
            .with_ticker("ACME")
            .with_financial_data(json!({"revenue": 1000, "netIncome": 100}))
    }

    #[tokio::test]
    async fn test_acme_scenario() {
        let client = Arc::new(MockModelClient::with_reply(
            "## Pros\n- Strong margins\n## Cons\n- High debt",
        ));
        let agent = BuffettAgent::new(client.clone());

        let output = assert_ok!(agent.execute(&acme()).await);

        assert_eq!(output.status, AgentStatus::Completed);
        assert_eq!(output.field("pros"), Some(&json!(["Strong margins"])));
        assert_eq!(output.field("cons"), Some(&json!(["High debt"])));
        assert_eq!(output.field("executive_summary"), Some(&Value::Null));
        assert_eq!(output.field("risk_factors"), Some(&Value::Null));
        assert_eq!(output.field("persona_name"), Some(&json!("Warren Buffett")));
        assert_eq!(output.model_version.as_deref(), Some("mock-model"));

        let request = client.last_request().unwrap();
        assert!(request.prompt.contains("Analyze ACME (ACME)"));
        assert!(request.prompt.contains("Revenue: $1,000"));
        assert!(request.prompt.contains("The Buffett Analysis"));
        assert!(request.system_instruction.unwrap().contains("Warren Buffett"));
    }

    #[tokio::test]
    async fn test_missing_inputs_never_call_model() {
        let client = Arc::new(MockModelClient::with_reply("unused"));
        let agent = MungerAgent::new(client.clone());

        let no_ticker = AgentContext::new("r").with_financial_data(json!({"revenue": 1}));
        let err = assert_err!(agent.execute(&no_ticker).await);
        assert_eq!(err.kind(), ErrorKind::Validation);

        let no_data = AgentContext::new("r").with_ticker("ACME");
        let err = assert_err!(agent.execute(&no_data).await);
        assert!(err.to_string().contains("financial_data"));

        let empty_data = AgentContext::new("r").with_ticker("ACME").with_financial_data(json!({}));
        assert_err!(agent.execute(&empty_data).await);

        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_constraints_validated() {
        let client = Arc::new(MockModelClient::with_reply("unused"));
        let agent = LynchAgent::new(client.clone());
        let err = assert_err!(agent.execute(&acme().with_generation(4096, 1.7)).await);
        assert!(err.to_string().contains("temperature"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_provider_error() {
        let agent = GrahamAgent::new(Arc::new(MockModelClient::failing("503 upstream")));
        let err = assert_err!(agent.execute(&acme()).await);
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.to_string().contains("503 upstream"));
    }

    #[tokio::test]
    async fn test_request_uses_context_generation_settings() {
        let client = Arc::new(MockModelClient::with_reply("ok"));
        let agent = AckmanAgent::new(client.clone());
        let ctx = acme()
            .with_company_name("Acme Corp")
            .with_generation(1024, 0.2)
            .with_param("custom_instructions", json!("Focus on spinoffs"));

        assert_ok!(agent.execute(&ctx).await);

        let request = client.last_request().unwrap();
        assert_eq!(request.max_tokens, 1024);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert!(request.prompt.contains("Analyze Acme Corp (ACME)"));
        assert!(request.prompt.contains("ADDITIONAL INSTRUCTIONS: Focus on spinoffs"));
    }

    #[test]
    fn test_extraction_of_full_reply() {
        let reply = "## Executive Summary\nA durable franchise.\n\n\
                     ## Competitive Advantage\nBrand and scale.\n\n\
                     ### What I Like\n- Pricing power\n- Buybacks\n\n\
                     ### Weaknesses\n* Cyclical demand\n\n\
                     ## Fair Value\nAround 20x earnings.\n\n\
                     ## What Could Go Wrong\n→ Input costs\n→ Regulation\n\n\
                     ## Verdict\nBuy below $80.";

        let fields = extract_structured_data(reply);
        assert_eq!(fields["executive_summary"], json!("Executive Summary\nA durable franchise."));
        assert_eq!(fields["pros"], json!(["Pricing power", "Buybacks"]));
        assert_eq!(fields["cons"], json!(["Cyclical demand"]));
        assert_eq!(fields["moat_analysis"], json!("Competitive Advantage\nBrand and scale."));
        assert_eq!(fields["valuation_notes"], json!("Fair Value\nAround 20x earnings."));
        assert_eq!(fields["risk_factors"], json!(["Input costs", "Regulation"]));
        assert_eq!(fields["recommendation"], json!("Verdict\nBuy below $80."));
    }

    #[test]
    fn test_extraction_of_section_free_reply() {
        let fields = extract_structured_data("I cannot help with that.");
        assert_eq!(fields.len(), 7);
        assert!(fields.values().all(Value::is_null));
    }

    #[test]
    fn test_default_template_placeholders_filled() {
        struct Plain;
        static PLAIN: PersonaConfig = PersonaConfig {
            id: "plain",
            name: "Plain Analyst",
            emoji: "🎯",
            tagline: "Investment Analysis",
            description: "Base persona for investment analysis.",
            focus_areas: &["fundamentals", "valuation"],
            key_metrics: &["P/E", "ROE", "Debt/Equity"],
            investment_style: "value",
            time_horizon: "long-term",
            risk_tolerance: "moderate",
            requires_premium: false,
            tags: &[],
        };
        impl Persona for Plain {
            fn config() -> &'static PersonaConfig {
                &PLAIN
            }
            fn system_prompt() -> &'static str {
                "Be plain."
            }
        }

        let prompt = PersonaAgent::<Plain>::build_prompt("ACME", "Acme", "Sector: Tech", None);
        assert!(prompt.contains("# Acme (ACME) - Plain Analyst Analysis"));
        assert!(prompt.contains("### Pros"));
        assert!(!prompt.contains("ADDITIONAL INSTRUCTIONS"));
    }
}
