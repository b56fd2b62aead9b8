use investor_persona_agents::{
    config::Settings,
    gemini::{GeminiClient, MockModelClient, ModelClient},
    models::{AgentContext, AgentType},
    registry::AgentRegistry,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEMO_REPLY: &str = "## Executive Summary
A durable franchise trading near fair value.

## Pros
- Wide moat from brand and distribution
- High returns on equity with little debt

## Cons
- Growth has slowed to mid single digits
- Valuation leaves a thin margin of safety

## Recommendation
Hold. Accumulate below fair value.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();
    let client: Arc<dyn ModelClient> = if settings.has_api_key() {
        info!(model = %settings.gemini_model, "Using Gemini model client");
        Arc::new(GeminiClient::new(&settings)?)
    } else {
        warn!("GEMINI_API_KEY not set, using mock model client");
        Arc::new(MockModelClient::with_reply(DEMO_REPLY))
    };

    let registry = AgentRegistry::with_builtin_agents(client);

    println!("\n=== REGISTERED AGENTS ===");
    for metadata in registry.list_metadata(None, false) {
        println!(
            "  {} {:<18} [{}] {}",
            metadata.emoji, metadata.name, metadata.agent_type, metadata.description
        );
    }

    let context = AgentContext::new(Uuid::new_v4().to_string())
        .with_ticker("KO")
        .with_company_name("The Coca-Cola Company")
        .with_financial_data(json!({
            "description": "Global beverage company selling concentrates and finished drinks.",
            "sector": "Consumer Defensive",
            "industry": "Beverages - Non-Alcoholic",
            "market_cap": 265_000_000_000u64,
            "income_statements": [
                {"revenue": 45_754_000_000u64, "netIncome": 10_714_000_000u64, "eps": 2.48}
            ],
            "ratios": [
                {"returnOnEquity": 0.41, "priceEarningsRatio": 24.3, "debtEquityRatio": 1.62}
            ]
        }));

    let persona_ids: Vec<String> = registry
        .list_metadata(Some(AgentType::Persona), true)
        .into_iter()
        .map(|m| m.id)
        .collect();

    info!(request_id = %context.request_id, personas = persona_ids.len(), "Running persona analyses");
    let results = registry.execute_multiple(&persona_ids, &context, true).await;

    for id in &persona_ids {
        println!("\n=== {} ===", id.to_uppercase());
        match &results[id] {
            Ok(output) => {
                println!("Status: {} in {}ms", output.status, output.execution_time_ms);
                if let Some(recommendation) = output.field("recommendation").and_then(|v| v.as_str()) {
                    println!("Recommendation: {}", recommendation);
                }
                if let Some(pros) = output.field("pros").and_then(|v| v.as_array()) {
                    for pro in pros.iter().filter_map(|p| p.as_str()) {
                        println!("  + {}", pro);
                    }
                }
            }
            Err(e) => println!("Failed [{}]: {}", e.code(), e.user_message()),
        }
    }

    Ok(())
}
