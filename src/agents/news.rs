//! News summarizer: plain-English bullets plus value-investing sentiment

use crate::agent::extract::truncate_chars;
use crate::agent::{self, Agent};
use crate::error::AgentError;
use crate::gemini::{GenerationRequest, ModelClient};
use crate::models::{AgentContext, AgentType};
use crate::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const AGENT_ID: &str = "news_summarizer";

const MAX_CONTENT_CHARS: usize = 8000;
const DEFAULT_MAX_BULLETS: usize = 3;
const TICKER_SCAN_CHARS: usize = 1000;
const MAX_MENTIONED: usize = 5;

static TICKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{1,5}\b").expect("ticker pattern is valid"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

const TICKER_STOP_WORDS: [&str; 12] = [
    "THE", "FOR", "AND", "WITH", "CEO", "CFO", "Q1", "Q2", "Q3", "Q4", "YOY", "EPS",
];

const SYSTEM_PROMPT: &str = "You are a financial news analyst specializing in value investing.
Your role is to translate complex financial news into clear, plain English that non-technical
investors can understand and act upon.

Key principles:
1. Focus on FUNDAMENTALS, not short-term price movements
2. Explain WHY news matters for long-term investors
3. Replace jargon with simple language
4. Be honest about uncertainty - don't oversell or undersell
5. Think like a teacher, not a trader

Remember: Your audience is learning value investing. Help them understand the business,
not just the stock price.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentReading {
    pub sentiment: Sentiment,
    pub confidence: u8,
    pub reasoning: String,
}

pub struct NewsSummarizerAgent {
    client: Arc<dyn ModelClient>,
}

impl NewsSummarizerAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Agent for NewsSummarizerAgent {
    fn agent_id(&self) -> &str {
        AGENT_ID
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Utility
    }

    fn description(&self) -> &str {
        "Summarizes financial news in plain English and rates its long-term sentiment."
    }

    fn display_name(&self) -> Option<&str> {
        Some("News Summarizer")
    }

    fn emoji(&self) -> Option<&str> {
        Some("📰")
    }

    fn tags(&self) -> Vec<String> {
        vec!["news".into(), "sentiment".into(), "summary".into()]
    }

    fn validate_context(&self, context: &AgentContext) -> Vec<String> {
        let has_articles = context
            .news_articles
            .as_ref()
            .is_some_and(|articles| !articles.is_empty());

        let mut errors = Vec::new();
        if !has_articles && context.param_str("content").is_none() {
            errors.push("Missing required field: news_articles or content parameter".to_string());
        }
        errors.extend(context.constraint_violations());
        errors
    }

    async fn execute_impl(&self, context: &AgentContext) -> Result<Map<String, Value>> {
        let content = news_content(context);
        if content.trim().is_empty() {
            return Err(AgentError::validation(["News articles contain no text"]));
        }
        let content = truncate_content(&content);

        let max_bullets = context
            .get_param("max_bullets")
            .and_then(Value::as_u64)
            .map(|n| (n as usize).clamp(1, 10))
            .unwrap_or(DEFAULT_MAX_BULLETS);
        let include_sentiment = context
            .get_param("include_sentiment")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let summary_call = agent::generate(
            self.client.as_ref(),
            self.request(summarization_prompt(&content, max_bullets), context),
        );

        let (summary, sentiment) = if include_sentiment {
            let sentiment_call = agent::generate(
                self.client.as_ref(),
                self.request(sentiment_prompt(&content), context),
            );
            let (summary, sentiment) = tokio::join!(summary_call, sentiment_call);
            (summary, Some(sentiment))
        } else {
            (summary_call.await, None)
        };

        let summary = summary?;
        let bullets = parse_bullets(&summary.text, max_bullets);
        let mut tokens_used = summary.tokens_used;

        let reading = match sentiment {
            Some(Ok(generation)) => {
                tokens_used = sum_tokens(tokens_used, generation.tokens_used);
                Some(parse_sentiment(&generation.text))
            }
            Some(Err(e)) => {
                warn!(request_id = %context.request_id, error = %e, "Sentiment analysis failed");
                Some(SentimentReading {
                    sentiment: Sentiment::Neutral,
                    confidence: 0,
                    reasoning: format!("Error analyzing sentiment: {}", e.user_message()),
                })
            }
            None => None,
        };

        if let Some(reading) = &reading {
            info!(
                request_id = %context.request_id,
                sentiment = %reading.sentiment,
                confidence = reading.confidence,
                "Sentiment analysis complete"
            );
        }

        let mut result = Map::new();
        result.insert("raw_text".into(), json!(summary.text));
        result.insert("summary".into(), json!(summary.text));
        result.insert("bullets".into(), json!(bullets));
        result.insert("sentiment".into(), json!(reading.as_ref().map(|r| r.sentiment)));
        result.insert(
            "sentiment_confidence".into(),
            json!(reading.as_ref().map(|r| r.confidence)),
        );
        result.insert(
            "sentiment_reasoning".into(),
            json!(reading.as_ref().map(|r| r.reasoning.as_str())),
        );
        result.insert("mentioned_companies".into(), json!(extract_tickers(&content)));
        result.insert("tokens_used".into(), json!(tokens_used));
        result.insert("model_version".into(), json!(summary.model_version));

        Ok(result)
    }
}

impl NewsSummarizerAgent {
    fn request(&self, prompt: String, context: &AgentContext) -> GenerationRequest {
        GenerationRequest {
            prompt,
            system_instruction: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: context.max_tokens,
            temperature: context.temperature,
        }
    }
}

/// Combined text to summarize: the `content` parameter (with optional
/// `title`) wins over `news_articles`.
fn news_content(context: &AgentContext) -> String {
    if let Some(content) = context.param_str("content") {
        return with_title(context.param_str("title"), content);
    }

    context
        .news_articles
        .iter()
        .flatten()
        .filter_map(|article| {
            let title = article.get("title").and_then(Value::as_str).map(str::trim);
            let body = ["content", "description", "summary"]
                .iter()
                .find_map(|key| article.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .unwrap_or_default();

            match (title.filter(|t| !t.is_empty()), body.is_empty()) {
                (None, true) => None,
                (title, _) => Some(with_title(title, body)),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn with_title(title: Option<&str>, content: &str) -> String {
    match title {
        Some(title) => format!("Title: {}\n\n{}", title, content),
        None => content.to_string(),
    }
}

fn truncate_content(content: &str) -> String {
    let truncated = truncate_chars(content, MAX_CONTENT_CHARS);
    if truncated.len() < content.len() {
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}

fn summarization_prompt(content: &str, max_bullets: usize) -> String {
    format!(
        "Summarize the following financial news in PLAIN ENGLISH
for someone learning value investing.

News: {content}

Requirements:
1. Create EXACTLY {max_bullets} bullet points
2. Each bullet should be ONE clear insight
3. Replace jargon with simple language:
   - \"EBITDA\" → \"operating profit\"
   - \"YoY\" → \"compared to last year\"
   - \"Guidance\" → \"company's forecast\"
   - \"Multiple expansion\" → \"investors willing to pay more\"
4. Focus on what matters for long-term investors
5. Be concise but complete (15-25 words per bullet)

Format:
• [First key insight]
• [Second key insight]
• [Third key insight]

Do not include any other text, headers, or explanations. Just the bullets."
    )
}

fn sentiment_prompt(content: &str) -> String {
    format!(
        "Analyze the following financial news and determine its sentiment
from a VALUE INVESTING perspective.

News: {content}

Instructions:
- BULLISH means positive for the company's long-term fundamentals (moat, earnings power, management)
- BEARISH means negative for long-term fundamentals
- NEUTRAL means no clear long-term impact OR mixed signals

Ignore short-term price movements. Focus on business fundamentals.

Respond in this EXACT format:
SENTIMENT: [bullish/bearish/neutral]
CONFIDENCE: [0-100]
REASONING: [2-3 sentences explaining your assessment focusing on fundamentals]
"
    )
}

/// Read `SENTIMENT:`, `CONFIDENCE:` and `REASONING:` lines.
///
/// Unparseable fields fall back to neutral, 50 and "No reasoning provided".
pub fn parse_sentiment(text: &str) -> SentimentReading {
    let mut sentiment = Sentiment::Neutral;
    let mut confidence: u64 = 50;

    for line in text.trim().lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("SENTIMENT:") {
            let value = rest.rsplit(':').next().unwrap_or_default().trim().to_lowercase();
            sentiment = match value.as_str() {
                "bullish" => Sentiment::Bullish,
                "bearish" => Sentiment::Bearish,
                "neutral" => Sentiment::Neutral,
                _ => sentiment,
            };
        } else if line.starts_with("CONFIDENCE:") {
            confidence = DIGITS
                .find(line)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(50);
        }
    }

    let reasoning = text
        .rsplit("REASONING:")
        .next()
        .filter(|_| text.contains("REASONING:"))
        .and_then(|section| section.trim().lines().next())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("No reasoning provided")
        .to_string();

    SentimentReading {
        sentiment,
        confidence: confidence.min(100) as u8,
        reasoning,
    }
}

/// Bullet lines with markers stripped, skipping headers and short fragments.
/// Falls back to sentence splitting when nothing qualifies.
pub fn parse_bullets(text: &str, max_bullets: usize) -> Vec<String> {
    const MARKERS: [&str; 5] = ["•", "-", "*", "–", "—"];

    let bullets: Vec<String> = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            MARKERS
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
                .map(str::trim)
                .unwrap_or(line)
        })
        .filter(|line| line.chars().count() > 10 && !line.ends_with(':'))
        .take(max_bullets)
        .map(str::to_string)
        .collect();

    if !bullets.is_empty() {
        return bullets;
    }

    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(max_bullets)
        .map(str::to_string)
        .collect()
}

/// Ticker-like tokens near the top of the article, deduplicated in order.
pub fn extract_tickers(text: &str) -> Vec<String> {
    let head = truncate_chars(text, TICKER_SCAN_CHARS);
    let mut tickers: Vec<String> = Vec::new();

    for m in TICKER_PATTERN.find_iter(head) {
        let token = m.as_str();
        if TICKER_STOP_WORDS.contains(&token) || tickers.iter().any(|t| t == token) {
            continue;
        }
        tickers.push(token.to_string());
        if tickers.len() == MAX_MENTIONED {
            break;
        }
    }

    tickers
}

fn sum_tokens(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}
