//! Education tutor: answers questions from caller-supplied content chunks
//!
//! Retrieval happens upstream; this agent only builds the cited context,
//! asks the model and post-processes the answer.

use crate::agent::{self, Agent};
use crate::error::AgentError;
use crate::gemini::{GenerationRequest, ModelClient};
use crate::models::{AgentContext, AgentType};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub const AGENT_ID: &str = "education";

const MAX_SUGGESTED_QUESTIONS: usize = 3;
const MAX_TOPICS: usize = 5;
const HISTORY_WINDOW: usize = 5;

const TOPIC_KEYWORDS: [&str; 12] = [
    "margin of safety",
    "intrinsic value",
    "moat",
    "competitive advantage",
    "management quality",
    "free cash flow",
    "return on equity",
    "valuation",
    "business analysis",
    "market price",
    "book value",
    "earnings power",
];

const QUESTION_SECTION_HEADERS: [&str; 3] = ["follow-up", "questions to consider", "next steps"];

const SYSTEM_PROMPT: &str = "You are a patient, knowledgeable investment education tutor.

Your role is to help students learn value investing by:
1. Answering questions based ONLY on the provided educational content
2. Citing specific sources and page numbers
3. Explaining concepts clearly without dumbing down
4. Connecting ideas across different sources
5. Encouraging critical thinking with follow-up questions

Teaching Principles:
- Use the Socratic method - ask questions that lead to understanding
- Relate abstract concepts to concrete examples
- Build on what the student already knows
- Be honest when the source material doesn't cover something
- Reference specific passages, chapters, or pages

Remember: You're teaching fundamental analysis and value investing. Focus on:
- Long-term thinking
- Business quality assessment
- Margin of safety
- Intrinsic value
- Management quality

Never make up information. Only use what's in the provided context.";

/// One retrieved passage, most relevant first.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentChunk {
    #[serde(default, alias = "id")]
    pub chunk_id: Option<String>,
    #[serde(alias = "text")]
    pub chunk_text: String,
    #[serde(default, alias = "similarity")]
    pub similarity_score: f64,
    #[serde(default = "unknown_source", alias = "title")]
    pub source_title: String,
    #[serde(default, alias = "author")]
    pub source_author: Option<String>,
    #[serde(default)]
    pub page_number: Option<u32>,
}

fn unknown_source() -> String {
    "Unknown".to_string()
}

impl ContentChunk {
    fn source_label(&self) -> String {
        let mut label = self.source_title.clone();
        if let Some(author) = self.source_author.as_deref().filter(|a| !a.is_empty()) {
            label.push_str(&format!(" by {}", author));
        }
        if let Some(page) = self.page_number {
            label.push_str(&format!(", Page {}", page));
        }
        label
    }

    fn citation(&self) -> Value {
        json!({
            "source": self.source_title,
            "author": self.source_author,
            "page": self.page_number,
            "relevance": self.similarity_score,
            "chunk_id": self.chunk_id,
        })
    }
}

pub struct EducationAgent {
    client: Arc<dyn ModelClient>,
}

impl EducationAgent {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Agent for EducationAgent {
    fn agent_id(&self) -> &str {
        AGENT_ID
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Education
    }

    fn description(&self) -> &str {
        "Answers value-investing questions from books and articles, with citations."
    }

    fn display_name(&self) -> Option<&str> {
        Some("Investment Tutor")
    }

    fn emoji(&self) -> Option<&str> {
        Some("📚")
    }

    fn tags(&self) -> Vec<String> {
        vec!["education".into(), "rag".into(), "books".into()]
    }

    fn validate_context(&self, context: &AgentContext) -> Vec<String> {
        let mut errors = Vec::new();
        if context.param_str("question").is_none() {
            errors.push("Missing required parameter: question".to_string());
        }
        if !context.content_chunks.as_ref().is_some_and(|c| !c.is_empty()) {
            errors.push("Missing required field: content_chunks".to_string());
        }
        errors.extend(context.constraint_violations());
        errors
    }

    async fn execute_impl(&self, context: &AgentContext) -> Result<Map<String, Value>> {
        let question = context.param_str("question").unwrap_or_default();
        let chunks = parse_chunks(context.content_chunks.as_deref().unwrap_or_default())?;

        debug!(
            request_id = %context.request_id,
            chunks = chunks.len(),
            "Building tutor prompt"
        );

        let prompt = rag_prompt(
            &build_cited_context(&chunks),
            question,
            &conversation_history(context),
        );

        let generation = agent::generate(
            self.client.as_ref(),
            GenerationRequest {
                prompt,
                system_instruction: Some(SYSTEM_PROMPT.to_string()),
                max_tokens: context.max_tokens,
                temperature: context.temperature,
            },
        )
        .await?;

        let confidence = confidence_score(&chunks);
        info!(
            request_id = %context.request_id,
            confidence,
            "Education answer generated"
        );

        let citations: Vec<Value> = chunks.iter().map(ContentChunk::citation).collect();

        let mut result = Map::new();
        result.insert("raw_text".into(), json!(generation.text));
        result.insert(
            "suggested_questions".into(),
            json!(extract_suggested_questions(&generation.text)),
        );
        result.insert("related_topics".into(), json!(extract_topics(&generation.text)));
        result.insert("citations".into(), Value::Array(citations));
        result.insert("confidence_score".into(), json!(confidence));
        result.insert("tokens_used".into(), json!(generation.tokens_used));
        result.insert("model_version".into(), json!(generation.model_version));

        Ok(result)
    }
}

fn parse_chunks(raw: &[Value]) -> Result<Vec<ContentChunk>> {
    raw.iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value.clone()).map_err(|e| {
                AgentError::validation([format!("Invalid content chunk {}: {}", i + 1, e)])
            })
        })
        .collect()
}

fn build_cited_context(chunks: &[ContentChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {}] {}\n{}\n", i + 1, chunk.source_label(), chunk.chunk_text))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Last few `{role, content}` messages from the `conversation_history` parameter.
fn conversation_history(context: &AgentContext) -> String {
    let Some(messages) = context.get_param("conversation_history").and_then(Value::as_array) else {
        return String::new();
    };

    let start = messages.len().saturating_sub(HISTORY_WINDOW);
    messages[start..]
        .iter()
        .filter_map(|msg| {
            let role = msg.get("role").and_then(Value::as_str).unwrap_or("user");
            let content = msg.get("content").and_then(Value::as_str)?;
            Some(format!("{}: {}", role, content.trim()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn rag_prompt(context: &str, question: &str, history: &str) -> String {
    let history = if history.is_empty() {
        String::new()
    } else {
        format!("PREVIOUS CONVERSATION:\n{}\n\n", history)
    };

    format!(
        "{history}Based on the following educational content, please answer the student's question.

CONTEXT (from educational materials):
{context}

STUDENT QUESTION:
{question}

Instructions:
1. Answer using ONLY information from the context above
2. Cite your sources (mention book/article name and section)
3. If the context doesn't fully answer the question, say so
4. Explain clearly - assume the student is learning
5. Suggest 2-3 follow-up questions to deepen understanding

Your response should:
- Start with a direct answer
- Provide explanation with examples from the context
- Include citations: [Source: \"Book Name\", Chapter X]
- End with suggested follow-up questions"
    )
}

/// Follow-up questions: lines ending in `?` inside a follow-up section, or
/// anywhere a line contains a question mark.
pub fn extract_suggested_questions(text: &str) -> Vec<String> {
    const LIST_MARKERS: [&str; 6] = ["1.", "2.", "3.", "-", "•", "*"];

    let mut questions = Vec::new();
    let mut in_questions_section = false;

    for line in text.lines().map(str::trim) {
        let lower = line.to_lowercase();
        if QUESTION_SECTION_HEADERS.iter().any(|h| lower.contains(h)) {
            in_questions_section = true;
            continue;
        }

        if !(in_questions_section || line.contains('?')) {
            continue;
        }

        let mut candidate = line;
        for marker in LIST_MARKERS {
            if let Some(rest) = candidate.strip_prefix(marker) {
                candidate = rest.trim();
            }
        }

        if candidate.ends_with('?') && candidate.chars().count() > 10 {
            questions.push(candidate.to_string());
            if questions.len() >= MAX_SUGGESTED_QUESTIONS {
                break;
            }
        }
    }

    questions
}

/// Known value-investing topics mentioned in the answer, title-cased.
pub fn extract_topics(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .take(MAX_TOPICS)
        .map(|keyword| title_case(keyword))
        .collect()
}

fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 60% mean similarity, 30% coverage (five chunks is full), 10% top chunk.
pub fn confidence_score(chunks: &[ContentChunk]) -> f64 {
    let Some(top) = chunks.first() else {
        return 0.0;
    };

    let n = chunks.len() as f64;
    let mean = chunks.iter().map(|c| c.similarity_score).sum::<f64>() / n;
    let coverage = (n / 5.0).min(1.0);

    (mean * 0.6 + coverage * 0.3 + top.similarity_score * 0.1).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gemini::MockModelClient;
    use tokio_test::{assert_err, assert_ok};

    const ANSWER: &str = "Margin of safety is the gap between intrinsic value and market price [Source 1].

Follow-up questions:
1. How would you estimate intrinsic value for a bank?
2. Why did Graham prefer a 33% discount?
- Short?";

    fn chunk(title: &str, similarity: f64) -> Value {
        json!({
            "id": format!("chunk-{}", title),
            "chunk_text": "The margin of safety is always dependent on the price paid.",
            "similarity": similarity,
            "title": title,
            "author": "Benjamin Graham",
            "page_number": 512
        })
    }

    fn tutor_context() -> AgentContext {
        AgentContext::new("req-edu")
            .with_param("question", json!("What is margin of safety?"))
            .with_content_chunks(vec![
                chunk("The Intelligent Investor", 0.9),
                chunk("Security Analysis", 0.7),
            ])
    }

    #[tokio::test]
    async fn test_answer_with_citations() {
        let client = Arc::new(MockModelClient::with_reply(ANSWER));
        let agent = EducationAgent::new(client.clone());

        let output = assert_ok!(agent.execute(&tutor_context()).await);

        assert_eq!(output.agent_type, AgentType::Education);
        assert_eq!(
            output.field("suggested_questions"),
            Some(&json!([
                "How would you estimate intrinsic value for a bank?",
                "Why did Graham prefer a 33% discount?"
            ]))
        );
        assert_eq!(
            output.field("related_topics"),
            Some(&json!(["Margin Of Safety", "Intrinsic Value", "Market Price"]))
        );
        let citations = output.field("citations").unwrap().as_array().unwrap();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0]["source"], "The Intelligent Investor");
        assert_eq!(citations[0]["page"], 512);

        let prompt = client.last_request().unwrap().prompt;
        assert!(prompt.contains("[Source 1] The Intelligent Investor by Benjamin Graham, Page 512"));
        assert!(prompt.contains("STUDENT QUESTION:\nWhat is margin of safety?"));
        assert!(!prompt.contains("PREVIOUS CONVERSATION"));
    }

    #[tokio::test]
    async fn test_history_window_included() {
        let client = Arc::new(MockModelClient::with_reply("ok"));
        let agent = EducationAgent::new(client.clone());
        let history: Vec<Value> = (0..7)
            .map(|i| json!({"role": "user", "content": format!("message {}", i)}))
            .collect();

        assert_ok!(agent.execute(&tutor_context().with_param("conversation_history", json!(history))).await);

        let prompt = client.last_request().unwrap().prompt;
        assert!(prompt.starts_with("PREVIOUS CONVERSATION:\nuser: message 2"));
        assert!(!prompt.contains("message 1\n"));
    }

    #[tokio::test]
    async fn test_requires_question_and_chunks() {
        let client = Arc::new(MockModelClient::with_reply("unused"));
        let agent = EducationAgent::new(client.clone());

        let err = assert_err!(agent.execute(&AgentContext::new("r")).await);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("question"));
        assert!(err.to_string().contains("content_chunks"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_validation_error() {
        let agent = EducationAgent::new(Arc::new(MockModelClient::with_reply("unused")));
        let ctx = AgentContext::new("r")
            .with_param("question", json!("What is a moat?"))
            .with_content_chunks(vec![json!({"title": "No text here"})]);

        let err = assert_err!(agent.execute(&ctx).await);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(confidence_score(&[]), 0.0);

        let chunks: Vec<ContentChunk> = [0.9, 0.7]
            .iter()
            .map(|s| serde_json::from_value(chunk("x", *s)).unwrap())
            .collect();
        let expected = 0.8 * 0.6 + 0.4 * 0.3 + 0.9 * 0.1;
        assert!((confidence_score(&chunks) - expected).abs() < 1e-9);

        let perfect: Vec<ContentChunk> = (0..8)
            .map(|_| serde_json::from_value(chunk("x", 1.0)).unwrap())
            .collect();
        assert!((confidence_score(&perfect) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_topics_capped() {
        let text = "moat, valuation, book value, free cash flow, earnings power, intrinsic value, market price";
        assert_eq!(extract_topics(text).len(), 5);
        assert_eq!(title_case("return on equity"), "Return On Equity");
    }
}
