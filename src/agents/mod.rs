//! Non-persona agents

pub mod education;
pub mod news;

pub use education::EducationAgent;
pub use news::NewsSummarizerAgent;
