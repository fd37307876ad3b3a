//! Reasoning service boundary
//!
//! The engine only needs text in, text out. Retries, if any, belong to
//! the implementation behind this trait.

use crate::Result;
use async_trait::async_trait;

pub mod groq;
pub use groq::GroqClient;

/// External language-model completion service
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Offline reasoning service for development and demos
/// Keeps the pipeline runnable without an API key
pub struct MockReasoningService;

#[async_trait]
impl ReasoningService for MockReasoningService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let role = prompt
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("You are a "))
            .map(|role| role.trim_end_matches('.'))
            .unwrap_or("analyst");

        let task = prompt
            .split("Task:\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or("the assigned task");

        Ok(format!(
            "[{}] Reviewed: {}\n- Key findings recorded\n- Recommendations pending human review",
            role, task
        ))
    }
}
