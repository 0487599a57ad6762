mod error;
mod gemini;
mod history;
mod prompt;

pub use error::ReadingError;
pub use gemini::GeminiClient;
pub use history::{ChatRole, ChatTurn, History};
pub use prompt::{default_request, system_prompt};

use std::sync::Arc;

use async_trait::async_trait;

use crate::chart::ChartRecord;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Answers the last user turn given the system prompt and prior turns.
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String, ReadingError>;
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub answer: String,
    /// Caller's history with this exchange appended.
    pub history: History,
}

/// Produces readings and follow-up answers for one chart.
#[derive(Clone)]
pub struct ReadingGenerator {
    model: Arc<dyn ChatModel>,
}

impl ReadingGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Without a question (or with a blank one) asks for the full reading.
    /// `history` is left untouched when the model call fails.
    pub async fn ask(
        &self,
        chart: &ChartRecord,
        question: Option<&str>,
        history: &History,
    ) -> Result<Reply, ReadingError> {
        let request = match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q.to_string(),
            None => default_request(&chart.name),
        };

        let mut turns = history.turns().to_vec();
        turns.push(ChatTurn::user(request.clone()));

        let answer = self.model.complete(&system_prompt(chart), &turns).await?;

        let mut history = history.clone();
        history.push(ChatTurn::user(request));
        history.push(ChatTurn::assistant(answer.clone()));
        Ok(Reply { answer, history })
    }
}
