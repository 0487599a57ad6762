use std::path::Path;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::reading::ReadingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation so far, oldest turn first. Owned by the caller and passed
/// into every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct History(Vec<ChatTurn>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.0.push(turn);
    }

    /// A missing file is an empty conversation.
    pub fn load(path: &Path) -> Result<Self, ReadingError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ReadingError> {
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.yaml");

        assert!(History::load(&path).unwrap().is_empty());

        let mut history = History::new();
        history.push(ChatTurn::user("When will I travel?"));
        history.push(ChatTurn::assistant("Jupiter transits your ninth house..."));
        history.save(&path).unwrap();

        let loaded = History::load(&path).unwrap();
        assert_eq!(loaded, history);
        assert_eq!(loaded.turns()[0].role, ChatRole::User);
        assert_eq!(loaded.turns()[1].role, ChatRole::Assistant);
    }

    #[test]
    fn rejects_malformed_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.yaml");
        std::fs::write(&path, "- role: narrator\n  content: hi\n").unwrap();
        assert!(matches!(History::load(&path), Err(ReadingError::Yaml(_))));
    }
}
