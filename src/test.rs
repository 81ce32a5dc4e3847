//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{QuizAnswer, QuizItem, Tip, User};
use crate::Config;
use tempfile::TempDir;

/// Test environment that sets up an edufin home directory with Config and database.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with Config and initialized database.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("edufin");
        let config = Config::create(&root).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Inserts a user directly, skipping password hashing. The user cannot log in.
    pub async fn insert_user(&self, email: &str) -> User {
        let user = User::new(email, "Test User", "not-a-hash");
        self.config.db().insert_user(&user).await.unwrap();
        user
    }

    /// Replaces the tips with one tip per text, in order.
    pub async fn insert_tips(&self, texts: &[&str]) -> Vec<Tip> {
        let tips: Vec<Tip> = texts.iter().map(|t| Tip::new(*t)).collect();
        self.config.db().replace_tips(&tips).await.unwrap();
        tips
    }

    /// Replaces the quiz with one item per prompt, in order.
    pub async fn insert_quiz(&self, items: &[(&str, QuizAnswer)]) -> Vec<QuizItem> {
        let items: Vec<QuizItem> = items
            .iter()
            .map(|(prompt, answer)| QuizItem::new(*prompt, *answer, None))
            .collect();
        self.config.db().replace_quiz_items(&items).await.unwrap();
        items
    }
}
