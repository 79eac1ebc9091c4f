/// Scripted generator for tests.
///
/// Replays queued answers in order and records every prompt it receives.
/// When the queue is empty it echoes the prompt back.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Generator, LlmError};

#[derive(Default)]
pub struct MockGenerator {
    answers: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next call.
    pub fn push_answer(&self, answer: impl Into<String>) -> &Self {
        self.lock_answers().push_back(Ok(answer.into()));
        self
    }

    /// Queue a failure for the next call.
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.lock_answers().push_back(Err(message.into()));
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn lock_answers(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.answers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        match self.lock_answers().pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(body)) => Err(LlmError::Api { status: 500, body }),
            None => Ok(prompt.to_string()),
        }
    }
}
