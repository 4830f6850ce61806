//! Mock publisher for testing
//!
//! Plays back a script of results, then falls back to a default behavior.
//! Clones share their state, so a test can keep a handle while the controller
//! owns a boxed copy.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::Publisher;

/// Result a scripted publish call should produce
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success,
    Fail(PlatformError),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockResponse>,
    calls: Vec<String>,
    published: Vec<String>,
}

/// Configurable in-memory publisher
#[derive(Debug, Clone)]
pub struct MockPublisher {
    name: String,
    character_limit: Option<usize>,
    fallback: MockResponse,
    state: Arc<Mutex<MockState>>,
}

impl MockPublisher {
    /// Create a mock publisher that always succeeds
    pub fn success(name: &str) -> Self {
        Self {
            name: name.to_string(),
            character_limit: None,
            fallback: MockResponse::Success,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock publisher that always fails with `error`
    pub fn failing(name: &str, error: PlatformError) -> Self {
        Self {
            fallback: MockResponse::Fail(error),
            ..Self::success(name)
        }
    }

    /// Play `script` first, one entry per call, then use the fallback
    pub fn with_script(self, script: Vec<MockResponse>) -> Self {
        self.state.lock().unwrap().script = script.into();
        self
    }

    /// Reject content longer than `limit` characters during validation
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.character_limit = Some(limit);
        self
    }

    /// Every text passed to `publish`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of times publish was called
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Texts that were accepted
    pub fn published(&self) -> Vec<String> {
        self.state.lock().unwrap().published.clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, text: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(text.to_string());

        let response = state
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match response {
            MockResponse::Success => {
                state.published.push(text.to_string());
                Ok(format!("{}:mock-{}", self.name, uuid::Uuid::new_v4()))
            }
            MockResponse::Fail(error) => Err(error.into()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn character_limit(&self) -> Option<usize> {
        self.character_limit
    }
}
