use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::client::{ChatMessage, CompletionClient};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    /// Content present but empty.
    Empty,
    /// No content field at all.
    Missing,
    Fail(String),
}

/// Completion client that answers from a script. The last reply repeats
/// once the script runs out.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedClient {
    pub(crate) fn sequence(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub(crate) fn text(text: &str) -> Arc<Self> {
        Self::sequence(vec![Reply::Text(text.to_string())])
    }

    pub(crate) fn empty() -> Arc<Self> {
        Self::sequence(vec![Reply::Empty])
    }

    pub(crate) fn missing() -> Arc<Self> {
        Self::sequence(vec![Reply::Missing])
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Self::sequence(vec![Reply::Fail(message.to_string())])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock();
        if replies.len() > 1 {
            replies.pop_front().unwrap_or(Reply::Missing)
        } else {
            replies.front().cloned().unwrap_or(Reply::Missing)
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = messages.last().map(|m| m.content.clone());

        match self.next_reply() {
            Reply::Text(text) => Ok(Some(text)),
            Reply::Empty => Ok(Some(String::new())),
            Reply::Missing => Ok(None),
            Reply::Fail(message) => Err(anyhow::anyhow!(message)),
        }
    }
}
