// Deterministic in-process stand-ins for the moderation and generation
// services. Each stub counts its invocations so tests can assert which
// stages ran.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sieve::generation::traits::{GenerationError, TextGenerator};
use sieve::moderation::traits::{CategorySeverity, ContentModerator, ModerationError};
use sieve::pipeline::{ModeratedCompletion, PipelineOptions};

/// What the stub moderator does for a given text.
#[derive(Clone, Debug)]
pub enum Screen {
    Clean,
    Flag(&'static str, u8),
    Fail,
    Hang,
}

pub struct StubModerator {
    default: Screen,
    by_text: HashMap<String, Screen>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StubModerator {
    pub fn new(default: Screen) -> Self {
        Self {
            default,
            by_text: HashMap::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Override the behavior for one exact text.
    pub fn on(mut self, text: &str, screen: Screen) -> Self {
        self.by_text.insert(text.to_string(), screen);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentModerator for StubModerator {
    async fn analyze(&self, text: &str) -> Result<Vec<CategorySeverity>, ModerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());

        let screen = self.by_text.get(text).unwrap_or(&self.default).clone();
        let mut categories: Vec<CategorySeverity> = ["Hate", "SelfHarm", "Sexual", "Violence"]
            .iter()
            .map(|c| CategorySeverity::new(*c, 0))
            .collect();

        match screen {
            Screen::Clean => Ok(categories),
            Screen::Flag(category, severity) => {
                for c in categories.iter_mut().filter(|c| c.category == category) {
                    c.severity = severity;
                }
                Ok(categories)
            }
            Screen::Fail => Err(ModerationError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            }),
            Screen::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(categories)
            }
        }
    }
}

/// What the stub generator does when called.
#[derive(Clone, Debug)]
pub enum Reply {
    Text(&'static str),
    Empty,
    Fail,
    Hang,
    Panic,
}

pub struct StubGenerator {
    reply: Reply,
    calls: AtomicUsize,
    received: Mutex<Vec<(String, String)>>,
}

impl StubGenerator {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every `(prompt, system_message)` pair passed to `complete`, in order.
    pub fn received(&self) -> Vec<(String, String)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(
        &self,
        prompt: &str,
        system_message: &str,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap()
            .push((prompt.to_string(), system_message.to_string()));
        match &self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Empty => Ok(String::new()),
            Reply::Fail => Err(GenerationError::Status {
                status: 503,
                body: "overloaded".to_string(),
            }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("too late".to_string())
            }
            Reply::Panic => panic!("generator exploded"),
        }
    }
}

/// A pipeline over the given stubs with a short call timeout.
pub fn pipeline(
    moderator: &Arc<StubModerator>,
    generator: &Arc<StubGenerator>,
) -> ModeratedCompletion {
    let options = PipelineOptions {
        call_timeout: Duration::from_millis(200),
        ..PipelineOptions::default()
    };
    ModeratedCompletion::new(moderator.clone(), generator.clone(), options)
}
