//! Shared test doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use plume_abstraction::Provider;
use plume_models::{GatewayError, Generation, ImageInput, LanguageGateway, ProviderSpec};

/// Replays canned replies in order and counts every call.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, prompt: &str) -> Generation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let content = self.replies.lock().unwrap().pop_front().expect("script exhausted");
        Generation::Generated { content, provider: Provider::OpenAI, model: "gpt-4o".to_string() }
    }
}

#[async_trait]
impl LanguageGateway for ScriptedGateway {
    async fn generate_text(
        &self,
        prompt: &str,
        _system_prompt: &str,
        _spec: &ProviderSpec,
    ) -> Result<Generation, GatewayError> {
        Ok(self.next(prompt))
    }

    async fn analyze_image(
        &self,
        _image: &ImageInput,
        prompt: &str,
    ) -> Result<Generation, GatewayError> {
        Ok(self.next(prompt))
    }
}

/// Echoes which stage a prompt came from, never approving a draft.
///
/// Safe to share between concurrent runs since replies depend only on the prompt.
#[derive(Default)]
pub struct EchoGateway {
    calls: AtomicUsize,
}

impl EchoGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageGateway for EchoGateway {
    async fn generate_text(
        &self,
        prompt: &str,
        _system_prompt: &str,
        _spec: &ProviderSpec,
    ) -> Result<Generation, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let topic = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Topic: "))
            .unwrap_or("unknown")
            .to_string();
        Ok(Generation::Generated {
            content: format!("copy about {topic}"),
            provider: Provider::OpenAI,
            model: "gpt-4o".to_string(),
        })
    }

    async fn analyze_image(
        &self,
        _image: &ImageInput,
        _prompt: &str,
    ) -> Result<Generation, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Generation::Unconfigured { message: "no vision".to_string() })
    }
}
