//! Scripted provider: canned replies, recorded requests, image concurrency tracking

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assistive_gateway::error::GatewayError;
use assistive_gateway::providers::{GeneratedImage, GenerationRequest, GenerativeProvider};
use async_trait::async_trait;

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    image_prompts: Mutex<Vec<String>>,
    failing_terms: Vec<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider answering `generate` with `replies` in order, then `""`.
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    /// Provider whose first `generate` call fails with `error`.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            ..Self::default()
        }
    }

    /// Image prompts mentioning any of `terms` fail.
    pub fn with_failing_image_terms(mut self, terms: &[&str]) -> Self {
        self.failing_terms = terms.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().unwrap().clone()
    }

    pub fn max_concurrent_images(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedProvider {
    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn supports_response_schema(&self) -> bool {
        true
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, GatewayError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.image_prompts.lock().unwrap().push(prompt.to_string());
        if self.failing_terms.iter().any(|t| prompt.contains(t.as_str())) {
            return Err(GatewayError::UpstreamProvider {
                status: 429,
                message: "RESOURCE_EXHAUSTED: quota exceeded".into(),
                details: None,
            });
        }
        Ok(Some(GeneratedImage {
            mime_type: "image/png".into(),
            base64_data: format!("img{}", self.image_prompts.lock().unwrap().len()),
        }))
    }
}
