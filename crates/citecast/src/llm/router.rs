//! Primary/fallback routing.
//!
//! Each logical call tries the primary up to `1 + backoff.len()` times,
//! sleeping the matching backoff entry between retriable failures. A
//! non-retriable failure ends the primary path at once. The fallback then
//! gets exactly one attempt; if that fails too the caller sees
//! [`CitecastError::Unavailable`] and the details only reach the log.
//!
//! A [`CitecastError::Configuration`] from either provider is returned as is:
//! it is never retried and never sent on to the fallback.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, warn};

use crate::contracts::{Extraction, PostVariant};
use crate::error::{CitecastError, Result};
use crate::llm::{ExtractClaimsInput, GeneratePostsInput, LlmProvider};

/// Waits between primary attempts. Swapped out in tests to record delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct LlmRouter {
    primary: Arc<dyn LlmProvider>,
    fallback: Arc<dyn LlmProvider>,
    backoff: Vec<Duration>,
    sleeper: Arc<dyn Sleeper>,
}

impl LlmRouter {
    pub fn new(
        primary: Arc<dyn LlmProvider>,
        fallback: Arc<dyn LlmProvider>,
        backoff: Vec<Duration>,
    ) -> Self {
        Self {
            primary,
            fallback,
            backoff,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn route<'a, T, F, Fut>(&'a self, operation: &str, call: F) -> Result<T>
    where
        F: Fn(&'a dyn LlmProvider) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send + 'a,
        T: Send,
    {
        let primary = self.primary.as_ref();
        let mut attempt = 0;

        loop {
            match call(primary).await {
                Ok(value) => return Ok(value),
                Err(e @ CitecastError::Configuration(_)) => return Err(e),
                Err(e) => {
                    let delay = self.backoff.get(attempt).copied();
                    warn!(
                        "{} {} attempt {} failed: {}",
                        primary.id(),
                        operation,
                        attempt + 1,
                        e
                    );
                    match delay {
                        Some(delay) if e.is_retriable() => {
                            self.sleeper.sleep(delay).await;
                            attempt += 1;
                        }
                        _ => break,
                    }
                }
            }
        }

        let fallback = self.fallback.as_ref();
        warn!("Falling back to {} for {}", fallback.id(), operation);

        match call(fallback).await {
            Ok(value) => Ok(value),
            Err(e @ CitecastError::Configuration(_)) => Err(e),
            Err(e) => {
                error!("{} {} failed on fallback: {}", fallback.id(), operation, e);
                Err(CitecastError::Unavailable)
            }
        }
    }
}

#[async_trait]
impl LlmProvider for LlmRouter {
    fn id(&self) -> &str {
        "router"
    }

    async fn extract_claims(&self, input: &ExtractClaimsInput) -> Result<Extraction> {
        self.route("extract_claims", |provider| provider.extract_claims(input))
            .await
    }

    async fn generate_posts(&self, input: &GeneratePostsInput) -> Result<Vec<PostVariant>> {
        self.route("generate_posts", |provider| provider.generate_posts(input))
            .await
    }
}
