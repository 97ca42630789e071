//! Scripted [`LlmProvider`] for integration tests.

use async_trait::async_trait;
use futures::StreamExt;
use llm_client::{ChunkStream, LlmProvider, ProviderError};
use prompt::{AttachmentRef, ContentChunk, GenerationRequest};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// What the next `generate` call produces.
pub enum Script {
    /// These chunks, immediately.
    Chunks(Vec<ContentChunk>),
    /// These chunks, then a stream that never yields again.
    ChunksThenPending(Vec<ContentChunk>),
    /// These chunks, each after `delay`.
    Delayed(Vec<ContentChunk>, Duration),
    /// `generate` takes `Duration` to open, then yields these chunks and stalls.
    SlowOpen(Duration, Vec<ContentChunk>),
    /// `generate` itself fails.
    OpenError(ProviderError),
}

/// Returns scripted streams in order; falls back to `"ok"` + Done when the script runs out.
pub struct MockProvider {
    scripts: Mutex<VecDeque<Script>>,
    image: Mutex<Result<AttachmentRef, ProviderError>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            image: Mutex::new(Err(ProviderError::Unsupported("no image".to_string()))),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_image(self, image: Result<AttachmentRef, ProviderError>) -> Self {
        *self.image.lock().unwrap() = image;
        self
    }

    /// Every request passed to `generate`, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Stream of `chunks` followed by nothing, ever.
pub fn pending_after(chunks: Vec<ContentChunk>) -> ChunkStream {
    futures::stream::iter(chunks)
        .chain(futures::stream::pending())
        .boxed()
}

/// Stream of `chunks`, each yielded after `delay`.
pub fn delayed(chunks: Vec<ContentChunk>, delay: Duration) -> ChunkStream {
    futures::stream::iter(chunks)
        .then(move |chunk| async move {
            tokio::time::sleep(delay).await;
            chunk
        })
        .boxed()
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<ChunkStream, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Chunks(chunks)) => Ok(futures::stream::iter(chunks).boxed()),
            Some(Script::ChunksThenPending(chunks)) => Ok(pending_after(chunks)),
            Some(Script::Delayed(chunks, delay)) => Ok(delayed(chunks, delay)),
            Some(Script::SlowOpen(delay, chunks)) => {
                tokio::time::sleep(delay).await;
                Ok(pending_after(chunks))
            }
            Some(Script::OpenError(e)) => Err(e),
            None => Ok(futures::stream::iter(vec![ContentChunk::text("ok"), ContentChunk::done()]).boxed()),
        }
    }

    async fn generate_image(&self, _prompt: &str) -> Result<AttachmentRef, ProviderError> {
        self.image.lock().unwrap().clone()
    }
}
