//! Transport seam between the session and the completion endpoint

use async_trait::async_trait;
use quill_ai::{CompletionClient, CompletionEventStream, Turn};

/// Issues one streaming completion call.
///
/// The seam tests script against; the session never talks to the endpoint
/// client directly.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn stream(&self, turns: Vec<Turn>) -> quill_ai::Result<CompletionEventStream>;
}

/// Transport backed by the real completion endpoint.
pub struct EndpointTransport {
    client: CompletionClient,
}

impl EndpointTransport {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionTransport for EndpointTransport {
    async fn stream(&self, turns: Vec<Turn>) -> quill_ai::Result<CompletionEventStream> {
        self.client.stream(turns).await
    }
}
