//! HTTP client for the streaming completion endpoint

use std::pin::Pin;

use async_stream::stream;
use futures::StreamExt;
use tokio_stream::Stream;

use crate::{
    error::{Error, Result},
    sse::{RecordAssembler, SseRecord},
    types::{CompletionRequest, StreamChunk, Turn},
};

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Full URL of the completion endpoint.
    pub base_url: String,
    /// Bearer credential sent with each request.
    pub api_key: String,
    /// Response-length cap forwarded in the request body.
    pub max_tokens: u32,
}

/// Events yielded while consuming a completion stream.
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    /// An incremental text fragment extracted from one record.
    Delta(String),
    /// The transport reported end of stream.
    Done,
    /// The stream failed mid-flight.
    Error { message: String },
}

/// A stream of completion events.
pub type CompletionEventStream = Pin<Box<dyn Stream<Item = CompletionEvent> + Send>>;

/// Client for the completion endpoint.
pub struct CompletionClient {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl CompletionClient {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Issue one streaming completion request.
    ///
    /// A connect failure or non-success status is returned as an error here,
    /// before any stream exists. Once the stream is handed out, failures are
    /// reported in-band as [`CompletionEvent::Error`].
    pub async fn stream(&self, turns: Vec<Turn>) -> Result<CompletionEventStream> {
        let request = CompletionRequest {
            messages: turns,
            stream: true,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.base_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), body));
        }

        Ok(Box::pin(create_stream(response)))
    }
}

fn create_stream(response: reqwest::Response) -> impl Stream<Item = CompletionEvent> {
    stream! {
        let mut assembler = RecordAssembler::new();
        let mut bytes = response.bytes_stream();

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for record in assembler.push(&chunk) {
                        match record {
                            SseRecord::Done => {
                                // Logical end marker; keep reading until the
                                // transport itself ends.
                                tracing::debug!("received end-of-stream sentinel");
                            }
                            SseRecord::Data(payload) => {
                                if let Some(fragment) = extract_fragment(&payload) {
                                    yield CompletionEvent::Delta(fragment);
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    yield CompletionEvent::Error {
                        message: format!("stream read failed: {}", e),
                    };
                    return;
                }
            }
        }

        if assembler.has_partial() {
            tracing::debug!("discarding truncated trailing line");
        }
        yield CompletionEvent::Done;
    }
}

/// Map one record payload to its delta fragment, if any.
///
/// A payload that fails to parse is logged and dropped; a single malformed
/// record never aborts the stream.
fn extract_fragment(payload: &str) -> Option<String> {
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk.fragment().map(str::to_owned),
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed stream record");
            None
        }
    }
}
