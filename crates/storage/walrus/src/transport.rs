//! Single-endpoint HTTP operations.

use async_trait::async_trait;

use crate::error::EndpointError;
use crate::types::BlobResponse;

/// One request against one endpoint. The resolver owns failover.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// `PUT {publisher}/v1/blobs?epochs={epochs}`.
    async fn put_blob(
        &self,
        publisher: &str,
        data: &[u8],
        epochs: u32,
    ) -> Result<BlobResponse, EndpointError>;

    /// `GET {aggregator}/v1/blobs/{blob_id}`.
    async fn get_blob(&self, aggregator: &str, blob_id: &str) -> Result<Vec<u8>, EndpointError>;
}

/// Walrus HTTP API over `reqwest`.
#[derive(Clone, Default)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

fn classify_send_error(error: reqwest::Error) -> EndpointError {
    if error.is_timeout() || error.is_connect() {
        EndpointError::Transient(error.to_string())
    } else {
        EndpointError::Other(error.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, EndpointError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(EndpointError::NotFound);
    }
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(EndpointError::Other(format!("status {}: {}", status, error_text)));
    }
    Ok(response)
}

#[async_trait]
impl BlobTransport for HttpTransport {
    async fn put_blob(
        &self,
        publisher: &str,
        data: &[u8],
        epochs: u32,
    ) -> Result<BlobResponse, EndpointError> {
        let url = format!("{}/v1/blobs?epochs={}", publisher, epochs);

        let response = self
            .http_client
            .put(&url)
            .header("Content-Type", "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .map_err(classify_send_error)?;
        let response = check_status(response).await?;

        let response_text = response
            .text()
            .await
            .map_err(|e| EndpointError::Other(format!("failed to read body: {e}")))?;

        serde_json::from_str(&response_text).map_err(|e| {
            EndpointError::Other(format!(
                "unparseable publisher response ({e}): {response_text}"
            ))
        })
    }

    async fn get_blob(&self, aggregator: &str, blob_id: &str) -> Result<Vec<u8>, EndpointError> {
        let url = format!("{}/v1/blobs/{}", aggregator, blob_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(classify_send_error)?;
        let response = check_status(response).await?;

        let data = response
            .bytes()
            .await
            .map_err(|e| EndpointError::Other(format!("failed to read body: {e}")))?;
        Ok(data.to_vec())
    }
}
