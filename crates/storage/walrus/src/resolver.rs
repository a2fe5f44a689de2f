//! Ordered failover across interchangeable Walrus endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gate_core::{BlobId, BlobStore, EndpointFailure, StorageError};

use crate::error::{EndpointError, PoolConfigError};
use crate::pool::{EndpointPool, PoolConfig};
use crate::transport::{BlobTransport, HttpTransport};

/// Uploads and downloads blobs against an [`EndpointPool`].
///
/// Endpoints are tried strictly in order and the first success returns.
/// Every endpoint failure is recorded and the loop moves on; only pool
/// exhaustion is an error.
pub struct BlobResolver {
    pool: EndpointPool,
    transport: Arc<dyn BlobTransport>,
    timeout: Duration,
    epochs: u32,
}

impl BlobResolver {
    pub fn new(
        pool: EndpointPool,
        transport: Arc<dyn BlobTransport>,
        timeout: Duration,
        epochs: u32,
    ) -> Self {
        Self {
            pool,
            transport,
            timeout,
            epochs,
        }
    }

    /// Resolver over HTTP using `config`.
    pub fn from_config(config: &PoolConfig) -> Result<Self, PoolConfigError> {
        Ok(Self::new(
            EndpointPool::from_config(config)?,
            Arc::new(HttpTransport::new()),
            config.timeout(),
            config.epochs,
        ))
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    async fn attempt<T, F>(&self, endpoint: &str, operation: F) -> Result<T, EndpointError>
    where
        F: std::future::Future<Output = Result<T, EndpointError>>,
    {
        let result = match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(EndpointError::Transient(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };
        result.inspect_err(|e| match e {
            EndpointError::NotFound | EndpointError::Transient(_) => {
                tracing::debug!(endpoint, error = %e, "Endpoint attempt failed, trying next");
            }
            EndpointError::Other(_) => {
                tracing::warn!(endpoint, error = %e, "Endpoint misbehaved, trying next");
            }
        })
    }

    /// Store `data` through the first publisher that accepts it.
    pub async fn upload(&self, data: &[u8]) -> Result<BlobId, StorageError> {
        let publishers = self.pool.publishers();

        let mut errors = Vec::new();
        for publisher in publishers {
            let attempt = self
                .attempt(publisher, self.transport.put_blob(publisher, data, self.epochs))
                .await;
            match attempt {
                Ok(response) => {
                    let blob_id = BlobId::new(response.blob_id());
                    tracing::info!(
                        %blob_id,
                        publisher = %publisher,
                        bytes = data.len(),
                        "Blob stored"
                    );
                    return Ok(blob_id);
                }
                Err(e) => errors.push(EndpointFailure {
                    endpoint: publisher.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        tracing::error!(tried = publishers.len(), "Every publisher failed");
        Err(StorageError::StorageConnection {
            tried: publishers.len(),
            errors,
        })
    }

    /// Fetch `blob_id` from the first aggregator that has it.
    pub async fn download(&self, blob_id: &BlobId) -> Result<Vec<u8>, StorageError> {
        let aggregators = self.pool.aggregators();

        let mut errors = Vec::new();
        for aggregator in aggregators {
            let attempt = self
                .attempt(
                    aggregator,
                    self.transport.get_blob(aggregator, blob_id.as_str()),
                )
                .await;
            match attempt {
                Ok(data) => {
                    tracing::debug!(
                        %blob_id,
                        aggregator = %aggregator,
                        bytes = data.len(),
                        "Blob fetched"
                    );
                    return Ok(data);
                }
                Err(e) => errors.push(EndpointFailure {
                    endpoint: aggregator.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        tracing::error!(%blob_id, tried = aggregators.len(), "Every aggregator failed");
        Err(StorageError::BlobNotFound {
            blob_id: blob_id.clone(),
            tried: aggregators.len(),
            errors,
        })
    }
}

#[async_trait]
impl BlobStore for BlobResolver {
    async fn upload_blob(&self, data: Vec<u8>) -> Result<BlobId, StorageError> {
        self.upload(&data).await
    }

    async fn get_encrypted_blob(&self, blob_id: &BlobId) -> Result<Vec<u8>, StorageError> {
        self.download(blob_id).await
    }

    /// URL on the first aggregator.
    fn blob_url(&self, blob_id: &BlobId) -> Option<String> {
        self.pool
            .aggregators()
            .first()
            .map(|aggregator| format!("{}/v1/blobs/{}", aggregator, blob_id))
    }
}
