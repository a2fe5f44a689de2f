use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gate_core::{BlobId, BlobStore, StorageError};
use gate_storage_walrus::{
    AlreadyCertified, BlobResolver, BlobResponse, BlobTransport, EndpointError, EndpointPool,
    PoolConfig, PoolConfigError,
};

#[derive(Clone)]
enum Behavior {
    Serve(Vec<u8>),
    Store(&'static str),
    NotFound,
    Refused,
    ServerError,
    Hang,
}

/// Transport whose endpoints behave as scripted; records every call.
#[derive(Default)]
struct ScriptedTransport {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn with(mut self, endpoint: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(endpoint.to_string(), behavior);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn run(&self, endpoint: &str) -> Result<Behavior, EndpointError> {
        self.calls.lock().unwrap().push(endpoint.to_string());
        match self.behaviors.get(endpoint).cloned() {
            Some(Behavior::NotFound) => Err(EndpointError::NotFound),
            Some(Behavior::Refused) | None => {
                Err(EndpointError::Transient("connection refused".to_string()))
            }
            Some(Behavior::ServerError) => Err(EndpointError::Other("status 500".to_string())),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Err(EndpointError::Other("unreachable".to_string()))
            }
            Some(other) => Ok(other),
        }
    }
}

#[async_trait]
impl BlobTransport for ScriptedTransport {
    async fn put_blob(
        &self,
        publisher: &str,
        _data: &[u8],
        _epochs: u32,
    ) -> Result<BlobResponse, EndpointError> {
        match self.run(publisher).await? {
            Behavior::Store(blob_id) => Ok(BlobResponse::AlreadyCertified(AlreadyCertified {
                blob_id: blob_id.to_string(),
                end_epoch: Some(6),
                extra: HashMap::new(),
            })),
            _ => Err(EndpointError::Other("publisher cannot serve".to_string())),
        }
    }

    async fn get_blob(&self, aggregator: &str, _blob_id: &str) -> Result<Vec<u8>, EndpointError> {
        match self.run(aggregator).await? {
            Behavior::Serve(data) => Ok(data),
            _ => Err(EndpointError::Other("aggregator cannot store".to_string())),
        }
    }
}

fn endpoints(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://{prefix}{i}.example")).collect()
}

fn resolver(transport: Arc<ScriptedTransport>, pool: EndpointPool) -> BlobResolver {
    BlobResolver::new(pool, transport, Duration::from_millis(500), 5)
}

#[tokio::test]
async fn test_primary_404_falls_through_to_second() {
    let aggregators = endpoints("agg", 6);
    let transport = Arc::new(
        ScriptedTransport::default()
            .with(&aggregators[0], Behavior::NotFound)
            .with(&aggregators[1], Behavior::Serve(b"ciphertext".to_vec())),
    );
    let resolver = resolver(transport.clone(), EndpointPool::new(vec![], aggregators.clone()));

    let data = resolver
        .get_encrypted_blob(&BlobId::new("blob"))
        .await
        .expect("second aggregator should serve the blob");

    assert_eq!(data, b"ciphertext");
    // Early exit: the rest of the pool is never touched.
    assert_eq!(transport.calls(), aggregators[..2].to_vec());
}

#[tokio::test]
async fn test_exhausted_download_reports_every_endpoint() {
    let aggregators = endpoints("agg", 4);
    let transport = Arc::new(
        ScriptedTransport::default()
            .with(&aggregators[0], Behavior::NotFound)
            .with(&aggregators[1], Behavior::Refused)
            .with(&aggregators[2], Behavior::ServerError)
            .with(&aggregators[3], Behavior::NotFound),
    );
    let resolver = resolver(transport.clone(), EndpointPool::new(vec![], aggregators));

    let err = resolver
        .get_encrypted_blob(&BlobId::new("missing"))
        .await
        .expect_err("no aggregator has the blob");

    assert!(err.to_string().contains("after trying 4 aggregators"));
    match &err {
        StorageError::BlobNotFound { tried, errors, .. } => {
            assert_eq!(*tried, 4);
            assert_eq!(errors.len(), 4);
            assert!(errors[1].reason.contains("connection refused"));
            assert!(errors[2].reason.contains("500"));
        }
        other => panic!("expected BlobNotFound, got {other:?}"),
    }
    assert_eq!(transport.calls().len(), 4);
}

#[tokio::test]
async fn test_misbehaving_endpoint_does_not_block_pool() {
    let aggregators = endpoints("agg", 3);
    let transport = Arc::new(
        ScriptedTransport::default()
            .with(&aggregators[0], Behavior::ServerError)
            .with(&aggregators[1], Behavior::ServerError)
            .with(&aggregators[2], Behavior::Serve(b"ok".to_vec())),
    );
    let resolver = resolver(transport, EndpointPool::new(vec![], aggregators));

    assert_eq!(
        resolver.download(&BlobId::new("blob")).await.unwrap(),
        b"ok"
    );
}

#[tokio::test(start_paused = true)]
async fn test_hanging_endpoint_times_out_and_moves_on() {
    let aggregators = endpoints("agg", 2);
    let transport = Arc::new(
        ScriptedTransport::default()
            .with(&aggregators[0], Behavior::Hang)
            .with(&aggregators[1], Behavior::Serve(b"late".to_vec())),
    );
    let resolver = resolver(transport.clone(), EndpointPool::new(vec![], aggregators));

    let data = resolver.download(&BlobId::new("blob")).await.unwrap();
    assert_eq!(data, b"late");
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn test_upload_uses_first_working_publisher() {
    let publishers = endpoints("pub", 5);
    let transport = Arc::new(
        ScriptedTransport::default()
            .with(&publishers[0], Behavior::Refused)
            .with(&publishers[1], Behavior::Store("blob-xyz")),
    );
    let resolver = resolver(transport.clone(), EndpointPool::new(publishers.clone(), vec![]));

    let blob_id = resolver.upload_blob(b"ciphertext".to_vec()).await.unwrap();
    assert_eq!(blob_id, BlobId::new("blob-xyz"));
    assert_eq!(transport.calls(), publishers[..2].to_vec());
}

#[tokio::test]
async fn test_exhausted_upload_is_a_connection_error() {
    let publishers = endpoints("pub", 3);
    let transport = Arc::new(ScriptedTransport::default());
    let resolver = resolver(transport, EndpointPool::new(publishers, vec![]));

    let err = resolver.upload_blob(b"data".to_vec()).await.unwrap_err();
    assert!(matches!(err, StorageError::StorageConnection { tried: 3, .. }));
    assert_eq!(err.failures().len(), 3);
}

#[tokio::test]
async fn test_empty_side_of_pool_exhausts_immediately() {
    let transport = Arc::new(ScriptedTransport::default());

    let downloads = resolver(
        Arc::clone(&transport),
        EndpointPool::new(endpoints("pub", 1), vec![]),
    );
    assert!(matches!(
        downloads.download(&BlobId::new("blob")).await,
        Err(StorageError::BlobNotFound { tried: 0, .. })
    ));
    assert_eq!(downloads.blob_url(&BlobId::new("blob")), None);

    let uploads = resolver(
        Arc::clone(&transport),
        EndpointPool::new(vec![], endpoints("agg", 1)),
    );
    assert!(matches!(
        uploads.upload(b"data").await,
        Err(StorageError::StorageConnection { tried: 0, .. })
    ));
    assert!(transport.calls().is_empty());
}

#[test]
fn test_half_configured_pool_fails_at_startup() {
    let config = PoolConfig::from_toml_str(r#"publishers = ["https://p.example"]"#).unwrap();
    assert!(matches!(
        BlobResolver::from_config(&config),
        Err(PoolConfigError::Empty("aggregator"))
    ));
}

#[test]
fn test_blob_url_points_at_first_aggregator() {
    let transport = Arc::new(ScriptedTransport::default());
    let resolver = resolver(transport, EndpointPool::new(vec![], endpoints("agg", 2)));
    assert_eq!(
        resolver.blob_url(&BlobId::new("abc")).as_deref(),
        Some("https://agg0.example/v1/blobs/abc")
    );
}
