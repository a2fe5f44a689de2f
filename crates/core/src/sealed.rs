//! Encrypt-then-store and fetch-then-decrypt for gated videos.

use std::sync::Arc;

use crate::error::ContentError;
use crate::traits::{BlobStore, SealCipher};
use crate::types::{BlobId, ObjectId, SealIdentity, Session};

pub struct SealedContent {
    store: Arc<dyn BlobStore>,
    cipher: Arc<dyn SealCipher>,
    seal_package_id: ObjectId,
    threshold: u8,
}

impl SealedContent {
    pub fn new(
        store: Arc<dyn BlobStore>,
        cipher: Arc<dyn SealCipher>,
        seal_package_id: ObjectId,
        threshold: u8,
    ) -> Self {
        Self {
            store,
            cipher,
            seal_package_id,
            threshold,
        }
    }

    /// Seal `plaintext` to `nft_id`'s identity and upload the ciphertext.
    pub async fn publish(&self, nft_id: &ObjectId, plaintext: &[u8]) -> Result<BlobId, ContentError> {
        let identity = SealIdentity::for_nft(self.seal_package_id, nft_id, self.threshold);
        let ciphertext = self.cipher.encrypt(&identity, plaintext).await?;
        let blob_id = self.store.upload_blob(ciphertext).await?;
        tracing::info!(%nft_id, %blob_id, bytes = plaintext.len(), "Sealed content published");
        Ok(blob_id)
    }

    /// Fetch the session's blob and decrypt it with the session's material.
    pub async fn open(&self, session: &Session) -> Result<Vec<u8>, ContentError> {
        let ciphertext = self.store.get_encrypted_blob(&session.blob_id).await?;
        Ok(self.cipher.decrypt(&session.decryption, &ciphertext).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    use crate::error::StorageError;
    use crate::mock::{MemoryBlobStore, XorCipher};
    use crate::types::{Address, SessionId};

    fn session_for(nft: Address, package: Address, blob_id: BlobId) -> Session {
        let user = Address::parse("0xa11ce").unwrap();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        Session {
            session_id: SessionId::derive(&user, &nft, at),
            user_address: user,
            nft_id: nft,
            blob_id,
            decryption: SealIdentity::for_nft(package, &nft, 2),
            created_at: at,
            expires_at: at + chrono::Duration::seconds(60),
        }
    }

    #[tokio::test]
    async fn publish_then_open_returns_plaintext() {
        let store = Arc::new(MemoryBlobStore::new());
        let package = Address::parse("0xabc").unwrap();
        let nft = Address::parse("0x100").unwrap();
        let content = SealedContent::new(store.clone(), Arc::new(XorCipher), package, 2);

        let blob_id = content.publish(&nft, b"highlight reel").await.unwrap();
        let stored = store.get_encrypted_blob(&blob_id).await.unwrap();
        assert_ne!(stored, b"highlight reel");

        let opened = content
            .open(&session_for(nft, package, blob_id))
            .await
            .unwrap();
        assert_eq!(opened, b"highlight reel");
    }

    #[tokio::test]
    async fn other_nft_identity_does_not_open() {
        let store = Arc::new(MemoryBlobStore::new());
        let package = Address::parse("0xabc").unwrap();
        let content = SealedContent::new(store, Arc::new(XorCipher), package, 2);

        let blob_id = content
            .publish(&Address::parse("0x100").unwrap(), b"highlight reel")
            .await
            .unwrap();
        let wrong = session_for(Address::parse("0x101").unwrap(), package, blob_id);
        assert_ne!(content.open(&wrong).await.unwrap(), b"highlight reel");
    }

    #[tokio::test]
    async fn missing_blob_is_a_storage_error() {
        let package = Address::parse("0xabc").unwrap();
        let content = SealedContent::new(
            Arc::new(MemoryBlobStore::new()),
            Arc::new(XorCipher),
            package,
            2,
        );
        let session = session_for(Address::parse("0x100").unwrap(), package, BlobId::new("gone"));
        assert!(matches!(
            content.open(&session).await,
            Err(ContentError::Storage(StorageError::BlobNotFound { .. }))
        ));
    }
}
