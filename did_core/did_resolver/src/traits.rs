use async_trait::async_trait;
use did_doc::schema::did_doc::DidDocument;

use crate::error::DidResolverError;

#[async_trait]
pub trait DidResolvable: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolverError>;
}
