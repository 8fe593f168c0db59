use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use did_doc::schema::did_doc::DidDocument;

use crate::{did::parse_did, error::DidResolverError, traits::DidResolvable};

/// Routes a DID to the resolver registered for its method.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn DidResolvable>>,
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("methods", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_resolver<T>(mut self, method: impl Into<String>, resolver: T) -> Self
    where
        T: DidResolvable + 'static,
    {
        self.resolvers.insert(method.into(), Arc::new(resolver));
        self
    }

    pub fn unregister_resolver(mut self, method: &str) -> Self {
        self.resolvers.remove(method);
        self
    }

    pub fn supports(&self, method: &str) -> bool {
        self.resolvers.contains_key(method)
    }
}

#[async_trait]
impl DidResolvable for ResolverRegistry {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolverError> {
        let (method, _) =
            parse_did(did).ok_or_else(|| DidResolverError::InvalidDid(did.to_owned()))?;
        let resolver = self
            .resolvers
            .get(method)
            .ok_or_else(|| DidResolverError::UnsupportedMethod(method.to_owned()))?;
        debug!("Resolving {did} using did:{method} resolver");
        resolver.resolve(did).await
    }
}

#[cfg(test)]
mod tests {
    use mockall::{mock, predicate::eq};

    use super::*;

    mock! {
        Resolver {}

        #[async_trait]
        impl DidResolvable for Resolver {
            async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolverError>;
        }
    }

    #[tokio::test]
    async fn routes_to_method_resolver() {
        let did = "did:example:1234";
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .with(eq(did))
            .times(1)
            .returning(|did| Ok(DidDocument::builder(did.to_owned()).build()));

        let registry = ResolverRegistry::new().register_resolver("example", resolver);
        let doc = registry.resolve(did).await.unwrap();
        assert_eq!(doc.id(), did);
    }

    #[tokio::test]
    async fn unknown_method_fails() {
        let registry = ResolverRegistry::new();
        let err = registry.resolve("did:unknown:1").await.unwrap_err();
        assert!(matches!(err, DidResolverError::UnsupportedMethod(m) if m == "unknown"));

        let err = registry.resolve("not-a-did").await.unwrap_err();
        assert!(matches!(err, DidResolverError::InvalidDid(_)));
    }
}
