use async_trait::async_trait;
use did_doc::schema::did_doc::DidDocument;
use did_resolver::{error::DidResolverError, traits::DidResolvable};

use crate::{
    error::DidPeerError,
    peer_did::{
        num_algo_from_peer_did,
        numalgos::{numalgo0, numalgo2, numalgo4},
        PeerDidNumAlgo,
    },
};

/// Resolves the peer DIDs that carry their document in the DID itself.
/// Numalgo 1 and numalgo 4 short form DIDs need the document out of band.
#[derive(Debug, Default, Clone, Copy)]
pub struct PeerDidResolver;

impl PeerDidResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve_peer_did(&self, did: &str) -> Result<DidDocument, DidResolverError> {
        let into_resolver_error = |err: DidPeerError| DidResolverError::ResolutionFailed {
            did: did.to_owned(),
            reason: err.to_string(),
        };
        let numalgo = num_algo_from_peer_did(did).map_err(into_resolver_error)?;
        debug!("Resolving {did} using numalgo {numalgo}");
        match numalgo {
            PeerDidNumAlgo::InceptionKeyWithoutDoc => {
                numalgo0::resolve(did).map_err(into_resolver_error)
            }
            PeerDidNumAlgo::MultipleInceptionKeyWithoutDoc => {
                numalgo2::resolve(did).map_err(into_resolver_error)
            }
            PeerDidNumAlgo::ShortFormAndLongForm if numalgo4::is_long_form(did) => {
                numalgo4::resolve(did).map_err(into_resolver_error)
            }
            PeerDidNumAlgo::GenesisDoc | PeerDidNumAlgo::ShortFormAndLongForm => {
                Err(DidResolverError::RequiresAttachedDocument {
                    did: did.to_owned(),
                })
            }
        }
    }
}

#[async_trait]
impl DidResolvable for PeerDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolverError> {
        self.resolve_peer_did(did)
    }
}
