//! DID exchange 1.1: a requester answers an out-of-band invitation with a
//! request carrying its DID, the responder answers with its own DID signed
//! by the invitation keys, and the requester completes the thread.

pub mod jws;
pub mod service;

use did_peer::PeerDidNumAlgo;
use typed_builder::TypedBuilder;
use url::Url;

pub use self::service::DidExchangeService;

#[derive(Clone, Debug, TypedBuilder)]
pub struct DidExchangeConfig {
    pub label: String,
    pub endpoint: Url,
    /// Used for our DID when the peer's DID does not dictate one.
    #[builder(default = PeerDidNumAlgo::ShortFormAndLongForm)]
    pub peer_num_algo: PeerDidNumAlgo,
    #[builder(default)]
    pub auto_accept_connections: bool,
}

#[derive(Clone, Debug, Default, TypedBuilder)]
#[builder(field_defaults(default, setter(strip_option)))]
pub struct CreateRequestConfig {
    /// Overrides the agent label sent in the request.
    pub label: Option<String>,
    pub alias: Option<String>,
    /// A DID this agent created earlier, used instead of a fresh peer DID.
    pub our_did: Option<String>,
    pub goal_code: Option<String>,
    pub goal: Option<String>,
    pub auto_accept_connection: Option<bool>,
}
