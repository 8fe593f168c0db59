use std::sync::Arc;

use aries_vcx_wallet::wallet::base_wallet::{record_tags::RecordTags, BaseWallet};
use messages::{decorators::service::Service, AriesMessage};
use public_key::{Key, KeyType};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    storage::{Repository, StorageRecord},
    transport::OutboundMessage,
};

/// Where the messages of one exchange without a connection go, and the key
/// we told the peer to answer to. Shares its id with the exchange record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionlessRoute {
    id: String,
    their_service: Option<Service>,
    our_key: Option<Key>,
}

impl ConnectionlessRoute {
    fn new(record_id: &str) -> Self {
        Self {
            id: record_id.to_owned(),
            their_service: None,
            our_key: None,
        }
    }

    pub fn their_service(&self) -> Option<&Service> {
        self.their_service.as_ref()
    }

    pub fn our_key(&self) -> Option<&Key> {
        self.our_key.as_ref()
    }
}

impl StorageRecord for ConnectionlessRoute {
    const CATEGORY: &'static str = "connectionless_route";

    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> RecordTags {
        RecordTags::default()
    }
}

/// Answers exchanges that run without a connection through the `~service`
/// decorators of their messages.
#[derive(Clone, Debug)]
pub struct ConnectionlessService {
    wallet: Arc<dyn BaseWallet>,
    repository: Repository<ConnectionlessRoute>,
    endpoint: Url,
}

impl ConnectionlessService {
    pub fn new(wallet: Arc<dyn BaseWallet>, endpoint: Url) -> Self {
        Self {
            repository: Repository::new(wallet.clone()),
            wallet,
            endpoint,
        }
    }

    pub async fn find_route(&self, record_id: &str) -> VcxResult<Option<ConnectionlessRoute>> {
        self.repository.find_by_id(record_id).await
    }

    async fn store(&self, route: &ConnectionlessRoute, stored: bool) -> VcxResult<()> {
        if stored {
            self.repository.update(route).await
        } else {
            self.repository.save(route).await
        }
    }

    /// Keeps the `~service` of an inbound message as the reply target of
    /// `record_id`. Messages without one leave the route as it is.
    pub async fn remember_their_service(
        &self,
        record_id: &str,
        message: &AriesMessage,
    ) -> VcxResult<()> {
        let Some(service) = message.service() else {
            return Ok(());
        };
        let existing = self.find_route(record_id).await?;
        let stored = existing.is_some();
        let mut route = existing.unwrap_or_else(|| ConnectionlessRoute::new(record_id));
        if route.their_service.as_ref() == Some(service) {
            return Ok(());
        }
        debug!(
            "ConnectionlessService::remember_their_service >> record {record_id} answers to {}",
            service.service_endpoint
        );
        route.their_service = Some(service.clone());
        self.store(&route, stored).await
    }

    pub async fn has_route(&self, record_id: &str) -> VcxResult<bool> {
        Ok(self
            .find_route(record_id)
            .await?
            .is_some_and(|route| route.their_service.is_some()))
    }

    /// Fails unless the peer of `record_id` told us where to answer.
    pub async fn assert_route(&self, record_id: &str) -> VcxResult<()> {
        if self.has_route(record_id).await? {
            Ok(())
        } else {
            Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::NotReady,
                format!("Record {record_id} has neither a connection nor a ~service to answer on"),
            ))
        }
    }

    /// Puts our `~service` on `message`, minting the key behind it on the
    /// first message of the exchange. Returns that key.
    pub async fn attach_our_service(
        &self,
        record_id: &str,
        message: &mut AriesMessage,
    ) -> VcxResult<Key> {
        let existing = self.find_route(record_id).await?;
        let stored = existing.is_some();
        let mut route = existing.unwrap_or_else(|| ConnectionlessRoute::new(record_id));
        let key = match &route.our_key {
            Some(key) => key.clone(),
            None => {
                let key = self.wallet.create_key(None).await?;
                route.our_key = Some(key.clone());
                self.store(&route, stored).await?;
                key
            }
        };
        let service = Service::builder()
            .recipient_keys(vec![key.base58()])
            .service_endpoint(self.endpoint.clone())
            .build();
        if !message.set_service(service) {
            trace!(
                "ConnectionlessService::attach_our_service >> {} carries no ~service",
                message.msg_type()
            );
        }
        Ok(key)
    }

    /// Addresses `message` to the `~service` the peer of `record_id` gave
    /// us, advertising ours so the peer can answer in turn.
    pub async fn outbound_message(
        &self,
        record_id: &str,
        message: impl Into<AriesMessage>,
    ) -> VcxResult<OutboundMessage> {
        self.assert_route(record_id).await?;
        let mut message = message.into();
        let sender_key = self.attach_our_service(record_id, &mut message).await?;
        let route = self.repository.get_by_id(record_id).await?;
        let service = route.their_service.ok_or_else(|| {
            AriesVcxError::from_msg(
                AriesVcxErrorKind::NotReady,
                format!("Record {record_id} has no ~service to answer on"),
            )
        })?;
        Ok(OutboundMessage {
            message,
            connection_id: None,
            endpoint: service.service_endpoint.clone(),
            recipient_keys: base58_keys(&service.recipient_keys)?,
            routing_keys: base58_keys(&service.routing_keys)?,
            sender_key: Some(sender_key),
        })
    }
}

fn base58_keys(keys: &[String]) -> VcxResult<Vec<Key>> {
    keys.iter()
        .map(|key| Ok(Key::from_base58(key, KeyType::Ed25519)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use messages::msg_fields::protocols::cred_issuance::v2::{
        offer_credential::{OfferCredentialV2, OfferCredentialV2Content},
        CredentialPreviewV2,
    };
    use test_utils::{
        constants::{ALICE_ENDPOINT, BOB_ENDPOINT},
        devsetup::dev_build_in_memory_wallet,
    };

    use super::*;
    use crate::protocols::common::build_problem_report_msg;

    fn service(endpoint: &str) -> ConnectionlessService {
        ConnectionlessService::new(dev_build_in_memory_wallet(), Url::parse(endpoint).unwrap())
    }

    fn offer() -> AriesMessage {
        let content = OfferCredentialV2Content::builder()
            .credential_preview(CredentialPreviewV2::new(Vec::new()))
            .formats(Vec::new())
            .offers_attach(Vec::new())
            .build();
        OfferCredentialV2::with_decorators("offer-1".to_owned(), content, Default::default())
            .into()
    }

    #[tokio::test]
    async fn test_reply_goes_to_remembered_service() {
        let issuer = service(BOB_ENDPOINT);
        let holder = service(ALICE_ENDPOINT);

        let mut offer = offer();
        let issuer_key = issuer
            .attach_our_service("issuer-record", &mut offer)
            .await
            .unwrap();
        assert_eq!(
            offer.service().map(|s| s.recipient_keys.clone()),
            Some(vec![issuer_key.base58()])
        );

        holder
            .remember_their_service("holder-record", &offer)
            .await
            .unwrap();
        let outbound = holder
            .outbound_message("holder-record", offer.clone())
            .await
            .unwrap();
        assert_eq!(outbound.endpoint, Url::parse(BOB_ENDPOINT).unwrap());
        assert_eq!(outbound.recipient_keys, vec![issuer_key]);
        assert_eq!(outbound.connection_id, None);

        let holder_key = outbound.sender_key.clone().unwrap();
        let advertised = outbound.message.service().unwrap();
        assert_eq!(advertised.recipient_keys, vec![holder_key.base58()]);
        assert_eq!(advertised.service_endpoint, Url::parse(ALICE_ENDPOINT).unwrap());

        let again = holder.outbound_message("holder-record", offer).await.unwrap();
        assert_eq!(again.sender_key, Some(holder_key), "the key is minted once");
    }

    #[tokio::test]
    async fn test_missing_service_leaves_no_route() {
        let holder = service(ALICE_ENDPOINT);
        holder
            .remember_their_service("holder-record", &offer())
            .await
            .unwrap();

        assert!(!holder.has_route("holder-record").await.unwrap());
        let err = holder
            .outbound_message("holder-record", build_problem_report_msg(None, "offer-1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::NotReady);
        assert!(holder.find_route("holder-record").await.unwrap().is_none());
    }
}
