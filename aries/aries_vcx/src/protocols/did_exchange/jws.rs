//! Detached JWS over attachment content, as used by did-exchange to bind a
//! DID document or a rotated DID to the keys that vouch for it.

use aries_vcx_wallet::wallet::base_wallet::BaseWallet;
use did_doc::schema::did_doc::DidDocument;
use messages::{
    decorators::attachment::{
        Attachment, AttachmentData, AttachmentJws, AttachmentType, JwsHeader, JwsSignature,
    },
    misc::MimeType,
};
use public_key::{Key, OkpJwk};
use serde::Deserialize;
use serde_json::json;

use crate::{
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    protocols::common::new_message_id,
    utils::base64::{decode_url_safe, encode_url_safe},
};

#[derive(Debug, Deserialize)]
struct ProtectedHeader {
    alg: String,
    #[serde(default)]
    jwk: Option<OkpJwk>,
}

/// Outcome of checking every signature of an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct JwsVerification {
    pub is_valid: bool,
    pub signer_keys: Vec<Key>,
}

pub fn did_doc_attachment(did_document: &DidDocument) -> VcxResult<Attachment> {
    let encoded = encode_url_safe(serde_json::to_vec(did_document)?);
    Ok(Attachment::base64(new_message_id(), MimeType::DidJson, encoded))
}

pub fn did_rotate_attachment(did: &str) -> Attachment {
    Attachment::base64(
        new_message_id(),
        MimeType::Plain,
        encode_url_safe(did),
    )
}

/// Raw attachment content, decoded from base64 or taken from inline JSON.
pub fn attachment_content(attachment: &Attachment) -> VcxResult<Vec<u8>> {
    match &attachment.data.content {
        AttachmentType::Base64(encoded) => decode_url_safe(encoded),
        AttachmentType::Json(value) => Ok(serde_json::to_vec(value)?),
        AttachmentType::Links(_) => Err(AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            "Linked attachments are not supported",
        )),
    }
}

/// Signs the base64 content of `attachment` once per key.
pub async fn sign_attachment(
    wallet: &dyn BaseWallet,
    mut attachment: Attachment,
    keys: &[Key],
) -> VcxResult<Attachment> {
    let AttachmentType::Base64(attach_base64) = &attachment.data.content else {
        return Err(AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidState,
            "Cannot sign non-base64-encoded attachment",
        ));
    };

    let mut signatures = Vec::with_capacity(keys.len());
    for key in keys {
        let did_key = key.to_did_key();
        let protected_header = json!({
            "alg": "EdDSA",
            "jwk": {
                "kty": "OKP",
                "kid": did_key,
                "crv": "Ed25519",
                "x": encode_url_safe(key.key()),
            }
        });
        let b64_protected = encode_url_safe(protected_header.to_string());
        let sign_input = format!("{b64_protected}.{attach_base64}").into_bytes();
        let signed = wallet.sign(key, &sign_input).await?;
        signatures.push(JwsSignature {
            header: JwsHeader { kid: did_key },
            protected: b64_protected,
            signature: encode_url_safe(signed),
        });
    }

    let content = attachment.data.content.clone();
    attachment.data = AttachmentData {
        jws: AttachmentJws::from_signatures(signatures),
        ..AttachmentData::new(content)
    };
    Ok(attachment)
}

/// Checks every signature over the attachment's base64 content. Says nothing
/// about whether the signers are the right ones; callers compare
/// `signer_keys` against the keys they trust.
pub async fn verify_attachment(
    wallet: &dyn BaseWallet,
    attachment: &Attachment,
) -> VcxResult<JwsVerification> {
    let AttachmentType::Base64(attach_base64) = &attachment.data.content else {
        return Err(AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            "Signed attachment must be base64 encoded",
        ));
    };
    let Some(jws) = &attachment.data.jws else {
        return Ok(JwsVerification {
            is_valid: false,
            signer_keys: Vec::new(),
        });
    };

    let mut is_valid = true;
    let mut signer_keys = Vec::new();
    for signature in jws.signatures() {
        let key = signer_key(signature)?;
        let sign_input = format!("{}.{}", signature.protected, attach_base64).into_bytes();
        let raw_signature = decode_url_safe(&signature.signature)?;
        if !wallet.verify(&key, &sign_input, &raw_signature).await? {
            warn!("verify_attachment >> invalid signature by {}", signature.header.kid);
            is_valid = false;
        }
        signer_keys.push(key);
    }
    Ok(JwsVerification {
        is_valid: is_valid && !signer_keys.is_empty(),
        signer_keys,
    })
}

/// The signing key, named by the `did:key` kid. A JWK in the protected
/// header must name the same key.
fn signer_key(signature: &JwsSignature) -> VcxResult<Key> {
    let kid = &signature.header.kid;
    if !kid.starts_with("did:key:") {
        return Err(AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            format!("JWS kid {kid} is not a did:key"),
        ));
    }
    let key = Key::from_did_key(kid)?;
    let protected: ProtectedHeader =
        serde_json::from_slice(&decode_url_safe(&signature.protected)?)?;
    if protected.alg != "EdDSA" {
        return Err(AriesVcxError::from_msg(
            AriesVcxErrorKind::InvalidInput,
            format!("Unsupported JWS algorithm {}", protected.alg),
        ));
    }
    if let Some(jwk) = protected.jwk {
        if Key::from_okp_jwk(&jwk)? != key {
            return Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidInput,
                format!("JWS protected header key does not match kid {kid}"),
            ));
        }
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use aries_vcx_wallet::wallet::base_wallet::DidWallet;
    use test_utils::devsetup::dev_build_in_memory_wallet;

    use super::*;

    #[tokio::test]
    async fn test_signed_attachment_reports_signers() {
        let wallet = dev_build_in_memory_wallet();
        let first = wallet.create_key(None).await.unwrap();
        let second = wallet.create_key(None).await.unwrap();

        let attachment = sign_attachment(
            wallet.as_ref(),
            did_rotate_attachment("did:example:123"),
            &[first.clone(), second.clone()],
        )
        .await
        .unwrap();
        assert!(matches!(
            attachment.data.jws,
            Some(AttachmentJws::General { .. })
        ));

        let verification = verify_attachment(wallet.as_ref(), &attachment)
            .await
            .unwrap();
        assert!(verification.is_valid);
        assert_eq!(verification.signer_keys, vec![first, second]);
        assert_eq!(
            attachment_content(&attachment).unwrap(),
            b"did:example:123".to_vec()
        );
    }

    #[tokio::test]
    async fn test_tampered_content_fails_verification() {
        let wallet = dev_build_in_memory_wallet();
        let key = wallet.create_key(None).await.unwrap();
        let mut attachment = sign_attachment(
            wallet.as_ref(),
            did_rotate_attachment("did:example:123"),
            &[key],
        )
        .await
        .unwrap();
        attachment.data.content = AttachmentType::Base64(encode_url_safe("did:example:456"));

        let verification = verify_attachment(wallet.as_ref(), &attachment)
            .await
            .unwrap();
        assert!(!verification.is_valid);
    }

    #[tokio::test]
    async fn test_unsigned_attachment_is_not_valid() {
        let wallet = dev_build_in_memory_wallet();
        let verification = verify_attachment(wallet.as_ref(), &did_rotate_attachment("did:x:y"))
            .await
            .unwrap();
        assert!(!verification.is_valid);
        assert!(verification.signer_keys.is_empty());
    }
}
