use base64::{
    alphabet,
    engine::{
        general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
    },
    Engine,
};

use crate::errors::error::VcxResult;

/// Peers differ on whether they pad attachment and JWS segments, so decoding
/// accepts both.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Unpadded URL-safe encoding, the form JWS segments are signed over.
pub fn encode_url_safe(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub fn decode_url_safe(input: impl AsRef<[u8]>) -> VcxResult<Vec<u8>> {
    Ok(URL_SAFE_LENIENT.decode(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        let encoded = encode_url_safe("did:peer:4");
        assert!(!encoded.ends_with('='));
        assert_eq!(decode_url_safe(&encoded).unwrap(), b"did:peer:4");
        assert_eq!(decode_url_safe(format!("{encoded}==")).unwrap(), b"did:peer:4");
    }
}
