use once_cell::sync::Lazy;
use regex::Regex;

const GROUP_NUMALGO_0_AND_1: &str = r"([01](z)([1-9a-km-zA-HJ-NP-Z]{5,200}))";
const GROUP_NUMALGO_2: &str =
    r"(2((\.[AEVID](z)([1-9a-km-zA-HJ-NP-Z]{5,200}))*(\.(S)[0-9a-zA-Z=_\-]*)*))";
const GROUP_NUMALGO_4: &str = r"(4(z[1-9a-km-zA-HJ-NP-Z]{46})(:z[1-9a-km-zA-HJ-NP-Z]{6,}){0,1})";

static PEER_DID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^did:peer:({GROUP_NUMALGO_0_AND_1}|{GROUP_NUMALGO_2}|{GROUP_NUMALGO_4})$"
    ))
    .expect("peer DID regex is valid")
});

pub fn is_valid_peer_did(did: &str) -> bool {
    PEER_DID_REGEX.is_match(did)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_shapes() {
        assert!(is_valid_peer_did(
            "did:peer:0z6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th"
        ));
        assert!(is_valid_peer_did(
            "did:peer:2.Vz6MkmjY8GnV5i9YTDtPETC2uUAW6ejw3nk5mXF5yci5ab7th.SeyJ0IjoiZG0ifQ"
        ));
    }

    #[test]
    fn rejects_others() {
        assert!(!is_valid_peer_did("did:peer:9abc"));
        assert!(!is_valid_peer_did("did:key:z6Mk"));
    }
}
