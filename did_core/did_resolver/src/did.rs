//! Minimal DID syntax helpers, enough to route a DID to its method resolver.

/// Splits `did:<method>:<method-specific-id>` (ignoring any path, query or
/// fragment) into its method and method specific id.
pub fn parse_did(did: &str) -> Option<(&str, &str)> {
    let rest = did.strip_prefix("did:")?;
    let (method, id) = rest.split_once(':')?;
    let id = id.split(['#', '?', '/']).next().unwrap_or(id);
    let valid_method = !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !valid_method || id.is_empty() {
        return None;
    }
    Some((method, id))
}

pub fn is_did(value: &str) -> bool {
    parse_did(value).is_some()
}

pub fn is_did_of_method(value: &str, method: &str) -> bool {
    matches!(parse_did(value), Some((m, _)) if m == method)
}

/// DID without its fragment, query or path.
pub fn strip_did_url(did_url: &str) -> &str {
    did_url.split(['#', '?']).next().unwrap_or(did_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_and_id() {
        assert_eq!(
            parse_did("did:peer:2.Ez6LS#key-1"),
            Some(("peer", "2.Ez6LS"))
        );
        assert_eq!(parse_did("did:sov:123"), Some(("sov", "123")));
    }

    #[test]
    fn rejects_non_dids() {
        assert!(!is_did("8f1c7a2e-invitation-id"));
        assert!(!is_did("did:Peer:1"));
        assert!(!is_did("did:peer:"));
        assert!(is_did_of_method("did:key:z6Mk", "key"));
    }

    #[test]
    fn strips_fragment() {
        assert_eq!(strip_did_url("did:key:z6Mk#z6Mk"), "did:key:z6Mk");
    }
}
