//! A minimal, built-in notion of where the public DNS hierarchy stops
//! being "one registry's zone" and starts being "whatever the
//! registrant wants".
//!
//! `Recur::query_zone` only caches a referral's `ZoneServers` when
//! `is_registrar` says the referral lands on a registrar-controlled
//! boundary: the root, a bare top-level domain, a known public
//! suffix, or the registrable name directly beneath one of those. A
//! referral further down than that is some customer's own internal
//! delegation, which is cheap to re-discover and not worth caching
//! under a single shared key.

use dns_types::protocol::types::DomainName;

/// Generic TLDs, a handful of two-letter country-code TLDs, and a
/// few well-known second-level public suffixes. Real-world public
/// suffix lists run into the thousands of entries; this is
/// deliberately just enough to exercise the registrar-gating logic.
const GENERIC_TLDS: &[&str] = &["com", "net", "org", "info", "biz", "io", "dev", "app"];

const COUNTRY_CODE_TLDS: &[&str] = &[
    "uk", "de", "fr", "jp", "cn", "au", "ca", "us", "nl", "br", "in", "it",
];

const SECOND_LEVEL_SUFFIXES: &[&str] = &["co.uk", "org.uk", "com.au", "co.jp"];

fn is_public_suffix(name: &DomainName) -> bool {
    if name.is_root() {
        return true;
    }

    let dotted = name.to_dotted_string();
    let trimmed = dotted.trim_end_matches('.');

    GENERIC_TLDS.contains(&trimmed)
        || COUNTRY_CODE_TLDS.contains(&trimmed)
        || SECOND_LEVEL_SUFFIXES.contains(&trimmed)
}

/// True if `name` is a zone a registrar (or registry) is directly
/// responsible for: the root, a recognised public suffix, or exactly
/// one label below one.
pub fn is_registrar(name: &DomainName) -> bool {
    if is_public_suffix(name) {
        return true;
    }

    match name.parent() {
        Some(parent) => is_public_suffix(&parent),
        None => false,
    }
}

/// Splits `name` into the domain a registrant actually controls and
/// the public-suffix zone it was registered under: for
/// `www.example.com.` that's `(example.com., com.)`. If `name` is
/// itself a public suffix, both halves are `name`.
pub fn registrar_parts(name: &DomainName) -> (DomainName, DomainName) {
    let mut child = name.clone();
    let mut current = name.clone();

    loop {
        if is_public_suffix(&current) {
            let registered = if current.labels == name.labels {
                name.clone()
            } else {
                child
            };
            return (registered, current);
        }
        match current.parent() {
            Some(parent) => {
                child = current;
                current = parent;
            }
            None => return (name.clone(), current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_types::protocol::types::test_util::domain;

    #[test]
    fn root_and_tlds_are_registrar_boundaries() {
        assert!(is_registrar(&domain(".")));
        assert!(is_registrar(&domain("com.")));
        assert!(is_registrar(&domain("uk.")));
    }

    #[test]
    fn second_level_suffix_is_a_registrar_boundary() {
        assert!(is_registrar(&domain("co.uk.")));
    }

    #[test]
    fn registrable_domain_under_a_tld_is_a_registrar_boundary() {
        assert!(is_registrar(&domain("example.com.")));
        assert!(is_registrar(&domain("example.co.uk.")));
    }

    #[test]
    fn deeper_delegations_are_not_registrar_boundaries() {
        assert!(!is_registrar(&domain("ns.example.com.")));
        assert!(!is_registrar(&domain("internal.example.co.uk.")));
    }

    #[test]
    fn registrar_parts_splits_a_deep_name() {
        let (registered, registrar) = registrar_parts(&domain("www.example.com."));
        assert_eq!(registered, domain("example.com."));
        assert_eq!(registrar, domain("com."));
    }

    #[test]
    fn registrar_parts_of_a_public_suffix_is_itself_both_ways() {
        let (registered, registrar) = registrar_parts(&domain("com."));
        assert_eq!(registered, domain("com."));
        assert_eq!(registrar, domain("com."));
    }

    #[test]
    fn registrar_parts_handles_a_second_level_suffix() {
        let (registered, registrar) = registrar_parts(&domain("www.example.co.uk."));
        assert_eq!(registered, domain("example.co.uk."));
        assert_eq!(registrar, domain("co.uk."));
    }
}
