//! Fingerprint derivation (`spec.md` §4.1 Keying).

/// `canonical(list)` — JSON-encodes the list preserving insertion order.
fn canonical(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}

/// `"sf4ai:" + url + "-" + canonical(targetSelectors) + "-" + canonical(removeSelectors)`
pub fn fingerprint(url: &str, target_selectors: &[String], remove_selectors: &[String]) -> String {
    format!(
        "sf4ai:{}-{}-{}",
        url,
        canonical(target_selectors),
        canonical(remove_selectors)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_and_order_preserving() {
        let a = fingerprint("https://x.test", &["main".into(), ".body".into()], &[]);
        let b = fingerprint("https://x.test", &["main".into(), ".body".into()], &[]);
        let c = fingerprint("https://x.test", &[".body".into(), "main".into()], &[]);
        assert_eq!(a, b);
        assert_ne!(a, c, "selector order is part of the fingerprint");
    }

    #[test]
    fn fingerprint_distinguishes_urls() {
        let a = fingerprint("https://x.test", &[], &[]);
        let b = fingerprint("https://y.test", &[], &[]);
        assert_ne!(a, b);
    }

    proptest::proptest! {
        /// Same inputs, same fingerprint, for any url/selector combination —
        /// the cache's "interchangeability" property from `spec.md` §8
        /// depends on this holding for arbitrary input shapes, not just the
        /// handful of fixtures above.
        #[test]
        fn fingerprint_is_a_pure_function_of_its_inputs(
            url in "[a-z]{1,10}://[a-z]{1,10}\\.test(/[a-z]{0,10})?",
            targets in proptest::collection::vec("[a-z.#]{0,8}", 0..4),
            removes in proptest::collection::vec("[a-z.#]{0,8}", 0..4),
        ) {
            let a = fingerprint(&url, &targets, &removes);
            let b = fingerprint(&url, &targets, &removes);
            proptest::prop_assert_eq!(a, b);
        }
    }
}
