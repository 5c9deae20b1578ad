//! Property-based tests for repository definition fingerprints.
//!
//! These tests use proptest to generate random definitions and verify that
//! the fingerprint invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::fingerprint::fingerprint;
    use crate::repo::RepoDefinition;
    use proptest::prelude::*;

    fn arb_attrs() -> impl Strategy<Value = Vec<(String, String)>> {
        // Map first so attribute keys are unique per case
        prop::collection::btree_map("[a-z_]{1,12}", "[ -~]{0,24}", 0..6)
            .prop_map(|attrs| attrs.into_iter().collect())
    }

    fn definition(rule: &str, attrs: &[(String, String)]) -> RepoDefinition {
        let mut definition = RepoDefinition::new(rule);
        for (key, value) in attrs {
            definition = definition.with_attr(key, value);
        }
        definition
    }

    proptest! {
        /// Property: fingerprints are deterministic (same definition = same digest)
        #[test]
        fn fingerprint_is_deterministic(rule in "[a-z]{1,8}", attrs in arb_attrs()) {
            let a = fingerprint(&definition(&rule, &attrs));
            let b = fingerprint(&definition(&rule, &attrs));
            prop_assert_eq!(a, b);
        }

        /// Property: attribute insertion order does not affect the digest
        #[test]
        fn fingerprint_ignores_attr_order(rule in "[a-z]{1,8}", attrs in arb_attrs()) {
            let forward = fingerprint(&definition(&rule, &attrs));
            let mut reversed_attrs = attrs.clone();
            reversed_attrs.reverse();
            let reversed = fingerprint(&definition(&rule, &reversed_attrs));
            prop_assert_eq!(forward, reversed);
        }

        /// Property: changing the rule changes the digest
        #[test]
        fn fingerprint_covers_rule(rule in "[a-z]{1,8}", attrs in arb_attrs()) {
            let original = fingerprint(&definition(&rule, &attrs));
            let renamed = fingerprint(&definition(&format!("{}x", rule), &attrs));
            prop_assert_ne!(original, renamed);
        }

        /// Property: the digest is always 64 lowercase hex characters
        #[test]
        fn fingerprint_is_hex(rule in "[a-z]{1,8}", attrs in arb_attrs()) {
            let digest = fingerprint(&definition(&rule, &attrs));
            prop_assert_eq!(digest.as_str().len(), 64);
            prop_assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()
                && !c.is_ascii_uppercase()));
        }
    }
}
