//! Proptest generators for property-based testing.

use proptest::prelude::*;

use conduit_core::{Catchpoint, Round};

/// Generate a round in a range small enough for collisions to happen.
pub fn round() -> impl Strategy<Value = Round> {
    0u64..10_000
}

/// Generate (catchpoint round, node round, target round).
pub fn round_triple() -> impl Strategy<Value = (Round, Round, Round)> {
    (round(), round(), round())
}

/// Generate a label hash in the catalog's base32 alphabet.
pub fn hash() -> impl Strategy<Value = String> {
    "[A-Z2-7]{52}".prop_map(String::from)
}

/// Generate a valid catchpoint.
pub fn catchpoint() -> impl Strategy<Value = Catchpoint> {
    (round(), hash()).prop_map(|(round, hash)| Catchpoint::new(round, hash))
}

/// Generate catalog text with up to `max_len` strictly ascending rounds,
/// along with the rounds themselves.
pub fn catalog(max_len: usize) -> impl Strategy<Value = (String, Vec<Round>)> {
    prop::collection::btree_set(round(), 0..=max_len).prop_flat_map(|rounds| {
        let rounds: Vec<Round> = rounds.into_iter().collect();
        prop::collection::vec(hash(), rounds.len()).prop_map(move |hashes| {
            let text: String = rounds
                .iter()
                .zip(&hashes)
                .map(|(round, hash)| format!("{round}#{hash}\n"))
                .collect();
            (text, rounds.clone())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_catchpoint_label_parses_back(cp in catchpoint()) {
            let parsed = Catchpoint::parse(&cp.label()).unwrap();
            prop_assert_eq!(parsed, cp);
        }

        #[test]
        fn test_catalog_is_ascending((text, rounds) in catalog(16)) {
            prop_assert_eq!(text.lines().count(), rounds.len());
            prop_assert!(rounds.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
