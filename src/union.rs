//! Union of named sample-identifier sets.

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Union of the sample sets, optionally restricted by a selection mask.
///
/// With `mask`, only keys mapped to `true` contribute; keys absent from the mask are
/// left out.
pub fn sample_union<K, I, S>(
    sets: impl IntoIterator<Item = (K, I)>,
    mask: Option<&HashMap<K, bool>>,
) -> BTreeSet<String>
where
    K: Eq + Hash,
    I: IntoIterator<Item = S>,
    S: Borrow<str>,
{
    let mut union = BTreeSet::new();
    for (key, samples) in sets {
        let selected = mask.is_none_or(|m| m.get(&key).copied().unwrap_or(false));
        if selected {
            union.extend(samples.into_iter().map(|s| s.borrow().to_string()));
        }
    }
    union
}

/// [`sample_union`] for unkeyed collections: positions act as keys.
pub fn sample_union_positional<I, S>(
    sets: impl IntoIterator<Item = I>,
    mask: Option<&HashMap<usize, bool>>,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Borrow<str>,
{
    sample_union(sets.into_iter().enumerate(), mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_every_set_without_mask() {
        let sets = vec![("a", vec!["s1", "s2"]), ("b", vec!["s2", "s3"])];
        let union = sample_union(sets, None);
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn mask_selects_keys() {
        let sets = vec![("a", vec!["s1"]), ("b", vec!["s2"]), ("c", vec!["s3"])];
        let mask = HashMap::from([("a", true), ("b", false)]);
        let union = sample_union(sets, Some(&mask));
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec!["s1"]);
    }

    #[test]
    fn positions_are_keys_for_unkeyed_input() {
        let sets = vec![vec!["x".to_string()], vec!["y".to_string()]];
        let mask = HashMap::from([(1, true)]);
        let union = sample_union_positional(sets, Some(&mask));
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec!["y"]);
    }
}
