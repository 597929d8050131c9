//! Weighted reordering of candidate lists.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Errors raised by assessment helpers.
#[derive(Debug, thiserror::Error)]
pub enum AssessError {
    #[error("no weight for {0}")]
    MissingWeight(String),
}

fn compare<W: PartialOrd>(a: &W, b: &W, descending: bool) -> Ordering {
    let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

/// Stable-sorts `items` by their weight. Every item must have one.
pub fn reorder<K, W>(
    items: &mut [K],
    weights: &HashMap<K, W>,
    descending: bool,
) -> Result<(), AssessError>
where
    K: Eq + Hash + Debug,
    W: PartialOrd + Copy,
{
    if let Some(missing) = items.iter().find(|k| !weights.contains_key(*k)) {
        return Err(AssessError::MissingWeight(format!("{missing:?}")));
    }
    items.sort_by(|a, b| compare(&weights[a], &weights[b], descending));
    Ok(())
}

/// Like [`reorder`], but items without a weight sort as if they weighed
/// `W::default()`.
pub fn reorder_or_zero<K, W>(items: &mut [K], weights: &HashMap<K, W>, descending: bool)
where
    K: Eq + Hash,
    W: PartialOrd + Copy + Default,
{
    let weight = |k: &K| weights.get(k).copied().unwrap_or_default();
    items.sort_by(|a, b| compare(&weight(a), &weight(b), descending));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_reorder_rejects_missing_keys() {
        let weights: HashMap<&str, f32> = [("a", 1.0), ("b", 3.0)].into_iter().collect();
        let mut items = vec!["a", "b", "c"];
        let err = reorder(&mut items, &weights, true).unwrap_err();
        assert!(matches!(err, AssessError::MissingWeight(ref k) if k.contains('c')));
        assert_eq!(items, vec!["a", "b", "c"], "left untouched on error");
    }

    #[test]
    fn reorder_is_stable_in_both_directions() {
        let weights: HashMap<u32, i32> = [(1, 5), (2, 1), (3, 5), (4, 0)].into_iter().collect();
        let mut items = vec![1, 2, 3, 4];
        reorder(&mut items, &weights, true).unwrap();
        assert_eq!(items, vec![1, 3, 2, 4]);
        reorder(&mut items, &weights, false).unwrap();
        assert_eq!(items, vec![4, 2, 1, 3]);
    }

    #[test]
    fn permissive_reorder_treats_missing_as_zero() {
        let weights: HashMap<&str, f32> = [("up", 2.0), ("down", -1.0)].into_iter().collect();
        let mut items = vec!["down", "unknown", "up"];
        reorder_or_zero(&mut items, &weights, true);
        assert_eq!(items, vec!["up", "unknown", "down"]);
    }
}
