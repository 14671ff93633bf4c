//! Group-by reductions and key joins over normalized records.
//!
//! Reductions produce one entry per distinct key (a `HashMap` guarantees it),
//! which is what keeps the joins below free of fan-out.

use std::collections::HashMap;
use std::hash::Hash;

/// Number of rows per key. Rows without a key are dropped.
pub fn count_by<R, K, F>(rows: &[R], key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&R) -> Option<K>,
{
    let mut map: HashMap<K, usize> = HashMap::new();
    for r in rows {
        if let Some(k) = key(r) {
            *map.entry(k).or_insert(0) += 1;
        }
    }
    map
}

/// Sum of `value` per key. Absent values contribute nothing, but the key
/// still shows up (with 0.0 if none of its values parsed).
pub fn sum_by<R, K, F, V>(rows: &[R], key: F, value: V) -> HashMap<K, f64>
where
    K: Eq + Hash,
    F: Fn(&R) -> Option<K>,
    V: Fn(&R) -> Option<f64>,
{
    let mut map: HashMap<K, f64> = HashMap::new();
    for r in rows {
        let Some(k) = key(r) else { continue };
        let e = map.entry(k).or_insert(0.0);
        if let Some(v) = value(r) {
            *e += v;
        }
    }
    map
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
}

/// A left row paired with the right-side value for its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<L> {
    pub left: L,
    /// Right-side value, `0.0` when the key had no match (left join only).
    pub right: f64,
    pub matched: bool,
}

/// Join `left` rows against a keyed right-side table.
///
/// `right` must hold one value per key, which every reduction in this
/// module guarantees.
pub fn join<L, K, F>(
    left: Vec<L>,
    right: &HashMap<K, f64>,
    kind: JoinKind,
    key: F,
) -> Vec<Joined<L>>
where
    K: Eq + Hash,
    F: Fn(&L) -> &K,
{
    left
        .into_iter()
        .filter_map(|l| {
            let found = right.get(key(&l)).copied();
            match found {
                Some(v) => Some(Joined {
                    left: l,
                    right: v,
                    matched: true,
                }),
                None if kind == JoinKind::Left => Some(Joined {
                    left: l,
                    right: 0.0,
                    matched: false,
                }),
                None => None,
            }
        })
        .collect()
}
