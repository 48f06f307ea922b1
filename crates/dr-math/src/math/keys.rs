use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::{MathError, Result};

/// Fail unless both maps carry exactly the same key set.
pub(crate) fn ensure_same_keys<K, A, B>(
    left_name: &'static str,
    left: &BTreeMap<K, A>,
    right_name: &'static str,
    right: &BTreeMap<K, B>,
) -> Result<()>
where
    K: Ord + Display,
{
    let only_left: Vec<String> = left
        .keys()
        .filter(|k| !right.contains_key(*k))
        .map(|k| k.to_string())
        .collect();
    let only_right: Vec<String> = right
        .keys()
        .filter(|k| !left.contains_key(*k))
        .map(|k| k.to_string())
        .collect();

    if only_left.is_empty() && only_right.is_empty() {
        Ok(())
    } else {
        Err(MathError::KeyMismatch {
            left: left_name,
            right: right_name,
            only_left,
            only_right,
        })
    }
}
