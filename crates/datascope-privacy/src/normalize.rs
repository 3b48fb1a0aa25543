//! Outward-facing result sets are always sequences, never absent.

/// Replace an absent result set with an empty one.
pub fn normalize_set<T>(set: Option<Vec<T>>) -> Vec<T> {
    set.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_becomes_empty() {
        let set: Vec<u64> = normalize_set(None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_present_set_is_untouched() {
        assert_eq!(normalize_set(Some(vec![3, 1, 2])), vec![3, 1, 2]);
        assert_eq!(normalize_set(Some(Vec::<u64>::new())), Vec::<u64>::new());
    }
}
