//! Majority-including-self quorum arithmetic. The local member always counts as an implicit
//! acknowledger, so callers pass only the number of *other* members that acknowledged.

/// Smallest quorum accepted unless a cluster explicitly configures otherwise. A single member
/// cluster can never reach it.
pub const MIN_QUORUM: usize = 2;

/// `is_quorum_of` takes the collections themselves and compares their sizes.
pub fn is_quorum_of<C, A>(cluster: &[C], acknowledged_not_including_self: &[A]) -> bool {
    is_quorum(cluster.len(), acknowledged_not_including_self.len())
}

pub fn is_quorum(cluster_size: usize, count_not_including_self: usize) -> bool {
    is_quorum_with_min(MIN_QUORUM, cluster_size, count_not_including_self)
}

pub fn is_quorum_with_min(min_quorum: usize, cluster_size: usize, count_not_including_self: usize) -> bool {
    (count_not_including_self + 1) >= min_quorum && count_not_including_self >= cluster_size / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_examples() {
        assert!(is_quorum(3, 1));
        assert!(!is_quorum(3, 0));
        assert!(is_quorum(5, 2));
        assert!(!is_quorum(5, 1));
        assert!(is_quorum(4, 2));
        assert!(!is_quorum(4, 1));
    }

    #[test]
    fn single_member_cluster_needs_explicit_minimum() {
        assert!(!is_quorum(1, 0));
        assert!(is_quorum_with_min(1, 1, 0));
    }

    #[test]
    fn matches_definition_for_small_clusters() {
        for min_quorum in 0..=4 {
            for cluster_size in 1..=9 {
                for count in 0..cluster_size {
                    let expected = count + 1 >= min_quorum && count >= cluster_size / 2;
                    assert_eq!(
                        is_quorum_with_min(min_quorum, cluster_size, count),
                        expected,
                        "min={} size={} count={}",
                        min_quorum,
                        cluster_size,
                        count
                    );
                }
            }
        }
    }

    #[test]
    fn collection_overload_uses_sizes() {
        let cluster = ["a", "b", "c"];
        assert!(is_quorum_of(&cluster, &["b"]));
        assert!(!is_quorum_of::<_, &str>(&cluster, &[]));
    }
}
