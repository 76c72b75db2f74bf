/// Search for a perfect one-to-one pairing between two sequences of
/// `len` elements each, where positions `i` (actual) and `j` (expected)
/// may be paired iff `pair_matches(i, j)`.
///
/// The element-equality relation is not assumed transitive, so no
/// sort-based or greedy shortcut is sound; this is bipartite perfect
/// matching via augmenting-path search. The predicate is evaluated once
/// per pair. Returns the pairing as `matched[i] = j`, or `None` when no
/// perfect pairing exists.
pub fn find_perfect_matching<F>(len: usize, mut pair_matches: F) -> Option<Vec<usize>>
where
    F: FnMut(usize, usize) -> bool,
{
    let adjacency: Vec<Vec<usize>> = (0..len)
        .map(|i| (0..len).filter(|&j| pair_matches(i, j)).collect())
        .collect();

    let mut owner_of: Vec<Option<usize>> = vec![None; len];
    for i in 0..len {
        let mut visited = vec![false; len];
        if !augment(i, &adjacency, &mut visited, &mut owner_of) {
            return None;
        }
    }

    let mut matched = vec![0; len];
    for (j, owner) in owner_of.iter().enumerate() {
        if let Some(i) = owner {
            matched[*i] = j;
        }
    }
    Some(matched)
}

fn augment(
    i: usize,
    adjacency: &[Vec<usize>],
    visited: &mut [bool],
    owner_of: &mut [Option<usize>],
) -> bool {
    for &j in &adjacency[i] {
        if visited[j] {
            continue;
        }
        visited[j] = true;
        match owner_of[j] {
            None => {
                owner_of[j] = Some(i);
                return true;
            }
            Some(owner) => {
                if augment(owner, adjacency, visited, owner_of) {
                    owner_of[j] = Some(i);
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequences_match_trivially() {
        assert_eq!(find_perfect_matching(0, |_, _| false), Some(vec![]));
    }

    #[test]
    fn identity_matching() {
        let matched = find_perfect_matching(3, |i, j| i == j).unwrap();
        assert_eq!(matched, vec![0, 1, 2]);
    }

    #[test]
    fn permutation_matching() {
        let actual = [3, 1, 2];
        let expected = [1, 2, 3];
        let matched =
            find_perfect_matching(3, |i, j| actual[i] == expected[j]).unwrap();
        assert_eq!(matched, vec![2, 0, 1]);
    }

    #[test]
    fn no_matching_when_an_element_is_unpairable() {
        let actual = [1, 5];
        let expected = [1, 2];
        assert!(find_perfect_matching(2, |i, j| actual[i] == expected[j]).is_none());
    }

    #[test]
    fn duplicate_elements_need_distinct_partners() {
        // Two equal elements on the actual side, only one partner available.
        let actual = [7, 7];
        let expected = [7, 8];
        assert!(find_perfect_matching(2, |i, j| actual[i] == expected[j]).is_none());
    }

    #[test]
    fn augmenting_path_reroutes_greedy_choice() {
        // Within a 0.6 margin: 1.0 pairs only with 1.5, while 1.6 pairs
        // with both 1.5 and 2.1. A greedy pass that gives 1.5 to 1.6
        // strands 1.0; the search must reroute 1.6 to 2.1.
        let actual = [1.6f64, 1.0];
        let expected = [1.5f64, 2.1];
        let near = |x: f64, y: f64| (x - y).abs() <= 0.6;

        let matched =
            find_perfect_matching(2, |i, j| near(actual[i], expected[j])).unwrap();
        assert_eq!(matched, vec![1, 0]);
    }

    #[test]
    fn tolerates_non_transitive_relation() {
        // 1.0 ~ 1.5 and 1.5 ~ 2.0 but 1.0 !~ 2.0 under a 0.5 margin.
        let actual = [1.0f64, 1.5, 2.0];
        let expected = [1.5f64, 2.0, 1.0];
        let near = |x: f64, y: f64| (x - y).abs() <= 0.5;

        assert!(find_perfect_matching(3, |i, j| near(actual[i], expected[j])).is_some());

        // Shift one element out of everyone's reach and the pairing dies.
        let expected_broken = [1.5f64, 2.0, 9.0];
        assert!(
            find_perfect_matching(3, |i, j| near(actual[i], expected_broken[j])).is_none()
        );
    }
}
