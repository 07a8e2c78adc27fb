//! Neighbor selection heuristic (§4.3).
//!
//! Candidates are visited in ascending order of distance to the point being
//! connected. A candidate is accepted if it is closer to the query than to
//! every neighbor already accepted — this keeps the neighbor set spread out
//! instead of clustering on one side of the query. If the heuristic doesn't
//! fill the quota, the closest remaining candidates are added regardless.

use crate::distance::OpClass;
use crate::storage::ItemPointer;
use crate::vector::Vector;

/// One scored candidate: its pointer, vector, and distance to the query.
pub struct Candidate {
    /// Pointer to the candidate element.
    pub pointer: ItemPointer,
    /// The candidate's vector, needed to score it against other candidates.
    pub vector: Vector,
    /// Distance from this candidate to the query vector.
    pub dist_to_query: f64,
}

/// Selects up to `max_neighbors` candidates for an element being connected
/// at one layer. `candidates` must already be sorted ascending by
/// `dist_to_query`.
#[must_use]
pub fn select_neighbors(
    opclass: &OpClass,
    candidates: &[Candidate],
    max_neighbors: usize,
) -> Vec<ItemPointer> {
    if candidates.len() <= max_neighbors {
        return candidates.iter().map(|c| c.pointer).collect();
    }

    let mut selected: Vec<&Candidate> = Vec::with_capacity(max_neighbors);
    for candidate in candidates {
        if selected.len() >= max_neighbors {
            break;
        }
        let diverse = selected.iter().all(|r| {
            let d_e_r = opclass
                .distance(&candidate.vector, &r.vector)
                .unwrap_or(f64::INFINITY);
            candidate.dist_to_query < d_e_r
        });
        if diverse || selected.is_empty() {
            selected.push(candidate);
        }
    }

    if selected.len() < max_neighbors {
        for candidate in candidates {
            if selected.len() >= max_neighbors {
                break;
            }
            if !selected.iter().any(|s| s.pointer == candidate.pointer) {
                selected.push(candidate);
            }
        }
    }

    selected.into_iter().map(|c| c.pointer).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::OpClass;

    fn candidate(x: f32, y: f32, dist_to_query: f64) -> Candidate {
        Candidate {
            pointer: ItemPointer::new(0, 0),
            vector: Vector::F32(vec![x, y]),
            dist_to_query,
        }
    }

    #[test]
    fn test_selects_all_when_under_quota() {
        let op = OpClass::l2(16000);
        let candidates = vec![candidate(1.0, 0.0, 1.0), candidate(0.0, 1.0, 1.0)];
        let selected = select_neighbors(&op, &candidates, 4);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_heuristic_prefers_diverse_candidates() {
        let op = OpClass::l2(16000);
        // Two nearly-identical close candidates and one diverse farther one.
        let mut candidates = vec![
            candidate(1.0, 0.0, 1.0),
            candidate(1.01, 0.0, 1.01),
            candidate(0.0, 1.0, 1.02),
        ];
        candidates.sort_by(|a, b| a.dist_to_query.total_cmp(&b.dist_to_query));
        let selected = select_neighbors(&op, &candidates, 2);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_fills_remaining_with_closest_when_heuristic_too_strict() {
        let op = OpClass::l2(16000);
        let candidates = vec![
            candidate(1.0, 0.0, 1.0),
            candidate(1.1, 0.0, 1.1),
            candidate(1.2, 0.0, 1.2),
        ];
        let selected = select_neighbors(&op, &candidates, 3);
        assert_eq!(selected.len(), 3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            /// Property: selection never exceeds the requested quota, and
            /// never fabricates pointers not present in the input.
            #[test]
            fn prop_never_exceeds_max_neighbors(
                xs in proptest::collection::vec(-10.0f32..10.0, 1usize..=30),
                max_neighbors in 1usize..=10,
            ) {
                let op = OpClass::l2(16000);
                let mut candidates: Vec<Candidate> = xs
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| Candidate {
                        pointer: ItemPointer::new(i as u32, 1),
                        vector: Vector::F32(vec![x, 0.0]),
                        dist_to_query: f64::from(x).abs(),
                    })
                    .collect();
                candidates.sort_by(|a, b| a.dist_to_query.total_cmp(&b.dist_to_query));
                let selected = select_neighbors(&op, &candidates, max_neighbors);

                prop_assert!(selected.len() <= max_neighbors);
                prop_assert!(selected.len() <= candidates.len());
                let valid: std::collections::HashSet<ItemPointer> =
                    candidates.iter().map(|c| c.pointer).collect();
                prop_assert!(selected.iter().all(|p| valid.contains(p)));
            }
        }
    }
}
