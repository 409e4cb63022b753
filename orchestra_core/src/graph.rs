//! Neighbor graph construction.
//!
//! Two musicians are neighbors when their Euclidean distance is at most the
//! configured threshold. The relation is symmetric and never includes the
//! musician itself. N is small (tens to low hundreds), so the quadratic
//! pairwise scan is fine.

use orchestra_env::MusicianId;

use crate::position::Position;

/// Computes, for each position index, the ids of all other positions within
/// `max_distance` (inclusive).
///
/// Deterministic: neighbor lists are in ascending id order.
pub fn build_neighbors(positions: &[Position], max_distance: u32) -> Vec<Vec<MusicianId>> {
    let threshold_sq = u128::from(max_distance) * u128::from(max_distance);

    positions
        .iter()
        .enumerate()
        .map(|(i, pos)| {
            positions
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && pos.distance_sq_to(other) <= threshold_sq)
                .map(|(j, _)| MusicianId::from_index(j))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn has(graph: &[Vec<MusicianId>], a: usize, b: usize) -> bool {
        graph[a].contains(&MusicianId::from_index(b))
    }

    #[test]
    fn test_line_of_three() {
        // A and C are each within range of B but not of each other.
        let positions = vec![
            Position::new(0, 0),
            Position::new(2, 0),
            Position::new(4, 0),
        ];
        let graph = build_neighbors(&positions, 3);

        assert_eq!(graph[0], vec![MusicianId::from_index(1)]);
        assert_eq!(
            graph[1],
            vec![MusicianId::from_index(0), MusicianId::from_index(2)]
        );
        assert_eq!(graph[2], vec![MusicianId::from_index(1)]);
    }

    #[test]
    fn test_excludes_self() {
        // Two musicians on the same spot are each other's neighbors, not
        // their own.
        let positions = vec![Position::new(1, 1), Position::new(1, 1)];
        let graph = build_neighbors(&positions, 3);

        assert!(!has(&graph, 0, 0));
        assert!(has(&graph, 0, 1));
        assert!(has(&graph, 1, 0));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let positions = vec![Position::new(0, 0), Position::new(3, 0)];
        let graph = build_neighbors(&positions, 3);
        assert!(has(&graph, 0, 1));

        let graph = build_neighbors(&positions, 2);
        assert!(!has(&graph, 0, 1));
    }

    #[test]
    fn test_wide_coordinates_are_just_far_apart() {
        // Coordinates at the edges of the 32-bit domain must not panic the
        // distance arithmetic; they are simply out of range of each other.
        let positions = vec![
            Position::new(i64::from(i32::MAX), 0),
            Position::new(i64::from(i32::MIN), 0),
        ];
        let graph = build_neighbors(&positions, 3);

        assert!(graph[0].is_empty());
        assert!(graph[1].is_empty());
    }

    #[test]
    fn test_empty_and_singleton() {
        assert!(build_neighbors(&[], 3).is_empty());

        let graph = build_neighbors(&[Position::new(5, 5)], 3);
        assert_eq!(graph.len(), 1);
        assert!(graph[0].is_empty());
    }

    proptest! {
        #[test]
        fn prop_symmetric(
            coords in prop::collection::vec((-50i64..50, -50i64..50), 0..40),
            max_distance in 0u32..20,
        ) {
            let positions: Vec<Position> =
                coords.iter().map(|&(x, y)| Position::new(x, y)).collect();
            let graph = build_neighbors(&positions, max_distance);

            for (i, neighbors) in graph.iter().enumerate() {
                for id in neighbors {
                    let j = id.value() as usize;
                    prop_assert_ne!(j, i);
                    prop_assert!(has(&graph, j, i), "asymmetric edge {} -> {}", i, j);
                }
            }
        }

        #[test]
        fn prop_deterministic(
            coords in prop::collection::vec((-50i64..50, -50i64..50), 0..40),
        ) {
            let positions: Vec<Position> =
                coords.iter().map(|&(x, y)| Position::new(x, y)).collect();
            prop_assert_eq!(
                build_neighbors(&positions, 5),
                build_neighbors(&positions, 5)
            );
        }
    }
}
