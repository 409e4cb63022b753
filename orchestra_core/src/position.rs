//! Integer grid positions for musicians.

use serde::{Deserialize, Serialize};

/// A musician's location on the stage grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    /// Creates a position.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another position.
    ///
    /// The neighbor test compares this against a squared threshold, which is
    /// equivalent to comparing Euclidean distances with `<=` and keeps the
    /// whole graph computation in integer arithmetic. Deltas are taken as
    /// unsigned magnitudes and squared in `u128`, so the arithmetic cannot
    /// overflow for any pair of `i64` coordinates; the final sum saturates
    /// at the (unreachable for real rosters) extreme.
    pub fn distance_sq_to(&self, other: &Position) -> u128 {
        let dx = u128::from(self.x.abs_diff(other.x));
        let dy = u128::from(self.y.abs_diff(other.y));
        (dx * dx).saturating_add(dy * dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_sq() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert_eq!(a.distance_sq_to(&b), 25);
        assert_eq!(b.distance_sq_to(&a), 25);
        assert_eq!(a.distance_sq_to(&a), 0);
    }

    #[test]
    fn test_distance_sq_negative_coordinates() {
        let a = Position::new(-2, -1);
        let b = Position::new(1, 3);
        assert_eq!(a.distance_sq_to(&b), 25);
    }

    #[test]
    fn test_distance_sq_wide_coordinates_do_not_overflow() {
        // A delta spanning the whole 32-bit domain squares past i64::MAX;
        // the u128 arithmetic keeps it exact.
        let a = Position::new(i64::from(i32::MAX), 0);
        let b = Position::new(i64::from(i32::MIN), 0);
        let delta = u128::from(u32::MAX);
        assert_eq!(a.distance_sq_to(&b), delta * delta);

        // Even the full i64 span stays panic-free.
        let far = Position::new(i64::MAX, i64::MAX);
        let near = Position::new(i64::MIN, i64::MIN);
        assert!(far.distance_sq_to(&near) > u128::from(u64::MAX));
    }
}
