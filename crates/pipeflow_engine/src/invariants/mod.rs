//! First-class grid invariants.
//!
//! Invariants are logical properties every reachable grid satisfies. They
//! are checked after each mutation in debug builds and can be tested on
//! their own.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// A set of invariants checked together.
///
/// Implemented for tuples of invariants.
pub trait InvariantSet<S> {
    /// Checks every invariant in the set, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn collect(violations: Vec<InvariantViolation>) -> Result<(), Vec<InvariantViolation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }
        collect(violations)
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        collect(violations)
    }
}

pub mod fixed_endpoints;
pub mod source_seeded;
pub mod water_mirrors_connection;

pub use fixed_endpoints::FixedEndpointsInvariant;
pub use source_seeded::SourceSeededInvariant;
pub use water_mirrors_connection::WaterMirrorsConnectionInvariant;

/// Every grid invariant as a composable set.
pub type GridInvariants = (
    FixedEndpointsInvariant,
    SourceSeededInvariant,
    WaterMirrorsConnectionInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::propagate;
    use crate::grid::Grid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generated_grid_satisfies_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let grid = Grid::generate(5, 0.1, &mut rng).unwrap();
        assert!(GridInvariants::check_all(&grid).is_ok());
    }

    #[test]
    fn test_propagated_grid_satisfies_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            let mut grid = Grid::generate(7, 0.2, &mut rng).unwrap();
            propagate(&mut grid);
            assert!(GridInvariants::check_all(&grid).is_ok());
        }
    }

    #[test]
    fn test_two_invariants_as_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let grid = Grid::generate(4, 0.1, &mut rng).unwrap();
        type Endpoints = (FixedEndpointsInvariant, SourceSeededInvariant);
        assert!(Endpoints::check_all(&grid).is_ok());
    }
}
