use thiserror::Error;

use crate::support::fv::{SolverFailure, Variable};

/// Errors that abort a correction step.
///
/// The step is not retried and no field is restored; [`super::Stage`] tells
/// the caller where it stopped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrectError {
    /// The equation solver failed; its failure is passed on unchanged.
    #[error("solving for {variable} failed")]
    Solve {
        variable: Variable,
        #[source]
        source: SolverFailure,
    },

    /// A solved or updated field holds NaN or infinity.
    #[error("{field} is not finite at cell {cell}")]
    NonFinite { field: &'static str, cell: usize },

    /// The mean velocity does not fit the mesh.
    #[error("velocity has {found} cells, the mesh has {expected}")]
    VelocitySize { expected: usize, found: usize },
}
