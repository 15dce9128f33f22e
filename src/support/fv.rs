//! Finite-volume collaborators.
//!
//! A closure model never discretizes anything itself. It asks a host for
//! explicit differential operators ([`FvOperators`]) and hands assembled
//! transport equations to an implicit solver ([`EquationSolver`]). Mesh
//! topology, boundary conditions, time discretization and the linear algebra
//! all live behind these two traits.
//!
//! [`channel::ChannelMesh`] implements both for fully developed channel flow.

pub mod channel;

use std::fmt;

use nalgebra::Vector3;
use thiserror::Error;

use crate::support::field::{Field, ScalarField, TensorField, VectorField};

/// Transported quantity of a closure model.
///
/// Hosts use it to select boundary conditions and solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    K,
    Epsilon,
    Phi,
    Psi,
}

impl Variable {
    /// Field name of the transported quantity.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Variable::K => "k",
            Variable::Epsilon => "epsilon",
            Variable::Phi => "phi",
            Variable::Psi => "psi",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An assembled transport equation for one variable.
///
/// Represents
///
/// ```text
/// ddt(x) + div(flux, x) − laplacian(diffusivity, x) = source − sink·x
/// ```
///
/// where `source` is treated explicitly and `sink` implicitly. The solver
/// supplies the time derivative, convection, and boundary conditions.
#[derive(Debug, Clone, Copy)]
pub struct TransportEquation<'a, T> {
    pub variable: Variable,
    pub diffusivity: &'a ScalarField,
    pub source: &'a Field<T>,
    pub sink: &'a ScalarField,
}

/// Convergence report of one equation solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverPerformance {
    pub variable: Variable,
    pub iterations: usize,
    pub initial_residual: f64,
    pub final_residual: f64,
}

impl fmt::Display for SolverPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Solving for {}, Initial residual = {:e}, Final residual = {:e}, No Iterations {}",
            self.variable, self.initial_residual, self.final_residual, self.iterations
        )
    }
}

/// Failure reported by an [`EquationSolver`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverFailure {
    /// The assembled matrix has a zero or negative pivot.
    #[error("singular system at cell {cell} (pivot {pivot:e})")]
    Singular { cell: usize, pivot: f64 },

    /// The solution contains NaN or infinity.
    #[error("non-finite solution at cell {cell}")]
    NonFinite { cell: usize },

    /// An iterative solver stopped before reaching its tolerance.
    #[error("no convergence after {iterations} iterations (residual {residual:e})")]
    MaxIterations { iterations: usize, residual: f64 },

    /// A field or flux does not match the mesh.
    #[error("size mismatch: mesh has {expected} entries, got {found}")]
    SizeMismatch { expected: usize, found: usize },
}

/// Explicit finite-volume operators on cell fields.
pub trait FvOperators {
    /// Number of cells in the mesh.
    fn n_cells(&self) -> usize;

    /// Gradient of a scalar field.
    fn grad(&self, field: &ScalarField) -> VectorField;

    /// Gradient of a vector field, `(∇u)_ij = ∂u_j/∂x_i`.
    fn grad_vector(&self, field: &VectorField) -> TensorField;

    /// Divergence of a tensor field, `(∇·T)_j = ∂T_ij/∂x_i`.
    fn div_tensor(&self, field: &TensorField) -> VectorField;

    /// Explicit Laplacian `∇·(gamma ∇field)`.
    fn laplacian(&self, gamma: &ScalarField, field: &ScalarField) -> ScalarField;

    /// Curl of a vector field.
    fn curl(&self, field: &VectorField) -> VectorField {
        curl_from_gradient(&self.grad_vector(field)).renamed(format!("curl({})", field.name()))
    }
}

/// Implicit solver for assembled transport equations.
pub trait EquationSolver {
    /// Face flux used for convection.
    type Flux;

    /// Solves a scalar equation, overwriting `field` in place.
    ///
    /// # Errors
    ///
    /// Returns [`SolverFailure`] if the system cannot be solved.
    fn solve_scalar(
        &mut self,
        flux: &Self::Flux,
        equation: &TransportEquation<'_, f64>,
        field: &mut ScalarField,
    ) -> Result<SolverPerformance, SolverFailure>;

    /// Solves a vector equation, overwriting `field` in place.
    ///
    /// # Errors
    ///
    /// Returns [`SolverFailure`] if the system cannot be solved.
    fn solve_vector(
        &mut self,
        flux: &Self::Flux,
        equation: &TransportEquation<'_, Vector3<f64>>,
        field: &mut VectorField,
    ) -> Result<SolverPerformance, SolverFailure>;
}

/// Curl of a vector field from its gradient `G_ij = ∂u_j/∂x_i`.
#[must_use]
pub fn curl_from_gradient(grad: &TensorField) -> VectorField {
    grad.map(format!("curl({})", grad.name()), |g| {
        Vector3::new(
            g[(1, 2)] - g[(2, 1)],
            g[(2, 0)] - g[(0, 2)],
            g[(0, 1)] - g[(1, 0)],
        )
    })
}
