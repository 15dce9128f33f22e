//! Fully developed channel flow on a single wall-normal line of cells.
//!
//! The channel spans `0 ≤ y ≤ height` between two walls and is homogeneous in
//! `x` and `z`, so every derivative except `∂/∂y` vanishes. Cell `i` has its
//! centre at `(i + ½)·Δy`; face `f` sits at `f·Δy`, faces `0` and `n` are the
//! walls.
//!
//! Boundary conditions are attached by field name. A named field is either
//! held at a fixed wall value or, when not named, has zero normal gradient.
//! By default `U`, `k`, `phi`, `psi` and the square roots `kSqrt` and
//! `phiSqrt` are held at zero; `epsilon` has zero gradient.
//!
//! Equations are discretized with implicit Euler in time, first-order upwind
//! convection and central diffusion, then solved directly with the Thomas
//! algorithm.

use std::{
    collections::BTreeMap,
    num::NonZeroUsize,
    ops::{Add, Mul},
};

use nalgebra::{Matrix3, Vector3};

use crate::support::{
    constraint::{Constrained, StrictlyPositive},
    field::{Field, ScalarField, TensorField, VectorField},
    fv::{EquationSolver, FvOperators, SolverFailure, SolverPerformance, TransportEquation},
};

/// Volumetric flux through each face per unit face area, positive towards `+y`.
///
/// Holds `n_cells + 1` values, wall faces included.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceFlux {
    values: Vec<f64>,
}

impl FaceFlux {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// No flow through any face, the fully developed case.
    #[must_use]
    pub fn zero(n_cells: usize) -> Self {
        Self::new(vec![0.0; n_cells + 1])
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Wall-normal finite-volume discretization of a plane channel.
#[derive(Debug, Clone)]
pub struct ChannelMesh {
    n_cells: usize,
    dy: f64,
    delta_t: f64,
    fixed_scalars: BTreeMap<String, f64>,
    fixed_vectors: BTreeMap<String, Vector3<f64>>,
}

impl ChannelMesh {
    /// Creates a channel of `n_cells` uniform cells advanced with time step `delta_t`.
    #[must_use]
    pub fn new(
        n_cells: NonZeroUsize,
        height: Constrained<f64, StrictlyPositive>,
        delta_t: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        let n_cells = n_cells.get();
        let mesh = Self {
            n_cells,
            dy: height.into_inner() / n_cells as f64,
            delta_t: delta_t.into_inner(),
            fixed_scalars: BTreeMap::new(),
            fixed_vectors: BTreeMap::new(),
        };
        mesh.with_fixed_vector("U", Vector3::zeros())
            .with_fixed_scalar("k", 0.0)
            .with_fixed_scalar("phi", 0.0)
            .with_fixed_vector("psi", Vector3::zeros())
            .with_fixed_scalar("kSqrt", 0.0)
            .with_fixed_scalar("phiSqrt", 0.0)
    }

    /// Holds the named scalar field at `value` on both walls.
    #[must_use]
    pub fn with_fixed_scalar(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fixed_scalars.insert(name.into(), value);
        self
    }

    /// Holds the named vector field at `value` on both walls.
    #[must_use]
    pub fn with_fixed_vector(mut self, name: impl Into<String>, value: Vector3<f64>) -> Self {
        self.fixed_vectors.insert(name.into(), value);
        self
    }

    /// Gives the named field zero normal gradient on both walls.
    #[must_use]
    pub fn with_zero_gradient(mut self, name: &str) -> Self {
        self.fixed_scalars.remove(name);
        self.fixed_vectors.remove(name);
        self
    }

    /// Cell spacing.
    #[must_use]
    pub fn dy(&self) -> f64 {
        self.dy
    }

    #[must_use]
    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    pub fn set_delta_t(&mut self, delta_t: Constrained<f64, StrictlyPositive>) {
        self.delta_t = delta_t.into_inner();
    }

    /// Wall-normal coordinate of every cell centre.
    #[must_use]
    pub fn cell_centres(&self) -> Vec<f64> {
        (0..self.n_cells)
            .map(|i| (i as f64 + 0.5) * self.dy)
            .collect()
    }

    /// Distance from every cell centre to the nearest wall.
    #[must_use]
    pub fn wall_distance(&self) -> ScalarField {
        let height = self.dy * self.n_cells as f64;
        ScalarField::new(
            "yWall",
            self.cell_centres()
                .into_iter()
                .map(|y| y.min(height - y))
                .collect(),
        )
    }

    fn check_size(&self, found: usize) -> Result<(), SolverFailure> {
        if found == self.n_cells {
            Ok(())
        } else {
            Err(SolverFailure::SizeMismatch {
                expected: self.n_cells,
                found,
            })
        }
    }

    /// Derivative in `y` of face values, one entry per cell.
    fn face_difference<T>(&self, faces: &[T]) -> Vec<T>
    where
        T: Copy + std::ops::Sub<Output = T> + Mul<f64, Output = T>,
    {
        faces
            .windows(2)
            .map(|f| (f[1] - f[0]) * (1.0 / self.dy))
            .collect()
    }

    fn assemble(
        &self,
        flux: &FaceFlux,
        diffusivity: &ScalarField,
        sink: &ScalarField,
        fixed_walls: bool,
    ) -> Result<System, SolverFailure> {
        let n = self.n_cells;
        self.check_size(diffusivity.len())?;
        self.check_size(sink.len())?;
        if flux.values.len() != n + 1 {
            return Err(SolverFailure::SizeMismatch {
                expected: n + 1,
                found: flux.values.len(),
            });
        }

        let gamma = diffusivity.values();
        let f = &flux.values;
        let dy = self.dy;
        let dy2 = dy * dy;

        let mut system = System {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
            wall: vec![0.0; n],
        };

        for i in 0..n {
            let mut diag = 1.0 / self.delta_t + sink[i];

            let f_west = f[i];
            if i > 0 {
                let d = 0.5 * (gamma[i] + gamma[i - 1]) / dy2;
                diag += d + (-f_west).max(0.0) / dy;
                system.lower[i] = -d - f_west.max(0.0) / dy;
            } else if fixed_walls {
                let d = 2.0 * gamma[i] / dy2;
                diag += d + (-f_west).max(0.0) / dy;
                system.wall[i] += d + f_west.max(0.0) / dy;
            } else {
                diag -= f_west / dy;
            }

            let f_east = f[i + 1];
            if i + 1 < n {
                let d = 0.5 * (gamma[i] + gamma[i + 1]) / dy2;
                diag += d + f_east.max(0.0) / dy;
                system.upper[i] = -d + f_east.min(0.0) / dy;
            } else if fixed_walls {
                let d = 2.0 * gamma[i] / dy2;
                diag += d + f_east.max(0.0) / dy;
                system.wall[i] += d - f_east.min(0.0) / dy;
            } else {
                diag += f_east / dy;
            }

            system.diag[i] = diag;
        }

        Ok(system)
    }

    /// Solves one scalar component; returns `(initial, final)` normalized residuals.
    fn solve_component(
        &self,
        system: &System,
        source: impl Fn(usize) -> f64,
        wall_value: f64,
        x: &mut [f64],
    ) -> Result<(f64, f64), SolverFailure> {
        let rhs: Vec<f64> = (0..self.n_cells)
            .map(|i| x[i] / self.delta_t + source(i) + system.wall[i] * wall_value)
            .collect();

        let initial = system.residual(&rhs, x);
        let solution = system.thomas(&rhs)?;
        if let Some(cell) = solution.iter().position(|v| !v.is_finite()) {
            return Err(SolverFailure::NonFinite { cell });
        }
        x.copy_from_slice(&solution);
        let last = system.residual(&rhs, x);

        Ok((initial, last))
    }
}

/// Tridiagonal system `lower·x[i-1] + diag·x[i] + upper·x[i+1] = rhs + wall·x_wall`.
struct System {
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    wall: Vec<f64>,
}

impl System {
    fn apply(&self, x: &[f64], i: usize) -> f64 {
        let mut ax = self.diag[i] * x[i];
        if i > 0 {
            ax += self.lower[i] * x[i - 1];
        }
        if i + 1 < x.len() {
            ax += self.upper[i] * x[i + 1];
        }
        ax
    }

    fn residual(&self, rhs: &[f64], x: &[f64]) -> f64 {
        let norm: f64 = rhs.iter().map(|b| b.abs()).sum();
        let res: f64 = (0..x.len()).map(|i| (rhs[i] - self.apply(x, i)).abs()).sum();
        res / norm.max(f64::MIN_POSITIVE)
    }

    fn thomas(&self, rhs: &[f64]) -> Result<Vec<f64>, SolverFailure> {
        let n = rhs.len();
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; n];

        for i in 0..n {
            let (c_prev, d_prev) = if i > 0 { (c[i - 1], d[i - 1]) } else { (0.0, 0.0) };
            let pivot = self.diag[i] - self.lower[i] * c_prev;
            if !(pivot.is_finite() && pivot > 0.0) {
                return Err(SolverFailure::Singular { cell: i, pivot });
            }
            c[i] = self.upper[i] / pivot;
            d[i] = (rhs[i] - self.lower[i] * d_prev) / pivot;
        }

        for i in (0..n.saturating_sub(1)).rev() {
            d[i] -= c[i] * d[i + 1];
        }
        Ok(d)
    }
}

/// Face values with linear interpolation inside and the wall value (or the
/// adjacent cell value for zero gradient) on the two wall faces.
fn face_values<T>(values: &[T], wall: Option<T>) -> Vec<T>
where
    T: Copy + Add<Output = T> + Mul<f64, Output = T>,
{
    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return Vec::new();
    };
    let mut faces = Vec::with_capacity(values.len() + 1);
    faces.push(wall.unwrap_or(first));
    faces.extend(values.windows(2).map(|w| (w[0] + w[1]) * 0.5));
    faces.push(wall.unwrap_or(last));
    faces
}

impl FvOperators for ChannelMesh {
    fn n_cells(&self) -> usize {
        self.n_cells
    }

    fn grad(&self, field: &ScalarField) -> VectorField {
        let wall = self.fixed_scalars.get(field.name()).copied();
        let faces = face_values(field.values(), wall);
        Field::new(
            format!("grad({})", field.name()),
            self.face_difference(&faces)
                .into_iter()
                .map(|d| Vector3::new(0.0, d, 0.0))
                .collect(),
        )
    }

    fn grad_vector(&self, field: &VectorField) -> TensorField {
        let wall = self.fixed_vectors.get(field.name()).copied();
        let faces = face_values(field.values(), wall);
        Field::new(
            format!("grad({})", field.name()),
            self.face_difference(&faces)
                .into_iter()
                .map(|d| {
                    let mut g = Matrix3::zeros();
                    g.set_row(1, &d.transpose());
                    g
                })
                .collect(),
        )
    }

    fn div_tensor(&self, field: &TensorField) -> VectorField {
        let faces = face_values(field.values(), None);
        Field::new(
            format!("div({})", field.name()),
            self.face_difference(&faces)
                .into_iter()
                .map(|d| d.row(1).transpose())
                .collect(),
        )
    }

    fn laplacian(&self, gamma: &ScalarField, field: &ScalarField) -> ScalarField {
        let wall = self.fixed_scalars.get(field.name()).copied();
        let g = gamma.values();
        let x = field.values();
        let n = x.len();
        let dy = self.dy;

        let values = (0..n)
            .map(|i| {
                let east = if i + 1 < n {
                    0.5 * (g[i] + g[i + 1]) * (x[i + 1] - x[i]) / dy
                } else {
                    wall.map_or(0.0, |w| g[i] * (w - x[i]) / (0.5 * dy))
                };
                let west = if i > 0 {
                    0.5 * (g[i] + g[i - 1]) * (x[i] - x[i - 1]) / dy
                } else {
                    wall.map_or(0.0, |w| g[i] * (x[i] - w) / (0.5 * dy))
                };
                (east - west) / dy
            })
            .collect();

        ScalarField::new(
            format!("laplacian({},{})", gamma.name(), field.name()),
            values,
        )
    }
}

impl EquationSolver for ChannelMesh {
    type Flux = FaceFlux;

    fn solve_scalar(
        &mut self,
        flux: &FaceFlux,
        equation: &TransportEquation<'_, f64>,
        field: &mut ScalarField,
    ) -> Result<SolverPerformance, SolverFailure> {
        self.check_size(field.len())?;
        self.check_size(equation.source.len())?;

        let wall = self.fixed_scalars.get(field.name()).copied();
        let system = self.assemble(flux, equation.diffusivity, equation.sink, wall.is_some())?;
        let source = equation.source.values();

        let (initial_residual, final_residual) = self.solve_component(
            &system,
            |i| source[i],
            wall.unwrap_or(0.0),
            field.values_mut(),
        )?;

        Ok(SolverPerformance {
            variable: equation.variable,
            iterations: 1,
            initial_residual,
            final_residual,
        })
    }

    fn solve_vector(
        &mut self,
        flux: &FaceFlux,
        equation: &TransportEquation<'_, Vector3<f64>>,
        field: &mut VectorField,
    ) -> Result<SolverPerformance, SolverFailure> {
        self.check_size(field.len())?;
        self.check_size(equation.source.len())?;

        let wall = self.fixed_vectors.get(field.name()).copied();
        let system = self.assemble(flux, equation.diffusivity, equation.sink, wall.is_some())?;
        let wall = wall.unwrap_or_else(Vector3::zeros);
        let source = equation.source.values();

        let mut initial_residual = 0.0_f64;
        let mut final_residual = 0.0_f64;
        for c in 0..3 {
            let mut component: Vec<f64> = field.iter().map(|v| v[c]).collect();
            let (initial, last) =
                self.solve_component(&system, |i| source[i][c], wall[c], &mut component)?;
            for (v, x) in field.values_mut().iter_mut().zip(component) {
                v[c] = x;
            }
            initial_residual = initial_residual.max(initial);
            final_residual = final_residual.max(last);
        }

        Ok(SolverPerformance {
            variable: equation.variable,
            iterations: 1,
            initial_residual,
            final_residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::support::{constraint::StrictlyPositive, fv::Variable};

    fn mesh(n: usize, delta_t: f64) -> ChannelMesh {
        ChannelMesh::new(
            NonZeroUsize::new(n).unwrap(),
            StrictlyPositive::new(2.0).unwrap(),
            StrictlyPositive::new(delta_t).unwrap(),
        )
    }

    #[test]
    fn gradient_of_linear_profile_is_exact_inside() {
        let mesh = mesh(10, 1.0).with_zero_gradient("T");
        let t = ScalarField::new("T", mesh.cell_centres().iter().map(|y| 3.0 * y).collect());

        let grad = mesh.grad(&t);
        for cell in 1..9 {
            assert_relative_eq!(grad[cell].y, 3.0, epsilon = 1e-12);
            assert_relative_eq!(grad[cell].x, 0.0);
        }
    }

    #[test]
    fn velocity_gradient_uses_no_slip_walls() {
        let mesh = mesh(4, 1.0);
        let u = VectorField::uniform("U", 4, Vector3::new(1.0, 0.0, 0.0));

        let g = mesh.grad_vector(&u);
        // Wall face at u = 0, interior face at u = 1, over Δy = 0.5.
        assert_relative_eq!(g[0][(1, 0)], 2.0);
        assert_relative_eq!(g[1][(1, 0)], 0.0);
        assert_relative_eq!(g[3][(1, 0)], -2.0);

        let omega = mesh.curl(&u);
        assert_relative_eq!(omega[0].z, -2.0);
    }

    #[test]
    fn laplacian_of_quadratic() {
        let mesh = mesh(20, 1.0).with_zero_gradient("T");
        let t = ScalarField::new("T", mesh.cell_centres().iter().map(|y| y * y).collect());
        let gamma = ScalarField::uniform("gamma", 20, 0.5);

        let lap = mesh.laplacian(&gamma, &t);
        for cell in 1..19 {
            assert_relative_eq!(lap[cell], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn steady_diffusion_with_source_is_parabolic() {
        // −Γ T'' = S with T = 0 on both walls: T = S y (H − y) / (2Γ).
        let mut mesh = mesh(40, 1e6).with_fixed_scalar("T", 0.0);
        let gamma = ScalarField::uniform("gamma", 40, 1.0);
        let source = ScalarField::uniform("S", 40, 2.0);
        let sink = ScalarField::uniform("Sp", 40, 0.0);
        let mut t = ScalarField::uniform("T", 40, 0.0);

        let eqn = TransportEquation {
            variable: Variable::K,
            diffusivity: &gamma,
            source: &source,
            sink: &sink,
        };
        for _ in 0..3 {
            mesh.solve_scalar(&FaceFlux::zero(40), &eqn, &mut t).unwrap();
        }

        let centre = mesh.cell_centres()[20];
        assert_relative_eq!(t[20], centre * (2.0 - centre), epsilon = 1e-3);
    }

    #[test]
    fn implicit_sink_decays_without_overshoot() {
        let mut mesh = mesh(5, 10.0).with_zero_gradient("k");
        let gamma = ScalarField::uniform("D", 5, 0.0);
        let source = ScalarField::uniform("S", 5, 0.0);
        let sink = ScalarField::uniform("Sp", 5, 1.0);
        let mut k = ScalarField::uniform("k", 5, 1.0);

        let perf = mesh
            .solve_scalar(
                &FaceFlux::zero(5),
                &TransportEquation {
                    variable: Variable::K,
                    diffusivity: &gamma,
                    source: &source,
                    sink: &sink,
                },
                &mut k,
            )
            .unwrap();

        // (k − 1)/Δt = −k  ⇒  k = 1/(1 + Δt).
        assert_relative_eq!(k[2], 1.0 / 11.0, epsilon = 1e-14);
        assert!(perf.initial_residual > perf.final_residual);
    }

    #[test]
    fn negative_sink_can_make_the_system_singular() {
        let mut mesh = mesh(3, 1.0).with_zero_gradient("k");
        let gamma = ScalarField::uniform("D", 3, 0.0);
        let source = ScalarField::uniform("S", 3, 0.0);
        let sink = ScalarField::uniform("Sp", 3, -2.0);
        let mut k = ScalarField::uniform("k", 3, 1.0);

        let result = mesh.solve_scalar(
            &FaceFlux::zero(3),
            &TransportEquation {
                variable: Variable::K,
                diffusivity: &gamma,
                source: &source,
                sink: &sink,
            },
            &mut k,
        );
        assert!(matches!(result, Err(SolverFailure::Singular { cell: 0, .. })));
        assert_eq!(k.values(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn upwind_convection_carries_the_inflow_value() {
        // Uniform flow towards +y with a fixed inflow wall value and no diffusion.
        let mut mesh = mesh(4, 1e6).with_fixed_scalar("c", 1.0);
        let zeros = ScalarField::uniform("0", 4, 0.0);
        let mut c = ScalarField::uniform("c", 4, 0.0);

        mesh.solve_scalar(
            &FaceFlux::new(vec![1.0; 5]),
            &TransportEquation {
                variable: Variable::Phi,
                diffusivity: &zeros,
                source: &zeros,
                sink: &zeros,
            },
            &mut c,
        )
        .unwrap();

        for cell in 0..4 {
            assert_relative_eq!(c[cell], 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn rejects_mismatched_flux() {
        let mut mesh = mesh(3, 1.0);
        let zeros = ScalarField::uniform("0", 3, 0.0);
        let mut k = ScalarField::uniform("k", 3, 1.0);

        let result = mesh.solve_scalar(
            &FaceFlux::zero(5),
            &TransportEquation {
                variable: Variable::K,
                diffusivity: &zeros,
                source: &zeros,
                sink: &zeros,
            },
            &mut k,
        );
        assert!(matches!(
            result,
            Err(SolverFailure::SizeMismatch {
                expected: 4,
                found: 6
            })
        ));
    }
}
