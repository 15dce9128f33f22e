//! One implicit correction step.
//!
//! [`TurbulentPotential::correct`] walks the stages of [`Stage`] in order.
//! Every solve is followed by a fresh derivation so the next equation sees
//! the fields updated before it. Diffusivities are evaluated once, on entry,
//! and held for the whole step.

mod error;

pub use error::CorrectError;

use log::{debug, warn};

use crate::support::{
    field::ScalarField,
    fv::{EquationSolver, FvOperators, TransportEquation, Variable},
};

use super::{
    ClosureTerms, MODEL_NAME, MeanFlow, StepState, TransportModel, TurbulentPotential,
    derived::{Derived, Diffusivities, derive, diffusivities},
    fields::{FieldStore, PhiBudget},
    nu_si,
};

/// Progress through a correction step.
///
/// Stages only ever advance; a failed step stays at the stage that failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    #[default]
    Idle,
    DerivingQuantities,
    SolvingK,
    SolvingDissipation,
    SolvingPhi,
    SolvingPsi,
    UpdatingViscosity,
    Done,
}

impl<D, S, M, C> TurbulentPotential<D, S, M, C>
where
    D: FvOperators + EquationSolver,
    M: TransportModel,
    C: ClosureTerms,
{
    /// Advances k, ε, φ, ψ and the eddy viscosity by one implicit step.
    ///
    /// Equations whose switch is off are skipped and keep their values.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectError`] if the velocity does not fit the mesh, the
    /// solver fails, or a solved field is not finite. The fields are then
    /// partially updated and [`Self::stage`] names the failing stage.
    pub fn correct(&mut self, flow: MeanFlow<'_, D::Flux>) -> Result<(), CorrectError> {
        let n_cells = self.fields.n_cells();
        if flow.velocity.len() != n_cells {
            return Err(CorrectError::VelocitySize {
                expected: n_cells,
                found: flow.velocity.len(),
            });
        }

        let nu = nu_si(&self.transport);
        let switches = self.config.switches;
        let floors = self.config.coefficients;

        self.stage = Stage::DerivingQuantities;
        let mut derived = self.derive(flow, nu);
        let diff = diffusivities(&self.fields.nut, &derived, &self.config, nu);

        if switches.solve_k {
            self.stage = Stage::SolvingK;
            let sources = self.terms.k(&self.state(nu, &derived, &diff));
            let equation = TransportEquation {
                variable: Variable::K,
                diffusivity: &diff.k,
                source: &sources.explicit,
                sink: &sources.implicit,
            };
            let floor = floors.k_min.get().value;
            solve_scalar(
                &mut self.discretization,
                flow.flux,
                &equation,
                &mut self.fields.k,
                floor,
            )?;
            derived = self.derive(flow, nu);
        }

        if switches.solve_epsilon {
            self.stage = Stage::SolvingDissipation;
            let sources = self.terms.epsilon(&self.state(nu, &derived, &diff));
            let equation = TransportEquation {
                variable: Variable::Epsilon,
                diffusivity: &diff.epsilon,
                source: &sources.explicit,
                sink: &sources.implicit,
            };
            let floor = floors.epsilon_min.get().value;
            solve_scalar(
                &mut self.discretization,
                flow.flux,
                &equation,
                &mut self.fields.epsilon,
                floor,
            )?;
            derived = self.derive(flow, nu);
        }

        if switches.solve_phi {
            self.stage = Stage::SolvingPhi;
            let sources = self.terms.phi(&self.state(nu, &derived, &diff));
            let equation = TransportEquation {
                variable: Variable::Phi,
                diffusivity: &diff.phi,
                source: &sources.explicit,
                sink: &sources.implicit,
            };
            let floor = floors.phi_min.get().value;
            solve_scalar(
                &mut self.discretization,
                flow.flux,
                &equation,
                &mut self.fields.phi,
                floor,
            )?;
            derived = self.derive(flow, nu);
        }

        self.fields.phi_budget = if switches.debug_write {
            self.assemble_phi_budget(nu, &derived, &diff)
        } else {
            None
        };

        if switches.solve_psi {
            self.stage = Stage::SolvingPsi;
            let sources = self.terms.psi(&self.state(nu, &derived, &diff));
            let equation = TransportEquation {
                variable: Variable::Psi,
                diffusivity: &diff.psi,
                source: &sources.explicit,
                sink: &sources.implicit,
            };
            let performance = self
                .discretization
                .solve_vector(flow.flux, &equation, &mut self.fields.psi)
                .map_err(|source| CorrectError::Solve {
                    variable: Variable::Psi,
                    source,
                })?;
            debug!("{MODEL_NAME}: {performance}");
            if let Some(cell) = self.fields.psi.first_non_finite() {
                return Err(CorrectError::NonFinite { field: "psi", cell });
            }
            derived = self.derive(flow, nu);
        }

        self.stage = Stage::UpdatingViscosity;
        if switches.solve_nut {
            let nut = self.terms.eddy_viscosity(&self.state(nu, &derived, &diff));
            if let Some(cell) = nut.first_non_finite() {
                return Err(CorrectError::NonFinite { field: "nut", cell });
            }
            self.fields.nut.assign(&nut);
            clip(&mut self.fields.nut, floors.nut_min.get().value);
            derived = self.derive(flow, nu);
        }

        record(&mut self.fields, &derived);
        self.fields.sigma_k.assign(&diff.sigma_k);
        self.fields.sigma_epsilon.assign(&diff.sigma_epsilon);
        self.fields.sigma_phi.assign(&diff.sigma_phi);
        self.fields.sigma_psi.assign(&diff.sigma_psi);

        self.stage = Stage::Done;
        Ok(())
    }

    fn derive(&self, flow: MeanFlow<'_, D::Flux>, nu: f64) -> Derived {
        derive(
            &self.discretization,
            flow.velocity,
            &self.fields,
            &self.config,
            nu,
        )
    }

    fn state<'a>(
        &'a self,
        nu: f64,
        derived: &'a Derived,
        diff: &'a Diffusivities,
    ) -> StepState<'a> {
        StepState::new(&self.config, nu, &self.fields, derived, diff)
    }

    fn assemble_phi_budget(
        &self,
        nu: f64,
        derived: &Derived,
        diff: &Diffusivities,
    ) -> Option<PhiBudget> {
        let terms = self.terms.phi_budget(&self.state(nu, derived, diff))?;
        let phi = &self.fields.phi;

        let molecular = ScalarField::uniform("nu", phi.len(), nu);
        let turbulent = self
            .fields
            .nut
            .zip_map(&diff.sigma_phi, "nutSigmaPhi", |nut, sigma| nut * sigma);

        let budget = PhiBudget {
            pressure_strain: terms.pressure_strain,
            pressure_diffusion: terms.pressure_diffusion,
            dissipation: terms.dissipation,
            viscous_diffusion: self
                .discretization
                .laplacian(&molecular, phi)
                .renamed("phiViscousDiff"),
            turbulent_diffusion: self
                .discretization
                .laplacian(&turbulent, phi)
                .renamed("phiTurbDiff"),
        };

        debug!(
            "{MODEL_NAME}: phi budget means: pressure strain {:e}, pressure diffusion {:e}, \
             dissipation {:e}, viscous diffusion {:e}, turbulent diffusion {:e}",
            mean(&budget.pressure_strain),
            mean(&budget.pressure_diffusion),
            mean(&budget.dissipation),
            mean(&budget.viscous_diffusion),
            mean(&budget.turbulent_diffusion),
        );
        Some(budget)
    }
}

/// Copies the diagnostics of `derived` into the persistent fields.
pub(super) fn record(fields: &mut FieldStore, derived: &Derived) {
    fields.grad_u.assign(&derived.grad_u);
    fields.vorticity.assign(&derived.vorticity);
    fields.eps_hat.assign(&derived.eps_hat);
    fields.eps_hat_ratio.assign(&derived.eps_hat_ratio);
    fields.kolmogorov.assign(&derived.kolmogorov);
    fields.time_scale.assign(&derived.time_scale);
    fields.production.assign(&derived.production);
    fields.production_3d.assign(&derived.production_3d);
    fields.grad_k.assign(&derived.grad_k);
    fields.k_sqrt.assign(&derived.k_sqrt);
    fields.grad_k_sqrt.assign(&derived.grad_k_sqrt);
    fields.phi_sqrt.assign(&derived.phi_sqrt);
    fields.grad_phi.assign(&derived.grad_phi);
    fields.grad_psi.assign(&derived.grad_psi);
    fields.c_ep2.assign(&derived.c_ep2);
}

fn solve_scalar<D: EquationSolver>(
    solver: &mut D,
    flux: &D::Flux,
    equation: &TransportEquation<'_, f64>,
    field: &mut ScalarField,
    floor: f64,
) -> Result<(), CorrectError> {
    let variable = equation.variable;
    let performance = solver
        .solve_scalar(flux, equation, field)
        .map_err(|source| CorrectError::Solve { variable, source })?;
    debug!("{MODEL_NAME}: {performance}");

    if let Some(cell) = field.first_non_finite() {
        return Err(CorrectError::NonFinite {
            field: variable.name(),
            cell,
        });
    }

    let clipped = clip(field, floor);
    if clipped > 0 {
        warn!("{MODEL_NAME}: bounding {variable}, {clipped} cells raised to {floor:e}");
    }
    Ok(())
}

/// Raises every cell below `floor` to it and returns how many moved.
fn clip(field: &mut ScalarField, floor: f64) -> usize {
    let mut clipped = 0;
    for v in field.values_mut() {
        if *v < floor {
            *v = floor;
            clipped += 1;
        }
    }
    clipped
}

fn mean(field: &ScalarField) -> f64 {
    if field.is_empty() {
        0.0
    } else {
        field.iter().sum::<f64>() / field.len() as f64
    }
}
