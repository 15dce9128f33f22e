//! Production and destruction terms of the transported equations.
//!
//! Each equation has the form
//!
//! ```text
//! ddt(x) + div(flux, x) − laplacian(D_x, x) = explicit − implicit·x
//! ```
//!
//! and a [`ClosureTerms`] implementation supplies `explicit` and `implicit`
//! for each variable plus the eddy-viscosity relation. [`PotentialTerms`] is
//! the turbulent-potential closure; other closures of the same family plug in
//! by implementing the trait.

use nalgebra::Vector3;

use crate::support::field::{Field, ScalarField, VectorField};

use super::{
    config::{Config, PsiProduction},
    derived::{Derived, Diffusivities},
    fields::FieldStore,
};

/// Everything a closure may read while assembling one equation.
///
/// `fields` holds the values updated so far in the current step and
/// `derived` was recomputed from them.
#[derive(Debug, Clone, Copy)]
pub struct StepState<'a> {
    pub config: &'a Config,
    pub nu: f64,
    pub fields: &'a FieldStore,
    pub derived: &'a Derived,
    pub diffusivities: &'a Diffusivities,
}

impl<'a> StepState<'a> {
    #[must_use]
    pub fn new(
        config: &'a Config,
        nu: f64,
        fields: &'a FieldStore,
        derived: &'a Derived,
        diffusivities: &'a Diffusivities,
    ) -> Self {
        Self {
            config,
            nu,
            fields,
            derived,
            diffusivities,
        }
    }
}

/// Explicit source and implicit sink coefficient of one equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sources<T> {
    pub explicit: Field<T>,
    /// Non-negative coefficient multiplying the unknown.
    pub implicit: ScalarField,
}

/// Split of the phi source for budget diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiSourceTerms {
    pub pressure_strain: ScalarField,
    pub pressure_diffusion: ScalarField,
    pub dissipation: ScalarField,
}

/// Closed-form source terms of a turbulent-potential closure.
pub trait ClosureTerms {
    fn k(&self, state: &StepState<'_>) -> Sources<f64>;

    fn epsilon(&self, state: &StepState<'_>) -> Sources<f64>;

    fn phi(&self, state: &StepState<'_>) -> Sources<f64>;

    fn psi(&self, state: &StepState<'_>) -> Sources<Vector3<f64>>;

    /// Eddy viscosity before flooring.
    fn eddy_viscosity(&self, state: &StepState<'_>) -> ScalarField;

    /// Splits the phi source into budget terms, if the closure can.
    fn phi_budget(&self, _state: &StepState<'_>) -> Option<PhiSourceTerms> {
        None
    }
}

/// The turbulent-potential closure.
///
/// With `T` the limited time scale, `G` the production, `α` the blending
/// factor and `ω` the vorticity:
///
/// | equation | explicit | implicit |
/// |---|---|---|
/// | k | `G` | `ε/k` |
/// | ε | `cEp1 G/T` | `cEp2/T` |
/// | φ | `cPphi α G φ/k + cP1 (2/3) k/T + cD1 (νt/k) ∇k·∇φ` | `(cP1 + 1)/T + cP4 ν \|∇√k\|²/k` |
/// | ψ | `cP2 φ ω` (or `2 cP2 α φ ω`) | `cP3/T + (cVv1 ν + cTv1 νt) \|∇√k\|²/k` |
///
/// and `νt = cMu φ T`. Denominators use the floored fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PotentialTerms;

fn cellwise(name: &str, n_cells: usize, f: impl Fn(usize) -> f64) -> ScalarField {
    Field::new(name, (0..n_cells).map(f).collect())
}

impl PotentialTerms {
    fn pressure_strain_sources(state: &StepState<'_>, i: usize) -> (f64, f64) {
        let c = &state.config.coefficients;
        let d = state.derived;
        let f = state.fields;

        let rapid = c.c_pphi.get() * d.alpha[i] * d.production[i] * f.phi[i] / d.k_safe[i];
        let slow = c.c_p1.get() * (2.0 / 3.0) * f.k[i] / d.time_scale[i];
        (rapid, slow)
    }

    fn pressure_diffusion(state: &StepState<'_>, i: usize) -> f64 {
        let d = state.derived;
        state.config.coefficients.c_d1.get() * d.nut_safe[i] / d.k_safe[i]
            * d.grad_k[i].dot(&d.grad_phi[i])
    }
}

impl ClosureTerms for PotentialTerms {
    fn k(&self, state: &StepState<'_>) -> Sources<f64> {
        let d = state.derived;
        Sources {
            explicit: d.production.clone().renamed("kSource"),
            implicit: d.epsilon_safe.zip_map(&d.k_safe, "kSink", |e, k| e / k),
        }
    }

    fn epsilon(&self, state: &StepState<'_>) -> Sources<f64> {
        let d = state.derived;
        let c_ep1 = state.config.coefficients.c_ep1.get();
        Sources {
            explicit: d
                .production
                .zip_map(&d.time_scale, "epsilonSource", |g, t| c_ep1 * g / t),
            implicit: d.c_ep2.zip_map(&d.time_scale, "epsilonSink", |c, t| c / t),
        }
    }

    fn phi(&self, state: &StepState<'_>) -> Sources<f64> {
        let c = &state.config.coefficients;
        let d = state.derived;
        let n = state.fields.n_cells();

        Sources {
            explicit: cellwise("phiSource", n, |i| {
                let (rapid, slow) = Self::pressure_strain_sources(state, i);
                rapid + slow + Self::pressure_diffusion(state, i)
            }),
            implicit: cellwise("phiSink", n, |i| {
                (c.c_p1.get() + 1.0) / d.time_scale[i]
                    + c.c_p4.get() * state.nu * d.grad_k_sqrt_sq[i] / d.k_safe[i]
            }),
        }
    }

    fn psi(&self, state: &StepState<'_>) -> Sources<Vector3<f64>> {
        let c = &state.config.coefficients;
        let d = state.derived;
        let f = state.fields;
        let n = f.n_cells();

        let explicit = (0..n)
            .map(|i| {
                let weight = match state.config.switches.psi_production {
                    PsiProduction::Phi => c.c_p2.get(),
                    PsiProduction::Alpha => c.c_p2.get() * 2.0 * d.alpha[i],
                };
                d.vorticity[i] * (weight * f.phi[i])
            })
            .collect();

        Sources {
            explicit: VectorField::new("psiSource", explicit),
            implicit: cellwise("psiSink", n, |i| {
                let viscous = c.c_vv1.get() * state.nu + c.c_tv1.get() * f.nut[i];
                c.c_p3.get() / d.time_scale[i] + viscous * d.grad_k_sqrt_sq[i] / d.k_safe[i]
            }),
        }
    }

    fn eddy_viscosity(&self, state: &StepState<'_>) -> ScalarField {
        let c_mu = state.config.coefficients.c_mu.get();
        state
            .fields
            .phi
            .zip_map(&state.derived.time_scale, "nut", |phi, t| c_mu * phi * t)
    }

    fn phi_budget(&self, state: &StepState<'_>) -> Option<PhiSourceTerms> {
        let c = &state.config.coefficients;
        let d = state.derived;
        let f = state.fields;
        let n = f.n_cells();

        Some(PhiSourceTerms {
            pressure_strain: cellwise("phiPressureStrain", n, |i| {
                let (rapid, slow) = Self::pressure_strain_sources(state, i);
                rapid + slow - c.c_p1.get() * f.phi[i] / d.time_scale[i]
            }),
            pressure_diffusion: cellwise("phiPressureDiff", n, |i| {
                Self::pressure_diffusion(state, i)
            }),
            dissipation: cellwise("phiDiss", n, |i| {
                -f.phi[i]
                    * (1.0 / d.time_scale[i]
                        + c.c_p4.get() * state.nu * d.grad_k_sqrt_sq[i] / d.k_safe[i])
            }),
        })
    }
}
