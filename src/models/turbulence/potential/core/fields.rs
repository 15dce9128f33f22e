//! Persistent per-cell state of the model.
//!
//! Fields are allocated once at construction and then only overwritten in
//! place, so their cell counts never change.

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;
use uom::si::available_energy::joule_per_kilogram;

use crate::support::{
    field::{ScalarField, TensorField, VectorField},
    units::{DissipationRate, TurbulentKineticEnergy},
};

/// Starting values for the transported fields, e.g. from a restart.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialFields {
    pub k: ScalarField,
    pub epsilon: ScalarField,
    pub phi: ScalarField,
    pub psi: VectorField,
    /// Eddy viscosity; computed from the other fields when absent.
    pub nut: Option<ScalarField>,
}

impl InitialFields {
    /// Uniform isotropic turbulence: `φ = 2k/3` and `ψ = 0`.
    #[must_use]
    pub fn uniform(n_cells: usize, k: TurbulentKineticEnergy, epsilon: DissipationRate) -> Self {
        let k = k.get::<joule_per_kilogram>();
        Self {
            k: ScalarField::uniform("k", n_cells, k),
            epsilon: ScalarField::uniform("epsilon", n_cells, epsilon.value),
            phi: ScalarField::uniform("phi", n_cells, 2.0 / 3.0 * k),
            psi: VectorField::uniform("psi", n_cells, Vector3::zeros()),
            nut: None,
        }
    }
}

/// An initial field does not fit the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("initial field '{field}' has {found} cells, the mesh has {expected}")]
pub struct FieldSizeError {
    pub field: String,
    pub expected: usize,
    pub found: usize,
}

/// Budget of the phi equation, kept when `debugWrite` is on.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiBudget {
    pub pressure_strain: ScalarField,
    pub pressure_diffusion: ScalarField,
    pub dissipation: ScalarField,
    pub viscous_diffusion: ScalarField,
    pub turbulent_diffusion: ScalarField,
}

/// Every persistent field of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore {
    // Transported state.
    pub k: ScalarField,
    pub epsilon: ScalarField,
    pub phi: ScalarField,
    pub psi: VectorField,
    pub nut: ScalarField,

    // Mean flow.
    pub grad_u: TensorField,
    pub vorticity: VectorField,

    // Diagnostics of the last completed step.
    pub eps_hat: ScalarField,
    pub eps_hat_ratio: ScalarField,
    pub kolmogorov: ScalarField,
    pub time_scale: ScalarField,
    pub production: ScalarField,
    pub production_3d: ScalarField,
    pub grad_k: VectorField,
    pub k_sqrt: ScalarField,
    pub grad_k_sqrt: VectorField,
    pub phi_sqrt: ScalarField,
    pub grad_phi: VectorField,
    pub grad_psi: TensorField,

    // Diffusion multipliers and the dynamic dissipation coefficient.
    pub sigma_k: ScalarField,
    pub sigma_epsilon: ScalarField,
    pub sigma_phi: ScalarField,
    pub sigma_psi: ScalarField,
    pub c_ep2: ScalarField,

    pub phi_budget: Option<PhiBudget>,
}

impl FieldStore {
    /// Allocates every field, checking the initial values against the mesh.
    ///
    /// Derived fields start at zero (sigmas and `cEp2` at one) until the
    /// first correction step fills them in. The eddy viscosity, when not
    /// supplied, is filled by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSizeError`] if any initial field does not have `n_cells` cells.
    pub fn new(n_cells: usize, initial: InitialFields) -> Result<Self, FieldSizeError> {
        let check = |name: &str, found: usize| {
            if found == n_cells {
                Ok(())
            } else {
                Err(FieldSizeError {
                    field: name.to_owned(),
                    expected: n_cells,
                    found,
                })
            }
        };
        check("k", initial.k.len())?;
        check("epsilon", initial.epsilon.len())?;
        check("phi", initial.phi.len())?;
        check("psi", initial.psi.len())?;
        if let Some(nut) = &initial.nut {
            check("nut", nut.len())?;
        }

        let scalar = |name: &str, value: f64| ScalarField::uniform(name, n_cells, value);
        let vector = |name: &str| VectorField::uniform(name, n_cells, Vector3::zeros());
        let tensor = |name: &str| TensorField::uniform(name, n_cells, Matrix3::zeros());

        let InitialFields {
            k,
            epsilon,
            phi,
            psi,
            nut,
        } = initial;

        Ok(Self {
            eps_hat: epsilon.clone().renamed("epsHat"),
            k: k.renamed("k"),
            epsilon: epsilon.renamed("epsilon"),
            phi: phi.renamed("phi"),
            psi: psi.renamed("psi"),
            nut: nut.map_or_else(|| scalar("nut", 0.0), |nut| nut.renamed("nut")),
            grad_u: tensor("grad(U)"),
            vorticity: vector("vorticity"),
            eps_hat_ratio: scalar("eHrC", 1.0),
            kolmogorov: scalar("kol", 0.0),
            time_scale: scalar("Ts", 0.0),
            production: scalar("tpProd", 0.0),
            production_3d: scalar("tpProd3d", 0.0),
            grad_k: vector("gradk"),
            k_sqrt: scalar("kSqrt", 0.0),
            grad_k_sqrt: vector("gradkSqrt"),
            phi_sqrt: scalar("phiSqrt", 0.0),
            grad_phi: vector("gradTpphi"),
            grad_psi: tensor("gradTppsi"),
            sigma_k: scalar("sigmaK", 1.0),
            sigma_epsilon: scalar("sigmaEps", 1.0),
            sigma_phi: scalar("sigmaPhi", 1.0),
            sigma_psi: scalar("sigmaPsi", 1.0),
            c_ep2: scalar("cEp2", 1.0),
            phi_budget: None,
        })
    }

    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.k.len()
    }
}
