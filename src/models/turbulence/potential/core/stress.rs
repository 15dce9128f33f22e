//! Reynolds stress and the momentum-equation source term.
//!
//! These read the fields of the last completed step and never modify them.
//! Called while [`TurbulentPotential::stage`] is neither `Idle` nor `Done`,
//! they see a partially updated state.

use nalgebra::Matrix3;
use thiserror::Error;

use crate::support::{
    field::{ScalarField, SymmTensorField, TensorField, VectorField, dev, symm},
    fv::FvOperators,
};

use super::{TransportModel, TurbulentPotential, nu_si};

/// Contribution of the turbulence model to the momentum equation.
///
/// The host adds `laplacian(diffusivity, U) + explicit` to its right-hand
/// side, treating the Laplacian implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumSource {
    /// Effective viscosity `νt + ν`.
    pub diffusivity: ScalarField,
    /// Explicit remainder of the effective stress divergence.
    pub explicit: VectorField,
}

/// The velocity does not fit the model's mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("velocity has {found} cells, the mesh has {expected}")]
pub struct VelocitySizeError {
    pub expected: usize,
    pub found: usize,
}

impl<D, S, M, C> TurbulentPotential<D, S, M, C>
where
    D: FvOperators,
    M: TransportModel,
{
    /// Reynolds stress `R = (2/3) k I − 2 cMu T phiS`.
    ///
    /// `phiS` is [`Self::phi_s`] and `T` the stored time scale, so `R` follows
    /// the potentials even where `νt` is frozen or floored.
    #[must_use]
    pub fn r(&self) -> SymmTensorField {
        let f = &self.fields;
        let k_part = f.k.map("R", |k| Matrix3::identity() * (2.0 / 3.0 * k));
        k_part.zip_map(&self.potential_stress(), "R", |iso, s| iso - s * 2.0)
    }

    /// Deviatoric effective stress `dev(R) − ν dev(2 symm(∇U))`.
    ///
    /// Equal to `−(cMu T φ + ν) dev(2 symm(∇U))`.
    #[must_use]
    pub fn dev_reff(&self) -> SymmTensorField {
        let nu = nu_si(&self.transport);
        self.potential_stress()
            .zip_map(&self.fields.grad_u, "devRhoReff", |s, g| {
                dev(s) * -2.0 - dev(&(symm(g) * 2.0)) * nu
            })
    }

    /// Momentum source for the velocity `velocity`.
    ///
    /// The explicit part is
    /// `−div((νt + ν) dev(∇Uᵀ)) − 2 div(cMu T φ symm(∇U) − νt symm(∇U))`,
    /// the turbulent-potential stress replacing the eddy-viscosity one.
    ///
    /// # Errors
    ///
    /// Returns a [`VelocitySizeError`] if `velocity` does not have one value
    /// per cell.
    pub fn div_dev_reff(
        &self,
        velocity: &VectorField,
    ) -> Result<MomentumSource, VelocitySizeError> {
        let f = &self.fields;
        if velocity.len() != f.n_cells() {
            return Err(VelocitySizeError {
                expected: f.n_cells(),
                found: velocity.len(),
            });
        }

        let nu = nu_si(&self.transport);
        let c_mu = self.config.coefficients.c_mu.get();

        let grad_u = self.discretization.grad_vector(velocity);
        let stress = TensorField::new(
            "divDevReffStress",
            (0..f.n_cells())
                .map(|i| {
                    let g = grad_u[i];
                    let s = symm(&g);
                    let viscous = dev(&g.transpose()) * (f.nut[i] + nu);
                    let potential = s * (c_mu * f.time_scale[i] * f.phi[i]) - s * f.nut[i];
                    viscous + potential * 2.0
                })
                .collect(),
        );

        Ok(MomentumSource {
            diffusivity: f.nut.map("DEff", |nut| nut + nu),
            explicit: self
                .discretization
                .div_tensor(&stress)
                .map("divDevReff", |v| -v),
        })
    }

    /// `cMu T phiS` on the stored gradient.
    fn potential_stress(&self) -> SymmTensorField {
        let c_mu = self.config.coefficients.c_mu.get();
        self.phi_s()
            .zip_map(&self.fields.time_scale, "cMuTphiS", |s, t| s * (c_mu * t))
    }
}
