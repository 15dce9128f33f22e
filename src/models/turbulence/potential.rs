//! Turbulent-potential RANS closure.
//!
//! [`TurbulentPotential`] owns the closure state and advances it with
//! [`TurbulentPotential::correct`]. [`ReynoldsStress`] exposes the stress
//! queries of a corrected model as a [`twine_core::Model`].
//!
//! The computational core is in the internal `core` module.

mod core;

pub use self::core::{
    Cep2Variant, ClosureTerms, Coefficients, Config, ConfigError, CorrectError, EpsHatVariant,
    FieldSizeError, FieldStore, InitialFields, Keyword, MODEL_NAME, MeanFlow, MomentumSource,
    NewError, PhiBudget, PhiSourceTerms, PotentialTerms, Production, PsiProduction, SigmaBlend,
    Sources, Stage, StepState, Switches, TimeScale, TimeScaleLimiter, TransportModel,
    TurbulentPotential, VelocitySizeError, alpha, c_ep2, effective_diffusivity, eps_hat,
    kolmogorov_time_scale, limit_time_scale, nut_frac, production, sigma, time_scale,
    turbulent_reynolds,
};

use twine_core::Model;

use crate::support::{
    field::{SymmTensorField, VectorField},
    fv::FvOperators,
};

/// Stress queries of a model at a given mean velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct StressResults {
    /// Reynolds stress.
    pub r: SymmTensorField,
    /// Deviatoric effective stress.
    pub dev_reff: SymmTensorField,
    /// Momentum-equation source at the input velocity.
    pub momentum_source: MomentumSource,
}

/// Model adapter evaluating the stress of a corrected [`TurbulentPotential`].
///
/// The input is the mean velocity handed to the momentum equation.
#[derive(Debug)]
pub struct ReynoldsStress<'a, D, S, M, C = PotentialTerms> {
    model: &'a TurbulentPotential<D, S, M, C>,
}

impl<'a, D, S, M, C> ReynoldsStress<'a, D, S, M, C> {
    #[must_use]
    pub fn new(model: &'a TurbulentPotential<D, S, M, C>) -> Self {
        Self { model }
    }
}

impl<D, S, M, C> Model for ReynoldsStress<'_, D, S, M, C>
where
    D: FvOperators,
    M: TransportModel,
{
    type Input = VectorField;
    type Output = StressResults;
    type Error = VelocitySizeError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let momentum_source = self.model.div_dev_reff(input)?;
        Ok(StressResults {
            r: self.model.r(),
            dev_reff: self.model.dev_reff(),
            momentum_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::num::NonZeroUsize;

    use nalgebra::Vector3;
    use uom::si::{
        available_energy::joule_per_kilogram, f64::KinematicViscosity,
        kinematic_viscosity::square_meter_per_second,
    };

    use crate::support::{
        constraint::StrictlyPositive,
        dictionary::Dictionary,
        fv::channel::{ChannelMesh, FaceFlux},
        units::{TurbulentKineticEnergy, dissipation_rate},
    };

    #[test]
    fn corrected_model_feeds_the_momentum_equation() {
        let n = NonZeroUsize::new(16).unwrap();
        let mesh = ChannelMesh::new(
            n,
            StrictlyPositive::new(2.0).unwrap(),
            StrictlyPositive::new(0.05).unwrap(),
        );
        let velocity = VectorField::new(
            "U",
            mesh.cell_centres()
                .into_iter()
                .map(|y| Vector3::new(y * (2.0 - y), 0.0, 0.0))
                .collect(),
        );
        let flux = FaceFlux::zero(16);
        let flow = MeanFlow {
            velocity: &velocity,
            flux: &flux,
        };
        let nu = StrictlyPositive::new(KinematicViscosity::new::<square_meter_per_second>(1e-4))
            .unwrap();
        let initial = InitialFields::uniform(
            16,
            TurbulentKineticEnergy::new::<joule_per_kilogram>(0.01),
            dissipation_rate(0.001),
        );

        let mut model =
            TurbulentPotential::new(flow, mesh, nu, Dictionary::new(), initial).unwrap();
        for _ in 0..3 {
            model.correct(flow).unwrap();
        }
        assert_eq!(model.stage(), Stage::Done);

        let stress = ReynoldsStress::new(&model);
        let results = stress.call(&velocity).unwrap();
        assert_eq!(results.r.len(), 16);
        assert!(results.momentum_source.explicit.first_non_finite().is_none());
        assert!(results.momentum_source.diffusivity.iter().all(|d| *d > 1e-4));

        let short = VectorField::uniform("U", 4, Vector3::zeros());
        assert_eq!(
            stress.call(&short).unwrap_err(),
            VelocitySizeError {
                expected: 16,
                found: 4
            }
        );
    }
}
