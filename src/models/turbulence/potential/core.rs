//! Turbulent-potential closure.
//!
//! The model transports turbulent kinetic energy `k`, its dissipation `ε`, and
//! the scalar and vector turbulent potentials `φ` and `ψ`, then closes the
//! eddy viscosity as `νt = cMu φ T`. Each call to
//! [`TurbulentPotential::correct`] advances all four equations by one implicit
//! step in the fixed order k, ε, φ, ψ, νt, each solve seeing the fields
//! updated before it.
//!
//! Configuration comes from the `turbulentPotentialCoeffs` dictionary and can
//! be re-read between steps with [`TurbulentPotential::read`].

mod config;
mod corrector;
mod derived;
mod equations;
mod fields;
mod stress;

#[cfg(test)]
mod test_support;

pub use config::{
    Cep2Variant, Coefficients, Config, ConfigError, EpsHatVariant, Keyword, Production,
    PsiProduction, SigmaBlend, Switches, TimeScale, TimeScaleLimiter,
};
pub use corrector::{CorrectError, Stage};
pub use derived::{
    alpha, c_ep2, effective_diffusivity, eps_hat, kolmogorov_time_scale, limit_time_scale,
    nut_frac, production, sigma, time_scale, turbulent_reynolds,
};
pub use equations::{ClosureTerms, PhiSourceTerms, PotentialTerms, Sources, StepState};
pub use fields::{FieldSizeError, FieldStore, InitialFields, PhiBudget};
pub use stress::{MomentumSource, VelocitySizeError};

use log::{info, warn};
use thiserror::Error;
use uom::si::{f64::KinematicViscosity, kinematic_viscosity::square_meter_per_second};

use crate::support::{
    constraint::{Constrained, StrictlyPositive},
    dictionary::DictionarySource,
    field::{ScalarField, SymmTensorField, TensorField, VectorField, symm},
    fv::{EquationSolver, FvOperators},
};

use derived::derive;

/// Dictionary name of the model; coefficients live under `turbulentPotentialCoeffs`.
pub const MODEL_NAME: &str = "turbulentPotential";

/// Supplies the molecular kinematic viscosity.
pub trait TransportModel {
    fn nu(&self) -> Constrained<KinematicViscosity, StrictlyPositive>;
}

/// A fluid with constant viscosity.
impl TransportModel for Constrained<KinematicViscosity, StrictlyPositive> {
    fn nu(&self) -> Constrained<KinematicViscosity, StrictlyPositive> {
        *self
    }
}

/// The outer solver's current mean flow, borrowed for one call.
#[derive(Debug)]
pub struct MeanFlow<'a, F> {
    pub velocity: &'a VectorField,
    pub flux: &'a F,
}

impl<F> Clone for MeanFlow<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for MeanFlow<'_, F> {}

/// Errors raised while constructing a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NewError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("initial fields do not fit the mesh")]
    FieldSize(#[from] FieldSizeError),

    #[error("velocity has {found} cells, the mesh has {expected}")]
    VelocitySize { expected: usize, found: usize },
}

/// A turbulent-potential RANS closure bound to one mesh.
///
/// - `D` discretizes and solves the transport equations.
/// - `S` supplies the coefficient dictionary.
/// - `M` supplies the molecular viscosity.
/// - `C` supplies the closed-form source terms.
#[derive(Debug)]
pub struct TurbulentPotential<D, S, M, C = PotentialTerms> {
    discretization: D,
    source: S,
    transport: M,
    terms: C,
    config: Config,
    fields: FieldStore,
    stage: Stage,
}

impl<D, S, M> TurbulentPotential<D, S, M, PotentialTerms>
where
    D: FvOperators + EquationSolver,
    S: DictionarySource,
    M: TransportModel,
{
    /// Creates the model with the turbulent-potential source terms.
    ///
    /// # Errors
    ///
    /// Returns a [`NewError`] if the configuration is invalid or a field does
    /// not fit the mesh.
    pub fn new(
        flow: MeanFlow<'_, D::Flux>,
        discretization: D,
        transport: M,
        source: S,
        initial: InitialFields,
    ) -> Result<Self, NewError> {
        Self::with_terms(flow, discretization, transport, source, initial, PotentialTerms)
    }
}

impl<D, S, M, C> TurbulentPotential<D, S, M, C>
where
    D: FvOperators + EquationSolver,
    S: DictionarySource,
    M: TransportModel,
    C: ClosureTerms,
{
    /// Creates the model with custom source terms.
    ///
    /// Reads the configuration, allocates every field, and derives the
    /// diagnostics of the initial state. When `initial.nut` is absent the
    /// eddy viscosity comes from the closure.
    ///
    /// # Errors
    ///
    /// Returns a [`NewError`] if the configuration is invalid or a field does
    /// not fit the mesh.
    pub fn with_terms(
        flow: MeanFlow<'_, D::Flux>,
        discretization: D,
        transport: M,
        source: S,
        initial: InitialFields,
        terms: C,
    ) -> Result<Self, NewError> {
        let dict = source.coeffs(MODEL_NAME).map_err(ConfigError::from)?;
        let config = Config::from_dictionary(&dict)?;

        let n_cells = discretization.n_cells();
        if flow.velocity.len() != n_cells {
            return Err(NewError::VelocitySize {
                expected: n_cells,
                found: flow.velocity.len(),
            });
        }

        let solve_nut = initial.nut.is_none();
        let mut fields = FieldStore::new(n_cells, initial)?;
        let nu = nu_si(&transport);

        let derived = derive(&discretization, flow.velocity, &fields, &config, nu);
        if solve_nut {
            let diffusivities = derived::diffusivities(&fields.nut, &derived, &config, nu);
            let state = StepState::new(&config, nu, &fields, &derived, &diffusivities);
            let nut_min = config.coefficients.nut_min.get().value;
            let nut = terms.eddy_viscosity(&state);
            fields.nut.assign(&nut.map("nut", |v| v.max(nut_min)));
        }
        corrector::record(&mut fields, &derived);

        Ok(Self {
            discretization,
            source,
            transport,
            terms,
            config,
            fields,
            stage: Stage::Idle,
        })
    }

    /// Re-reads coefficients and switches from the dictionary source.
    ///
    /// The new configuration replaces the old one only if every entry is
    /// valid; otherwise the model keeps running with what it had.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] describing the first invalid entry.
    pub fn read(&mut self) -> Result<(), ConfigError> {
        let result = self
            .source
            .coeffs(MODEL_NAME)
            .map_err(ConfigError::from)
            .and_then(|dict| Config::from_dictionary(&dict));

        match result {
            Ok(config) => {
                self.config = config;
                info!("{MODEL_NAME}: coefficients re-read");
                Ok(())
            }
            Err(err) => {
                warn!("{MODEL_NAME}: keeping previous coefficients: {err}");
                Err(err)
            }
        }
    }
}

impl<D, S, M, C> TurbulentPotential<D, S, M, C>
where
    D: FvOperators,
    M: TransportModel,
{
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn coefficients(&self) -> &Coefficients {
        &self.config.coefficients
    }

    #[must_use]
    pub fn switches(&self) -> &Switches {
        &self.config.switches
    }

    /// Every persistent field.
    #[must_use]
    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    /// Progress of the current or last correction step.
    ///
    /// Anything other than [`Stage::Idle`] or [`Stage::Done`] means a step
    /// failed part way and the fields are not mutually consistent.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn discretization(&self) -> &D {
        &self.discretization
    }

    /// Mutable access to the discretization, e.g. to change the time step.
    pub fn discretization_mut(&mut self) -> &mut D {
        &mut self.discretization
    }

    /// Molecular kinematic viscosity.
    #[must_use]
    pub fn nu(&self) -> KinematicViscosity {
        self.transport.nu().into_inner()
    }

    #[must_use]
    pub fn nut(&self) -> &ScalarField {
        &self.fields.nut
    }

    #[must_use]
    pub fn k(&self) -> &ScalarField {
        &self.fields.k
    }

    #[must_use]
    pub fn epsilon(&self) -> &ScalarField {
        &self.fields.epsilon
    }

    #[must_use]
    pub fn eps_hat(&self) -> &ScalarField {
        &self.fields.eps_hat
    }

    #[must_use]
    pub fn vorticity(&self) -> &VectorField {
        &self.fields.vorticity
    }

    /// Scalar turbulent potential `φ`.
    #[must_use]
    pub fn phi(&self) -> &ScalarField {
        &self.fields.phi
    }

    /// Vector turbulent potential `ψ`.
    #[must_use]
    pub fn psi(&self) -> &VectorField {
        &self.fields.psi
    }

    /// Production of turbulent kinetic energy in the last step.
    #[must_use]
    pub fn psi_production(&self) -> &ScalarField {
        &self.fields.production
    }

    /// Full three-dimensional production `−R:∇U`.
    #[must_use]
    pub fn production_3d(&self) -> &ScalarField {
        &self.fields.production_3d
    }

    /// Limited dissipation time scale of the last step.
    #[must_use]
    pub fn time_scale(&self) -> &ScalarField {
        &self.fields.time_scale
    }

    /// Kolmogorov time scale of the last step, from floored `ε`.
    #[must_use]
    pub fn kolmogorov(&self) -> &ScalarField {
        &self.fields.kolmogorov
    }

    /// `ε̂/ε`.
    #[must_use]
    pub fn eps_hat_ratio(&self) -> &ScalarField {
        &self.fields.eps_hat_ratio
    }

    #[must_use]
    pub fn grad_k(&self) -> &VectorField {
        &self.fields.grad_k
    }

    #[must_use]
    pub fn k_sqrt(&self) -> &ScalarField {
        &self.fields.k_sqrt
    }

    #[must_use]
    pub fn grad_k_sqrt(&self) -> &VectorField {
        &self.fields.grad_k_sqrt
    }

    #[must_use]
    pub fn phi_sqrt(&self) -> &ScalarField {
        &self.fields.phi_sqrt
    }

    #[must_use]
    pub fn grad_phi(&self) -> &VectorField {
        &self.fields.grad_phi
    }

    #[must_use]
    pub fn grad_psi(&self) -> &TensorField {
        &self.fields.grad_psi
    }

    /// Dynamic dissipation destruction coefficient of the last step.
    #[must_use]
    pub fn c_ep2(&self) -> &ScalarField {
        &self.fields.c_ep2
    }

    /// Phi budget of the last step, kept only while `debugWrite` is on.
    #[must_use]
    pub fn phi_budget(&self) -> Option<&PhiBudget> {
        self.fields.phi_budget.as_ref()
    }

    /// Kolmogorov time scale `6 sqrt(ν/ε)`, with `ε` floored at `epsilonMin`.
    #[must_use]
    pub fn min_ts(&self) -> ScalarField {
        let nu = nu_si(&self.transport);
        let eps_min = self.config.coefficients.epsilon_min.get().value;
        self.fields.epsilon.map("minTS", |e| {
            derived::kolmogorov_time_scale(nu, e.max(eps_min))
        })
    }

    /// Anisotropy tensor contribution `φ symm(∇U)`.
    #[must_use]
    pub fn phi_s(&self) -> SymmTensorField {
        self.fields
            .phi
            .zip_map(&self.fields.grad_u, "phiS", |phi, g| symm(g) * *phi)
    }

    /// Divergence of [`Self::phi_s`].
    #[must_use]
    pub fn div_phi_s(&self) -> VectorField {
        self.discretization
            .div_tensor(&self.phi_s())
            .renamed("divphiS")
    }

    /// `ψ/φ`, the potential vector per unit scalar potential.
    #[must_use]
    pub fn sreal(&self) -> VectorField {
        self.fields
            .psi
            .zip_map(&self.fields.phi, "sreal", |psi, phi| psi / *phi)
    }

    #[must_use]
    pub fn phi_over_k(&self) -> ScalarField {
        self.fields
            .phi
            .zip_map(&self.fields.k, "PhiOverK", |phi, k| phi / k)
    }

    #[must_use]
    pub fn psi_over_k(&self) -> VectorField {
        self.fields
            .psi
            .zip_map(&self.fields.k, "PsiOverK", |psi, k| psi / *k)
    }

    /// `|∇√k|`.
    #[must_use]
    pub fn grad_sq_k(&self) -> ScalarField {
        self.fields.grad_k_sqrt.map("gradsqK", |g| g.norm())
    }

    /// `∇√φ`.
    #[must_use]
    pub fn grad_phi_sqrt(&self) -> VectorField {
        self.discretization
            .grad(&self.fields.phi_sqrt)
            .renamed("gradtpphisqrt")
    }

    /// Turbulent Reynolds number `k²/(ν ε)`, with `ε` floored at `epsilonMin`.
    #[must_use]
    pub fn re_tau(&self) -> ScalarField {
        self.reynolds("reTau", &self.fields.epsilon)
    }

    /// Turbulent Reynolds number `k²/(ν ε̂)` on the configured epsilon-hat.
    #[must_use]
    pub fn tp_reynolds(&self) -> ScalarField {
        self.reynolds("tpReynolds", &self.fields.eps_hat)
    }

    #[must_use]
    pub fn nut_frac(&self) -> ScalarField {
        let nu = nu_si(&self.transport);
        let c_nf = self.config.coefficients.c_nf.get();
        self.fields
            .nut
            .map("nutFrac", |nut| derived::nut_frac(*nut, nu, c_nf))
    }

    /// Anisotropy blending factor `1/(1 + 1.5 φ/k)`.
    #[must_use]
    pub fn alpha(&self) -> ScalarField {
        self.phi_over_k().map("Alpha", |r| derived::alpha(*r))
    }

    /// Effective diffusivity of `k`.
    #[must_use]
    pub fn dk_eff(&self) -> ScalarField {
        self.effective("DkEff", &self.fields.sigma_k, 1.0)
    }

    /// Effective diffusivity of `ε`.
    #[must_use]
    pub fn depsilon_eff(&self) -> ScalarField {
        let visc = self.config.coefficients.sigma_eps_visc.get();
        self.effective("DepsilonEff", &self.fields.sigma_epsilon, visc)
    }

    /// Effective diffusivity of `φ`.
    #[must_use]
    pub fn dphi_eff(&self) -> ScalarField {
        self.effective("DphiEff", &self.fields.sigma_phi, 1.0)
    }

    /// Effective diffusivity of `ψ`, with a fraction of the molecular part.
    #[must_use]
    pub fn dpsi_eff(&self) -> ScalarField {
        let frac = self.config.coefficients.psi_nu_frac.get();
        self.effective("DpsiEff", &self.fields.sigma_psi, frac)
    }

    /// Effective momentum diffusivity `νt + ν`.
    #[must_use]
    pub fn d_eff(&self) -> ScalarField {
        let nu = nu_si(&self.transport);
        self.fields.nut.map("DEff", |nut| nut + nu)
    }

    fn reynolds(&self, name: &str, dissipation: &ScalarField) -> ScalarField {
        let nu = nu_si(&self.transport);
        let eps_min = self.config.coefficients.epsilon_min.get().value;
        self.fields.k.zip_map(dissipation, name, |k, e| {
            derived::turbulent_reynolds(*k, nu, e.max(eps_min))
        })
    }

    fn effective(&self, name: &str, sigma: &ScalarField, nu_factor: f64) -> ScalarField {
        let nu = nu_si(&self.transport);
        self.fields.nut.zip_map(sigma, name, |nut, sigma| {
            derived::effective_diffusivity(*nut, *sigma, nu, nu_factor)
        })
    }
}

fn nu_si(transport: &impl TransportModel) -> f64 {
    transport.nu().into_inner().get::<square_meter_per_second>()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{
        models::turbulence::potential::core::test_support::{Fixture, NU},
        support::dictionary::Dictionary,
    };

    #[test]
    fn minimum_time_scale_uses_the_floored_dissipation() {
        let mut fx = Fixture::new(Dictionary::new());
        let min_ts = fx.model.min_ts();
        assert_eq!(min_ts.name(), "minTS");
        for i in 0..8 {
            let eps = fx.model.epsilon()[i];
            assert_relative_eq!(min_ts[i], 6.0 * (NU / eps).sqrt(), max_relative = 1e-12);
            assert_relative_eq!(min_ts[i], fx.model.kolmogorov()[i], max_relative = 1e-12);
        }

        fx.model.fields.epsilon.values_mut()[4] = 0.0;
        let floor = fx.model.coefficients().epsilon_min.get().value;
        assert_relative_eq!(
            fx.model.min_ts()[4],
            6.0 * (NU / floor).sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn reynolds_numbers() {
        let mut fx = Fixture::new(Dictionary::new().with("eqnEpsHat", "viscous"));
        fx.step().unwrap();
        let (re_tau, tp_reynolds) = (fx.model.re_tau(), fx.model.tp_reynolds());

        for i in 0..8 {
            let k = fx.model.k()[i];
            let eps = fx.model.epsilon()[i];
            let eps_hat = fx.model.eps_hat()[i];
            assert_relative_eq!(re_tau[i], k * k / (NU * eps), max_relative = 1e-12);
            assert_relative_eq!(tp_reynolds[i], k * k / (NU * eps_hat), max_relative = 1e-12);
            assert!(tp_reynolds[i] >= re_tau[i]);
        }

        fx.model.fields.epsilon.values_mut()[0] = 0.0;
        assert!(fx.model.re_tau()[0].is_finite());
    }

    #[test]
    fn potential_ratios() {
        let mut fx = Fixture::new(Dictionary::new());
        fx.model.fields.phi.values_mut()[2] = 0.0;

        let (phi_over_k, psi_over_k) = (fx.model.phi_over_k(), fx.model.psi_over_k());
        let alpha = fx.model.alpha();
        for i in 0..8 {
            let k = fx.model.k()[i];
            assert_relative_eq!(phi_over_k[i], fx.model.phi()[i] / k, max_relative = 1e-12);
            assert_relative_eq!(psi_over_k[i] * k, fx.model.psi()[i], max_relative = 1e-12);
            assert!(alpha[i] > 0.0 && alpha[i] <= 1.0);
        }
        assert_eq!(alpha[2], 1.0);
        assert_relative_eq!(alpha[3], 1.0 / (1.0 + 1.5 * phi_over_k[3]));
    }

    #[test]
    fn sreal_recovers_psi() {
        let fx = Fixture::new(Dictionary::new());
        let sreal = fx.model.sreal();
        for i in 0..8 {
            let psi = fx.model.psi()[i];
            let scaled = sreal[i] * fx.model.phi()[i];
            assert_relative_eq!(scaled.z, psi.z, epsilon = 1e-15, max_relative = 1e-12);
            assert_eq!(scaled.x, 0.0);
        }
    }

    #[test]
    fn square_root_gradients() {
        let fx = Fixture::new(Dictionary::new());
        let grad_sq_k = fx.model.grad_sq_k();
        for i in 0..8 {
            assert_relative_eq!(grad_sq_k[i], fx.model.grad_k_sqrt()[i].norm());
            assert_relative_eq!(
                fx.model.phi_sqrt()[i].powi(2),
                fx.model.phi()[i],
                max_relative = 1e-12
            );
        }

        let grad_phi_sqrt = fx.model.grad_phi_sqrt();
        assert_eq!(grad_phi_sqrt.name(), "gradtpphisqrt");
        assert_eq!(
            grad_phi_sqrt.values(),
            fx.model.discretization().grad(fx.model.phi_sqrt()).values()
        );
        // Profiles peak at the centreline.
        assert!(grad_phi_sqrt[1].y > 0.0);
        assert!(grad_phi_sqrt[6].y < 0.0);
    }

    #[test]
    fn anisotropy_tensor_and_its_divergence() {
        let fx = Fixture::new(Dictionary::new());
        let phi_s = fx.model.phi_s();
        let fields = fx.model.fields();
        for i in 0..8 {
            let dudy = fields.grad_u[i][(1, 0)];
            assert_relative_eq!(
                phi_s[i][(0, 1)],
                0.5 * fields.phi[i] * dudy,
                max_relative = 1e-12
            );
            assert_eq!(phi_s[i], phi_s[i].transpose());
            assert_eq!(phi_s[i].trace(), 0.0);
        }

        let div = fx.model.div_phi_s();
        assert_eq!(div.name(), "divphiS");
        assert_eq!(
            div.values(),
            fx.model.discretization().div_tensor(&phi_s).values()
        );
        assert!(div.first_non_finite().is_none());
    }

    #[test]
    fn nut_fraction_vanishes_without_eddy_viscosity() {
        let mut fx = Fixture::new(Dictionary::new().with("cNF", 2.0));
        fx.model.fields.nut.values_mut()[0] = 0.0;

        let nut_frac = fx.model.nut_frac();
        assert_eq!(nut_frac[0], 0.0);
        for i in 1..8 {
            let nut = fx.model.nut()[i];
            assert_relative_eq!(nut_frac[i], nut / (nut + 2.0 * NU), max_relative = 1e-12);
        }
    }

    #[test]
    fn effective_diffusivities() {
        let coeffs = Dictionary::new()
            .with("sigmaEpsVisc", 0.5)
            .with("psiNuFrac", 0.25)
            .with("eqnSigmaK", "nutFrac")
            .with("eqnSigmaPhi", "alpha");
        let mut fx = Fixture::new(coeffs);
        fx.step().unwrap();
        fx.model.fields.nut.values_mut()[0] = 0.0;

        let fields = fx.model.fields();
        let dk = fx.model.dk_eff();
        let deps = fx.model.depsilon_eff();
        let dphi = fx.model.dphi_eff();
        let dpsi = fx.model.dpsi_eff();
        let d = fx.model.d_eff();

        assert_eq!(dk[0], NU);
        assert_eq!(d[0], NU);
        assert_eq!(dpsi[0], 0.25 * NU);
        for i in 0..8 {
            let nut = fields.nut[i];
            assert_relative_eq!(dk[i], nut * fields.sigma_k[i] + NU, max_relative = 1e-12);
            assert_relative_eq!(
                deps[i],
                nut * fields.sigma_epsilon[i] + 0.5 * NU,
                max_relative = 1e-12
            );
            assert_relative_eq!(dphi[i], nut * fields.sigma_phi[i] + NU, max_relative = 1e-12);
            assert_relative_eq!(
                dpsi[i],
                nut * fields.sigma_psi[i] + 0.25 * NU,
                max_relative = 1e-12
            );
            assert_relative_eq!(d[i], nut + NU, max_relative = 1e-12);
        }
        assert_eq!(dk.name(), "DkEff");
        assert_eq!(d.name(), "DEff");
    }
}
