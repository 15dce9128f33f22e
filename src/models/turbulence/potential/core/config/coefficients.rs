use uom::si::{
    available_energy::joule_per_kilogram, f64::KinematicViscosity,
    kinematic_viscosity::square_meter_per_second,
};

use crate::support::{
    constraint::{
        Constrained, Constraint, ConstraintError, NonNegative, StrictlyPositive, UnitInterval,
    },
    dictionary::Dictionary,
    units::{Dimensions, DissipationRate, TurbulentKineticEnergy, dissipation_rate},
};

use super::{ConfigError, scalar};

/// Model constants and clipping floors.
///
/// Dimensionless constants are plain `f64`s behind their numeric constraint.
/// Floors carry their physical quantity so they can only be compared with
/// like quantities.
///
/// `c_d2`, `c_pr`, `g_t3` and `c_pw` are read and validated but not used by
/// [`PotentialTerms`]; they are there for other [`ClosureTerms`]
/// implementations.
///
/// [`PotentialTerms`]: crate::models::turbulence::potential::PotentialTerms
/// [`ClosureTerms`]: crate::models::turbulence::potential::ClosureTerms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub c_ep1: Constrained<f64, NonNegative>,
    pub c_ep2_con: Constrained<f64, NonNegative>,
    pub c_ep3: Constrained<f64, NonNegative>,
    pub c_d1: Constrained<f64, NonNegative>,
    pub c_d2: Constrained<f64, NonNegative>,
    pub c_vv1: Constrained<f64, NonNegative>,
    pub c_tv1: Constrained<f64, NonNegative>,
    pub c_p1: Constrained<f64, NonNegative>,
    pub c_p2: Constrained<f64, NonNegative>,
    pub c_p3: Constrained<f64, NonNegative>,
    pub c_p4: Constrained<f64, NonNegative>,
    pub c_pphi: Constrained<f64, NonNegative>,
    pub c_mu: Constrained<f64, NonNegative>,
    pub c_t: Constrained<f64, NonNegative>,
    pub c_pr: Constrained<f64, NonNegative>,
    pub c_ehm: Constrained<f64, NonNegative>,
    pub c_ehr: Constrained<f64, NonNegative>,
    /// Scale of the realizability bound on the time scale.
    pub g_t1: Constrained<f64, StrictlyPositive>,
    pub g_t2: Constrained<f64, NonNegative>,
    pub g_t3: Constrained<f64, NonNegative>,
    /// Weight of molecular viscosity in `nutFrac`.
    pub c_nf: Constrained<f64, StrictlyPositive>,
    pub c_pw: Constrained<f64, NonNegative>,
    pub sigma_k_init: Constrained<f64, NonNegative>,
    pub sigma_eps_init: Constrained<f64, NonNegative>,
    pub sigma_eps_visc: Constrained<f64, NonNegative>,
    pub sigma_phi_init: Constrained<f64, NonNegative>,
    pub sigma_psi_init: Constrained<f64, NonNegative>,
    /// Share of molecular viscosity in the psi diffusivity.
    pub psi_nu_frac: Constrained<f64, UnitInterval>,
    pub k_min: Constrained<TurbulentKineticEnergy, StrictlyPositive>,
    pub epsilon_min: Constrained<DissipationRate, StrictlyPositive>,
    pub phi_min: Constrained<TurbulentKineticEnergy, StrictlyPositive>,
    pub nut_min: Constrained<KinematicViscosity, StrictlyPositive>,
}

impl Default for Coefficients {
    fn default() -> Self {
        let c = Constrained::new_unchecked;
        Self {
            c_ep1: c(1.44),
            c_ep2_con: c(1.83),
            c_ep3: c(0.3),
            c_d1: c(0.5),
            c_d2: c(0.0),
            c_vv1: c(2.0),
            c_tv1: c(0.0),
            c_p1: c(1.8),
            c_p2: c(1.0),
            c_p3: c(1.0),
            c_p4: c(0.0),
            c_pphi: c(2.0),
            c_mu: c(0.21),
            c_t: c(1.0),
            c_pr: c(0.0),
            c_ehm: c(0.1),
            c_ehr: c(10.0),
            g_t1: Constrained::new_unchecked(0.6),
            g_t2: c(1.0),
            g_t3: c(1.0),
            c_nf: Constrained::new_unchecked(1.0),
            c_pw: c(0.0),
            sigma_k_init: c(1.0),
            sigma_eps_init: c(0.833),
            sigma_eps_visc: c(1.0),
            sigma_phi_init: c(1.0),
            sigma_psi_init: c(1.0),
            psi_nu_frac: Constrained::new_unchecked(1.0),
            k_min: Constrained::new_unchecked(TurbulentKineticEnergy::new::<joule_per_kilogram>(
                1e-12,
            )),
            epsilon_min: Constrained::new_unchecked(dissipation_rate(1e-14)),
            phi_min: Constrained::new_unchecked(TurbulentKineticEnergy::new::<joule_per_kilogram>(
                1e-12,
            )),
            nut_min: Constrained::new_unchecked(KinematicViscosity::new::<square_meter_per_second>(
                1e-15,
            )),
        }
    }
}

impl Coefficients {
    /// Reads every coefficient, taking the default for absent keys.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first entry that has the wrong
    /// kind, the wrong dimensions, or violates its constraint.
    pub fn from_dictionary(dict: &Dictionary) -> Result<Self, ConfigError> {
        let d = Self::default();
        let c = |key: &str, default: Constrained<f64, NonNegative>| {
            constrained(dict, key, Dimensions::NONE, default.get(), NonNegative::new)
        };
        let positive = |key: &str, default: Constrained<f64, StrictlyPositive>| {
            constrained(dict, key, Dimensions::NONE, default.get(), StrictlyPositive::new)
        };

        Ok(Self {
            c_ep1: c("cEp1", d.c_ep1)?,
            c_ep2_con: c("cEp2con", d.c_ep2_con)?,
            c_ep3: c("cEp3", d.c_ep3)?,
            c_d1: c("cD1", d.c_d1)?,
            c_d2: c("cD2", d.c_d2)?,
            c_vv1: c("cVv1", d.c_vv1)?,
            c_tv1: c("cTv1", d.c_tv1)?,
            c_p1: c("cP1", d.c_p1)?,
            c_p2: c("cP2", d.c_p2)?,
            c_p3: c("cP3", d.c_p3)?,
            c_p4: c("cP4", d.c_p4)?,
            c_pphi: c("cPphi", d.c_pphi)?,
            c_mu: c("cMu", d.c_mu)?,
            c_t: c("cT", d.c_t)?,
            c_pr: c("cPr", d.c_pr)?,
            c_ehm: c("cEhm", d.c_ehm)?,
            c_ehr: c("cEhR", d.c_ehr)?,
            g_t1: positive("gT1", d.g_t1)?,
            g_t2: c("gT2", d.g_t2)?,
            g_t3: c("gT3", d.g_t3)?,
            c_nf: positive("cNF", d.c_nf)?,
            c_pw: c("cPw", d.c_pw)?,
            sigma_k_init: c("sigmaKInit", d.sigma_k_init)?,
            sigma_eps_init: c("sigmaEpsInit", d.sigma_eps_init)?,
            sigma_eps_visc: c("sigmaEpsVisc", d.sigma_eps_visc)?,
            sigma_phi_init: c("sigmaPhiInit", d.sigma_phi_init)?,
            sigma_psi_init: c("sigmaPsiInit", d.sigma_psi_init)?,
            psi_nu_frac: constrained(
                dict,
                "psiNuFrac",
                Dimensions::NONE,
                d.psi_nu_frac.get(),
                UnitInterval::new,
            )?,
            k_min: constrained(
                dict,
                "kMin",
                Dimensions::SPECIFIC_ENERGY,
                d.k_min.get().value,
                |v| StrictlyPositive::new(TurbulentKineticEnergy::new::<joule_per_kilogram>(v)),
            )?,
            epsilon_min: constrained(
                dict,
                "epsilonMin",
                Dimensions::DISSIPATION_RATE,
                d.epsilon_min.get().value,
                |v| StrictlyPositive::new(dissipation_rate(v)),
            )?,
            phi_min: constrained(
                dict,
                "phiMin",
                Dimensions::SPECIFIC_ENERGY,
                d.phi_min.get().value,
                |v| StrictlyPositive::new(TurbulentKineticEnergy::new::<joule_per_kilogram>(v)),
            )?,
            nut_min: constrained(
                dict,
                "nutMin",
                Dimensions::KINEMATIC_VISCOSITY,
                d.nut_min.get().value,
                |v| StrictlyPositive::new(KinematicViscosity::new::<square_meter_per_second>(v)),
            )?,
        })
    }
}

/// Reads a number and applies its constraint.
fn constrained<T, C>(
    dict: &Dictionary,
    key: &str,
    dimensions: Dimensions,
    default: f64,
    check: impl FnOnce(f64) -> Result<Constrained<T, C>, ConstraintError>,
) -> Result<Constrained<T, C>, ConfigError>
where
    C: Constraint<T>,
{
    let value = scalar(dict, key, dimensions, default)?;
    check(value).map_err(|source| ConfigError::InvalidValue {
        key: key.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::support::dictionary::DimensionedScalar;

    #[test]
    fn defaults() {
        let c = Coefficients::default();
        assert_relative_eq!(c.c_ep1.get(), 1.44);
        assert_relative_eq!(c.c_ep2_con.get(), 1.83);
        assert_relative_eq!(c.c_mu.get(), 0.21);
        assert_relative_eq!(c.sigma_eps_init.get(), 0.833);
        assert_relative_eq!(c.psi_nu_frac.get(), 1.0);
        assert_relative_eq!(c.k_min.get().value, 1e-12);
        assert_relative_eq!(c.epsilon_min.get().value, 1e-14);
        assert_relative_eq!(c.nut_min.get().get::<square_meter_per_second>(), 1e-15);
    }

    #[test]
    fn plain_and_dimensioned_entries() {
        let dict = Dictionary::new()
            .with("cMu", 0.09)
            .with("cEp1", DimensionedScalar::new(Dimensions::NONE, 1.5))
            .with(
                "epsilonMin",
                DimensionedScalar::new(Dimensions::DISSIPATION_RATE, 1e-10),
            )
            .with("kMin", 1e-8);

        let c = Coefficients::from_dictionary(&dict).unwrap();
        assert_eq!(c.c_mu.get(), 0.09);
        assert_eq!(c.c_ep1.get(), 1.5);
        assert_eq!(c.epsilon_min.get().value, 1e-10);
        assert_eq!(c.k_min.get().value, 1e-8);
        assert_eq!(c.c_ep2_con.get(), 1.83);
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let dict = Dictionary::new().with(
            "nutMin",
            DimensionedScalar::new(Dimensions::SPECIFIC_ENERGY, 1e-15),
        );
        assert_eq!(
            Coefficients::from_dictionary(&dict).unwrap_err(),
            ConfigError::DimensionMismatch {
                key: "nutMin".into(),
                expected: Dimensions::KINEMATIC_VISCOSITY,
                found: Dimensions::SPECIFIC_ENERGY,
            }
        );
    }

    #[test]
    fn rejects_non_positive_floor() {
        let dict = Dictionary::new().with("phiMin", 0.0);
        assert_eq!(
            Coefficients::from_dictionary(&dict).unwrap_err(),
            ConfigError::InvalidValue {
                key: "phiMin".into(),
                source: ConstraintError::Zero,
            }
        );
    }

    #[test]
    fn rejects_negative_constant_and_fraction_above_one() {
        let dict = Dictionary::new().with("cP3", -1.0);
        assert!(matches!(
            Coefficients::from_dictionary(&dict),
            Err(ConfigError::InvalidValue {
                ref key,
                source: ConstraintError::Negative,
            }) if key == "cP3"
        ));

        let dict = Dictionary::new().with("psiNuFrac", 1.5);
        assert!(matches!(
            Coefficients::from_dictionary(&dict),
            Err(ConfigError::InvalidValue {
                source: ConstraintError::AboveMaximum,
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_where_a_ratio_needs_a_denominator() {
        for key in ["cNF", "gT1"] {
            let dict = Dictionary::new().with(key, 0.0);
            assert_eq!(
                Coefficients::from_dictionary(&dict).unwrap_err(),
                ConfigError::InvalidValue {
                    key: key.into(),
                    source: ConstraintError::Zero,
                }
            );
        }

        let dict = Dictionary::new().with("cNF", 0.5).with("gT1", 2.0);
        let c = Coefficients::from_dictionary(&dict).unwrap();
        assert_eq!(c.c_nf.get(), 0.5);
        assert_eq!(c.g_t1.get(), 2.0);
    }

    #[test]
    fn reads_auxiliary_constants() {
        let c = Coefficients::default();
        assert_eq!(c.c_d2.get(), 0.0);
        assert_eq!(c.c_pr.get(), 0.0);
        assert_eq!(c.g_t3.get(), 1.0);
        assert_eq!(c.c_pw.get(), 0.0);

        let dict = Dictionary::new()
            .with("cD2", 0.3)
            .with("cPr", 1.2)
            .with("gT3", 0.5)
            .with("cPw", 0.1);
        let c = Coefficients::from_dictionary(&dict).unwrap();
        assert_eq!(c.c_d2.get(), 0.3);
        assert_eq!(c.c_pr.get(), 1.2);
        assert_eq!(c.g_t3.get(), 0.5);
        assert_eq!(c.c_pw.get(), 0.1);

        let dict = Dictionary::new().with("cPw", -0.1);
        assert!(matches!(
            Coefficients::from_dictionary(&dict),
            Err(ConfigError::InvalidValue {
                ref key,
                source: ConstraintError::Negative,
            }) if key == "cPw"
        ));
    }

    #[test]
    fn rejects_words_for_coefficients() {
        let dict = Dictionary::new().with("cT", "one");
        assert!(matches!(
            Coefficients::from_dictionary(&dict),
            Err(ConfigError::WrongKind { expected: "scalar", found: "word", .. })
        ));
    }
}
