use crate::support::dictionary::Dictionary;

use super::{ConfigError, word};

/// A mode switch value parsed from a keyword.
pub trait Keyword: Sized + Copy {
    /// Every keyword accepted for this switch.
    const ALLOWED: &'static [&'static str];

    fn from_keyword(word: &str) -> Option<Self>;
}

/// On/off switches accept the usual dictionary spellings.
impl Keyword for bool {
    const ALLOWED: &'static [&'static str] = &["on", "off", "true", "false", "yes", "no"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "on" | "true" | "yes" => Some(true),
            "off" | "false" | "no" => Some(false),
            _ => None,
        }
    }
}

/// Blending of a turbulent diffusion multiplier (`eqnSigma*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigmaBlend {
    /// The initial constant everywhere.
    #[default]
    Constant,
    /// Blends towards one where molecular viscosity dominates.
    NutFrac,
    /// Blends towards one as the anisotropy blending factor approaches one.
    Alpha,
}

impl Keyword for SigmaBlend {
    const ALLOWED: &'static [&'static str] = &["constant", "nutFrac", "alpha"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "constant" => Some(Self::Constant),
            "nutFrac" => Some(Self::NutFrac),
            "alpha" => Some(Self::Alpha),
            _ => None,
        }
    }
}

/// Destruction coefficient of the dissipation equation (`eqncEp2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cep2Variant {
    #[default]
    Constant,
    /// Low-Reynolds damping with the turbulent Reynolds number.
    Reynolds,
    /// Interpolation with the anisotropy blending factor.
    Alpha,
}

impl Keyword for Cep2Variant {
    const ALLOWED: &'static [&'static str] = &["constant", "reynolds", "alpha"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "constant" => Some(Self::Constant),
            "reynolds" => Some(Self::Reynolds),
            "alpha" => Some(Self::Alpha),
            _ => None,
        }
    }
}

/// Definition of epsilon-hat (`eqnEpsHat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpsHatVariant {
    /// Epsilon itself.
    #[default]
    Epsilon,
    /// Epsilon less the near-wall viscous part `2ν|∇√k|²`.
    Viscous,
    /// Epsilon damped by the turbulent Reynolds number.
    Reynolds,
}

impl Keyword for EpsHatVariant {
    const ALLOWED: &'static [&'static str] = &["epsilon", "viscous", "reynolds"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "epsilon" => Some(Self::Epsilon),
            "viscous" => Some(Self::Viscous),
            "reynolds" => Some(Self::Reynolds),
            _ => None,
        }
    }
}

/// Dissipation time scale (`timeScaleEps`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeScale {
    /// `k/ε`.
    #[default]
    Standard,
    /// `k/ε̂`.
    EpsHat,
    /// `k/ε` plus a multiple of the Kolmogorov time scale.
    Additive,
}

impl Keyword for TimeScale {
    const ALLOWED: &'static [&'static str] = &["standard", "epsHat", "additive"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "standard" => Some(Self::Standard),
            "epsHat" => Some(Self::EpsHat),
            "additive" => Some(Self::Additive),
            _ => None,
        }
    }
}

/// Bounds applied to the dissipation time scale (`tslimiter`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeScaleLimiter {
    None,
    /// Never shorter than the Kolmogorov time scale.
    #[default]
    Kolmogorov,
    /// Kolmogorov lower bound plus a realizability upper bound.
    Realizable,
}

impl Keyword for TimeScaleLimiter {
    const ALLOWED: &'static [&'static str] = &["none", "kolmogorov", "realizable"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "none" => Some(Self::None),
            "kolmogorov" => Some(Self::Kolmogorov),
            "realizable" => Some(Self::Realizable),
            _ => None,
        }
    }
}

/// Production of turbulent kinetic energy (`prodType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Production {
    /// `ψ·ω`, floored at zero.
    #[default]
    Vorticity,
    /// `2 νt S:S`.
    Strain,
    /// `|ψ||ω|`.
    Magnitude,
}

impl Keyword for Production {
    const ALLOWED: &'static [&'static str] = &["vorticity", "strain", "magnitude"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "vorticity" => Some(Self::Vorticity),
            "strain" => Some(Self::Strain),
            "magnitude" => Some(Self::Magnitude),
            _ => None,
        }
    }
}

/// Production in the psi equation (`psiProd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PsiProduction {
    #[default]
    Phi,
    Alpha,
}

impl Keyword for PsiProduction {
    const ALLOWED: &'static [&'static str] = &["phi", "alpha"];

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "phi" => Some(Self::Phi),
            "alpha" => Some(Self::Alpha),
            _ => None,
        }
    }
}

/// Mode switches selecting closure variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switches {
    pub solve_k: bool,
    pub solve_epsilon: bool,
    pub solve_phi: bool,
    pub solve_psi: bool,
    pub solve_nut: bool,
    pub debug_write: bool,
    pub sigma_k: SigmaBlend,
    pub sigma_epsilon: SigmaBlend,
    pub sigma_phi: SigmaBlend,
    pub sigma_psi: SigmaBlend,
    pub c_ep2: Cep2Variant,
    pub eps_hat: EpsHatVariant,
    pub time_scale: TimeScale,
    pub limiter: TimeScaleLimiter,
    pub production: Production,
    pub psi_production: PsiProduction,
}

impl Default for Switches {
    fn default() -> Self {
        Self {
            solve_k: true,
            solve_epsilon: true,
            solve_phi: true,
            solve_psi: true,
            solve_nut: true,
            debug_write: false,
            sigma_k: SigmaBlend::default(),
            sigma_epsilon: SigmaBlend::default(),
            sigma_phi: SigmaBlend::default(),
            sigma_psi: SigmaBlend::default(),
            c_ep2: Cep2Variant::default(),
            eps_hat: EpsHatVariant::default(),
            time_scale: TimeScale::default(),
            limiter: TimeScaleLimiter::default(),
            production: Production::default(),
            psi_production: PsiProduction::default(),
        }
    }
}

impl Switches {
    /// Reads every switch, taking the default for absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSwitch`] for a value outside its allow-list
    /// and [`ConfigError::WrongKind`] for a non-word entry.
    pub fn from_dictionary(dict: &Dictionary) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            solve_k: switch(dict, "solveK", d.solve_k)?,
            solve_epsilon: switch(dict, "solveEps", d.solve_epsilon)?,
            solve_phi: switch(dict, "solvePhi", d.solve_phi)?,
            solve_psi: switch(dict, "solvePsi", d.solve_psi)?,
            solve_nut: switch(dict, "solveNut", d.solve_nut)?,
            debug_write: switch(dict, "debugWrite", d.debug_write)?,
            sigma_k: switch(dict, "eqnSigmaK", d.sigma_k)?,
            sigma_epsilon: switch(dict, "eqnSigmaEps", d.sigma_epsilon)?,
            sigma_phi: switch(dict, "eqnSigmaPhi", d.sigma_phi)?,
            sigma_psi: switch(dict, "eqnSigmaPsi", d.sigma_psi)?,
            c_ep2: switch(dict, "eqncEp2", d.c_ep2)?,
            eps_hat: switch(dict, "eqnEpsHat", d.eps_hat)?,
            time_scale: switch(dict, "timeScaleEps", d.time_scale)?,
            limiter: switch(dict, "tslimiter", d.limiter)?,
            production: switch(dict, "prodType", d.production)?,
            psi_production: switch(dict, "psiProd", d.psi_production)?,
        })
    }
}

fn switch<K: Keyword>(dict: &Dictionary, key: &str, default: K) -> Result<K, ConfigError> {
    let Some(value) = word(dict, key)? else {
        return Ok(default);
    };
    K::from_keyword(value).ok_or_else(|| ConfigError::UnknownSwitch {
        key: key.to_owned(),
        value: value.to_owned(),
        allowed: K::ALLOWED,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let switches = Switches::from_dictionary(&Dictionary::new()).unwrap();
        assert_eq!(switches, Switches::default());
        assert!(switches.solve_k);
        assert!(!switches.debug_write);
        assert_eq!(switches.limiter, TimeScaleLimiter::Kolmogorov);
    }

    #[test]
    fn reads_every_spelling_of_on_and_off() {
        for (word, expected) in [("on", true), ("yes", true), ("true", true)] {
            let dict = Dictionary::new().with("solvePhi", word);
            assert_eq!(Switches::from_dictionary(&dict).unwrap().solve_phi, expected);
        }
        for word in ["off", "no", "false"] {
            let dict = Dictionary::new().with("solvePhi", word);
            assert!(!Switches::from_dictionary(&dict).unwrap().solve_phi);
        }
    }

    #[test]
    fn reads_variants() {
        let dict = Dictionary::new()
            .with("eqnSigmaEps", "nutFrac")
            .with("eqncEp2", "reynolds")
            .with("eqnEpsHat", "viscous")
            .with("timeScaleEps", "epsHat")
            .with("tslimiter", "realizable")
            .with("prodType", "strain")
            .with("psiProd", "alpha");

        let s = Switches::from_dictionary(&dict).unwrap();
        assert_eq!(s.sigma_epsilon, SigmaBlend::NutFrac);
        assert_eq!(s.sigma_k, SigmaBlend::Constant);
        assert_eq!(s.c_ep2, Cep2Variant::Reynolds);
        assert_eq!(s.eps_hat, EpsHatVariant::Viscous);
        assert_eq!(s.time_scale, TimeScale::EpsHat);
        assert_eq!(s.limiter, TimeScaleLimiter::Realizable);
        assert_eq!(s.production, Production::Strain);
        assert_eq!(s.psi_production, PsiProduction::Alpha);
    }

    #[test]
    fn rejects_unknown_keyword() {
        let dict = Dictionary::new().with("tslimiter", "aggressive");
        let err = Switches::from_dictionary(&dict).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownSwitch {
                key: "tslimiter".into(),
                value: "aggressive".into(),
                allowed: TimeScaleLimiter::ALLOWED,
            }
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let dict = Dictionary::new().with("eqnSigmaK", "NutFrac");
        assert!(matches!(
            Switches::from_dictionary(&dict),
            Err(ConfigError::UnknownSwitch { .. })
        ));
    }

    #[test]
    fn rejects_numbers_for_switches() {
        let dict = Dictionary::new().with("solveK", 1.0);
        assert!(matches!(
            Switches::from_dictionary(&dict),
            Err(ConfigError::WrongKind {
                expected: "word",
                found: "scalar",
                ..
            })
        ));
    }
}
