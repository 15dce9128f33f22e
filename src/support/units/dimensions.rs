use std::fmt;

use serde::{Deserialize, Serialize};

/// Exponents of the seven SI base dimensions carried by a dictionary entry.
///
/// The order is mass, length, time, temperature, amount of substance,
/// electric current, luminous intensity, matching the bracketed notation
/// `[0 2 -2 0 0 0 0]` used by finite-volume dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i8; 7]", into = "[i8; 7]")]
pub struct Dimensions {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub temperature: i8,
    pub moles: i8,
    pub current: i8,
    pub luminous_intensity: i8,
}

impl Dimensions {
    /// A pure number.
    pub const NONE: Self = Self::new([0, 0, 0, 0, 0, 0, 0]);

    /// m²/s, kinematic viscosity.
    pub const KINEMATIC_VISCOSITY: Self = Self::new([0, 2, -1, 0, 0, 0, 0]);

    /// m²/s², specific energy.
    pub const SPECIFIC_ENERGY: Self = Self::new([0, 2, -2, 0, 0, 0, 0]);

    /// m²/s³, dissipation rate.
    pub const DISSIPATION_RATE: Self = Self::new([0, 2, -3, 0, 0, 0, 0]);

    /// Creates dimensions from exponents in SI base order.
    #[must_use]
    pub const fn new(exponents: [i8; 7]) -> Self {
        let [mass, length, time, temperature, moles, current, luminous_intensity] = exponents;
        Self {
            mass,
            length,
            time,
            temperature,
            moles,
            current,
            luminous_intensity,
        }
    }

    /// Returns the exponents in SI base order.
    #[must_use]
    pub const fn exponents(self) -> [i8; 7] {
        [
            self.mass,
            self.length,
            self.time,
            self.temperature,
            self.moles,
            self.current,
            self.luminous_intensity,
        ]
    }

    /// True for a pure number.
    #[must_use]
    pub fn is_dimensionless(self) -> bool {
        self == Self::NONE
    }
}

impl From<[i8; 7]> for Dimensions {
    fn from(exponents: [i8; 7]) -> Self {
        Self::new(exponents)
    }
}

impl From<Dimensions> for [i8; 7] {
    fn from(dimensions: Dimensions) -> Self {
        dimensions.exponents()
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [m, l, t, th, n, i, j] = self.exponents();
        write!(f, "[{m} {l} {t} {th} {n} {i} {j}]")
    }
}
