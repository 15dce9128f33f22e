use std::marker::PhantomData;

use uom::{
    si::{ISQ, Quantity, SI},
    typenum::{N3, P2, Z0},
};

/// Turbulent kinetic energy per unit mass, m²/s² in SI.
///
/// Dimensionally identical to [`uom::si::f64::AvailableEnergy`], so values are
/// constructed with the `available_energy` units.
pub type TurbulentKineticEnergy = uom::si::f64::AvailableEnergy;

/// Dissipation rate of turbulent kinetic energy, m²/s³ in SI.
pub type DissipationRate = Quantity<ISQ<P2, Z0, N3, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Creates a [`DissipationRate`] from a value in m²/s³.
///
/// `uom` has no named unit for this dimension, so the SI value is taken as is.
#[must_use]
pub fn dissipation_rate(square_meters_per_cubic_second: f64) -> DissipationRate {
    DissipationRate {
        dimension: PhantomData,
        units: PhantomData,
        value: square_meters_per_cubic_second,
    }
}
