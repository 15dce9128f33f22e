//! Extensions to [`uom`].
//!
//! This crate uses [`uom`] wherever a physical quantity crosses an API
//! boundary (molecular viscosity, clipping floors, initial conditions).
//! Per-cell field arithmetic stays in raw SI `f64` values.
//!
//! ## Quantities
//!
//! [`TurbulentKineticEnergy`] and [`DissipationRate`] name the two energy
//! quantities of every two-equation closure:
//!
//! ```
//! use uom::si::available_energy::joule_per_kilogram;
//! use twine_turbulence::support::units::{TurbulentKineticEnergy, dissipation_rate};
//!
//! let k = TurbulentKineticEnergy::new::<joule_per_kilogram>(0.5);
//! let epsilon = dissipation_rate(0.1);
//! assert_eq!((k / epsilon).value, 5.0); // seconds
//! ```
//!
//! ## Dimension tags
//!
//! Coefficient dictionaries tag entries with [`Dimensions`], the exponent
//! vector of the seven SI base dimensions, so a mis-dimensioned entry is
//! rejected before it reaches a formula.

mod dimensions;
mod quantities;

pub use dimensions::Dimensions;
pub use quantities::{DissipationRate, TurbulentKineticEnergy, dissipation_rate};
