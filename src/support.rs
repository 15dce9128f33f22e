//! Supporting utilities used by models.
//!
//! Everything here is public because it is useful when wiring a closure model
//! into a host solver, but the APIs are not stable.
//!
//! - [`constraint`]: Numeric invariants checked at construction time.
//! - [`dictionary`]: The coefficient dictionary a host hands to a model.
//! - [`field`]: Dense per-cell field containers.
//! - [`fv`]: Finite-volume collaborator traits and a reference discretization.
//! - [`units`]: Extensions to [`uom`] for turbulence quantities.

pub mod constraint;
pub mod dictionary;
pub mod field;
pub mod fv;
pub mod units;
