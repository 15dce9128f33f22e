//! # Twine Turbulence
//!
//! Turbulence closure models for RANS flow solvers, built with the
//! [Twine](https://github.com/isentropic-dev/twine) model conventions.
//!
//! ## Crate layout
//!
//! - [`models`]: Closure models and their [`twine_core::Model`] adapters.
//! - [`support`]: Fields, finite-volume collaborators, coefficient
//!   dictionaries, units and numeric constraints used by models.
//!
//! ## Coupling to a flow solver
//!
//! A closure never discretizes anything itself. The host implements
//! [`support::fv::FvOperators`] and [`support::fv::EquationSolver`] for its
//! mesh, passes the current velocity and face flux to each correction step,
//! and reads the momentum source back. [`support::fv::channel::ChannelMesh`]
//! is a small reference host for fully developed channel flow.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Utility code starts in a model's internal `core` module and moves to
//! [`support`] once more than one model needs it.

pub mod models;
pub mod support;
