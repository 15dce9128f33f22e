//! Public Twine models.
//!
//! Models are the primary public interface of this crate.
//!
//! # Organization
//!
//! Models are organized into domain-specific submodules (currently
//! `turbulence`). This organization may evolve as more models are added.
//!
//! # Model structure
//!
//! Each model lives in its own module and contains an internal `core` submodule
//! where the actual computation and domain logic lives. The `core` module is an
//! implementation detail and is **not** re-exported as part of the public API;
//! the model module re-exports the types callers need.
//!
//! Stateful models expose their own step API. Read-only queries are wrapped
//! in thin [`twine_core::Model`] adapters that delegate to the core.

pub mod turbulence;
