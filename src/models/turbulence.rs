//! Turbulence closure models.
//!
//! A closure owns its transported fields and is advanced once per outer
//! iteration of a host flow solver, which supplies the finite-volume
//! operators and the implicit equation solver.

pub mod potential;
