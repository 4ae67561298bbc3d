//! Core trait abstractions for the discovery library.
//!
//! These traits define the external collaborators that applications
//! implement: the reasoning service and the source probe.

pub mod probe;
pub mod reasoner;
