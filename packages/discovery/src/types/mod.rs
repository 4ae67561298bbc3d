//! Data types flowing through the discovery loop.

pub mod candidate;
pub mod config;
pub mod feedback;
pub mod item;
pub mod outcome;
pub mod round;
