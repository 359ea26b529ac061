#![forbid(unsafe_code)]

//! Core: node identity, geometry, the host-tree interface, and layering
//! variables for the Stratum layering engine.

pub mod active;
pub mod clock;
pub mod error;
pub mod geometry;
pub mod host;
pub mod node;
pub mod vars;
