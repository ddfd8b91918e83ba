//! Path resolution and filesystem helpers shared by the protoreg crates.
//!
//! Everything that touches the environment goes through [`path::PathResolver`], so callers
//! decide whether the process environment or an explicit map is consulted.

pub mod error;
pub mod fs;
pub mod path;
