//! Domain types
//!
//! - Tool catalog and tool argument parsing
//! - Downstream vacation API response bodies

mod tools;
mod vacation;

pub use tools::*;
pub use vacation::*;
