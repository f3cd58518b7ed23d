//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table; all public functions are re-exported here.

mod admin;
mod record;
mod stats;
mod token;

pub use admin::*;
pub use record::*;
pub use stats::*;
pub use token::*;
