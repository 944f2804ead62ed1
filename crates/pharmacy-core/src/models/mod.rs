//! Domain models for the pharmacy core.

mod audit;
mod catalog;
mod party;
mod prescription;

pub use audit::*;
pub use catalog::*;
pub use party::*;
pub use prescription::*;
