//! Trait definitions for Cybsi operations.
//!
//! Each resource type implements the traits its endpoints support, keeping
//! path and payload differences inside the implementations.

mod edit;
mod get;
mod list;
mod register;

pub use edit::Edit;
pub use get::Get;
pub use list::List;
pub use register::Register;
