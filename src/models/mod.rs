//! Cybsi API model types.

mod api_key;
mod common;
mod entity;
mod replist;
mod stored_query;
mod user;

pub use api_key::*;
pub use common::*;
pub use entity::*;
pub use replist::*;
pub use stored_query::*;
pub use user::*;
