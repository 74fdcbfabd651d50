//! Value model for the converter.
//!
//! - [`Value`]: scalars, containers, bytes, date-times, adapter-backed
//!   objects, and zero-argument producers
//! - [`ObjectAccess`]: the adapter trait that exposes attribute access as
//!   key access

mod object;
mod types;

pub use object::ObjectAccess;
pub use types::{Thunk, Value};
