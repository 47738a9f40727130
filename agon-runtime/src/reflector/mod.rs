//! Caches objects in memory

mod object_ref;
mod ready_token;
pub mod store;

pub use self::object_ref::ObjectRef;
pub use store::{store, Store};
