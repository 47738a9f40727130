//! Crate with the read side of the agon local cache
//!
//! A [`Writer`](reflector::store::Writer) is fed [`watcher::Event`]s by whatever keeps the
//! cache in sync with the cluster, and any number of [`Store`] read handles are handed out.
//! [`Lister`]s sit on top of a store and answer label-filtered list queries and exact
//! namespace/name lookups.

#![deny(clippy::all)]

pub mod lister;
pub mod reflector;
pub mod watcher;

pub use lister::{Indexer, Lister, NamespacedLister};
pub use reflector::{store, ObjectRef, Store};
