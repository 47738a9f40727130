//! Typed, read-only listers over a local cache of agon resources
//!
//! The cache itself is populated out of band: something that watches the cluster
//! feeds [`watcher::Event`](runtime::watcher::Event)s into a
//! [`Writer`](runtime::reflector::store::Writer), and this crate only reads from the
//! resulting [`Store`](runtime::Store).
//!
//! ```
//! use agon::{listers::GameServerLister, runtime::{reflector, watcher::Event}, core::Selector};
//! use agon::{GameServer, GameServerSpec};
//!
//! let (reader, mut writer) = reflector::store::<GameServer>();
//! writer.apply_watcher_event(&Event::Apply(
//!     GameServer::new("alpha", GameServerSpec::default()).within("default").label("tier", "a"),
//! ));
//!
//! let lister = GameServerLister::new(reader);
//! let tier_a: Selector = "tier=a".parse()?;
//! assert_eq!(lister.namespace("default").list(&tier_a)?.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Re-exports from [`agon_core`]
pub use agon_core as core;

/// Re-exports from [`agon_runtime`]
#[cfg(feature = "runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime")))]
pub use agon_runtime as runtime;

#[cfg(feature = "runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime")))]
pub mod listers;

pub use agon_core::{
    GameServer, GameServerSpec, GameServerState, GameServerStatus, NotFound, Resource, ResourceExt,
};

// Kubernetes type bindings used in the public api
pub use k8s_openapi;
