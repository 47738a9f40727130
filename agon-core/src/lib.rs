//! Crate with types and traits shared by the agon listers
//!
//! This crate is client-less: it holds the [`GameServer`] resource definition,
//! the [`Resource`] accessor traits, label [`Selector`](labels::Selector)s and the
//! error types surfaced by lookups.
//! The same information here is always re-exported from `agon` under `agon::core`.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod gameserver;
pub use gameserver::{GameServer, GameServerSpec, GameServerState, GameServerStatus, PortPolicy};

pub mod labels;
pub use labels::{Everything, Expression, ParseSelectorError, Selector, SelectorExt};

mod resource;
pub use resource::{ClusterResourceScope, NamespaceResourceScope, ObjectMeta, Resource, ResourceExt};

mod error;
pub use error::{ErrorResponse, NotFound, StatusDetails, REASON_NOT_FOUND};
