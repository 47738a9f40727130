//! Listers for each agon resource kind
//!
//! Every kind gets the same generic [`Lister`]; the aliases here only pin the kind.
use crate::GameServer;
use agon_runtime::{
    lister::{Lister, NamespacedLister},
    Store,
};

/// Lists `GameServer`s across all namespaces, and scopes to one with [`Lister::namespace`]
pub type GameServerLister<I = Store<GameServer>> = Lister<GameServer, I>;

/// Lists and gets `GameServer`s in one namespace
pub type GameServerNamespaceLister<I = Store<GameServer>> = NamespacedLister<GameServer, I>;
