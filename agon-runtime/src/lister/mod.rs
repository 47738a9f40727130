//! Typed, label-filtered read access to a local store
//!
//! A [`Lister`] answers cluster-wide list queries and hands out [`NamespacedLister`]s,
//! which restrict listing to one namespace and add exact lookups by name.
//! Both are stateless views over an [`Indexer`]; they never write to it and never retry.
//!
//! ```
//! use agon_core::{Everything, GameServer, GameServerSpec, Selector};
//! use agon_runtime::{lister::Lister, reflector, watcher::Event};
//!
//! let (reader, mut writer) = reflector::store::<GameServer>();
//! let gs = GameServer::new("alpha", GameServerSpec::default())
//!     .within("default")
//!     .label("tier", "a");
//! writer.apply_watcher_event(&Event::Apply(gs));
//!
//! let lister = Lister::new(reader);
//! let tier_a: Selector = "tier=a".parse().unwrap();
//! assert_eq!(lister.list(&tier_a).unwrap().len(), 1);
//!
//! let default = lister.namespace("default");
//! assert!(default.get("alpha").is_ok());
//! assert!(default.get("gamma").unwrap_err().is_not_found());
//! assert!(lister.namespace("other").list(&Everything).unwrap().is_empty());
//! ```

mod indexer;
mod namespaced;

pub use indexer::Indexer;
pub use namespaced::NamespacedLister;

use crate::reflector::{ObjectRef, Store};
use agon_core::{ClusterResourceScope, NamespaceResourceScope, NotFound, Resource, ResourceExt, SelectorExt};
use educe::Educe;
use std::{error::Error as StdError, marker::PhantomData, sync::Arc};
use thiserror::Error;
use tracing::{debug, trace};

/// Failures of a list or get against an [`Indexer`]
///
/// `E` is the indexer's own error type. It is passed through untouched, only annotated with
/// the operation that triggered it.
#[derive(Debug, Error)]
pub enum Error<E>
where
    E: StdError + 'static,
{
    /// The exact lookup found nothing under the requested name
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The store failed to enumerate its entries
    #[error("failed to scan store: {source}")]
    Scan {
        /// The namespace being scanned, `None` for a cluster-wide scan
        namespace: Option<String>,
        /// The store's failure
        #[source]
        source: E,
    },
    /// The store failed to look up a key, as opposed to not finding it
    #[error("failed to look up {key} in store: {source}")]
    Lookup {
        /// The store key that was asked for
        key: String,
        /// The store's failure
        #[source]
        source: E,
    },
}

impl<E: StdError + 'static> Error<E> {
    /// Whether the object simply wasn't there
    ///
    /// Callers waiting on the cache to catch up can retry these, unlike store failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// The `NotFound` details, if this is one
    pub fn not_found(&self) -> Option<&NotFound> {
        match self {
            Error::NotFound(nf) => Some(nf),
            _ => None,
        }
    }
}

/// Convenient alias for `Result<T, lister::Error<E>>`
pub type Result<T, E> = std::result::Result<T, Error<E>>;

/// Cluster-wide read access to objects of kind `K`
///
/// Cheap to clone whenever the indexer is; a [`Store`] is a handle to shared state.
#[derive(Educe)]
#[educe(Clone, Debug)]
pub struct Lister<K, I = Store<K>> {
    indexer: I,
    #[educe(Debug(ignore))]
    _kind: PhantomData<fn() -> K>,
}

impl<K, I> Lister<K, I>
where
    K: Resource,
    I: Indexer<K>,
{
    /// Create a lister over an indexer
    pub fn new(indexer: I) -> Self {
        Self {
            indexer,
            _kind: PhantomData,
        }
    }

    /// List every object in the store whose labels match `selector`
    ///
    /// The order of the result is unspecified. A selector matching nothing gives an empty list.
    pub fn list<S>(&self, selector: &S) -> Result<Vec<Arc<K>>, I::Error>
    where
        S: SelectorExt + ?Sized,
    {
        let entries = self
            .indexer
            .scan_all()
            .map_err(|source| Error::Scan { namespace: None, source })?;
        let ret = select(entries, selector);
        trace!(kind = %K::kind(), matched = ret.len(), "listed objects");
        Ok(ret)
    }

    /// Scope subsequent reads to `namespace`
    ///
    /// `""` restricts reads to objects without a namespace; it does not mean all namespaces.
    pub fn namespace(&self, namespace: &str) -> NamespacedLister<K, I>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        I: Clone,
    {
        NamespacedLister::new(self.indexer.clone(), namespace)
    }

    /// Get a cluster-scoped object by name
    pub fn get(&self, name: &str) -> Result<Arc<K>, I::Error>
    where
        K: Resource<Scope = ClusterResourceScope>,
    {
        get_exact(&self.indexer, ObjectRef::new(name))
    }
}

/// Keep the objects whose labels match `selector`
fn select<K, S>(entries: Vec<(ObjectRef<K>, Arc<K>)>, selector: &S) -> Vec<Arc<K>>
where
    K: Resource,
    S: SelectorExt + ?Sized,
{
    entries
        .into_iter()
        .filter_map(|(_, obj)| selector.matches(ResourceExt::labels(obj.as_ref())).then_some(obj))
        .collect()
}

/// Look `key` up, turning absence into a `NotFound` for the requested name
fn get_exact<K, I>(indexer: &I, key: ObjectRef<K>) -> Result<Arc<K>, I::Error>
where
    K: Resource,
    I: Indexer<K>,
{
    match indexer.get_by_key(&key) {
        Ok(Some(obj)) => Ok(obj),
        Ok(None) => {
            debug!(%key, kind = %K::kind(), "object not found in store");
            Err(NotFound::new::<K>(&key.name).into())
        }
        Err(source) => Err(Error::Lookup {
            key: key.store_key(),
            source,
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Error, Indexer, Lister};
    use crate::{reflector, reflector::ObjectRef, watcher::Event};
    use agon_core::{Everything, GameServer, GameServerSpec, ObjectMeta, Selector};
    use k8s_openapi::api::core::v1::Node;
    use std::sync::Arc;

    /// An indexer whose internals are broken
    #[derive(Clone, Debug, Default)]
    pub(crate) struct BrokenIndexer;

    #[derive(Debug, thiserror::Error)]
    #[error("index corrupted")]
    pub(crate) struct Corrupted;

    impl<K> Indexer<K> for BrokenIndexer {
        type Error = Corrupted;

        fn scan_all(&self) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Corrupted> {
            Err(Corrupted)
        }

        fn scan_namespace(&self, _namespace: &str) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Corrupted> {
            Err(Corrupted)
        }

        fn get_by_key(&self, _key: &ObjectRef<K>) -> Result<Option<Arc<K>>, Corrupted> {
            Err(Corrupted)
        }
    }

    fn node(name: &str) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            ..Node::default()
        }
    }

    #[test]
    fn scan_failure_is_propagated_without_partial_results() {
        let lister = Lister::<GameServer, _>::new(BrokenIndexer);
        let err = lister.list(&Everything).unwrap_err();
        assert!(matches!(err, Error::Scan { namespace: None, source: Corrupted }));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "failed to scan store: index corrupted");
    }

    #[test]
    fn cluster_scoped_get_uses_bare_name() {
        let (reader, mut writer) = reflector::store::<Node>();
        writer.apply_watcher_event(&Event::Apply(node("node-1")));
        let lister = Lister::new(reader);

        assert_eq!(lister.get("node-1").unwrap().metadata.name.as_deref(), Some("node-1"));
        let err = lister.get("node-2").unwrap_err();
        assert_eq!(err.not_found().map(|nf| nf.name.as_str()), Some("node-2"));
        assert_eq!(err.to_string(), r#"node "node-2" not found"#);
    }

    #[test]
    fn cluster_scoped_lookup_failure_is_not_absence() {
        let lister = Lister::<Node, _>::new(BrokenIndexer);
        let err = lister.get("node-1").unwrap_err();
        assert!(matches!(&err, Error::Lookup { key, .. } if key == "node-1"));
        assert!(err.not_found().is_none());
    }

    #[test]
    fn shared_indexer_behaves_like_the_store() {
        let (reader, mut writer) = reflector::store::<GameServer>();
        writer.apply_watcher_event(&Event::Apply(
            GameServer::new("alpha", GameServerSpec::default())
                .within("default")
                .label("tier", "a"),
        ));
        let lister = Lister::new(Arc::new(reader));
        let tier_a: Selector = "tier=a".parse().unwrap();
        assert_eq!(lister.list(&tier_a).unwrap().len(), 1);
        assert!(lister.namespace("default").get("alpha").is_ok());
    }
}
