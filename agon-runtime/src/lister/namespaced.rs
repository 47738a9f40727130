use super::{get_exact, select, Error, Indexer, Result};
use crate::reflector::{ObjectRef, Store};
use agon_core::{Resource, SelectorExt};
use educe::Educe;
use std::{marker::PhantomData, sync::Arc};
use tracing::trace;

/// Read access to objects of kind `K` within one namespace
///
/// Obtained from [`Lister::namespace`](super::Lister::namespace).
#[derive(Educe)]
#[educe(Clone, Debug)]
pub struct NamespacedLister<K, I = Store<K>> {
    indexer: I,
    namespace: String,
    #[educe(Debug(ignore))]
    _kind: PhantomData<fn() -> K>,
}

impl<K, I> NamespacedLister<K, I>
where
    K: Resource,
    I: Indexer<K>,
{
    pub(super) fn new(indexer: I, namespace: &str) -> Self {
        Self {
            indexer,
            namespace: namespace.to_string(),
            _kind: PhantomData,
        }
    }

    /// The namespace reads are restricted to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// List the objects in the namespace whose labels match `selector`
    ///
    /// The order of the result is unspecified.
    pub fn list<S>(&self, selector: &S) -> Result<Vec<Arc<K>>, I::Error>
    where
        S: SelectorExt + ?Sized,
    {
        let entries = self
            .indexer
            .scan_namespace(&self.namespace)
            .map_err(|source| Error::Scan {
                namespace: Some(self.namespace.clone()),
                source,
            })?;
        let ret = select(entries, selector);
        trace!(kind = %K::kind(), namespace = %self.namespace, matched = ret.len(), "listed objects");
        Ok(ret)
    }

    /// Get the object called `name` in the namespace
    ///
    /// A missing object is an [`Error::NotFound`] naming `name`, distinct from the store failing.
    /// The returned object is the snapshot held by the store and is shared with every other reader.
    pub fn get(&self, name: &str) -> Result<Arc<K>, I::Error> {
        get_exact(&self.indexer, ObjectRef::new(name).within(&self.namespace))
    }
}
