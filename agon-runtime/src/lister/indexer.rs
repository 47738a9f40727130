use crate::reflector::ObjectRef;
use std::sync::Arc;

/// Read access to an indexed local store of objects of kind `K`
///
/// This is the whole contract the listers rely on. The backing store is owned and mutated by
/// something else (typically a [`Writer`](crate::reflector::store::Writer)); implementations
/// must tolerate concurrent reads while that happens, the listers add no locking of their own.
///
/// Absence is not an error: [`get_by_key`](Indexer::get_by_key) reports a missing key as
/// `Ok(None)` and reserves `Err` for the store itself failing.
pub trait Indexer<K> {
    /// Failure of the store's own enumeration or lookup machinery
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every entry in the store, in no particular order
    fn scan_all(&self) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Self::Error>;

    /// Every entry whose namespace is `namespace`, where `""` means no namespace
    fn scan_namespace(&self, namespace: &str) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Self::Error>;

    /// The entry stored under exactly `key`
    fn get_by_key(&self, key: &ObjectRef<K>) -> Result<Option<Arc<K>>, Self::Error>;
}

impl<K, I> Indexer<K> for Arc<I>
where
    I: Indexer<K> + ?Sized,
{
    type Error = I::Error;

    fn scan_all(&self) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Self::Error> {
        (**self).scan_all()
    }

    fn scan_namespace(&self, namespace: &str) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Self::Error> {
        (**self).scan_namespace(namespace)
    }

    fn get_by_key(&self, key: &ObjectRef<K>) -> Result<Option<Arc<K>>, Self::Error> {
        (**self).get_by_key(key)
    }
}
