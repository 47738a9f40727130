//! The in-memory store objects are cached in, and its single writer
use super::{ready_token::ReadyToken, ObjectRef};
use crate::{lister::Indexer, watcher};
use agon_core::Resource;
use ahash::{AHashMap, AHashSet};
use educe::Educe;
use parking_lot::RwLock;
use std::{convert::Infallible, sync::Arc};
use tracing::trace;

/// The shared state behind a [`Writer`] and its [`Store`]s
///
/// `namespaces` indexes the keys of `objects` by namespace (`""` for cluster-scoped objects)
/// and is kept in lockstep with it under the same lock.
#[derive(Educe)]
#[educe(Debug, Default)]
struct Cache<K> {
    objects: AHashMap<ObjectRef<K>, Arc<K>>,
    namespaces: AHashMap<String, AHashSet<ObjectRef<K>>>,
}

impl<K> Cache<K> {
    fn insert(&mut self, key: ObjectRef<K>, obj: Arc<K>) {
        self.namespaces
            .entry(key.namespace.clone().unwrap_or_default())
            .or_default()
            .insert(key.clone());
        self.objects.insert(key, obj);
    }

    fn remove(&mut self, key: &ObjectRef<K>) {
        if self.objects.remove(key).is_none() {
            return;
        }
        let namespace = key.namespace.as_deref().unwrap_or_default();
        if let Some(keys) = self.namespaces.get_mut(namespace) {
            keys.remove(key);
            if keys.is_empty() {
                self.namespaces.remove(namespace);
            }
        }
    }
}

type SharedCache<K> = Arc<RwLock<Cache<K>>>;

/// A writable Store handle
///
/// This is exclusive since it's not safe to share a single `Store` between multiple producers.
/// In particular, `InitDone` events will clobber the state of other connected producers.
#[derive(Educe)]
#[educe(Debug, Default)]
pub struct Writer<K> {
    store: SharedCache<K>,
    buffer: Vec<Arc<K>>,
    ready: ReadyToken,
}

impl<K: Resource> Writer<K> {
    /// Return a read handle to the store
    ///
    /// Multiple read handles may be obtained, by either calling `as_reader` multiple times,
    /// or by calling `Store::clone()` afterwards.
    #[must_use]
    pub fn as_reader(&self) -> Store<K> {
        Store {
            store: self.store.clone(),
            ready: self.ready.clone(),
        }
    }

    /// Applies a single watcher event to the store
    pub fn apply_watcher_event(&mut self, event: &watcher::Event<K>)
    where
        K: Clone,
    {
        match event {
            watcher::Event::Apply(obj) => {
                let key = ObjectRef::from_obj(obj);
                trace!(%key, "applying object");
                self.store.write().insert(key, Arc::new(obj.clone()));
            }
            watcher::Event::Delete(obj) => {
                let key = ObjectRef::from_obj(obj);
                trace!(%key, "deleting object");
                self.store.write().remove(&key);
            }
            watcher::Event::Init => {
                self.buffer = Vec::new();
            }
            watcher::Event::InitApply(obj) => {
                self.buffer.push(Arc::new(obj.clone()));
            }
            watcher::Event::InitDone => {
                let mut cache = Cache::default();
                for obj in std::mem::take(&mut self.buffer) {
                    cache.insert(ObjectRef::from_obj(obj.as_ref()), obj);
                }
                trace!(objects = cache.objects.len(), "replacing store contents");
                *self.store.write() = cache;
                // Readiness never regresses, later relists only swap contents
                self.ready.make_ready();
            }
        }
    }
}

/// A readable cache of objects of kind `K`
///
/// Cloning will produce a new reference to the same backing store.
///
/// Cannot be constructed directly since one writer handle is required,
/// use `Writer::as_reader()` or [`store()`] instead.
#[derive(Educe)]
#[educe(Debug, Clone)]
pub struct Store<K> {
    store: SharedCache<K>,
    ready: ReadyToken,
}

impl<K: Resource> Store<K> {
    /// Retrieve the entry referred to by `key`, if it is in the cache.
    ///
    /// The lookup is exact: a namespaced key never matches an object stored without a namespace,
    /// and the reverse. This is the same lookup listers perform through [`Indexer::get_by_key`].
    ///
    /// Note that this is a cache and may be stale. Deleted objects may still exist in the cache
    /// despite having been deleted in the cluster, and new objects may not yet exist in the cache.
    #[must_use]
    pub fn get(&self, key: &ObjectRef<K>) -> Option<Arc<K>> {
        self.store.read().objects.get(key).cloned()
    }

    /// Return a full snapshot of the current values
    #[must_use]
    pub fn state(&self) -> Vec<Arc<K>> {
        self.store.read().objects.values().cloned().collect()
    }

    /// Retrieve the first object matching `predicate`
    #[must_use]
    pub fn find<P>(&self, predicate: P) -> Option<Arc<K>>
    where
        P: Fn(&K) -> bool,
    {
        self.store
            .read()
            .objects
            .values()
            .find(|k| predicate(k.as_ref()))
            .cloned()
    }

    /// Return the number of elements in the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().objects.len()
    }

    /// Return whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().objects.is_empty()
    }

    /// Whether the first full relist has been applied
    ///
    /// Lookups before this point may report objects as missing that exist in the cluster.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Wait for the first full relist to be applied
    ///
    /// Returns immediately once the store has been ready at least once.
    pub async fn wait_until_ready(&self) {
        self.ready.ready().await;
    }
}

impl<K: Resource> Indexer<K> for Store<K> {
    type Error = Infallible;

    fn scan_all(&self) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Self::Error> {
        Ok(self
            .store
            .read()
            .objects
            .iter()
            .map(|(key, obj)| (key.clone(), obj.clone()))
            .collect())
    }

    fn scan_namespace(&self, namespace: &str) -> Result<Vec<(ObjectRef<K>, Arc<K>)>, Self::Error> {
        let store = self.store.read();
        let Some(keys) = store.namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| Some((key.clone(), store.objects.get(key)?.clone())))
            .collect())
    }

    fn get_by_key(&self, key: &ObjectRef<K>) -> Result<Option<Arc<K>>, Self::Error> {
        Ok(self.get(key))
    }
}

/// Create a (Reader, Writer) for a `Store<K>` for a typed resource `K`
///
/// The `Writer` should be fed by the sync mechanism, and the `Store` handed to listers.
#[must_use]
pub fn store<K: Resource>() -> (Store<K>, Writer<K>) {
    let w = Writer::<K>::default();
    let r = w.as_reader();
    (r, w)
}

#[cfg(test)]
mod tests {
    use super::{store, Writer};
    use crate::{
        lister::Indexer,
        reflector::{ObjectRef, Store},
        watcher,
    };
    use agon_core::{GameServer, GameServerSpec, ObjectMeta};
    use futures::FutureExt;
    use k8s_openapi::api::core::v1::Node;

    fn gameserver(namespace: &str, name: &str) -> GameServer {
        GameServer::new(name, GameServerSpec::default()).within(namespace)
    }

    fn relisted<K: agon_core::Resource + Clone>(objs: Vec<K>) -> Store<K> {
        let mut writer = Writer::default();
        writer.apply_watcher_event(&watcher::Event::Init);
        for obj in objs {
            writer.apply_watcher_event(&watcher::Event::InitApply(obj));
        }
        writer.apply_watcher_event(&watcher::Event::InitDone);
        writer.as_reader()
    }

    #[test]
    fn should_allow_getting_namespaced_object_by_namespaced_ref() {
        let gs = gameserver("ns", "obj");
        let (store, mut writer) = store();
        writer.apply_watcher_event(&watcher::Event::Apply(gs.clone()));
        assert_eq!(store.get(&ObjectRef::from_obj(&gs)).as_deref(), Some(&gs));
    }

    #[test]
    fn should_not_allow_getting_namespaced_object_by_clusterscoped_ref() {
        let gs = gameserver("ns", "obj");
        let (store, mut writer) = store::<GameServer>();
        writer.apply_watcher_event(&watcher::Event::Apply(gs));
        assert_eq!(store.get(&ObjectRef::new("obj")), None);
    }

    #[test]
    fn should_not_allow_getting_clusterscoped_object_by_namespaced_ref() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("node-1".to_string()),
                ..ObjectMeta::default()
            },
            ..Node::default()
        };
        let (store, mut writer) = store::<Node>();
        writer.apply_watcher_event(&watcher::Event::Apply(node.clone()));
        assert_eq!(store.get(&ObjectRef::new("node-1")).as_deref(), Some(&node));
        assert_eq!(store.get(&ObjectRef::new("node-1").within("ns")), None);
    }

    #[test]
    fn get_agrees_with_get_by_key_for_unnamespaced_objects() {
        let orphan = GameServer::new("orphan", GameServerSpec::default());
        let store = relisted(vec![orphan.clone()]);
        let namespaced = ObjectRef::new("orphan").within("default");
        assert_eq!(store.get(&namespaced), None);
        assert!(store.get_by_key(&namespaced).unwrap().is_none());
        let bare = ObjectRef::from_obj(&orphan);
        assert_eq!(store.get(&bare).as_deref(), Some(&orphan));
        assert_eq!(store.get_by_key(&bare).unwrap().as_deref(), Some(&orphan));
    }

    #[test]
    fn delete_removes_object_and_namespace_index() {
        let gs = gameserver("ns", "obj");
        let (store, mut writer) = store();
        writer.apply_watcher_event(&watcher::Event::Apply(gs.clone()));
        writer.apply_watcher_event(&watcher::Event::Delete(gs));
        assert!(store.is_empty());
        assert!(store.scan_namespace("ns").unwrap().is_empty());
    }

    #[test]
    fn apply_replaces_existing_snapshot() {
        let (store, mut writer) = store();
        writer.apply_watcher_event(&watcher::Event::Apply(gameserver("ns", "obj")));
        let updated = gameserver("ns", "obj").label("tier", "a");
        writer.apply_watcher_event(&watcher::Event::Apply(updated.clone()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.state()[0].as_ref(), &updated);
    }

    #[test]
    fn relist_replaces_contents_atomically() {
        let (store, mut writer) = store();
        writer.apply_watcher_event(&watcher::Event::Apply(gameserver("ns", "stale")));
        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitApply(gameserver("ns", "fresh")));
        // Nothing changes until the relist completes
        assert!(store.get(&ObjectRef::new("stale").within("ns")).is_some());
        assert!(store.get(&ObjectRef::new("fresh").within("ns")).is_none());

        writer.apply_watcher_event(&watcher::Event::InitDone);
        assert!(store.get(&ObjectRef::new("stale").within("ns")).is_none());
        assert!(store.get(&ObjectRef::new("fresh").within("ns")).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn scan_namespace_only_returns_that_namespace() {
        let store = relisted(vec![
            gameserver("default", "alpha"),
            gameserver("default", "beta"),
            gameserver("other", "gamma"),
        ]);
        let mut names: Vec<_> = store
            .scan_namespace("default")
            .unwrap()
            .into_iter()
            .map(|(key, _)| key.name)
            .collect();
        names.sort();
        assert_eq!(names, ["alpha", "beta"]);
        assert_eq!(store.scan_all().unwrap().len(), 3);
        assert!(store.scan_namespace("missing").unwrap().is_empty());
    }

    #[test]
    fn get_by_key_is_exact() {
        let store = relisted(vec![gameserver("default", "alpha")]);
        assert!(store
            .get_by_key(&ObjectRef::new("alpha").within("default"))
            .unwrap()
            .is_some());
        assert!(store.get_by_key(&ObjectRef::new("alpha")).unwrap().is_none());
    }

    #[test]
    fn readers_share_snapshots() {
        let store = relisted(vec![gameserver("default", "alpha")]);
        let other = store.clone();
        let key = ObjectRef::new("alpha").within("default");
        let a = store.get(&key).unwrap();
        let b = other.get(&key).unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn find_matches_predicate() {
        let store = relisted(vec![gameserver("default", "alpha"), gameserver("default", "beta")]);
        let found = store.find(|gs| gs.metadata.name.as_deref() == Some("beta"));
        assert_eq!(found.unwrap().metadata.name.as_deref(), Some("beta"));
        assert!(store.find(|_| false).is_none());
    }

    #[test]
    fn ready_after_first_relist() {
        let (store, mut writer) = store::<GameServer>();
        let mut ready = store.wait_until_ready().boxed();
        writer.apply_watcher_event(&watcher::Event::Apply(gameserver("ns", "obj")));
        assert!(!store.is_ready());
        assert!((&mut ready).now_or_never().is_none());

        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitDone);
        assert!(store.is_ready());
        assert!((&mut ready).now_or_never().is_some());

        // A later relist keeps the store ready
        writer.apply_watcher_event(&watcher::Event::Init);
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn wait_until_ready_resolves_across_tasks() {
        let (store, mut writer) = store::<GameServer>();
        let waiter = tokio::spawn(async move {
            store.wait_until_ready().await;
            store.len()
        });
        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitApply(gameserver("ns", "obj")));
        writer.apply_watcher_event(&watcher::Event::InitDone);
        assert_eq!(waiter.await.unwrap(), 1);
    }
}
