//! Events produced by the mechanism that keeps a local store in sync

/// A change to apply to a local store
///
/// The producing side (a watch against the cluster, a replayed log, a test fixture)
/// is outside this crate. Events are consumed by [`Writer::apply_watcher_event`](crate::reflector::store::Writer::apply_watcher_event).
#[derive(Clone, Debug, PartialEq)]
pub enum Event<K> {
    /// An object was added or modified
    Apply(K),
    /// An object was deleted
    ///
    /// NOTE: events may be lost if the producer is unavailable, so this must not be
    /// the only signal used to clean up external state.
    Delete(K),
    /// A full relist is starting
    ///
    /// Objects delivered until the matching [`Event::InitDone`] replace the store contents.
    Init,
    /// An object from the ongoing relist
    InitApply(K),
    /// The relist is complete and the store can be swapped over
    InitDone,
}

impl<K> Event<K> {
    /// Map each object in an event through a mutator fn
    ///
    /// Useful for dropping fields the readers never look at before they reach the store.
    #[must_use]
    pub fn modify(mut self, mut f: impl FnMut(&mut K)) -> Self {
        match &mut self {
            Event::Apply(obj) | Event::Delete(obj) | Event::InitApply(obj) => (f)(obj),
            Event::Init | Event::InitDone => {}
        }
        self
    }
}
