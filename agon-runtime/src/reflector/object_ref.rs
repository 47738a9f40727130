use agon_core::Resource;
use educe::Educe;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    marker::PhantomData,
};

/// A typed and namespaced (if relevant) reference to a stored object
///
/// This is the key objects are held under in a [`Store`](super::Store).
/// Its string form, see [`ObjectRef::store_key`], is `namespace/name`
/// for namespaced objects and the bare `name` for cluster-scoped ones.
///
/// ```
/// use agon_core::GameServer;
/// use agon_runtime::reflector::ObjectRef;
/// assert_eq!(ObjectRef::<GameServer>::new("alpha").within("default").store_key(), "default/alpha");
/// ```
#[derive(Educe)]
#[educe(Debug, PartialEq, Hash, Clone)]
#[non_exhaustive]
pub struct ObjectRef<K> {
    /// The name of the object
    pub name: String,
    /// The namespace of the object
    ///
    /// `None` for cluster-scoped objects. An empty namespace is never stored here;
    /// constructors normalise it to `None`.
    pub namespace: Option<String>,
    #[educe(Debug(ignore))]
    _kind: PhantomData<fn() -> K>,
}

impl<K> Eq for ObjectRef<K> {}

impl<K> ObjectRef<K> {
    /// A reference to a cluster-scoped object, or a namespaced one once [`within`](Self::within) is applied
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            _kind: PhantomData,
        }
    }

    /// Scope the reference to a namespace
    ///
    /// The empty namespace leaves the reference cluster-scoped.
    #[must_use]
    pub fn within(mut self, namespace: &str) -> Self {
        self.namespace = (!namespace.is_empty()).then(|| namespace.to_string());
        self
    }

    /// Parse the string form produced by [`store_key`](Self::store_key)
    #[must_use]
    pub fn from_store_key(key: &str) -> Self {
        match key.split_once('/') {
            Some((namespace, name)) => Self::new(name).within(namespace),
            None => Self::new(key),
        }
    }

    /// The string key: `namespace/name`, or `name` when there is no namespace
    #[must_use]
    pub fn store_key(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl<K: Resource> ObjectRef<K> {
    /// Creates `ObjectRef` from the resource
    ///
    /// Objects without a name are keyed under the empty name.
    #[must_use]
    pub fn from_obj(obj: &K) -> Self {
        let meta = obj.meta();
        Self::new(meta.name.as_deref().unwrap_or_default()).within(meta.namespace.as_deref().unwrap_or_default())
    }
}

impl<K> Display for ObjectRef<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::hash_map::DefaultHasher,
        hash::{Hash, Hasher},
    };

    use super::ObjectRef;
    use agon_core::{GameServer, GameServerSpec};
    use k8s_openapi::api::core::v1::Node;

    #[test]
    fn display_should_follow_store_key_format() {
        assert_eq!(
            format!("{}", ObjectRef::<GameServer>::new("alpha").within("default")),
            "default/alpha"
        );
        assert_eq!(format!("{}", ObjectRef::<Node>::new("node-1")), "node-1");
    }

    #[test]
    fn store_key_round_trips() {
        for key in ["default/alpha", "alpha"] {
            assert_eq!(ObjectRef::<GameServer>::from_store_key(key).store_key(), key);
        }
    }

    #[test]
    fn empty_namespace_is_cluster_scoped() {
        let oref = ObjectRef::<GameServer>::new("alpha").within("");
        assert_eq!(oref, ObjectRef::new("alpha"));
        assert_eq!(oref.namespace, None);
    }

    #[test]
    fn from_obj_uses_metadata() {
        let gs = GameServer::new("alpha", GameServerSpec::default()).within("default");
        let oref = ObjectRef::from_obj(&gs);
        assert_eq!(oref, ObjectRef::new("alpha").within("default"));
        assert_eq!(oref.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn namespaced_and_cluster_refs_differ() {
        let hash_value = |value: &ObjectRef<GameServer>| {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        };
        let cluster = ObjectRef::<GameServer>::new("alpha");
        let namespaced = ObjectRef::new("alpha").within("default");
        assert_ne!(cluster, namespaced);
        assert_ne!(hash_value(&cluster), hash_value(&namespaced));
    }
}
