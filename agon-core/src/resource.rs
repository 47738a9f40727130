pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};

use std::{borrow::Cow, collections::BTreeMap};

/// An accessor trait for a stored cluster object.
///
/// These types, using [`ObjectMeta`], SHOULD all have required properties:
/// - `.metadata`
/// - `.metadata.name`
///
/// And these optional properties:
/// - `.metadata.namespace` (unset for cluster-scoped kinds)
/// - `.metadata.labels`
///
/// The lister layer only ever reads through this trait.
pub trait Resource {
    /// Type information for the api scope of the resource
    ///
    /// Either [`NamespaceResourceScope`] or [`ClusterResourceScope`]; the listers use it
    /// to decide whether a lookup is keyed by `namespace/name` or by the bare name.
    type Scope;

    /// Returns kind of this object
    fn kind() -> Cow<'static, str>;
    /// Returns group of this object
    fn group() -> Cow<'static, str>;
    /// Returns version of this object
    fn version() -> Cow<'static, str>;
    /// Returns apiVersion of this object
    fn api_version() -> Cow<'static, str> {
        let group = Self::group();
        if group.is_empty() {
            return Self::version();
        }
        let mut group = group.into_owned();
        group.push('/');
        group.push_str(&Self::version());
        group.into()
    }
    /// Returns the plural name of the kind
    fn plural() -> Cow<'static, str>;

    /// Metadata that all persisted resources must have
    fn meta(&self) -> &ObjectMeta;
    /// Metadata that all persisted resources must have
    fn meta_mut(&mut self) -> &mut ObjectMeta;
}

/// Implement accessor trait for any ObjectMeta-using resource
impl<K, S> Resource for K
where
    K: k8s_openapi::Metadata<Ty = ObjectMeta>,
    K: k8s_openapi::Resource<Scope = S>,
{
    type Scope = S;

    fn kind() -> Cow<'static, str> {
        K::KIND.into()
    }

    fn group() -> Cow<'static, str> {
        K::GROUP.into()
    }

    fn version() -> Cow<'static, str> {
        K::VERSION.into()
    }

    fn api_version() -> Cow<'static, str> {
        K::API_VERSION.into()
    }

    fn plural() -> Cow<'static, str> {
        K::URL_PATH_SEGMENT.into()
    }

    fn meta(&self) -> &ObjectMeta {
        self.metadata()
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        self.metadata_mut()
    }
}

/// Helper methods for resources.
pub trait ResourceExt: Resource {
    /// Returns the name of the resource, panicking if it is unset
    ///
    /// Only use this function if you know that name is set; for example when
    /// the resource was received through the sync mechanism,
    /// or if you constructed the resource with the name.
    ///
    /// Prefer using `.meta().name` or [`name_any`](ResourceExt::name_any)
    /// for the more general cases.
    fn name_unchecked(&self) -> String;

    /// Returns the most useful name identifier available
    ///
    /// This is tries `name`, then `generateName`, and falls back on an empty string when neither is set.
    fn name_any(&self) -> String;

    /// The namespace the resource is in
    fn namespace(&self) -> Option<String>;
    /// The resource version
    fn resource_version(&self) -> Option<String>;
    /// Unique ID (if you delete resource and then create a new
    /// resource with the same name, it will have different ID)
    fn uid(&self) -> Option<String>;
    /// Returns resource labels
    fn labels(&self) -> &BTreeMap<String, String>;
    /// Provides mutable access to the labels
    fn labels_mut(&mut self) -> &mut BTreeMap<String, String>;
}

static EMPTY_MAP: BTreeMap<String, String> = BTreeMap::new();

impl<K: Resource> ResourceExt for K {
    fn name_unchecked(&self) -> String {
        #[allow(clippy::expect_used)]
        self.meta().name.clone().expect(".metadata.name missing")
    }

    fn name_any(&self) -> String {
        self.meta()
            .name
            .clone()
            .or_else(|| self.meta().generate_name.clone())
            .unwrap_or_default()
    }

    fn namespace(&self) -> Option<String> {
        self.meta().namespace.clone()
    }

    fn resource_version(&self) -> Option<String> {
        self.meta().resource_version.clone()
    }

    fn uid(&self) -> Option<String> {
        self.meta().uid.clone()
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        self.meta().labels.as_ref().unwrap_or(&EMPTY_MAP)
    }

    fn labels_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.meta_mut().labels.get_or_insert_with(BTreeMap::new)
    }
}
