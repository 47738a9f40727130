//! The `GameServer` custom resource (`stable.agon.io/v1alpha1`)
//!
//! Only the shape needed to hold snapshots in a local store is modelled here;
//! admission, defaulting and validation are handled by the controller that owns the kind.
use crate::resource::ObjectMeta;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use serde::{ser::SerializeStruct, Deserialize, Serialize};

/// A dedicated game server process managed by the agon controller
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GameServer {
    /// Standard object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state
    pub spec: GameServerSpec,
    /// Observed state, written by the controller
    #[serde(default)]
    pub status: Option<GameServerStatus>,
}

impl GameServer {
    /// Create a named `GameServer` with no namespace, labels or status
    pub fn new(name: &str, spec: GameServerSpec) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            spec,
            status: None,
        }
    }

    /// Place the `GameServer` in a namespace
    #[must_use]
    pub fn within(mut self, namespace: &str) -> Self {
        self.metadata.namespace = Some(namespace.to_string());
        self
    }

    /// Add a label to the `GameServer`
    #[must_use]
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// The lifecycle state reported by the controller, if any
    pub fn state(&self) -> Option<GameServerState> {
        self.status.as_ref().map(|s| s.state)
    }
}

/// Desired state of a [`GameServer`]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameServerSpec {
    /// Name of the container in the pod template running the game server.
    /// Only required when the template has more than one container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// How the host port is picked
    #[serde(default)]
    pub port_policy: PortPolicy,
    /// Port the game server listens on inside its container
    pub container_port: i32,
    /// Port exposed on the node. Required for [`PortPolicy::Static`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,
    /// Network protocol, `UDP` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Pod template the game server runs from
    #[serde(default)]
    pub template: PodTemplateSpec,
}

/// Host port allocation strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortPolicy {
    /// The user supplies `hostPort`
    Static,
    /// The controller allocates a free port
    #[default]
    Dynamic,
}

/// Observed state of a [`GameServer`]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameServerStatus {
    /// Lifecycle state
    #[serde(default)]
    pub state: GameServerState,
    /// Allocated host port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    /// Address players connect to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Node the backing pod was scheduled on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

/// Lifecycle states of a [`GameServer`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum GameServerState {
    /// Waiting for a dynamic host port
    PortAllocation,
    /// Backing pod is being created
    #[default]
    Creating,
    /// Pod exists, waiting for the sidecar to report ready
    Starting,
    /// Accepting players
    Ready,
    /// Game session finished, pending deletion
    Shutdown,
    /// Could not be created
    Error,
    /// Failed health checks
    Unhealthy,
}

impl k8s_openapi::Resource for GameServer {
    type Scope = k8s_openapi::NamespaceResourceScope;

    const API_VERSION: &'static str = "stable.agon.io/v1alpha1";
    const GROUP: &'static str = "stable.agon.io";
    const KIND: &'static str = "GameServer";
    const URL_PATH_SEGMENT: &'static str = "gameservers";
    const VERSION: &'static str = "v1alpha1";
}

impl k8s_openapi::Metadata for GameServer {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

// apiVersion and kind are derived from the type rather than stored
impl Serialize for GameServer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use k8s_openapi::Resource;
        let fields = 4 + usize::from(self.status.is_some());
        let mut state = serializer.serialize_struct(Self::KIND, fields)?;
        state.serialize_field("apiVersion", Self::API_VERSION)?;
        state.serialize_field("kind", Self::KIND)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("spec", &self.spec)?;
        if let Some(status) = &self.status {
            state.serialize_field("status", status)?;
        }
        state.end()
    }
}
