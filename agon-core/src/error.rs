use crate::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// StatusReason for a lookup that found no entry
pub const REASON_NOT_FOUND: &str = "NotFound";

/// An exact lookup found no object under the requested name
///
/// Carries the kind and the requested name, never the namespace,
/// matching how the apiserver reports a missing object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    /// Group of the missing kind, empty for the core group
    pub group: String,
    /// Kind of the missing object
    pub kind: String,
    /// The name that was asked for
    pub name: String,
}

impl NotFound {
    /// A `NotFound` for the kind `K`
    pub fn new<K: Resource>(name: &str) -> Self {
        Self {
            group: K::group().into_owned(),
            kind: K::kind().into_owned(),
            name: name.to_string(),
        }
    }

    /// The qualified resource, e.g. `gameserver.stable.agon.io`
    pub fn qualified_kind(&self) -> String {
        let kind = self.kind.to_lowercase();
        if self.group.is_empty() {
            kind
        } else {
            format!("{kind}.{}", self.group)
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} not found", self.qualified_kind(), self.name)
    }
}

/// An error response in the shape of an apiserver `Status`.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
    /// Extended data associated with the reason.
    pub details: Option<StatusDetails>,
}

/// Additional properties describing which object a status refers to
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    /// The group attribute of the resource associated with the status
    pub group: Option<String>,
    /// The kind attribute of the resource associated with the status
    pub kind: Option<String>,
    /// The name attribute of the resource associated with the status
    pub name: Option<String>,
}

impl From<NotFound> for ErrorResponse {
    fn from(nf: NotFound) -> Self {
        Self {
            status: "Failure".into(),
            message: nf.to_string(),
            reason: REASON_NOT_FOUND.into(),
            code: 404,
            details: Some(StatusDetails {
                group: Some(nf.group),
                kind: Some(nf.kind.to_lowercase()),
                name: Some(nf.name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameServer;
    use k8s_openapi::api::core::v1::ConfigMap;

    #[test]
    fn not_found_names_kind_and_name() {
        let nf = NotFound::new::<GameServer>("gamma");
        assert_eq!(nf.kind, "GameServer");
        assert_eq!(nf.name, "gamma");
        assert_eq!(nf.to_string(), r#"gameserver.stable.agon.io "gamma" not found"#);
    }

    #[test]
    fn core_group_is_unqualified() {
        let nf = NotFound::new::<ConfigMap>("settings");
        assert_eq!(nf.to_string(), r#"configmap "settings" not found"#);
    }

    #[test]
    fn renders_as_status() {
        let status = ErrorResponse::from(NotFound::new::<GameServer>("gamma"));
        assert_eq!(status.code, 404);
        assert_eq!(status.reason, "NotFound");
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["details"]["name"], "gamma");
        assert_eq!(value["details"]["kind"], "gameserver");
        assert_eq!(value["details"]["group"], "stable.agon.io");
    }
}
