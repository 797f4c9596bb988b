//! The subset of the OCI runtime `config.json` this crate produces.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capabilities::{sorted_names, CapabilitySet};
use crate::namespaces::DEFAULT_NAMESPACES;
use crate::types::Namespace;

pub use crate::idmap::IdMapping as LinuxIdMapping;

pub const OCI_VERSION: &str = "1.0.2";
pub const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub oci_version: String,
    pub root: Root,
    pub process: Process,
    pub linux: Linux,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub path: PathBuf,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default)]
    pub terminal: bool,
    pub user: User,
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    pub cwd: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<LinuxCapabilities>,
    #[serde(default)]
    pub no_new_privileges: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: u32,
    pub gid: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_gids: Vec<u32>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinuxCapabilities {
    pub bounding: Vec<String>,
    pub effective: Vec<String>,
    pub inheritable: Vec<String>,
    pub permitted: Vec<String>,
    pub ambient: Vec<String>,
}

impl From<&CapabilitySet> for LinuxCapabilities {
    fn from(set: &CapabilitySet) -> Self {
        Self {
            bounding: sorted_names(&set.bounding),
            effective: sorted_names(&set.effective),
            inheritable: sorted_names(&set.inheritable),
            permitted: sorted_names(&set.permitted),
            ambient: sorted_names(&set.ambient),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinuxNamespace {
    #[serde(rename = "type")]
    pub kind: Namespace,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linux {
    pub namespaces: Vec<LinuxNamespace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uid_mappings: Vec<LinuxIdMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gid_mappings: Vec<LinuxIdMapping>,
}

impl Linux {
    /// Add a namespace unless one of the same kind is already present.
    pub fn add_namespace(&mut self, kind: Namespace) {
        if !self.namespaces.iter().any(|ns| ns.kind == kind) {
            self.namespaces.push(LinuxNamespace { kind });
        }
    }
}

/// Baseline configuration: a writable `rootfs` running `sh` at `/` with the default
/// namespaces. The launch specification is laid over it.
pub fn minimal_spec() -> Spec {
    Spec {
        oci_version: OCI_VERSION.to_owned(),
        root: Root {
            path: "rootfs".into(),
            readonly: false,
        },
        process: Process {
            terminal: true,
            user: User::default(),
            args: vec!["sh".to_owned()],
            env: vec![format!("PATH={DEFAULT_PATH}")],
            cwd: "/".into(),
            capabilities: None,
            no_new_privileges: false,
        },
        linux: Linux {
            namespaces: DEFAULT_NAMESPACES
                .into_iter()
                .map(|kind| LinuxNamespace { kind })
                .collect(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use caps::Capability;
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal_spec_json() {
        let value = serde_json::to_value(minimal_spec()).unwrap();
        assert_eq!(
            value,
            json!({
                "ociVersion": "1.0.2",
                "root": {"path": "rootfs", "readonly": false},
                "process": {
                    "terminal": true,
                    "user": {"uid": 0, "gid": 0},
                    "args": ["sh"],
                    "env": ["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"],
                    "cwd": "/",
                    "noNewPrivileges": false,
                },
                "linux": {
                    "namespaces": [{"type": "ipc"}, {"type": "pid"}, {"type": "mount"}],
                },
            })
        );
    }

    #[test]
    fn capabilities_are_sorted_names() {
        let set = CapabilitySet {
            bounding: [Capability::CAP_SYS_ADMIN, Capability::CAP_CHOWN]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let caps = LinuxCapabilities::from(&set);
        assert_eq!(caps.bounding, ["CAP_CHOWN", "CAP_SYS_ADMIN"]);
        assert!(caps.ambient.is_empty());
    }

    #[test]
    fn namespaces_are_not_duplicated() {
        let mut linux = minimal_spec().linux;
        linux.add_namespace(Namespace::Pid);
        linux.add_namespace(Namespace::User);
        linux.add_namespace(Namespace::User);
        assert_eq!(linux.namespaces.len(), 4);
    }
}
