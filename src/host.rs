use std::io::IsTerminal;
use std::num::ParseIntError;
use std::path::PathBuf;

use caps::errors::CapsError;
use caps::CapsHashSet;
use nix::unistd::{Gid, Uid, User};

use crate::subid::{lookup_subid, SubIdError, SubIdKind, SubIdRange, SUBGID_PATH, SUBUID_PATH};

/// Host uid from before entering the rootless fake-root namespace.
pub const ROOTLESS_UID_ENV: &str = "_CONTAINERS_ROOTLESS_UID";
/// Host gid from before entering the rootless fake-root namespace.
pub const ROOTLESS_GID_ENV: &str = "_CONTAINERS_ROOTLESS_GID";
/// Set in the environment of a process re-executed inside the fake-root namespace.
pub const NAMESPACE_ENV: &str = "_APPTAINER_NAMESPACE";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HostIdentity {
    pub uid: Uid,
    pub gid: Gid,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid {var} value {value:?}: {source}")]
    InvalidRootlessId {
        var: &'static str,
        value: String,
        source: ParseIntError,
    },
    #[error("could not read process capabilities: {0}")]
    Capabilities(#[from] CapsError),
}

/// Read-only snapshot of the launching process.
///
/// Every piece of live process state the launch computation depends on goes through
/// this trait, so resolution itself never touches the running process.
pub trait HostState {
    /// Host environment, in the order the process received it.
    fn environ(&self) -> &[(String, String)];

    fn effective_ids(&self) -> (Uid, Gid);

    fn effective_caps(&self) -> Result<CapsHashSet, HostError>;

    fn stdin_is_terminal(&self) -> bool;

    fn sub_id_range(
        &self,
        kind: SubIdKind,
        identity: HostIdentity,
    ) -> Result<SubIdRange, SubIdError>;

    fn var(&self, key: &str) -> Option<&str> {
        self.environ()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn in_fakeroot_namespace(&self) -> bool {
        self.var(NAMESPACE_ENV).is_some()
    }

    /// The identity of the user who started the launch, seen through the rootless
    /// variables if present.
    fn identity(&self) -> Result<HostIdentity, HostError> {
        let (euid, egid) = self.effective_ids();
        let uid = match rootless_id(self, ROOTLESS_UID_ENV)? {
            Some(uid) => Uid::from_raw(uid),
            None => euid,
        };
        let gid = match rootless_id(self, ROOTLESS_GID_ENV)? {
            Some(gid) => Gid::from_raw(gid),
            None => egid,
        };
        Ok(HostIdentity { uid, gid })
    }
}

// An empty value counts as unset.
fn rootless_id<H: HostState + ?Sized>(
    host: &H,
    var: &'static str,
) -> Result<Option<u32>, HostError> {
    host.var(var)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|source| HostError::InvalidRootlessId {
                    var,
                    value: value.to_owned(),
                    source,
                })
        })
        .transpose()
}

#[derive(Clone, Debug)]
pub struct HostConfig {
    pub subuid_path: PathBuf,
    pub subgid_path: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            subuid_path: SUBUID_PATH.into(),
            subgid_path: SUBGID_PATH.into(),
        }
    }
}

/// The running process.
#[derive(Debug)]
pub struct LiveHost {
    config: HostConfig,
    environ: Vec<(String, String)>,
    euid: Uid,
    egid: Gid,
    stdin_terminal: bool,
}

impl LiveHost {
    pub fn capture(config: HostConfig) -> Self {
        let environ = std::env::vars_os()
            .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => Some((k, v)),
                (k, _) => {
                    log::debug!("skipping non UTF-8 host variable {k:?}");
                    None
                }
            })
            .collect();
        Self {
            config,
            environ,
            euid: nix::unistd::geteuid(),
            egid: nix::unistd::getegid(),
            stdin_terminal: std::io::stdin().is_terminal(),
        }
    }
}

impl HostState for LiveHost {
    fn environ(&self) -> &[(String, String)] {
        &self.environ
    }

    fn effective_ids(&self) -> (Uid, Gid) {
        (self.euid, self.egid)
    }

    fn effective_caps(&self) -> Result<CapsHashSet, HostError> {
        Ok(caps::read(None, caps::CapSet::Effective)?)
    }

    fn stdin_is_terminal(&self) -> bool {
        self.stdin_terminal
    }

    fn sub_id_range(
        &self,
        kind: SubIdKind,
        identity: HostIdentity,
    ) -> Result<SubIdRange, SubIdError> {
        let user = match User::from_uid(identity.uid) {
            Ok(user) => user.map(|u| u.name),
            Err(e) => {
                log::debug!("passwd lookup for uid {} failed: {e}", identity.uid);
                None
            }
        };
        let path = match kind {
            SubIdKind::Uid => &self.config.subuid_path,
            SubIdKind::Gid => &self.config.subgid_path,
        };
        lookup_subid(path, kind, user.as_deref(), identity.uid.as_raw())
    }
}

/// Host state given as plain data.
#[derive(Clone, Debug)]
pub struct FixedHost {
    pub environ: Vec<(String, String)>,
    pub uid: Uid,
    pub gid: Gid,
    pub effective_caps: CapsHashSet,
    pub stdin_terminal: bool,
    pub subuid: Option<SubIdRange>,
    pub subgid: Option<SubIdRange>,
}

impl FixedHost {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self {
            environ: Vec::new(),
            uid: Uid::from_raw(uid),
            gid: Gid::from_raw(gid),
            effective_caps: CapsHashSet::new(),
            stdin_terminal: false,
            subuid: None,
            subgid: None,
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environ.push((key.into(), value.into()));
        self
    }
}

impl HostState for FixedHost {
    fn environ(&self) -> &[(String, String)] {
        &self.environ
    }

    fn effective_ids(&self) -> (Uid, Gid) {
        (self.uid, self.gid)
    }

    fn effective_caps(&self) -> Result<CapsHashSet, HostError> {
        Ok(self.effective_caps.clone())
    }

    fn stdin_is_terminal(&self) -> bool {
        self.stdin_terminal
    }

    fn sub_id_range(
        &self,
        kind: SubIdKind,
        identity: HostIdentity,
    ) -> Result<SubIdRange, SubIdError> {
        let (range, path) = match kind {
            SubIdKind::Uid => (self.subuid, SUBUID_PATH),
            SubIdKind::Gid => (self.subgid, SUBGID_PATH),
        };
        range.ok_or_else(|| SubIdError::NoEntry {
            kind,
            user: identity.uid.to_string(),
            path: path.into(),
        })
    }
}
