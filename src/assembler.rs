use std::path::{Path, PathBuf};

use crate::capabilities::{self, CapabilitySet};
use crate::environment::{self, EnvironmentError};
use crate::host::{HostError, HostState};
use crate::idmap::{reverse_user_maps, IdMapError, ReverseMaps};
use crate::namespaces::{self, push_unique};
use crate::oci::{self, LinuxCapabilities};
use crate::process::{self, ProcessError};
use crate::subid::{SubIdError, SubIdKind};
use crate::types::{ImageDescriptor, LaunchOptions, Namespace, Notice};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error("while getting process args: {0}")]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    SubId(#[from] SubIdError),
    #[error(transparent)]
    IdMap(#[from] IdMapError),
}

/// Fully resolved description of the container process.
#[derive(Clone, Debug)]
pub struct LaunchSpec {
    args: Vec<String>,
    env: Vec<String>,
    cwd: PathBuf,
    capabilities: CapabilitySet,
    terminal: bool,
    no_new_privileges: bool,
    uid: u32,
    gid: u32,
    namespaces: Vec<Namespace>,
    id_maps: Option<ReverseMaps>,
    notices: Vec<Notice>,
}

impl LaunchSpec {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[String] {
        &self.env
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn terminal(&self) -> bool {
        self.terminal
    }

    pub fn no_new_privileges(&self) -> bool {
        self.no_new_privileges
    }

    /// Identity of the process inside the container.
    pub fn user(&self) -> (u32, u32) {
        (self.uid, self.gid)
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// UID/GID tables re-mapping the fake-root namespace, when launching from inside it.
    pub fn id_maps(&self) -> Option<&ReverseMaps> {
        self.id_maps.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Lay the launch specification over the baseline runtime configuration.
    pub fn into_oci(self) -> oci::Spec {
        let mut spec = oci::minimal_spec();
        spec.process = oci::Process {
            terminal: self.terminal,
            user: oci::User {
                uid: self.uid,
                gid: self.gid,
                additional_gids: Vec::new(),
            },
            capabilities: Some(LinuxCapabilities::from(&self.capabilities)),
            args: self.args,
            env: self.env,
            cwd: self.cwd,
            no_new_privileges: self.no_new_privileges,
        };
        for ns in self.namespaces {
            spec.linux.add_namespace(ns);
        }
        if let Some(maps) = self.id_maps {
            spec.linux.uid_mappings = maps.uid_map.into();
            spec.linux.gid_mappings = maps.gid_map.into();
        }
        spec
    }
}

/// Resolve everything the runtime needs to start the process of `image`.
pub fn assemble<H: HostState + ?Sized>(
    image: &ImageDescriptor,
    options: &LaunchOptions,
    host: &H,
) -> Result<LaunchSpec, LaunchError> {
    let mut notices = Vec::new();
    let identity = host.identity()?;
    let (uid, gid) = if options.fakeroot {
        (0, 0)
    } else {
        (identity.uid.as_raw(), identity.gid.as_raw())
    };

    let mut namespaces = namespaces::compose(options.namespaces, identity.uid, &mut notices);

    let id_maps = if host.in_fakeroot_namespace() && !options.fakeroot {
        let subuid = host.sub_id_range(SubIdKind::Uid, identity)?;
        let subgid = host.sub_id_range(SubIdKind::Gid, identity)?;
        let maps = reverse_user_maps(uid, gid, subuid, subgid)?;
        log::debug!("re-mapping {uid}:{gid} through the fake-root namespace: {maps:?}");
        push_unique(&mut namespaces, Namespace::User);
        Some(maps)
    } else {
        None
    };

    let env = environment::compose(image, options, host)?;
    let capabilities = capabilities::resolve(options, host, uid, &mut notices)?;
    let args = process::args(image, options)?;

    for notice in &notices {
        notice.log();
    }

    Ok(LaunchSpec {
        args,
        env,
        cwd: process::cwd(options),
        capabilities,
        terminal: process::terminal(host),
        no_new_privileges: options.no_new_privileges || options.no_privileges,
        uid,
        gid,
        namespaces,
        id_maps,
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixedHost;
    use crate::types::NamespaceFlags;

    #[test]
    fn plain_launch() {
        let image = ImageDescriptor::default();
        let options = LaunchOptions {
            home: "/home/alice".into(),
            ..Default::default()
        };
        let spec = assemble(&image, &options, &FixedHost::new(1000, 1000)).unwrap();
        assert_eq!(spec.user(), (1000, 1000));
        assert_eq!(spec.cwd(), Path::new("/home/alice"));
        assert!(spec.id_maps().is_none());
        assert!(spec.notices().is_empty());
        assert!(!spec.no_new_privileges());
        assert!(spec.capabilities().permitted.is_empty());
    }

    #[test]
    fn no_privileges_sets_no_new_privileges() {
        let options = LaunchOptions {
            no_privileges: true,
            ..Default::default()
        };
        let spec = assemble(&ImageDescriptor::default(), &options, &FixedHost::new(0, 0)).unwrap();
        assert!(spec.no_new_privileges());
        assert!(spec.capabilities().bounding.is_empty());
    }

    #[test]
    fn notices_are_collected() {
        let options = LaunchOptions {
            namespaces: NamespaceFlags::PID,
            add_caps: vec!["nonsense".to_owned()],
            ..Default::default()
        };
        let spec = assemble(&ImageDescriptor::default(), &options, &FixedHost::new(0, 0)).unwrap();
        assert_eq!(spec.notices().len(), 2);
    }

    #[test]
    fn native_exec_needs_process() {
        let image = ImageDescriptor {
            native: true,
            ..Default::default()
        };
        let err = assemble(&image, &LaunchOptions::default(), &FixedHost::new(0, 0)).unwrap_err();
        assert!(matches!(err, LaunchError::Process(ProcessError::MissingProcess(_))));
    }
}
