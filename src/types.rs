use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Host variables carrying this prefix are passed into the container with the prefix stripped.
pub const ENV_PASSTHROUGH_PREFIX: &str = "APPTAINERENV_";

/// Library bind directory that must always be on `LD_LIBRARY_PATH`.
pub const LIBS_BIND_PATH: &str = "/.singularity.d/libs";

bitflags::bitflags! {
    /// Namespaces the user asked for on top of the default isolation.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
    pub struct NamespaceFlags: u32 {
        const PID  = 0b00001;
        const IPC  = 0b00010;
        const USER = 0b00100;
        const NET  = 0b01000;
        const UTS  = 0b10000;
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Exec,
    Run,
    Shell,
    Start,
    Test,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Exec => "exec",
            Action::Run => "run",
            Action::Shell => "shell",
            Action::Start => "start",
            Action::Test => "test",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the user asked for when launching one container.
///
/// `home` is the home directory destination as already resolved by the mount
/// setup; nothing here re-derives it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LaunchOptions {
    pub home: PathBuf,
    pub cwd: Option<PathBuf>,
    pub bundle: PathBuf,
    /// Explicit `KEY`/`VALUE` overrides, later entries win.
    pub env: Vec<(String, String)>,
    pub env_file: Option<PathBuf>,
    pub add_caps: Vec<String>,
    pub drop_caps: Vec<String>,
    pub no_new_privileges: bool,
    pub keep_privileges: bool,
    pub no_privileges: bool,
    pub namespaces: NamespaceFlags,
    pub fakeroot: bool,
    pub action: Action,
    pub process: Option<String>,
    pub args: Vec<String>,
}

impl LaunchOptions {
    /// The explicit process name, if one was given and is not empty.
    pub fn process_name(&self) -> Option<&str> {
        self.process.as_deref().filter(|p| !p.is_empty())
    }
}

/// Read-only view of a container image, as handed over by the image layer.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ImageDescriptor {
    #[serde(default)]
    pub name: String,
    /// Image is in the runtime's own single-file format and carries action scripts.
    #[serde(default)]
    pub native: bool,
    #[serde(default)]
    pub config: ImageConfig,
}

/// The part of an OCI image configuration that drives the process.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Env")]
    pub env: Option<Vec<String>>,
    #[serde(rename = "Entrypoint")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(rename = "Cmd")]
    pub cmd: Option<Vec<String>>,
}

impl ImageDescriptor {
    pub fn env(&self) -> &[String] {
        self.config.env.as_deref().unwrap_or_default()
    }

    pub fn entrypoint(&self) -> &[String] {
        self.config.entrypoint.as_deref().unwrap_or_default()
    }

    pub fn cmd(&self) -> &[String] {
        self.config.cmd.as_deref().unwrap_or_default()
    }

    pub fn declares_user(&self) -> bool {
        !self.config.user.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Pid,
    Mount,
    Ipc,
    Network,
    User,
    Uts,
    Cgroup,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Namespace::Pid => "pid",
            Namespace::Mount => "mount",
            Namespace::Ipc => "ipc",
            Namespace::Network => "network",
            Namespace::User => "user",
            Namespace::Uts => "uts",
            Namespace::Cgroup => "cgroup",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CapList {
    Add,
    Drop,
}

impl fmt::Display for CapList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapList::Add => f.write_str("--add-caps"),
            CapList::Drop => f.write_str("--drop-caps"),
        }
    }
}

/// Non-fatal findings made while resolving a launch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    UnknownCapability { list: CapList, name: String },
    RedundantNamespace { flag: NamespaceFlags },
}

impl Notice {
    pub fn log(&self) {
        match self {
            Notice::UnknownCapability { .. } => log::warn!("{self}"),
            Notice::RedundantNamespace { .. } => log::info!("{self}"),
        }
    }
}

const USER_NAMESPACE_NOTICE: &str =
    "a user namespace is always created when run as non-root, user namespace flag is redundant";

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UnknownCapability { list, name } => {
                write!(f, "Ignoring unknown {list}: {name}")
            }
            Notice::RedundantNamespace { flag } if *flag == NamespaceFlags::USER => {
                f.write_str(USER_NAMESPACE_NOTICE)
            }
            Notice::RedundantNamespace { flag } => {
                let names: Vec<&str> = flag.iter_names().map(|(name, _)| name).collect();
                write!(
                    f,
                    "the {} namespace is always created, flag is redundant",
                    names.join("|")
                )
            }
        }
    }
}
