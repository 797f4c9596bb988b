use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use phf::phf_set;

use crate::envfile::{self, EnvFileError};
use crate::host::HostState;
use crate::types::{ImageDescriptor, LaunchOptions, ENV_PASSTHROUGH_PREFIX, LIBS_BIND_PATH};

/// Variables owned by the shell; an environment file can never set them.
pub static READ_ONLY_VARS: phf::Set<&'static str> = phf_set! {
    "EUID",
    "GID",
    "HOME",
    "IFS",
    "OPTIND",
    "PWD",
    "UID",
};

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("could not read environment file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("while processing {}: {source}", path.display())]
    Eval {
        path: PathBuf,
        source: EnvFileError,
    },
}

/// Replace `key` in place if present, else append it.
fn set_env(env: &mut Vec<(String, String)>, key: &str, value: &str) {
    match env.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_owned(),
        None => env.push((key.to_owned(), value.to_owned())),
    }
}

/// The runtime identity variables every container gets.
pub fn default_env(image: &ImageDescriptor, options: &LaunchOptions) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "APPTAINER_CONTAINER".to_owned(),
            options.bundle.to_string_lossy().into_owned(),
        ),
        ("APPTAINER_NAME".to_owned(), image.name.clone()),
    ])
}

/// Host variables carrying the pass-through prefix, with the prefix stripped.
pub fn passthrough_env<H: HostState + ?Sized>(host: &H) -> BTreeMap<String, String> {
    host.environ()
        .iter()
        .filter_map(|(k, v)| {
            let key = k.strip_prefix(ENV_PASSTHROUGH_PREFIX)?;
            (!key.is_empty()).then(|| (key.to_owned(), v.clone()))
        })
        .collect()
}

/// Evaluate an environment file, dropping the shell's read-only variables.
pub fn env_file_map(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>, EnvironmentError> {
    fn env_file_map_inner(path: &Path) -> Result<BTreeMap<String, String>, EnvironmentError> {
        let content = std::fs::read_to_string(path).map_err(|source| EnvironmentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut vars = envfile::evaluate(&content).map_err(|source| EnvironmentError::Eval {
            path: path.to_path_buf(),
            source,
        })?;
        vars.retain(|k, _| !READ_ONLY_VARS.contains(k.as_str()));
        log::debug!(
            "{} variables from environment file {}",
            vars.len(),
            path.display()
        );
        Ok(vars)
    }

    env_file_map_inner(path.as_ref())
}

/// Merge every runtime source of variables, lowest precedence first.
pub fn runtime_env<H: HostState + ?Sized>(
    image: &ImageDescriptor,
    options: &LaunchOptions,
    host: &H,
) -> Result<BTreeMap<String, String>, EnvironmentError> {
    let mut env = default_env(image, options);
    if let Some(term) = host.var("TERM") {
        env.insert("TERM".to_owned(), term.to_owned());
    }
    env.extend(passthrough_env(host));
    if let Some(path) = &options.env_file {
        env.extend(env_file_map(path)?);
    }
    env.extend(options.env.iter().cloned());

    // An image with its own USER keeps its own idea of HOME.
    if !image.declares_user() {
        env.insert(
            "HOME".to_owned(),
            options.home.to_string_lossy().into_owned(),
        );
    }
    Ok(env)
}

fn join_path(front: &str, back: &str) -> String {
    match (front.is_empty(), back.is_empty()) {
        (true, _) => back.to_owned(),
        (_, true) => front.to_owned(),
        _ => format!("{front}:{back}"),
    }
}

/// `value` with the library bind path present exactly once.
pub fn with_libs_path(value: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !value.is_empty() {
        for part in value.split(':') {
            if part == LIBS_BIND_PATH && parts.contains(&LIBS_BIND_PATH) {
                continue;
            }
            parts.push(part);
        }
    }
    if !parts.contains(&LIBS_BIND_PATH) {
        parts.push(LIBS_BIND_PATH);
    }
    parts.join(":")
}

/// Final `KEY=VALUE` list: the image environment overridden by the runtime one.
///
/// `PATH` and `LD_LIBRARY_PATH` from the image are only defaults; `APPEND_PATH` and
/// `PREPEND_PATH` from the runtime extend `PATH` instead of being set themselves.
pub fn process_env(image_env: &[String], runtime: &BTreeMap<String, String>) -> Vec<String> {
    let mut env = Vec::new();
    let mut path = String::new();
    let mut ld_library_path = String::new();

    for entry in image_env {
        let Some((key, value)) = entry.split_once('=') else {
            log::debug!("ignoring image environment entry without value: {entry}");
            continue;
        };
        match key {
            "PATH" => path = value.to_owned(),
            "LD_LIBRARY_PATH" => ld_library_path = value.to_owned(),
            _ => {}
        }
        set_env(&mut env, key, value);
    }

    let mut append_path = "";
    let mut prepend_path = "";
    for (key, value) in runtime {
        match key.as_str() {
            "PATH" => path = value.clone(),
            "APPEND_PATH" => append_path = value.as_str(),
            "PREPEND_PATH" => prepend_path = value.as_str(),
            "LD_LIBRARY_PATH" => ld_library_path = value.clone(),
            _ => set_env(&mut env, key, value),
        }
    }

    let path = join_path(prepend_path, &join_path(&path, append_path));
    if !path.is_empty() {
        set_env(&mut env, "PATH", &path);
    }
    set_env(
        &mut env,
        "LD_LIBRARY_PATH",
        &with_libs_path(&ld_library_path),
    );

    env.into_iter().map(|(k, v)| format!("{k}={v}")).collect()
}

pub fn compose<H: HostState + ?Sized>(
    image: &ImageDescriptor,
    options: &LaunchOptions,
    host: &H,
) -> Result<Vec<String>, EnvironmentError> {
    let runtime = runtime_env(image, options, host)?;
    let env = process_env(image.env(), &runtime);
    log::debug!("container environment: {env:?}");
    Ok(env)
}
