use std::path::{Path, PathBuf};
use std::process::ExitCode;

use env_logger::Env;
use serde::de::DeserializeOwned;

use ocilaunch::host::{HostConfig, LiveHost};
use ocilaunch::types::{ImageDescriptor, LaunchOptions};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("usage: ocilaunch <image-config.json> [launch-options.json]")]
    Usage,
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Launch(#[from] ocilaunch::LaunchError),
    #[error("could not render config.json: {0}")]
    Render(#[from] serde_json::Error),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let data = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn run() -> Result<(), CliError> {
    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let (image_path, options_path) = match args.as_slice() {
        [image] => (image, None),
        [image, options] => (image, Some(options)),
        _ => return Err(CliError::Usage),
    };

    let mut image: ImageDescriptor = read_json(image_path)?;
    if image.name.is_empty() {
        image.name = image_path.to_string_lossy().into_owned();
    }
    let options: LaunchOptions = match options_path {
        Some(path) => read_json(path)?,
        None => LaunchOptions::default(),
    };

    let host = LiveHost::capture(HostConfig::default());
    let spec = ocilaunch::assemble(&image, &options, &host)?;
    println!("{}", serde_json::to_string_pretty(&spec.into_oci())?);
    Ok(())
}

pub fn main() -> ExitCode {
    let env = Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
