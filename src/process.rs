use std::path::PathBuf;

use crate::host::HostState;
use crate::types::{Action, ImageDescriptor, LaunchOptions};

/// Emulates the native runtime's interactive shell: sets the prompt, prefers bash.
pub const SHELL_SCRIPT: &str =
    "export PS1='Apptainer> '; test -x /bin/bash && exec /bin/bash --norc || exec /bin/sh";

/// Directory holding the action scripts of a native image.
pub const ACTIONS_DIR: &str = "/.singularity.d/actions";

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ProcessError {
    #[error("no process given for the {0} action")]
    MissingProcess(Action),
}

/// Command line of a non-native image, built from its entrypoint and default command.
///
/// An explicit process replaces the entrypoint. The default command is only used when
/// neither a process nor arguments were given.
pub fn image_process_args(image: &ImageDescriptor, options: &LaunchOptions) -> Vec<String> {
    let mut args = match options.process_name() {
        Some(process) => vec![process.to_owned()],
        None => image.entrypoint().to_vec(),
    };
    if !options.args.is_empty() {
        args.extend(options.args.iter().cloned());
    } else if options.process_name().is_none() {
        args.extend(image.cmd().iter().cloned());
    }
    args
}

/// Invocation of the in-image action script for a native image.
pub fn action_script_args(options: &LaunchOptions) -> Result<Vec<String>, ProcessError> {
    let mut args = vec![format!("{ACTIONS_DIR}/{}", options.action)];
    match options.action {
        Action::Exec => {
            let process = options
                .process_name()
                .ok_or(ProcessError::MissingProcess(options.action))?;
            args.push(process.to_owned());
            args.extend(options.args.iter().cloned());
        }
        Action::Run | Action::Start | Action::Test => {
            args.extend(options.args.iter().cloned());
        }
        Action::Shell => {}
    }
    Ok(args)
}

pub fn args(image: &ImageDescriptor, options: &LaunchOptions) -> Result<Vec<String>, ProcessError> {
    let args = if image.native {
        action_script_args(options)?
    } else if options.action == Action::Shell {
        vec!["/bin/sh".to_owned(), "-c".to_owned(), SHELL_SCRIPT.to_owned()]
    } else {
        image_process_args(image, options)
    };
    log::debug!("container process args: {args:?}");
    Ok(args)
}

/// Working directory of the process. `options.home` must already be the final home
/// destination.
pub fn cwd(options: &LaunchOptions) -> PathBuf {
    match &options.cwd {
        Some(cwd) if !cwd.as_os_str().is_empty() => cwd.clone(),
        _ => options.home.clone(),
    }
}

pub fn terminal<H: HostState + ?Sized>(host: &H) -> bool {
    host.stdin_is_terminal()
}
