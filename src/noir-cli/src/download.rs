//! Drives `steamcmd` through a generated run script.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::details::Platform;
use crate::error::ProcessError;
use crate::task::CancelToken;

pub const DEFAULT_STEAMCMD: &str = "steamcmd";

/// How often a running steamcmd is checked for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything needed to download one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub id: u32,
    pub platform: Platform,
    pub username: String,
}

/// Render the steamcmd run script. Identical inputs give identical text.
pub fn render_script(platform: Platform, install_dir: &Path, username: &str, id: u32) -> String {
    format!(
        "@ShutdownOnFailedCommand 1\n\
         @NoPromptForPassword 1\n\
         @sSteamCmdForcePlatformType {platform}\n\
         force_install_dir {dir}\n\
         login {username}\n\
         app_update {id} validate\n\
         quit\n",
        platform = platform.steamcmd_name(),
        dir = install_dir.display(),
    )
}

/// Install directory for `id`: `<base>/<id>`.
pub fn install_dir(base: &Path, id: u32) -> PathBuf {
    base.join(id.to_string())
}

#[derive(Debug, Clone)]
pub struct Downloader {
    program: PathBuf,
}

impl Downloader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run steamcmd to completion for `request`, installing under the current
    /// working directory. Blocks the calling thread.
    pub fn download(&self, request: &DownloadRequest, cancel: &CancelToken) -> Result<(), ProcessError> {
        let cwd = std::env::current_dir().map_err(ProcessError::InstallDir)?;
        let dir = install_dir(&cwd, request.id);
        let script = render_script(request.platform, &dir, &request.username, request.id);

        // Removed when dropped at the end of this call.
        let mut script_file = tempfile::Builder::new()
            .prefix("steamcmd-download")
            .suffix(".txt")
            .tempfile()
            .map_err(ProcessError::Script)?;
        script_file
            .write_all(script.as_bytes())
            .and_then(|()| script_file.flush())
            .map_err(ProcessError::Script)?;

        tracing::info!(
            id = request.id,
            platform = %request.platform,
            dir = %dir.display(),
            "starting steamcmd"
        );

        let mut child = Command::new(&self.program)
            .arg("+runscript")
            .arg(script_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let status = loop {
            if cancel.is_cancelled() {
                tracing::info!(id = request.id, "cancelling steamcmd");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(ProcessError::Spawn {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        };

        if !status.success() {
            return Err(ProcessError::Exit {
                program: self.program.clone(),
                status,
            });
        }

        tracing::info!(id = request.id, "steamcmd finished");
        Ok(())
    }
}
