//! Tests for the steamcmd run script and process handling.
//!
//! Covers:
//!   - script       - directive order and exact text
//!   - exit status  - zero is success, anything else is an error
//!   - cancellation - a cancelled download kills steamcmd

use expect_test::expect;
use noir_cli::download::{DownloadRequest, Downloader, install_dir, render_script};
use noir_cli::task::CancelToken;
use noir_cli::{Platform, ProcessError};
use std::path::Path;

#[test]
fn script_lists_directives_in_order() {
    let dir = install_dir(Path::new("/home/user/games"), 620);
    let script = render_script(Platform::Linux, &dir, "gaben", 620);
    expect![[r#"
        @ShutdownOnFailedCommand 1
        @NoPromptForPassword 1
        @sSteamCmdForcePlatformType linux
        force_install_dir /home/user/games/620
        login gaben
        app_update 620 validate
        quit
    "#]]
    .assert_eq(&script);
}

#[test]
fn script_is_deterministic() {
    let dir = Path::new("/tmp/400");
    let a = render_script(Platform::MacOs, dir, "rjw", 400);
    let b = render_script(Platform::MacOs, dir, "rjw", 400);
    assert_eq!(a, b);
    assert!(a.contains("@sSteamCmdForcePlatformType macos\n"));

    let windows = render_script(Platform::Windows, dir, "rjw", 400);
    assert_ne!(a, windows);
}

fn request() -> DownloadRequest {
    DownloadRequest {
        id: 620,
        platform: Platform::Linux,
        username: "gaben".to_string(),
    }
}

#[test]
fn missing_program_is_a_spawn_error() {
    let downloader = Downloader::new("/nonexistent/steamcmd");
    let err = downloader
        .download(&request(), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ProcessError::Spawn { .. }));
}

#[cfg(unix)]
#[test]
fn nonzero_exit_is_an_error() {
    let downloader = Downloader::new("false");
    let err = downloader
        .download(&request(), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ProcessError::Exit { .. }));
}

#[cfg(unix)]
#[test]
fn zero_exit_is_success() {
    let downloader = Downloader::new("true");
    downloader
        .download(&request(), &CancelToken::new())
        .unwrap();
}

#[cfg(unix)]
#[test]
fn cancelled_token_kills_the_process() {
    let dir = tempfile::tempdir().unwrap();
    // A stand-in for steamcmd that never exits on its own.
    let script = dir.path().join("steamcmd");
    std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let token = CancelToken::new();
    let canceller = token.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(200));
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = Downloader::new(&script).download(&request(), &token).unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, ProcessError::Cancelled));
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}
