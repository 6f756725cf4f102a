//! Process spawning helpers.
//!
//! Console binaries spawned from a GUI process open a console window per
//! invocation on Windows unless `CREATE_NO_WINDOW` is set. Every external
//! tool (encoder, probe) is configured here.

use std::process::Stdio;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Applies platform-specific flags to a tokio process command.
pub fn configure_tokio_command(cmd: &mut tokio::process::Command) {
    #[cfg(target_os = "windows")]
    {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

/// Prepares a command for a long-running encoder.
///
/// Both output streams are piped so they can be merged into one line stream,
/// stdin is closed, and the child is killed if its handle is dropped.
pub fn configure_encoder_command(cmd: &mut tokio::process::Command) {
    configure_tokio_command(cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
}
