/// Process execution for pgmin.
///
/// Every administrative operation funnels through the `Runner` trait so that
/// tests can substitute a scripted runner for the real client binaries.
use crate::command::CommandLine;
use crate::core::{PgminError, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Executes a command line and returns its captured standard output.
pub trait Runner {
    fn run(&self, cmd: &CommandLine) -> Result<String>;
}

/// Runner backed by the operating system. Blocking: each call waits for the
/// spawned client to exit before returning.
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &CommandLine) -> Result<String> {
        debug!("running: {}", cmd);

        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| PgminError::Command(format!("failed to spawn {}: {}", cmd.program, e)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PgminError::Command(format!(
                "{} exited with {}: {}",
                cmd.program,
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// Searches the directories in `PATH` for an executable with the given name.
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &std::path::Path) -> bool {
    true
}

/// Load-time gate: fails with `Unavailable` when the administrative client
/// binary cannot be found on the executing host.
pub fn check_client(binary: &str) -> Result<PathBuf> {
    find_in_path(binary).ok_or_else(|| {
        PgminError::Unavailable(format!("{} not found in PATH on this host", binary))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // absolute paths: the PATH test below rewrites the environment
    #[test]
    fn test_system_runner_captures_stdout() {
        let cmd = CommandLine::new("/bin/echo").arg("hello");
        let out = SystemRunner.run(&cmd).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let cmd = CommandLine::new("/nonexistent/pgmin-no-such-binary");
        let result = SystemRunner.run(&cmd);
        assert!(matches!(result, Err(PgminError::Command(_))));
    }

    #[test]
    fn test_system_runner_nonzero_exit_is_error() {
        let cmd = CommandLine::new("/bin/sh").arg("-c").arg("echo oops >&2; exit 3");
        let err = SystemRunner.run(&cmd).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("oops"), "stderr not surfaced: {}", msg);
    }

    #[test]
    fn test_find_in_path_locates_executable() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("pgmin-test-bin");
        let mut file = std::fs::File::create(&bin).unwrap();
        file.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let old_path = std::env::var_os("PATH");
        std::env::set_var("PATH", dir.path());
        let found = find_in_path("pgmin-test-bin");
        let gate = check_client("pgmin-test-bin");
        let missing = check_client("pgmin-missing-bin");
        if let Some(p) = old_path {
            std::env::set_var("PATH", p);
        }

        assert_eq!(found, Some(bin.clone()));
        assert_eq!(gate.unwrap(), bin);
        assert!(matches!(missing, Err(PgminError::Unavailable(_))));
    }
}
