//! External command execution.
//!
//! Runs the site generator (`[build] command`) that renders every route to
//! HTML before any post-processing may start.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
};

/// Run `cmd` (program followed by its arguments) in `root`, relaying its
/// output through `log!` under the program's name.
///
/// # Errors
/// Fails when the command is empty, cannot be spawned, or exits non-zero.
pub fn exec(root: Option<&Path>, cmd: &[String]) -> Result<Output> {
    let (name, mut command) = prepare(root, &to_cmd_vec(cmd))?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output)?;
    Ok(output)
}

/// Ensure the program of `cmd` can be found on `PATH`.
pub fn check_installed(field: &str, cmd: &[String]) -> Result<()> {
    let Some(program) = cmd.first() else {
        bail!("{field} must have at least one element");
    };
    which::which(program)
        .with_context(|| format!("`{program}` not found. Please install it first."))?;
    Ok(())
}

#[inline]
fn to_cmd_vec(cmd: &[String]) -> Vec<OsString> {
    cmd.iter()
        .filter(|a| !a.is_empty())
        .map(OsString::from)
        .collect()
}

fn prepare(root: Option<&Path>, cmd: &[OsString]) -> Result<(String, Command)> {
    let (program, args) = cmd.split_first().context("Empty command")?;
    let name = Path::new(program)
        .file_name()
        .and_then(|s| s.to_str())
        .context("Invalid command name")?
        .to_owned();

    let mut command = Command::new(program);
    command.args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

/// Relay non-empty output lines; on failure print stderr and bail.
fn log_output(name: &str, output: &Output) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let message = stderr.trim();
        if !message.is_empty() {
            eprintln!("{message}");
        }
        bail!("Command `{name}` failed with {}", output.status);
    }

    for line in stdout.lines().chain(stderr.lines()) {
        if !line.trim().is_empty() {
            log!(name; "{line}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_to_cmd_vec_skips_empty() {
        let cmd = to_cmd_vec(&strings(&["npm", "", "run", "build"]));
        let expected: Vec<OsString> = ["npm", "run", "build"].map(OsString::from).into();
        assert_eq!(cmd, expected);
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(None, &[]).is_err());
    }

    #[test]
    fn test_prepare_uses_file_name() {
        let (name, _) = prepare(None, &to_cmd_vec(&strings(&["/usr/bin/npx", "next"]))).unwrap();
        assert_eq!(name, "npx");
    }

    #[test]
    fn test_check_installed_empty_command() {
        let err = check_installed("[build.command]", &[]).unwrap_err();
        assert!(err.to_string().contains("[build.command]"));
    }

    #[test]
    fn test_check_installed_missing_program() {
        let cmd = strings(&["folio-definitely-not-installed-xyz"]);
        assert!(check_installed("[build.command]", &cmd).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_success_and_failure() {
        assert!(exec(None, &strings(&["true"])).is_ok());
        let err = exec(None, &strings(&["false"])).unwrap_err();
        assert!(err.to_string().contains("`false` failed"));
    }
}
