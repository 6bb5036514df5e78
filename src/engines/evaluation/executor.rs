use crate::config::ExecutionConfig;
use crate::error::{FuzzplanError, Result};
use log::{debug, trace};
use std::io::Write;
use std::process::{Command, Stdio};

/// Captured output of one script run. The exit status is recorded for
/// logging only; nothing downstream inspects it.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
}

/// Runs a rendered script to completion.
pub trait Executor: Send + Sync {
    fn run_script(&self, script: &str) -> Result<ProcessOutput>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn run_script(&self, script: &str) -> Result<ProcessOutput> {
        (**self).run_script(script)
    }
}

/// Writes each script to its own temporary file and runs it through
/// `<shell> -c <path>`, so a shebang line is honoured and anything else
/// falls back to the shell.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    shell: String,
    echo_output: bool,
}

impl ScriptExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            echo_output: false,
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            echo_output: config.echo_output,
        }
    }

    /// Print each stdout line of every run.
    pub fn with_echo(mut self, echo_output: bool) -> Self {
        self.echo_output = echo_output;
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

#[cfg(unix)]
fn make_executable(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o700);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

impl Executor for ScriptExecutor {
    fn run_script(&self, script: &str) -> Result<ProcessOutput> {
        let mut file = tempfile::Builder::new()
            .prefix("fuzzplan-")
            .suffix(".sh")
            .tempfile()
            .map_err(|e| FuzzplanError::Execution(format!("Could not create script file: {}", e)))?;
        file.write_all(script.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| FuzzplanError::Execution(format!("Could not write script file: {}", e)))?;

        // Close the handle before running, otherwise exec can fail with ETXTBSY.
        let path = file.into_temp_path();
        make_executable(&path).map_err(|e| {
            FuzzplanError::Execution(format!(
                "Could not mark {} executable: {}",
                path.display(),
                e
            ))
        })?;

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(path.as_os_str())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                FuzzplanError::Execution(format!(
                    "Could not execute {} via '{}': {}",
                    path.display(),
                    self.shell,
                    e
                ))
            })?;

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        };

        for line in result.stdout.lines() {
            if self.echo_output {
                println!("{}", line);
            }
            debug!("stdout: {}", line);
        }
        for line in result.stderr.lines() {
            trace!("stderr: {}", line);
        }
        debug!("script exited with {:?}", result.status);

        path.close().map_err(|e| {
            FuzzplanError::Execution(format!("Could not remove script file: {}", e))
        })?;
        Ok(result)
    }
}
