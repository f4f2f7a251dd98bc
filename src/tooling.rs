//! External post-processing
//!
//! Formatters and linters run once over the output directory after every
//! stage has finished. They are cosmetic: failures come back as `ToolError`
//! and the orchestrator downgrades them to warnings.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ToolError;

pub trait PostProcessor: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, dir: &Path) -> Result<(), ToolError>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A local command invoked with the target directory as its last argument.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    /// Program plus arguments, e.g. `npx prettier --write`.
    label: String,
    timeout: Duration,
}

impl ExternalCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let label = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        ExternalCommand {
            program: program.to_string(),
            args,
            label,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn prettier() -> Self {
        ExternalCommand::new("npx", ["prettier", "--write"])
    }

    pub fn eslint() -> Self {
        ExternalCommand::new("npx", ["eslint", "--fix"])
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus, ToolError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolError::Timeout {
                        program: self.label(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(ToolError::Spawn {
                        program: self.label(),
                        source,
                    })
                }
            }
        }
    }
}

impl PostProcessor for ExternalCommand {
    fn name(&self) -> &str {
        &self.label
    }

    fn run(&self, dir: &Path) -> Result<(), ToolError> {
        let spawn_err = |source| ToolError::Spawn {
            program: self.label(),
            source,
        };
        // A file rather than a pipe: descendants of the tool that keep stderr
        // open cannot block us once the tool itself has exited or been killed.
        let mut captured: File = tempfile::tempfile().map_err(spawn_err)?;
        let sink = captured.try_clone().map_err(spawn_err)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(sink))
            .spawn()
            .map_err(spawn_err)?;

        let status = self.wait(&mut child)?;
        if status.success() {
            return Ok(());
        }

        let mut stderr = Vec::new();
        let _ = captured
            .seek(SeekFrom::Start(0))
            .and_then(|_| captured.read_to_end(&mut stderr));
        Err(ToolError::Exit {
            program: self.label(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        })
    }
}

pub fn default_post_processors() -> Vec<Box<dyn PostProcessor>> {
    vec![
        Box::new(ExternalCommand::prettier()),
        Box::new(ExternalCommand::eslint()),
    ]
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_successful_command() {
        let cmd = ExternalCommand::new("true", Vec::<String>::new());
        assert!(cmd.run(Path::new(".")).is_ok());
    }

    #[test]
    fn test_failing_command_is_exit_error() {
        let cmd = ExternalCommand::new("false", Vec::<String>::new());
        assert!(matches!(cmd.run(Path::new(".")), Err(ToolError::Exit { .. })));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let cmd = ExternalCommand::new("definitely-not-a-real-tool-xyz", Vec::<String>::new());
        assert!(matches!(cmd.run(Path::new(".")), Err(ToolError::Spawn { .. })));
    }

    #[test]
    fn test_name_tells_tools_apart() {
        assert_eq!(ExternalCommand::prettier().name(), "npx prettier --write");
        assert_eq!(ExternalCommand::eslint().name(), "npx eslint --fix");
    }

    #[test]
    fn test_stderr_captured_without_waiting_on_descendants() {
        // The backgrounded sleep inherits stderr and outlives the shell.
        let cmd = ExternalCommand::new("sh", ["-c", "(sleep 3 >&2 &); echo broken >&2; exit 1"]);
        let started = Instant::now();
        match cmd.run(Path::new(".")) {
            Err(ToolError::Exit { stderr, .. }) => assert_eq!(stderr, "broken"),
            other => panic!("expected exit error, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_timeout_kills_child() {
        let cmd = ExternalCommand::new("sh", ["-c", "sleep 5"]).with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        assert!(matches!(cmd.run(Path::new(".")), Err(ToolError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
