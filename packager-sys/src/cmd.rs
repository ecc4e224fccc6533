// SPDX-License-Identifier: GPL-3.0-only

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{Result, SysError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

pub fn render(program: &Path, args: &[String]) -> String {
    if args.is_empty() {
        program.display().to_string()
    } else {
        format!("{} {}", program.display(), args.join(" "))
    }
}

/// Run a command in the C locale, killing it once `timeout` elapses.
///
/// A non-zero exit status is reported as `SysError::CommandFailed`.
pub fn run(program: &Path, args: &[String], timeout: Duration) -> Result<CommandOutcome> {
    let rendered = render(program, args);
    debug!("Executing: {}", rendered);

    let mut child = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| SysError::CommandFailed {
            command: rendered.clone(),
            stderr: error.to_string(),
        })?;

    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!("{} did not finish within {:?}, killing it", rendered, timeout);
            terminate(&mut child, &rendered);
            return Err(SysError::Timeout {
                command: rendered,
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output_stdout = collect(stdout_reader);
    let output_stderr = collect(stderr_reader);

    let stdout = String::from_utf8_lossy(&output_stdout).to_string();
    let stderr = String::from_utf8_lossy(&output_stderr).to_string();

    if !status.success() {
        return Err(SysError::CommandFailed {
            command: rendered,
            stderr,
        });
    }

    Ok(CommandOutcome {
        command: rendered,
        stdout,
        stderr,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(error) = pipe.read_to_end(&mut buffer) {
            debug!("Reading command output failed: {}", error);
        }
        buffer
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// SIGKILL the child, then reap it. The pid stays ours until the wait.
fn terminate(child: &mut Child, command: &str) {
    match i32::try_from(child.id()) {
        Ok(raw) => match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => debug!("Killed {} (pid {})", command, raw),
            Err(Errno::ESRCH) => debug!("{} (pid {}) already exited", command, raw),
            Err(error) => warn!("Failed to kill {} (pid {}): {}", command, raw, error),
        },
        Err(_) => warn!("Pid {} of {} is out of range", child.id(), command),
    }

    if let Err(error) = child.wait() {
        warn!("Failed to reap {}: {}", command, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_command_context() {
        let args = vec![
            "-o".to_string(),
            "ro,nolock".to_string(),
            "server:/export".to_string(),
            "/tmp/diskspace_mount".to_string(),
        ];
        let rendered = render(Path::new("/usr/bin/mount"), &args);
        assert_eq!(
            rendered,
            "/usr/bin/mount -o ro,nolock server:/export /tmp/diskspace_mount"
        );
    }

    #[test]
    fn kills_commands_that_outlive_the_timeout() {
        let Ok(sleep) = which::which("sleep") else {
            return;
        };

        let started = Instant::now();
        let result = run(&sleep, &["5".to_string()], Duration::from_millis(100));

        assert!(matches!(result, Err(SysError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn reports_failing_commands() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let args = vec![
            "-c".to_string(),
            "echo used=16.00KiB; echo oops >&2; exit 3".to_string(),
        ];

        match run(&sh, &args, Duration::from_secs(5)) {
            Err(SysError::CommandFailed { stderr, .. }) => assert_eq!(stderr, "oops\n"),
            other => panic!("expected a command failure, got {other:?}"),
        }

        let args = vec!["-c".to_string(), "echo used=16.00KiB".to_string()];
        let outcome = run(&sh, &args, Duration::from_secs(5)).expect("command succeeds");
        assert_eq!(outcome.stdout, "used=16.00KiB\n");
    }
}
