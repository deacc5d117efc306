use log::{debug, warn};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::{MysqlError, Result};

/// Everything a finished child process left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code as reported to callers; `-1` when there is none
    pub fn returncode(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Spawns `command`, captures stdout and stderr, and waits at most `limit`.
///
/// On expiry the child is killed and `MysqlError::TimedOut` is returned; no
/// partial output is kept. Spawn failures come back as `MysqlError::Spawn`
/// so callers can tell a missing binary apart from other launch errors.
pub async fn run_with_timeout(
    mut command: Command,
    program: &str,
    limit: Duration,
) -> Result<ProcessOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| MysqlError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
    let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));
    let readers = [stdout_task.abort_handle(), stderr_task.abort_handle()];

    // Background children may inherit the pipes, so the reads share the limit
    let finished = tokio::time::timeout(limit, async {
        let status = child.wait().await?;
        let stdout = join_pipe(stdout_task).await?;
        let stderr = join_pipe(stderr_task).await?;
        Ok::<_, MysqlError>((status, stdout, stderr))
    })
    .await;

    let (status, stdout, stderr) = match finished {
        Ok(result) => result?,
        Err(_) => {
            warn!("{program} exceeded {limit:?}, killing it");
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {program}: {e}");
            }
            for reader in readers {
                reader.abort();
            }
            return Err(MysqlError::TimedOut {
                program: program.to_string(),
                after: limit,
            });
        }
    };

    debug!("{program} exited with {status}");

    Ok(ProcessOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buffer).await?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

async fn join_pipe(task: tokio::task::JoinHandle<std::io::Result<String>>) -> Result<String> {
    task.await
        .map_err(|e| MysqlError::Internal(format!("output reader failed: {e}")))?
        .map_err(MysqlError::Io)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let output = run_with_timeout(
            shell("echo out; echo err >&2; exit 3"),
            "sh",
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(output.code, Some(3));
        assert_eq!(output.returncode(), 3);
        assert!(!output.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn kills_the_child_when_the_limit_expires() {
        let started = Instant::now();
        let result = run_with_timeout(
            shell("exec sleep 30"),
            "sh",
            Duration::from_millis(200),
        )
        .await;

        assert!(matches!(result, Err(MysqlError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn limit_covers_pipes_held_by_background_children() {
        let started = Instant::now();
        let result = run_with_timeout(
            shell("sleep 5 & echo done"),
            "sh",
            Duration::from_millis(300),
        )
        .await;

        assert!(matches!(result, Err(MysqlError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let result = run_with_timeout(
            Command::new("/nonexistent/mysql-warden-test-binary"),
            "mysql-warden-test-binary",
            Duration::from_secs(1),
        )
        .await;

        match result {
            Err(MysqlError::Spawn { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("expected Spawn error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn signal_termination_has_no_exit_code() {
        let output = run_with_timeout(shell("kill -9 $$"), "sh", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.code, None);
        assert_eq!(output.returncode(), -1);
    }
}
