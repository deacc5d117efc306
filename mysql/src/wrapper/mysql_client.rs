use log::{debug, info};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;

use super::process::run_with_timeout;
use crate::{MysqlError, Result};

/// Longest slice of client error output surfaced to callers
const MAX_ERROR_CHARS: usize = 200;

/// Options for a connectivity probe
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

/// Statement run by the probe; the database name is quoted as an identifier
pub fn probe_statement(database: Option<&str>) -> String {
    match database {
        Some(db) if !db.is_empty() => format!("USE `{}`; SELECT 1", db.replace('`', "``")),
        _ => "SELECT 1".to_string(),
    }
}

/// Wrapper for the `mysql` command-line client
#[derive(Debug, Clone)]
pub struct MysqlClient {
    program: String,
}

impl MysqlClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs `SELECT 1` against the server, optionally after `USE <db>`.
    ///
    /// The password travels in `MYSQL_PWD` so it never shows up in the
    /// process list.
    pub async fn probe(&self, options: &ProbeOptions, limit: Duration) -> Result<()> {
        let statement = probe_statement(options.database.as_deref());

        let mut cmd = Command::new(&self.program);
        cmd.env("MYSQL_PWD", &options.password)
            .arg("-h")
            .arg(&options.host)
            .arg("-P")
            .arg(&options.port)
            .arg("-u")
            .arg(&options.user)
            .arg("-e")
            .arg(&statement);

        debug!(
            "Running {} -h {} -P {} -u {} -e {statement:?}",
            self.program, options.host, options.port, options.user
        );

        let output = run_with_timeout(cmd, &self.program, limit)
            .await
            .map_err(|e| self.client_error(e))?;

        if output.success() {
            info!(
                "Connection probe to {}:{} succeeded",
                options.host, options.port
            );
            return Ok(());
        }

        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim()
        } else {
            output.stderr.trim()
        };

        if detail.is_empty() {
            Err(MysqlError::ConnectionFailed("unknown error".to_string()))
        } else {
            Err(MysqlError::ConnectionFailed(
                detail.chars().take(MAX_ERROR_CHARS).collect(),
            ))
        }
    }

    /// Check if the client is available in the system
    pub async fn check_availability(&self) -> Result<String> {
        let output = run_with_timeout(
            {
                let mut cmd = Command::new(&self.program);
                cmd.arg("--version");
                cmd
            },
            &self.program,
            Duration::from_secs(10),
        )
        .await
        .map_err(|e| self.client_error(e))?;

        if !output.success() {
            return Err(MysqlError::ConnectionFailed(format!(
                "{} --version exited with {}",
                self.program,
                output.returncode()
            )));
        }

        let version = output.stdout.trim().to_string();
        debug!("{} version: {version}", self.program);
        Ok(version)
    }

    fn client_error(&self, err: MysqlError) -> MysqlError {
        match err {
            MysqlError::Spawn { source, .. } if source.kind() == ErrorKind::NotFound => {
                MysqlError::ClientNotFound(self.program.clone())
            }
            other => other,
        }
    }
}
