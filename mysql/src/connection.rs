use serde::Deserialize;

use crate::types::{port_or_default, Scalar};
use crate::wrapper::ProbeOptions;
use crate::{MysqlError, Result};

/// Body of a connectivity probe request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionRequest {
    pub host: Option<String>,
    pub port: Option<Scalar>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectionRequest {
    /// Host and user are required; everything else has a default
    pub fn validate(self) -> Result<ProbeOptions> {
        let host = self.host.as_deref().map(str::trim).unwrap_or_default();
        let user = self.user.as_deref().map(str::trim).unwrap_or_default();

        if host.is_empty() || user.is_empty() {
            return Err(MysqlError::Validation("Missing host or user".to_string()));
        }

        let database = self
            .database
            .as_deref()
            .map(str::trim)
            .filter(|db| !db.is_empty())
            .map(str::to_string);

        Ok(ProbeOptions {
            host: host.to_string(),
            port: port_or_default(&self.port),
            user: user.to_string(),
            password: self.password.unwrap_or_default(),
            database,
        })
    }
}
