//! Typed RPC handlers, one module per router.
//!
//! Each handler decodes its JSON input, calls into `lifecycle`, and encodes
//! the result. Authorization beyond "is there a session at all" lives in the
//! lifecycle components, not here.

pub mod audit;
pub mod commissions;
pub mod properties;

use crate::config::AppConfig;
use crate::domain::actor::Actor;
use crate::errors::ServerError;
use crate::lifecycle::{AuditRecorder, CommissionLedger, CommissionResolver, PropertyLifecycle};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The wired lifecycle components, built once at startup.
#[derive(Debug, Clone)]
pub struct Services {
    pub properties: PropertyLifecycle,
    pub commissions: CommissionLedger,
    pub audit: AuditRecorder,
}

impl Services {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let resolver = CommissionResolver::new(cfg.commission.clone());
        let audit = AuditRecorder::new(cfg.audit.clone());
        let commissions = CommissionLedger::new(resolver.clone(), audit.clone());
        Self {
            properties: PropertyLifecycle::new(resolver, commissions.clone(), audit.clone()),
            commissions,
            audit,
        }
    }
}

/// Everything a handler needs for one call.
pub struct Call<'a> {
    pub conn: &'a mut Connection,
    pub services: &'a Services,
    pub actor: Option<&'a Actor>,
    pub body: &'a [u8],
    pub now: DateTime<Utc>,
}

impl<'a> Call<'a> {
    /// Decodes the JSON input. An empty body reads as `{}`. Malformed or
    /// wrongly shaped input is a validation error like any other bad field.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, ServerError> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            self.body
        };
        serde_json::from_slice(body)
            .map_err(|e| ServerError::Validation(format!("Invalid request: {e}")))
    }

    pub fn actor(&self) -> Result<&'a Actor, ServerError> {
        self.actor
            .ok_or_else(|| ServerError::Unauthorized("You must be signed in".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ById {
    pub id: i64,
}
