// src/lifecycle/recorder.rs
use crate::config::AuditConfig;
use crate::db::audit::{self as db_audit, ActorStamp};
use crate::domain::actor::Actor;
use crate::domain::audit::{
    AuditEvent, AuditFilter, AuditLogEntry, AuditPage, AuditStats, EntityType, Pagination,
};
use crate::errors::ServerError;
use crate::lifecycle::require_admin;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

const ENTITY_HISTORY_LIMIT: u32 = 100;
const RECENT_MAX: u32 = 50;
const RECENT_DEFAULT: u32 = 20;

/// Append-only history of state-changing actions.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    cfg: AuditConfig,
}

/// Serializes a value for an audit payload. Failure drops the payload rather
/// than the entry.
pub fn snapshot<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            log::error!("audit snapshot serialization failed: {e}");
            None
        }
    }
}

fn stamp(actor: Option<&Actor>) -> ActorStamp {
    match actor {
        Some(a) => ActorStamp {
            user_id: Some(a.id),
            user_name: a.name.clone(),
            user_role: a.role.to_string(),
        },
        None => ActorStamp {
            user_id: None,
            user_name: "System".to_string(),
            user_role: "system".to_string(),
        },
    }
}

impl AuditRecorder {
    pub fn new(cfg: AuditConfig) -> Self {
        Self { cfg }
    }

    /// Appends an entry. Errors are logged and swallowed: a failed history
    /// write must never fail the operation it describes.
    pub fn record(
        &self,
        conn: &Connection,
        actor: Option<&Actor>,
        event: AuditEvent,
        now: DateTime<Utc>,
    ) {
        if let Err(e) = db_audit::insert_entry(conn, &stamp(actor), &event, now) {
            log::error!(
                "audit write failed for {} on {} {:?}: {e}",
                event.action,
                event.entity_type,
                event.entity_id
            );
        }
    }

    /// Paginated, newest-first listing. `page` is 1-based.
    pub fn query(
        &self,
        conn: &Connection,
        actor: &Actor,
        filter: &AuditFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<AuditPage, ServerError> {
        require_admin(actor)?;

        let page = page.unwrap_or(1);
        let limit = page_size.unwrap_or(self.cfg.default_page_size);
        if page == 0 {
            return Err(ServerError::Validation("page must be 1 or greater".into()));
        }
        if limit == 0 || limit > self.cfg.max_page_size {
            return Err(ServerError::Validation(format!(
                "pageSize must be between 1 and {}",
                self.cfg.max_page_size
            )));
        }

        let offset = u64::from(page - 1) * u64::from(limit);
        let (logs, total) = db_audit::query_entries(conn, filter, limit, offset)?;
        let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

        Ok(AuditPage {
            logs,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
        })
    }

    /// Newest entries for one entity. Admins see everything; agents may read
    /// the history of properties they manage.
    pub fn entity_history(
        &self,
        conn: &Connection,
        actor: &Actor,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<Vec<AuditLogEntry>, ServerError> {
        if !actor.is_admin() {
            let allowed = entity_type == EntityType::Property
                && crate::db::properties::find_property(conn, entity_id)?
                    .map(|p| p.can_be_managed_by(actor))
                    .unwrap_or(false);
            if !allowed {
                return Err(ServerError::Permission(
                    "You do not have permission to view this history".into(),
                ));
            }
        }

        let filter = AuditFilter {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            ..Default::default()
        };
        Ok(db_audit::query_entries(conn, &filter, ENTITY_HISTORY_LIMIT, 0)?.0)
    }

    pub fn user_activity(
        &self,
        conn: &Connection,
        actor: &Actor,
        user_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<AuditLogEntry>, ServerError> {
        require_admin(actor)?;
        let limit = limit.unwrap_or(self.cfg.default_page_size);
        if limit == 0 || limit > self.cfg.max_page_size {
            return Err(ServerError::Validation(format!(
                "limit must be between 1 and {}",
                self.cfg.max_page_size
            )));
        }
        let filter = AuditFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        Ok(db_audit::query_entries(conn, &filter, limit, 0)?.0)
    }

    pub fn recent(
        &self,
        conn: &Connection,
        actor: &Actor,
        limit: Option<u32>,
    ) -> Result<Vec<AuditLogEntry>, ServerError> {
        require_admin(actor)?;
        let limit = limit.unwrap_or(RECENT_DEFAULT);
        if limit == 0 || limit > RECENT_MAX {
            return Err(ServerError::Validation(format!(
                "limit must be between 1 and {RECENT_MAX}"
            )));
        }
        Ok(db_audit::query_entries(conn, &AuditFilter::default(), limit, 0)?.0)
    }

    /// Counts by entity type and action, plus the most active actors.
    pub fn stats(
        &self,
        conn: &Connection,
        actor: &Actor,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<AuditStats, ServerError> {
        require_admin(actor)?;
        let filter = AuditFilter {
            start_date,
            end_date,
            ..Default::default()
        };
        let (total, by_entity_type, by_action, top_users) =
            db_audit::aggregate_stats(conn, &filter)?;
        Ok(AuditStats {
            total,
            by_entity_type,
            by_action,
            top_users,
        })
    }
}
