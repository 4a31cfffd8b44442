// src/api/audit.rs
use crate::api::Call;
use crate::domain::audit::{AuditFilter, EntityType};
use crate::errors::ServerError;
use crate::responses::{json_ok, ResultResp};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListInput {
    #[serde(flatten)]
    filter: AuditFilter,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryInput {
    entity_type: EntityType,
    entity_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityInput {
    user_id: i64,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RecentInput {
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatsInput {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

pub fn dispatch(procedure: &str, call: Call<'_>) -> ResultResp {
    let audit = &call.services.audit;
    match procedure {
        "list" => {
            let ListInput {
                filter,
                page,
                page_size,
            } = call.input()?;
            json_ok(&audit.query(call.conn, call.actor()?, &filter, page, page_size)?)
        }
        "entityHistory" => {
            let HistoryInput {
                entity_type,
                entity_id,
            } = call.input()?;
            json_ok(&audit.entity_history(call.conn, call.actor()?, entity_type, entity_id)?)
        }
        "userActivity" => {
            let ActivityInput { user_id, limit } = call.input()?;
            json_ok(&audit.user_activity(call.conn, call.actor()?, user_id, limit)?)
        }
        "recent" => {
            let RecentInput { limit } = call.input()?;
            json_ok(&audit.recent(call.conn, call.actor()?, limit)?)
        }
        "stats" => {
            let StatsInput {
                start_date,
                end_date,
            } = call.input()?;
            json_ok(&audit.stats(call.conn, call.actor()?, start_date, end_date)?)
        }
        other => Err(ServerError::NotFound(format!("Unknown procedure audit.{other}"))),
    }
}
