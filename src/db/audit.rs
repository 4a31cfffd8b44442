// src/db/audit.rs
use crate::domain::audit::{
    ActionCount, ActorCount, AuditEvent, AuditFilter, AuditLogEntry, EntityType, EntityTypeCount,
};
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};

const ENTRY_COLUMNS: &str = r#"
    id, user_id, user_name, user_role, action, entity_type, entity_id,
    entity_name, previous_value, new_value, description, created_at
"#;

/// Actor identity copied onto each row.
#[derive(Debug, Clone)]
pub struct ActorStamp {
    pub user_id: Option<i64>,
    pub user_name: String,
    pub user_role: String,
}

/// Stored payloads are JSON text; anything unparsable is returned as a string.
fn parse_payload(raw: Option<String>) -> Option<serde_json::Value> {
    raw.map(|s| serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s)))
}

fn map_entry(r: &Row<'_>) -> rusqlite::Result<AuditLogEntry> {
    Ok(AuditLogEntry {
        id: r.get(0)?,
        user_id: r.get(1)?,
        user_name: r.get(2)?,
        user_role: r.get(3)?,
        action: r.get(4)?,
        entity_type: r.get(5)?,
        entity_id: r.get(6)?,
        entity_name: r.get(7)?,
        previous_value: parse_payload(r.get(8)?),
        new_value: parse_payload(r.get(9)?),
        description: r.get(10)?,
        created_at: r.get(11)?,
    })
}

pub fn insert_entry(
    conn: &Connection,
    actor: &ActorStamp,
    event: &AuditEvent,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    let previous = event
        .previous_value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ServerError::DbError(format!("serialize previous value failed: {e}")))?;
    let new = event
        .new_value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ServerError::DbError(format!("serialize new value failed: {e}")))?;

    conn.execute(
        r#"
        insert into audit_logs (
            user_id, user_name, user_role, action, entity_type, entity_id,
            entity_name, previous_value, new_value, description, created_at
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            actor.user_id,
            actor.user_name,
            actor.user_role,
            event.action,
            event.entity_type,
            event.entity_id,
            event.entity_name,
            previous,
            new,
            event.description,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert audit log failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

/// Escapes `%`, `_` and the escape character itself so user text matches
/// literally inside a `like ... escape '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Builds the WHERE clause shared by listing, counting and stats.
fn filter_clause(filter: &AuditFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(entity_type) = filter.entity_type {
        conditions.push("entity_type = ?");
        args.push(Box::new(entity_type));
    }
    if let Some(entity_id) = filter.entity_id {
        conditions.push("entity_id = ?");
        args.push(Box::new(entity_id));
    }
    if let Some(user_id) = filter.user_id {
        conditions.push("user_id = ?");
        args.push(Box::new(user_id));
    }
    if let Some(action) = filter.action {
        conditions.push("action = ?");
        args.push(Box::new(action));
    }
    if let Some(start) = filter.start_date {
        conditions.push("created_at >= ?");
        args.push(Box::new(start));
    }
    if let Some(end) = filter.end_date {
        conditions.push("created_at <= ?");
        args.push(Box::new(end));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push(
            r"(description like ? escape '\' or coalesce(entity_name, '') like ? escape '\'
              or user_name like ? escape '\')",
        );
        let pattern = format!("%{}%", escape_like(search));
        for _ in 0..3 {
            args.push(Box::new(pattern.clone()));
        }
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("where {}", conditions.join(" and "))
    };
    (clause, args)
}

/// One page of entries, newest first, plus the total matching count.
pub fn query_entries(
    conn: &Connection,
    filter: &AuditFilter,
    limit: u32,
    offset: u64,
) -> Result<(Vec<AuditLogEntry>, i64), ServerError> {
    let (clause, mut args) = filter_clause(filter);

    let total: i64 = conn.query_row(
        &format!("select count(*) from audit_logs {clause}"),
        params_from_iter(args.iter()),
        |r| r.get(0),
    )?;

    args.push(Box::new(limit));
    args.push(Box::new(offset as i64));
    let mut stmt = conn.prepare(&format!(
        "select {ENTRY_COLUMNS} from audit_logs {clause}
         order by created_at desc, id desc limit ? offset ?"
    ))?;
    let rows = stmt.query_map(params_from_iter(args.iter()), map_entry)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok((out, total))
}

pub fn aggregate_stats(
    conn: &Connection,
    filter: &AuditFilter,
) -> Result<(i64, Vec<EntityTypeCount>, Vec<ActionCount>, Vec<ActorCount>), ServerError> {
    let (clause, args) = filter_clause(filter);

    let total: i64 = conn.query_row(
        &format!("select count(*) from audit_logs {clause}"),
        params_from_iter(args.iter()),
        |r| r.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "select entity_type, count(*) from audit_logs {clause}
         group by entity_type order by count(*) desc, entity_type"
    ))?;
    let by_entity_type = stmt
        .query_map(params_from_iter(args.iter()), |r| {
            Ok(EntityTypeCount {
                entity_type: r.get::<_, EntityType>(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!(
        "select action, count(*) from audit_logs {clause}
         group by action order by count(*) desc, action limit 10"
    ))?;
    let by_action = stmt
        .query_map(params_from_iter(args.iter()), |r| {
            Ok(ActionCount {
                action: r.get(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!(
        "select user_id, user_name, count(*) from audit_logs {clause}
         group by user_id, user_name order by count(*) desc, user_name limit 10"
    ))?;
    let top_users = stmt
        .query_map(params_from_iter(args.iter()), |r| {
            Ok(ActorCount {
                user_id: r.get(0)?,
                user_name: r.get(1)?,
                count: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((total, by_entity_type, by_action, top_users))
}
