// src/db/commissions.rs
use crate::domain::commission::{Commission, CommissionStatus};
use crate::domain::property::TransactionType;
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const COMMISSION_COLUMNS: &str = r#"
    c.id, c.property_id, c.agent_id, c.transaction_type, c.transaction_amount,
    c.commission_rate, c.commission_amount, c.status, c.payment_date,
    c.created_at, c.updated_at
"#;

/// Fields fixed when a commission is recorded.
#[derive(Debug, Clone)]
pub struct NewCommission {
    pub property_id: i64,
    pub agent_id: i64,
    pub transaction_type: TransactionType,
    pub transaction_amount: i64,
    pub commission_rate: u32,
    pub commission_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionListing {
    #[serde(flatten)]
    pub commission: Commission,
    pub property_title: Option<String>,
    pub agent_name: Option<String>,
}

fn map_commission(r: &Row<'_>) -> rusqlite::Result<Commission> {
    Ok(Commission {
        id: r.get(0)?,
        property_id: r.get(1)?,
        agent_id: r.get(2)?,
        transaction_type: r.get(3)?,
        transaction_amount: r.get(4)?,
        commission_rate: r.get(5)?,
        commission_amount: r.get(6)?,
        status: r.get(7)?,
        payment_date: r.get(8)?,
        created_at: r.get(9)?,
        updated_at: r.get(10)?,
    })
}

/// Inserts a commission with status `pending`.
pub fn insert_commission(
    conn: &Connection,
    new: &NewCommission,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into commissions (
            property_id, agent_id, transaction_type, transaction_amount,
            commission_rate, commission_amount, status, created_at, updated_at
        ) values (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?7)
        "#,
        params![
            new.property_id,
            new.agent_id,
            new.transaction_type,
            new.transaction_amount,
            new.commission_rate,
            new.commission_amount,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert commission failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_commission(
    conn: &Connection,
    commission_id: i64,
) -> Result<Option<Commission>, ServerError> {
    conn.query_row(
        &format!("select {COMMISSION_COLUMNS} from commissions c where c.id = ?"),
        params![commission_id],
        map_commission,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select commission failed: {e}")))
}

fn query_listings(
    conn: &Connection,
    where_clause: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<CommissionListing>, ServerError> {
    let sql = format!(
        r#"
        select {COMMISSION_COLUMNS}, p.title, u.name
        from commissions c
        left join properties p on p.id = c.property_id
        left join users u on u.id = c.agent_id
        {where_clause}
        order by c.created_at desc, c.id desc
        "#
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args, |r| {
        Ok(CommissionListing {
            commission: map_commission(r)?,
            property_title: r.get(11)?,
            agent_name: r.get(12)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn list_all(conn: &Connection) -> Result<Vec<CommissionListing>, ServerError> {
    query_listings(conn, "", &[])
}

pub fn list_for_agent(
    conn: &Connection,
    agent_id: i64,
) -> Result<Vec<CommissionListing>, ServerError> {
    query_listings(conn, "where c.agent_id = ?1", &[&agent_id])
}

pub fn count_for_property(conn: &Connection, property_id: i64) -> Result<i64, ServerError> {
    let n = conn.query_row(
        "select count(*) from commissions where property_id = ?",
        params![property_id],
        |r| r.get(0),
    )?;
    Ok(n)
}

/// Sets the status. A supplied `payment_date` overwrites the stored one; `None`
/// leaves it untouched so earlier payment evidence is never cleared.
pub fn update_status(
    conn: &Connection,
    commission_id: i64,
    status: CommissionStatus,
    payment_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<usize, ServerError> {
    let n = conn.execute(
        r#"
        update commissions set
            status = ?1, payment_date = coalesce(?2, payment_date), updated_at = ?3
        where id = ?4
        "#,
        params![status, payment_date, now, commission_id],
    )?;
    Ok(n)
}

pub fn delete_commission(conn: &Connection, commission_id: i64) -> Result<usize, ServerError> {
    let n = conn.execute("delete from commissions where id = ?", params![commission_id])?;
    Ok(n)
}
