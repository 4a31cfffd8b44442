// src/db/properties.rs
use crate::domain::property::{NewProperty, Property, PropertyStatus};
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const PROPERTY_COLUMNS: &str = r#"
    p.id, p.title, p.description, p.type, p.transaction_type, p.price, p.size,
    p.rooms, p.bathrooms, p.has_backyard, p.has_living_room, p.has_kitchen,
    p.address, p.city, p.state, p.zip_code, p.agent_id, p.assigned_agent_id,
    p.custom_commission_rate, p.status, p.is_approved, p.approved_by,
    p.approved_at, p.rejection_reason, p.created_at, p.updated_at
"#;

/// A property joined with the display name of its creating agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListing {
    #[serde(flatten)]
    pub property: Property,
    pub agent_name: Option<String>,
}

fn map_property(r: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: r.get(0)?,
        title: r.get(1)?,
        description: r.get(2)?,
        kind: r.get(3)?,
        transaction_type: r.get(4)?,
        price: r.get(5)?,
        size: r.get(6)?,
        rooms: r.get(7)?,
        bathrooms: r.get(8)?,
        has_backyard: r.get(9)?,
        has_living_room: r.get(10)?,
        has_kitchen: r.get(11)?,
        address: r.get(12)?,
        city: r.get(13)?,
        state: r.get(14)?,
        zip_code: r.get(15)?,
        creator_agent_id: r.get(16)?,
        assigned_agent_id: r.get(17)?,
        custom_commission_rate: r.get(18)?,
        status: r.get(19)?,
        is_approved: r.get(20)?,
        approved_by: r.get(21)?,
        approved_at: r.get(22)?,
        rejection_reason: r.get(23)?,
        created_at: r.get(24)?,
        updated_at: r.get(25)?,
    })
}

fn map_listing(r: &Row<'_>) -> rusqlite::Result<PropertyListing> {
    Ok(PropertyListing {
        property: map_property(r)?,
        agent_name: r.get(26)?,
    })
}

/// Inserts a validated property and returns its id.
#[allow(clippy::too_many_arguments)]
pub fn insert_property(
    conn: &Connection,
    input: &NewProperty,
    creator_id: i64,
    status: PropertyStatus,
    is_approved: bool,
    approved_by: Option<i64>,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    let approved_at = approved_by.map(|_| now);
    conn.execute(
        r#"
        insert into properties (
            title, description, type, transaction_type, price, size, rooms, bathrooms,
            has_backyard, has_living_room, has_kitchen, address, city, state, zip_code,
            agent_id, status, is_approved, approved_by, approved_at, created_at, updated_at
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                  ?16, ?17, ?18, ?19, ?20, ?21, ?21)
        "#,
        params![
            input.title,
            input.description,
            input.kind,
            input.transaction_type,
            input.price,
            input.size,
            input.rooms,
            input.bathrooms,
            input.has_backyard,
            input.has_living_room,
            input.has_kitchen,
            input.address,
            input.city,
            input.state,
            input.zip_code,
            creator_id,
            status,
            is_approved,
            approved_by,
            approved_at,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert property failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_property(conn: &Connection, property_id: i64) -> Result<Option<Property>, ServerError> {
    conn.query_row(
        &format!("select {PROPERTY_COLUMNS} from properties p where p.id = ?"),
        params![property_id],
        map_property,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select property failed: {e}")))
}

fn query_listings(
    conn: &Connection,
    where_clause: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<PropertyListing>, ServerError> {
    let sql = format!(
        r#"
        select {PROPERTY_COLUMNS}, u.name
        from properties p
        left join users u on u.id = p.agent_id
        {where_clause}
        order by p.created_at desc, p.id desc
        "#
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args, map_listing)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Public catalogue: approved listings still on the market.
pub fn list_active(conn: &Connection) -> Result<Vec<PropertyListing>, ServerError> {
    query_listings(
        conn,
        "where p.status = 'active' and p.is_approved = 1",
        &[],
    )
}

pub fn list_all(conn: &Connection) -> Result<Vec<PropertyListing>, ServerError> {
    query_listings(conn, "", &[])
}

/// Properties an agent created or is currently assigned to.
pub fn list_for_agent(conn: &Connection, agent_id: i64) -> Result<Vec<PropertyListing>, ServerError> {
    query_listings(
        conn,
        "where p.agent_id = ?1 or p.assigned_agent_id = ?1",
        &[&agent_id],
    )
}

pub fn list_pending_approval(conn: &Connection) -> Result<Vec<PropertyListing>, ServerError> {
    query_listings(conn, "where p.status = 'pending_approval'", &[])
}

/// Approves a property that is not yet approved. Returns the number of rows
/// changed; zero means another request approved it first.
pub fn mark_approved(
    conn: &Connection,
    property_id: i64,
    approver_id: i64,
    now: DateTime<Utc>,
) -> Result<usize, ServerError> {
    let n = conn.execute(
        r#"
        update properties set
            is_approved = 1, status = 'active', approved_by = ?1, approved_at = ?2,
            rejection_reason = null, updated_at = ?2
        where id = ?3 and is_approved = 0
        "#,
        params![approver_id, now, property_id],
    )?;
    Ok(n)
}

pub fn mark_rejected(
    conn: &Connection,
    property_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<usize, ServerError> {
    let n = conn.execute(
        r#"
        update properties set
            status = 'rejected', rejection_reason = ?1, updated_at = ?2
        where id = ?3 and is_approved = 0
        "#,
        params![reason, now, property_id],
    )?;
    Ok(n)
}

pub fn set_assigned_agent(
    conn: &Connection,
    property_id: i64,
    agent_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        "update properties set assigned_agent_id = ?, updated_at = ? where id = ?",
        params![agent_id, now, property_id],
    )?;
    Ok(())
}

pub fn set_custom_commission_rate(
    conn: &Connection,
    property_id: i64,
    rate_bps: Option<u32>,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        "update properties set custom_commission_rate = ?, updated_at = ? where id = ?",
        params![rate_bps, now, property_id],
    )?;
    Ok(())
}

/// Writes the descriptive and status fields of `next` back to its row.
pub fn update_property_fields(
    conn: &Connection,
    next: &Property,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        update properties set
            title = ?1, description = ?2, type = ?3, price = ?4, size = ?5,
            rooms = ?6, bathrooms = ?7, has_backyard = ?8, has_living_room = ?9,
            has_kitchen = ?10, address = ?11, city = ?12, state = ?13, zip_code = ?14,
            status = ?15, updated_at = ?16
        where id = ?17
        "#,
        params![
            next.title,
            next.description,
            next.kind,
            next.price,
            next.size,
            next.rooms,
            next.bathrooms,
            next.has_backyard,
            next.has_living_room,
            next.has_kitchen,
            next.address,
            next.city,
            next.state,
            next.zip_code,
            next.status,
            now,
            next.id,
        ],
    )?;
    Ok(())
}

/// Moves an approved, active property to its closing status. Returns the rows
/// changed; zero means it was no longer active.
pub fn close_if_active(
    conn: &Connection,
    property_id: i64,
    closing: PropertyStatus,
    now: DateTime<Utc>,
) -> Result<usize, ServerError> {
    let n = conn.execute(
        r#"
        update properties set status = ?1, updated_at = ?2
        where id = ?3 and status = 'active' and is_approved = 1
        "#,
        params![closing, now, property_id],
    )?;
    Ok(n)
}

pub fn delete_property(conn: &Connection, property_id: i64) -> Result<usize, ServerError> {
    let n = conn.execute("delete from properties where id = ?", params![property_id])?;
    Ok(n)
}
