// src/lifecycle/ledger.rs
use crate::db::commissions::{self as db_commissions, CommissionListing, NewCommission};
use crate::domain::actor::Actor;
use crate::domain::audit::{AuditAction, AuditEvent, EntityType};
use crate::domain::commission::{format_money, format_rate, Commission, CommissionStatus};
use crate::domain::property::{Property, TransactionType};
use crate::errors::ServerError;
use crate::lifecycle::recorder::{snapshot, AuditRecorder};
use crate::lifecycle::resolver::CommissionResolver;
use crate::lifecycle::{load_property, require_admin, require_agent};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

/// Server-computed terms of a newly recorded commission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedCommission {
    pub id: i64,
    pub property_id: i64,
    pub commission_rate: u32,
    pub commission_amount: i64,
    pub transaction_amount: i64,
}

/// Append-only record of commissions and their payment status.
#[derive(Debug, Clone)]
pub struct CommissionLedger {
    resolver: CommissionResolver,
    audit: AuditRecorder,
}

impl CommissionLedger {
    pub fn new(resolver: CommissionResolver, audit: AuditRecorder) -> Self {
        Self { resolver, audit }
    }

    /// Resolves the rate, computes the amount and inserts a pending row. No
    /// audit entry is written here; callers record it once their unit of work
    /// has committed.
    pub(crate) fn insert_pending(
        &self,
        conn: &Connection,
        property: &Property,
        transaction_amount: i64,
        agent: &Actor,
        now: DateTime<Utc>,
    ) -> Result<RecordedCommission, ServerError> {
        // Rates are never taken from the client.
        let rate = self.resolver.resolve_rate(property, None);
        let amount = self.resolver.compute_commission(transaction_amount, rate)?;

        let id = db_commissions::insert_commission(
            conn,
            &NewCommission {
                property_id: property.id,
                agent_id: agent.id,
                transaction_type: property.transaction_type,
                transaction_amount,
                commission_rate: rate,
                commission_amount: amount,
            },
            now,
        )?;

        Ok(RecordedCommission {
            id,
            property_id: property.id,
            commission_rate: rate,
            commission_amount: amount,
            transaction_amount,
        })
    }

    pub(crate) fn record_created(
        &self,
        conn: &Connection,
        property: &Property,
        recorded: &RecordedCommission,
        actor: &Actor,
        now: DateTime<Utc>,
    ) {
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::CommissionCreated,
                EntityType::Commission,
                recorded.id,
                property.title.clone(),
                format!(
                    "Commission of {} ({}) recorded on {} for \"{}\"",
                    format_money(recorded.commission_amount),
                    format_rate(recorded.commission_rate),
                    format_money(recorded.transaction_amount),
                    property.title
                ),
            )
            .after(snapshot(recorded)),
            now,
        );
    }

    /// Records a commission for an additional transaction on an approved
    /// property (e.g. a renewed rental) without changing the property status.
    pub fn create(
        &self,
        conn: &Connection,
        property_id: i64,
        transaction_type: TransactionType,
        transaction_amount: i64,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<RecordedCommission, ServerError> {
        require_agent(actor)?;
        let property = load_property(conn, property_id)?;

        if !property.can_be_managed_by(actor) {
            return Err(ServerError::Permission(
                "Property not found or you do not have permission to record a commission on it"
                    .into(),
            ));
        }
        if !property.is_approved {
            return Err(ServerError::State(
                "Commissions can only be recorded on approved properties".into(),
            ));
        }
        if transaction_type != property.transaction_type {
            return Err(ServerError::Validation(format!(
                "Property \"{}\" is listed for {}, not {}",
                property.title, property.transaction_type, transaction_type
            )));
        }

        let recorded = self.insert_pending(conn, &property, transaction_amount, actor, now)?;
        log::info!(
            "commission {} recorded on property {} by user {}",
            recorded.id,
            property.id,
            actor.id
        );
        self.record_created(conn, &property, &recorded, actor, now);
        Ok(recorded)
    }

    /// Sets a commission's status. Moving to `paid` stamps the payment date
    /// (the supplied one, or `now`); other targets leave it untouched.
    pub fn update_status(
        &self,
        conn: &Connection,
        commission_id: i64,
        status: CommissionStatus,
        payment_date: Option<DateTime<Utc>>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Commission, ServerError> {
        require_admin(actor)?;
        let before = load_commission(conn, commission_id)?;

        // Only a transition into `paid` stamps `now`; re-marking a paid
        // commission keeps its recorded date unless one is supplied.
        let payment_date = match status {
            CommissionStatus::Paid if before.status != CommissionStatus::Paid => {
                Some(payment_date.unwrap_or(now))
            }
            CommissionStatus::Paid => payment_date,
            _ => None,
        };
        db_commissions::update_status(conn, commission_id, status, payment_date, now)?;
        let after = load_commission(conn, commission_id)?;

        let action = match status {
            CommissionStatus::Paid => AuditAction::CommissionPaid,
            CommissionStatus::Cancelled => AuditAction::CommissionCancelled,
            CommissionStatus::Pending => AuditAction::CommissionStatusChanged,
        };
        let name = entity_name(conn, &after);
        log::info!(
            "commission {} moved from {} to {} by user {}",
            commission_id,
            before.status,
            after.status,
            actor.id
        );
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                action,
                EntityType::Commission,
                commission_id,
                name.clone(),
                format!(
                    "Commission #{commission_id} for \"{name}\" changed from {} to {}",
                    before.status, after.status
                ),
            )
            .before(snapshot(&before))
            .after(snapshot(&after)),
            now,
        );

        Ok(after)
    }

    /// Hard delete, for correcting data-entry mistakes.
    pub fn delete(
        &self,
        conn: &Connection,
        commission_id: i64,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Commission, ServerError> {
        require_admin(actor)?;
        let before = load_commission(conn, commission_id)?;
        let name = entity_name(conn, &before);

        db_commissions::delete_commission(conn, commission_id)?;
        log::info!("commission {} deleted by user {}", commission_id, actor.id);

        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::CommissionDeleted,
                EntityType::Commission,
                commission_id,
                name.clone(),
                format!(
                    "Commission #{commission_id} of {} for \"{name}\" deleted",
                    format_money(before.commission_amount)
                ),
            )
            .before(snapshot(&before)),
            now,
        );

        Ok(before)
    }

    /// Admins may read any commission; agents only their own.
    pub fn get(
        &self,
        conn: &Connection,
        commission_id: i64,
        actor: &Actor,
    ) -> Result<Commission, ServerError> {
        let commission = load_commission(conn, commission_id)?;
        if !actor.is_admin() && commission.agent_id != actor.id {
            return Err(ServerError::Permission(
                "You do not have permission to view this commission".into(),
            ));
        }
        Ok(commission)
    }

    pub fn list_all(
        &self,
        conn: &Connection,
        actor: &Actor,
    ) -> Result<Vec<CommissionListing>, ServerError> {
        require_admin(actor)?;
        db_commissions::list_all(conn)
    }

    pub fn list_mine(
        &self,
        conn: &Connection,
        actor: &Actor,
    ) -> Result<Vec<CommissionListing>, ServerError> {
        require_agent(actor)?;
        db_commissions::list_for_agent(conn, actor.id)
    }
}

fn load_commission(conn: &Connection, commission_id: i64) -> Result<Commission, ServerError> {
    db_commissions::find_commission(conn, commission_id)?
        .ok_or_else(|| ServerError::NotFound(format!("Commission {commission_id} not found")))
}

/// Property title for history, falling back to the commission number.
fn entity_name(conn: &Connection, commission: &Commission) -> String {
    match crate::db::properties::find_property(conn, commission.property_id) {
        Ok(Some(p)) => p.title,
        _ => format!("Commission #{}", commission.id),
    }
}
