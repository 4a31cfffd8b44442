// src/lifecycle/properties.rs
use crate::db::commissions as db_commissions;
use crate::db::properties::{self as db_properties, PropertyListing};
use crate::db::users as db_users;
use crate::domain::actor::{Actor, Role};
use crate::domain::audit::{AuditAction, AuditEvent, EntityType};
use crate::domain::commission::rate_label;
use crate::domain::logic::{
    check_status_transition, completion_status, initial_state, status_change_action,
};
use crate::domain::property::{NewProperty, Property, PropertyPatch, PropertyStatus};
use crate::errors::ServerError;
use crate::lifecycle::ledger::CommissionLedger;
use crate::lifecycle::recorder::{snapshot, AuditRecorder};
use crate::lifecycle::resolver::{validate_rate, CommissionResolver};
use crate::lifecycle::{load_property, require_admin, require_agent};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProperty {
    pub id: i64,
    pub status: PropertyStatus,
    pub is_approved: bool,
    pub needs_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedAgent {
    pub property_id: i64,
    pub agent_id: Option<i64>,
    pub agent_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRateChange {
    pub property_id: i64,
    pub custom_rate: Option<u32>,
    /// Rate that will apply to the next transaction.
    pub effective_rate: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTransaction {
    pub commission_id: i64,
    pub property_id: i64,
    pub status: PropertyStatus,
    pub commission_rate: u32,
    pub commission_amount: i64,
    pub transaction_amount: i64,
}

/// State machine over a property's `status` / `is_approved` fields.
#[derive(Debug, Clone)]
pub struct PropertyLifecycle {
    resolver: CommissionResolver,
    ledger: CommissionLedger,
    audit: AuditRecorder,
}

impl PropertyLifecycle {
    pub fn new(resolver: CommissionResolver, ledger: CommissionLedger, audit: AuditRecorder) -> Self {
        Self {
            resolver,
            ledger,
            audit,
        }
    }

    fn current_rate_label(&self, property: &Property) -> String {
        rate_label(
            self.resolver.resolve_rate(property, None),
            property.custom_commission_rate.is_some(),
        )
    }

    /// Registers a property. Admin-created listings are approved on the spot;
    /// everything else waits in the approval queue.
    pub fn create(
        &self,
        conn: &Connection,
        input: NewProperty,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<CreatedProperty, ServerError> {
        require_agent(actor)?;
        let input = input.normalized()?;

        let (status, is_approved) = initial_state(actor);
        let approved_by = is_approved.then_some(actor.id);
        let id = db_properties::insert_property(
            conn,
            &input,
            actor.id,
            status,
            is_approved,
            approved_by,
            now,
        )?;
        let property = load_property(conn, id)?;

        log::info!(
            "property {} created by user {} as {}",
            id,
            actor.id,
            property.status
        );
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::PropertyCreated,
                EntityType::Property,
                id,
                property.title.clone(),
                format!(
                    "Property \"{}\" created in {}/{}",
                    property.title, property.city, property.state
                ),
            )
            .after(snapshot(&property)),
            now,
        );

        Ok(CreatedProperty {
            id,
            status: property.status,
            is_approved: property.is_approved,
            needs_approval: !property.is_approved,
        })
    }

    /// Approves a pending or previously rejected property.
    pub fn approve(
        &self,
        conn: &Connection,
        property_id: i64,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Property, ServerError> {
        require_admin(actor)?;
        let before = load_property(conn, property_id)?;
        if before.is_approved {
            return Err(ServerError::State(format!(
                "Property \"{}\" is already approved",
                before.title
            )));
        }

        if db_properties::mark_approved(conn, property_id, actor.id, now)? == 0 {
            return Err(ServerError::State(format!(
                "Property \"{}\" is already approved",
                before.title
            )));
        }
        let after = load_property(conn, property_id)?;

        log::info!("property {} approved by user {}", property_id, actor.id);
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::PropertyApproved,
                EntityType::Property,
                property_id,
                after.title.clone(),
                format!("Property \"{}\" approved", after.title),
            )
            .before(approval_fields(&before))
            .after(approval_fields(&after)),
            now,
        );
        Ok(after)
    }

    /// Rejects a property that has not been approved yet.
    pub fn reject(
        &self,
        conn: &Connection,
        property_id: i64,
        reason: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Property, ServerError> {
        require_admin(actor)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServerError::Validation(
                "A rejection reason is required".into(),
            ));
        }

        let before = load_property(conn, property_id)?;
        if before.is_approved {
            return Err(ServerError::State(format!(
                "Property \"{}\" is already approved and can no longer be rejected",
                before.title
            )));
        }
        if db_properties::mark_rejected(conn, property_id, reason, now)? == 0 {
            return Err(ServerError::State(format!(
                "Property \"{}\" is already approved and can no longer be rejected",
                before.title
            )));
        }
        let after = load_property(conn, property_id)?;

        log::info!("property {} rejected by user {}", property_id, actor.id);
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::PropertyRejected,
                EntityType::Property,
                property_id,
                after.title.clone(),
                format!("Property \"{}\" rejected: {}", after.title, reason),
            )
            .before(approval_fields(&before))
            .after(approval_fields(&after)),
            now,
        );
        Ok(after)
    }

    /// Sets or clears the agent responsible for closing the property.
    pub fn assign_agent(
        &self,
        conn: &Connection,
        property_id: i64,
        agent_id: Option<i64>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<AssignedAgent, ServerError> {
        require_admin(actor)?;
        let before = load_property(conn, property_id)?;

        let new_name = match agent_id {
            Some(id) => {
                let user = db_users::find_user(conn, id)?
                    .ok_or_else(|| ServerError::NotFound(format!("Agent {id} not found")))?;
                if !matches!(user.role, Role::Agent | Role::Admin) {
                    return Err(ServerError::Validation(format!(
                        "User \"{}\" is not an agent",
                        user.name
                    )));
                }
                Some(user.name)
            }
            None => None,
        };
        let old_name = match before.assigned_agent_id {
            Some(id) => db_users::user_name(conn, id)?,
            None => None,
        };

        db_properties::set_assigned_agent(conn, property_id, agent_id, now)?;

        log::info!(
            "property {} assigned to {:?} by user {}",
            property_id,
            agent_id,
            actor.id
        );
        let describe = |name: &Option<String>| name.clone().unwrap_or_else(|| "nobody".to_string());
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::PropertyAssigned,
                EntityType::Property,
                property_id,
                before.title.clone(),
                format!(
                    "Property \"{}\" reassigned from {} to {}",
                    before.title,
                    describe(&old_name),
                    describe(&new_name)
                ),
            )
            .before(json!({
                "assignedAgentId": before.assigned_agent_id,
                "assignedAgentName": old_name,
            }))
            .after(json!({
                "assignedAgentId": agent_id,
                "assignedAgentName": new_name,
            })),
            now,
        );

        Ok(AssignedAgent {
            property_id,
            agent_id,
            agent_name: new_name,
        })
    }

    /// Sets a custom commission rate, or restores the default with `None`.
    pub fn set_custom_commission(
        &self,
        conn: &Connection,
        property_id: i64,
        rate_bps: Option<u32>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<CommissionRateChange, ServerError> {
        require_admin(actor)?;
        if let Some(rate) = rate_bps {
            validate_rate(rate)?;
        }
        let before = load_property(conn, property_id)?;

        db_properties::set_custom_commission_rate(conn, property_id, rate_bps, now)?;
        let after = load_property(conn, property_id)?;

        let before_label = self.current_rate_label(&before);
        let after_label = self.current_rate_label(&after);
        log::info!(
            "property {} commission rate {} -> {} by user {}",
            property_id,
            before_label,
            after_label,
            actor.id
        );
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::PropertyCommissionChanged,
                EntityType::Property,
                property_id,
                after.title.clone(),
                format!(
                    "Commission rate for \"{}\" changed from {} to {}",
                    after.title, before_label, after_label
                ),
            )
            .before(json!({
                "customCommissionRate": before.custom_commission_rate,
                "rate": before_label,
            }))
            .after(json!({
                "customCommissionRate": after.custom_commission_rate,
                "rate": after_label,
            })),
            now,
        );

        Ok(CommissionRateChange {
            property_id,
            custom_rate: after.custom_commission_rate,
            effective_rate: self.resolver.resolve_rate(&after, None),
            label: after_label,
        })
    }

    /// Edits descriptive fields and, within the state machine, the status.
    pub fn update(
        &self,
        conn: &Connection,
        property_id: i64,
        patch: &PropertyPatch,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Property, ServerError> {
        require_agent(actor)?;
        let before = load_property(conn, property_id)?;
        if !before.can_be_managed_by(actor) {
            return Err(ServerError::Permission(
                "Property not found or you do not have permission to edit it".into(),
            ));
        }

        let next = patch.apply_to(&before)?;
        check_status_transition(before.status, next.status, before.transaction_type)?;
        db_properties::update_property_fields(conn, &next, now)?;
        let after = load_property(conn, property_id)?;

        let (action, description) = if before.status != after.status {
            (
                status_change_action(after.status),
                format!(
                    "Status of property \"{}\" changed from \"{}\" to \"{}\"",
                    after.title, before.status, after.status
                ),
            )
        } else {
            (
                AuditAction::PropertyUpdated,
                format!("Property \"{}\" updated", after.title),
            )
        };

        log::info!("property {} updated ({}) by user {}", property_id, action, actor.id);
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(action, EntityType::Property, property_id, after.title.clone(), description)
                .before(snapshot(&before))
                .after(snapshot(&after)),
            now,
        );
        Ok(after)
    }

    /// Records the sale or rental of an active property: inserts the pending
    /// commission and closes the property in one transaction.
    pub fn complete_transaction(
        &self,
        conn: &mut Connection,
        property_id: i64,
        transaction_amount: i64,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<CompletedTransaction, ServerError> {
        require_agent(actor)?;
        let property = load_property(conn, property_id)?;
        if !property.can_be_managed_by(actor) {
            return Err(ServerError::Permission(
                "Property not found or you do not have permission to close it".into(),
            ));
        }
        if property.status != PropertyStatus::Active || !property.is_approved {
            return Err(ServerError::State(format!(
                "Property \"{}\" is {}; only active, approved properties can be sold or rented",
                property.title, property.status
            )));
        }
        let closing = completion_status(property.transaction_type);

        let tx = conn
            .transaction()
            .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

        let recorded = self
            .ledger
            .insert_pending(&tx, &property, transaction_amount, actor, now)?;

        // Guarded on status = 'active' so a replay cannot double-count.
        if db_properties::close_if_active(&tx, property_id, closing, now)? != 1 {
            tx.rollback().ok();
            return Err(ServerError::State(format!(
                "Property \"{}\" was already closed by another request",
                property.title
            )));
        }

        tx.commit()
            .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

        let after = load_property(conn, property_id)?;
        log::info!(
            "property {} {} by user {}; commission {} of {} at {} bps",
            property_id,
            closing,
            actor.id,
            recorded.id,
            recorded.commission_amount,
            recorded.commission_rate
        );

        self.ledger
            .record_created(conn, &property, &recorded, actor, now);
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                status_change_action(closing),
                EntityType::Property,
                property_id,
                property.title.clone(),
                format!(
                    "Status of property \"{}\" changed from \"{}\" to \"{}\"",
                    property.title, property.status, after.status
                ),
            )
            .before(json!({ "status": property.status }))
            .after(json!({ "status": after.status, "commissionId": recorded.id })),
            now,
        );

        Ok(CompletedTransaction {
            commission_id: recorded.id,
            property_id,
            status: after.status,
            commission_rate: recorded.commission_rate,
            commission_amount: recorded.commission_amount,
            transaction_amount: recorded.transaction_amount,
        })
    }

    /// Deletes a property. Commissions referencing it are removed by the
    /// storage cascade.
    pub fn delete(
        &self,
        conn: &Connection,
        property_id: i64,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Property, ServerError> {
        require_agent(actor)?;
        let before = load_property(conn, property_id)?;
        if !before.is_owned_by(actor) {
            return Err(ServerError::Permission(
                "Property not found or you do not have permission to delete it".into(),
            ));
        }

        let commissions = db_commissions::count_for_property(conn, property_id)?;
        if commissions > 0 {
            log::warn!(
                "property {} deleted with {} commission(s) attached; they are removed with it",
                property_id,
                commissions
            );
        }

        db_properties::delete_property(conn, property_id)?;
        log::info!("property {} deleted by user {}", property_id, actor.id);
        self.audit.record(
            conn,
            Some(actor),
            AuditEvent::new(
                AuditAction::PropertyDeleted,
                EntityType::Property,
                property_id,
                before.title.clone(),
                format!("Property \"{}\" deleted", before.title),
            )
            .before(snapshot(&before)),
            now,
        );
        Ok(before)
    }

    /// Approved properties are public; unapproved ones are visible only to
    /// the people who manage them.
    pub fn get(
        &self,
        conn: &Connection,
        property_id: i64,
        actor: Option<&Actor>,
    ) -> Result<Property, ServerError> {
        let property = load_property(conn, property_id)?;
        let visible = property.is_approved || actor.map(|a| property.can_be_managed_by(a)).unwrap_or(false);
        if !visible {
            return Err(ServerError::NotFound(format!(
                "Property {property_id} not found"
            )));
        }
        Ok(property)
    }

    pub fn list_active(&self, conn: &Connection) -> Result<Vec<PropertyListing>, ServerError> {
        db_properties::list_active(conn)
    }

    pub fn list_all(
        &self,
        conn: &Connection,
        actor: &Actor,
    ) -> Result<Vec<PropertyListing>, ServerError> {
        require_admin(actor)?;
        db_properties::list_all(conn)
    }

    pub fn list_mine(
        &self,
        conn: &Connection,
        actor: &Actor,
    ) -> Result<Vec<PropertyListing>, ServerError> {
        require_agent(actor)?;
        db_properties::list_for_agent(conn, actor.id)
    }

    pub fn list_pending_approval(
        &self,
        conn: &Connection,
        actor: &Actor,
    ) -> Result<Vec<PropertyListing>, ServerError> {
        require_admin(actor)?;
        db_properties::list_pending_approval(conn)
    }
}

fn approval_fields(p: &Property) -> serde_json::Value {
    json!({
        "status": p.status,
        "isApproved": p.is_approved,
        "approvedBy": p.approved_by,
        "approvedAt": p.approved_at,
        "rejectionReason": p.rejection_reason,
    })
}
