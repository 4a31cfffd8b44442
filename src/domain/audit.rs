// src/domain/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    UserCreated,
    UserUpdated,
    UserDeleted,
    UserRoleChanged,
    UserLogin,
    UserLogout,
    PropertyCreated,
    PropertyUpdated,
    PropertyDeleted,
    PropertyStatusChanged,
    PropertySold,
    PropertyRented,
    PropertyApproved,
    PropertyRejected,
    PropertyAssigned,
    PropertyCommissionChanged,
    ImageUploaded,
    ImageDeleted,
    ImagePrimaryChanged,
    CommissionCreated,
    CommissionStatusChanged,
    CommissionPaid,
    CommissionCancelled,
    CommissionDeleted,
}

text_enum!(AuditAction {
    UserCreated => "user_created",
    UserUpdated => "user_updated",
    UserDeleted => "user_deleted",
    UserRoleChanged => "user_role_changed",
    UserLogin => "user_login",
    UserLogout => "user_logout",
    PropertyCreated => "property_created",
    PropertyUpdated => "property_updated",
    PropertyDeleted => "property_deleted",
    PropertyStatusChanged => "property_status_changed",
    PropertySold => "property_sold",
    PropertyRented => "property_rented",
    PropertyApproved => "property_approved",
    PropertyRejected => "property_rejected",
    PropertyAssigned => "property_assigned",
    PropertyCommissionChanged => "property_commission_changed",
    ImageUploaded => "image_uploaded",
    ImageDeleted => "image_deleted",
    ImagePrimaryChanged => "image_primary_changed",
    CommissionCreated => "commission_created",
    CommissionStatusChanged => "commission_status_changed",
    CommissionPaid => "commission_paid",
    CommissionCancelled => "commission_cancelled",
    CommissionDeleted => "commission_deleted",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Property,
    Commission,
    Image,
}

text_enum!(EntityType {
    User => "user",
    Property => "property",
    Commission => "commission",
    Image => "image",
});

/// What a mutation wants recorded. Actor and timestamp are supplied by the
/// recorder.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<i64>,
    pub entity_name: Option<String>,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub description: String,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        entity_type: EntityType,
        entity_id: i64,
        entity_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            entity_type,
            entity_id: Some(entity_id),
            entity_name: Some(entity_name.into()),
            previous_value: None,
            new_value: None,
            description: description.into(),
        }
    }

    pub fn before(mut self, value: impl Into<Option<serde_json::Value>>) -> Self {
        self.previous_value = value.into();
        self
    }

    pub fn after(mut self, value: impl Into<Option<serde_json::Value>>) -> Self {
        self.new_value = value.into();
        self
    }
}

/// A stored audit row. Actor fields are copies taken at write time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub user_role: String,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<i64>,
    pub entity_name: Option<String>,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<i64>,
    pub user_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub logs: Vec<AuditLogEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeCount {
    pub entity_type: EntityType,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCount {
    pub action: AuditAction,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorCount {
    pub user_id: Option<i64>,
    pub user_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total: i64,
    pub by_entity_type: Vec<EntityTypeCount>,
    pub by_action: Vec<ActionCount>,
    pub top_users: Vec<ActorCount>,
}
