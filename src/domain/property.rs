// src/domain/property.rs

use crate::domain::actor::Actor;
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    House,
    Land,
    Commercial,
    Other,
}

text_enum!(PropertyKind {
    Apartment => "apartment",
    House => "house",
    Land => "land",
    Commercial => "commercial",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Rental,
}

text_enum!(TransactionType {
    Sale => "sale",
    Rental => "rental",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Active,
    Sold,
    Rented,
    Inactive,
    PendingApproval,
    Rejected,
}

text_enum!(PropertyStatus {
    Active => "active",
    Sold => "sold",
    Rented => "rented",
    Inactive => "inactive",
    PendingApproval => "pending_approval",
    Rejected => "rejected",
});

/// A property row as stored in the `properties` table.
///
/// Money is kept in minor currency units and the custom commission rate in
/// basis points, so nothing here is ever a float.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub transaction_type: TransactionType,
    pub price: i64,
    pub size: i64,
    pub rooms: i64,
    pub bathrooms: i64,
    pub has_backyard: bool,
    pub has_living_room: bool,
    pub has_kitchen: bool,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: Option<String>,
    pub creator_agent_id: i64,
    pub assigned_agent_id: Option<i64>,
    pub custom_commission_rate: Option<u32>,
    pub status: PropertyStatus,
    pub is_approved: bool,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Admins, the creating agent, or the currently assigned agent.
    pub fn can_be_managed_by(&self, actor: &Actor) -> bool {
        actor.is_admin()
            || self.creator_agent_id == actor.id
            || self.assigned_agent_id == Some(actor.id)
    }

    /// Admins or the creating agent. Assignment alone does not grant deletion.
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.creator_agent_id == actor.id
    }
}

/// Input for registering a new property.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub transaction_type: TransactionType,
    pub price: i64,
    pub size: i64,
    pub rooms: i64,
    pub bathrooms: i64,
    #[serde(default)]
    pub has_backyard: bool,
    #[serde(default = "default_true")]
    pub has_living_room: bool,
    #[serde(default = "default_true")]
    pub has_kitchen: bool,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<String>,
}

fn default_true() -> bool {
    true
}

impl NewProperty {
    /// Validates field ranges and returns a trimmed copy with the state code
    /// upper-cased.
    pub fn normalized(self) -> Result<Self, ServerError> {
        let title = required_text("title", &self.title)?;
        let address = required_text("address", &self.address)?;
        let city = required_text("city", &self.city)?;
        let state = state_code(&self.state)?;
        positive("price", self.price)?;
        positive("size", self.size)?;
        non_negative("rooms", self.rooms)?;
        non_negative("bathrooms", self.bathrooms)?;

        Ok(NewProperty {
            title,
            description: optional_text(self.description),
            address,
            city,
            state,
            zip_code: optional_text(self.zip_code),
            ..self
        })
    }
}

/// Partial update of a property's descriptive and status fields.
///
/// `transaction_type` is accepted only so that an attempt to change it can be
/// rejected explicitly; commission defaults depend on it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PropertyKind>,
    pub transaction_type: Option<TransactionType>,
    pub price: Option<i64>,
    pub size: Option<i64>,
    pub rooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub has_backyard: Option<bool>,
    pub has_living_room: Option<bool>,
    pub has_kitchen: Option<bool>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub status: Option<PropertyStatus>,
}

impl PropertyPatch {
    /// Applies the patch onto a copy of `current`, validating each supplied
    /// field. Status is copied as given; transition rules are checked by the
    /// caller against the original status.
    pub fn apply_to(&self, current: &Property) -> Result<Property, ServerError> {
        let mut next = current.clone();

        if let Some(tt) = self.transaction_type {
            if tt != current.transaction_type {
                return Err(ServerError::Validation(
                    "Transaction type cannot be changed after the property is created".into(),
                ));
            }
        }
        if let Some(title) = &self.title {
            next.title = required_text("title", title)?;
        }
        if let Some(description) = &self.description {
            next.description = optional_text(Some(description.clone()));
        }
        if let Some(kind) = self.kind {
            next.kind = kind;
        }
        if let Some(price) = self.price {
            positive("price", price)?;
            next.price = price;
        }
        if let Some(size) = self.size {
            positive("size", size)?;
            next.size = size;
        }
        if let Some(rooms) = self.rooms {
            non_negative("rooms", rooms)?;
            next.rooms = rooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            non_negative("bathrooms", bathrooms)?;
            next.bathrooms = bathrooms;
        }
        if let Some(v) = self.has_backyard {
            next.has_backyard = v;
        }
        if let Some(v) = self.has_living_room {
            next.has_living_room = v;
        }
        if let Some(v) = self.has_kitchen {
            next.has_kitchen = v;
        }
        if let Some(address) = &self.address {
            next.address = required_text("address", address)?;
        }
        if let Some(city) = &self.city {
            next.city = required_text("city", city)?;
        }
        if let Some(state) = &self.state {
            next.state = state_code(state)?;
        }
        if let Some(zip) = &self.zip_code {
            next.zip_code = optional_text(Some(zip.clone()));
        }
        if let Some(status) = self.status {
            next.status = status;
        }

        Ok(next)
    }
}

fn required_text(field: &str, value: &str) -> Result<String, ServerError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ServerError::Validation(format!("{field} must not be empty")));
    }
    Ok(v.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn positive(field: &str, value: i64) -> Result<(), ServerError> {
    if value <= 0 {
        return Err(ServerError::Validation(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}

fn non_negative(field: &str, value: i64) -> Result<(), ServerError> {
    if value < 0 {
        return Err(ServerError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// State/province code: exactly two ASCII letters, stored upper-case.
fn state_code(value: &str) -> Result<String, ServerError> {
    let v = value.trim();
    if v.len() != 2 || !v.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServerError::Validation(
            "state must be a two-letter code".into(),
        ));
    }
    Ok(v.to_ascii_uppercase())
}
