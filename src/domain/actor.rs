// src/domain/actor.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    Admin,
}

text_enum!(Role {
    User => "user",
    Agent => "agent",
    Admin => "admin",
});

/// The authenticated caller of an operation.
///
/// Resolved once per request at the RPC boundary and passed explicitly into
/// every lifecycle and ledger operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Agents and admins may register properties and record transactions.
    pub fn is_agent(&self) -> bool {
        matches!(self.role, Role::Agent | Role::Admin)
    }
}
