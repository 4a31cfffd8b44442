//! Property lifecycle and commission engine.
//!
//! Every operation takes the acting user explicitly and writes its audit
//! entries through [`recorder::AuditRecorder`], which never fails the caller.

pub mod ledger;
pub mod properties;
pub mod recorder;
pub mod resolver;

pub use ledger::CommissionLedger;
pub use properties::PropertyLifecycle;
pub use recorder::AuditRecorder;
pub use resolver::CommissionResolver;

use crate::db::properties as db_properties;
use crate::domain::actor::Actor;
use crate::domain::property::Property;
use crate::errors::ServerError;
use rusqlite::Connection;

pub(crate) fn require_admin(actor: &Actor) -> Result<(), ServerError> {
    if !actor.is_admin() {
        log::warn!("user {} ({}) attempted an admin-only action", actor.id, actor.role);
        return Err(ServerError::Permission(
            "Only administrators can perform this action".into(),
        ));
    }
    Ok(())
}

pub(crate) fn require_agent(actor: &Actor) -> Result<(), ServerError> {
    if !actor.is_agent() {
        log::warn!("user {} ({}) attempted an agent-only action", actor.id, actor.role);
        return Err(ServerError::Permission(
            "Only agents can perform this action".into(),
        ));
    }
    Ok(())
}

pub(crate) fn load_property(conn: &Connection, property_id: i64) -> Result<Property, ServerError> {
    db_properties::find_property(conn, property_id)?
        .ok_or_else(|| ServerError::NotFound(format!("Property {property_id} not found")))
}
