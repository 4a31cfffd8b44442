// src/domain/logic.rs

use crate::domain::actor::Actor;
use crate::domain::audit::AuditAction;
use crate::domain::property::{PropertyStatus, TransactionType};
use crate::errors::ServerError;

/// Status and approval flag a new property starts with.
///
/// Admin-created listings skip the approval queue.
pub fn initial_state(creator: &Actor) -> (PropertyStatus, bool) {
    if creator.is_admin() {
        (PropertyStatus::Active, true)
    } else {
        (PropertyStatus::PendingApproval, false)
    }
}

/// The closing status reachable from `active` for a transaction type.
pub fn completion_status(transaction_type: TransactionType) -> PropertyStatus {
    match transaction_type {
        TransactionType::Sale => PropertyStatus::Sold,
        TransactionType::Rental => PropertyStatus::Rented,
    }
}

/// Checks a status change requested through a property update.
///
/// Only `active` has outgoing edges here: to `inactive`, or to the closing
/// status matching the transaction type. Approval and rejection have their own
/// operations, and `sold`, `rented` and `inactive` are terminal.
pub fn check_status_transition(
    from: PropertyStatus,
    to: PropertyStatus,
    transaction_type: TransactionType,
) -> Result<(), ServerError> {
    if from == to {
        return Ok(());
    }

    match (from, to) {
        (PropertyStatus::Active, PropertyStatus::Inactive) => Ok(()),
        (PropertyStatus::Active, PropertyStatus::Sold | PropertyStatus::Rented) => {
            let expected = completion_status(transaction_type);
            if to == expected {
                Ok(())
            } else {
                Err(ServerError::State(format!(
                    "A {transaction_type} property can only be marked as {expected}, not {to}"
                )))
            }
        }
        (PropertyStatus::PendingApproval | PropertyStatus::Rejected, _) => {
            Err(ServerError::State(format!(
                "Property is {from}; it must be approved by an administrator before its status can change"
            )))
        }
        (_, PropertyStatus::PendingApproval | PropertyStatus::Rejected) => Err(ServerError::State(
            "Approval status is changed through approve/reject, not through an update".into(),
        )),
        _ => Err(ServerError::State(format!(
            "Property status cannot change from {from} to {to}"
        ))),
    }
}

/// Audit action recorded for a status change made through an update.
pub fn status_change_action(to: PropertyStatus) -> AuditAction {
    match to {
        PropertyStatus::Sold => AuditAction::PropertySold,
        PropertyStatus::Rented => AuditAction::PropertyRented,
        _ => AuditAction::PropertyStatusChanged,
    }
}
