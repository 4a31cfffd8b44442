// src/api/commissions.rs
use crate::api::{Ack, ById, Call};
use crate::domain::commission::CommissionStatus;
use crate::domain::property::TransactionType;
use crate::errors::ServerError;
use crate::responses::{json_ok, ResultResp};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    property_id: i64,
    transaction_type: TransactionType,
    transaction_amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusInput {
    id: i64,
    status: CommissionStatus,
    #[serde(default)]
    payment_date: Option<DateTime<Utc>>,
}

pub fn dispatch(procedure: &str, call: Call<'_>) -> ResultResp {
    let ledger = &call.services.commissions;
    match procedure {
        "list" => json_ok(&ledger.list_all(call.conn, call.actor()?)?),
        "myCommissions" => json_ok(&ledger.list_mine(call.conn, call.actor()?)?),
        "getById" => {
            let ById { id } = call.input()?;
            json_ok(&ledger.get(call.conn, id, call.actor()?)?)
        }
        "create" => {
            let CreateInput {
                property_id,
                transaction_type,
                transaction_amount,
            } = call.input()?;
            json_ok(&ledger.create(
                call.conn,
                property_id,
                transaction_type,
                transaction_amount,
                call.actor()?,
                call.now,
            )?)
        }
        "updateStatus" => {
            let StatusInput {
                id,
                status,
                payment_date,
            } = call.input()?;
            let c = ledger.update_status(call.conn, id, status, payment_date, call.actor()?, call.now)?;
            json_ok(&json!({ "success": true, "commission": c }))
        }
        "delete" => {
            let ById { id } = call.input()?;
            ledger.delete(call.conn, id, call.actor()?, call.now)?;
            json_ok(&Ack::new(format!("Commission #{id} deleted")))
        }
        other => Err(ServerError::NotFound(format!(
            "Unknown procedure commissions.{other}"
        ))),
    }
}
