// src/api/properties.rs
use crate::api::{Ack, ById, Call};
use crate::domain::property::{NewProperty, PropertyPatch};
use crate::errors::ServerError;
use crate::responses::{json_ok, ResultResp};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput {
    id: i64,
    #[serde(flatten)]
    patch: PropertyPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectInput {
    id: i64,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignInput {
    property_id: i64,
    agent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommissionRateInput {
    property_id: i64,
    commission_rate: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteInput {
    property_id: i64,
    transaction_amount: i64,
}

pub fn dispatch(procedure: &str, call: Call<'_>) -> ResultResp {
    let svc = &call.services.properties;
    match procedure {
        "list" => json_ok(&svc.list_active(call.conn)?),
        "getById" => {
            let ById { id } = call.input()?;
            json_ok(&svc.get(call.conn, id, call.actor)?)
        }
        "listAll" => json_ok(&svc.list_all(call.conn, call.actor()?)?),
        "myProperties" => json_ok(&svc.list_mine(call.conn, call.actor()?)?),
        "pendingApproval" => json_ok(&svc.list_pending_approval(call.conn, call.actor()?)?),
        "create" => {
            let input: NewProperty = call.input()?;
            json_ok(&svc.create(call.conn, input, call.actor()?, call.now)?)
        }
        "update" => {
            let UpdateInput { id, patch } = call.input()?;
            let p = svc.update(call.conn, id, &patch, call.actor()?, call.now)?;
            json_ok(&json!({ "success": true, "property": p }))
        }
        "delete" => {
            let ById { id } = call.input()?;
            let p = svc.delete(call.conn, id, call.actor()?, call.now)?;
            json_ok(&Ack::new(format!("Property \"{}\" deleted", p.title)))
        }
        "approve" => {
            let ById { id } = call.input()?;
            let p = svc.approve(call.conn, id, call.actor()?, call.now)?;
            json_ok(&Ack::new(format!(
                "Property \"{}\" approved and now visible to the public",
                p.title
            )))
        }
        "reject" => {
            let RejectInput { id, reason } = call.input()?;
            let p = svc.reject(call.conn, id, &reason, call.actor()?, call.now)?;
            json_ok(&Ack::new(format!("Property \"{}\" rejected", p.title)))
        }
        "assignAgent" => {
            let AssignInput {
                property_id,
                agent_id,
            } = call.input()?;
            let assigned = svc.assign_agent(call.conn, property_id, agent_id, call.actor()?, call.now)?;
            json_ok(&json!({ "success": true, "assignment": assigned }))
        }
        "setCustomCommission" => {
            let CommissionRateInput {
                property_id,
                commission_rate,
            } = call.input()?;
            let change = svc.set_custom_commission(
                call.conn,
                property_id,
                commission_rate,
                call.actor()?,
                call.now,
            )?;
            json_ok(&json!({ "success": true, "commission": change }))
        }
        "completeTransaction" => {
            let CompleteInput {
                property_id,
                transaction_amount,
            } = call.input()?;
            let actor = call.actor()?;
            json_ok(&svc.complete_transaction(
                call.conn,
                property_id,
                transaction_amount,
                actor,
                call.now,
            )?)
        }
        other => Err(ServerError::NotFound(format!(
            "Unknown procedure properties.{other}"
        ))),
    }
}
