use crate::domain::actor::Role;
use crate::tests::utils::{init_test_app, property_body, rpc, sign_in, TestApp};
use serde_json::{json, Value};

fn audit_count(t: &TestApp) -> i64 {
    t.app
        .db
        .with_conn(|conn| Ok(conn.query_row("select count(*) from audit_logs", [], |r| r.get(0))?))
        .unwrap()
}

fn newest_entry(t: &TestApp, admin: &str) -> Value {
    let (status, recent) = rpc(t, "audit.recent", Some(admin), json!({ "limit": 1 }));
    assert_eq!(status, 200);
    recent[0].clone()
}

/// Runs one RPC that must succeed and write exactly one audit entry, which is
/// returned.
fn single_entry(t: &TestApp, admin: &str, procedure: &str, session: &str, body: Value) -> Value {
    let before = audit_count(t);
    let (status, reply) = rpc(t, procedure, Some(session), body);
    assert_eq!(status, 200, "{procedure}: {reply}");
    assert_eq!(audit_count(t), before + 1, "{procedure} audit entries");
    newest_entry(t, admin)
}

struct Listed {
    admin: String,
    agent: String,
    other_id: i64,
    id: i64,
}

/// An approved sale listed by agent Bruno, with agent Carla also signed in.
fn listed(t: &TestApp) -> Listed {
    let (_, admin) = sign_in(t, "Ana", Role::Admin);
    let (_, agent) = sign_in(t, "Bruno", Role::Agent);
    let (other_id, _) = sign_in(t, "Carla", Role::Agent);
    let (_, created) = rpc(t, "properties.create", Some(&agent), property_body());
    let id = created["id"].as_i64().unwrap();
    Listed {
        admin,
        agent,
        other_id,
        id,
    }
}

#[test]
fn create_and_approve_write_one_entry_each() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);

    let entry = single_entry(&t, &admin, "properties.create", &agent, property_body());
    assert_eq!(entry["action"], "property_created");
    let id = entry["entityId"].as_i64().unwrap();
    assert_eq!(entry["entityType"], "property");
    assert_eq!(entry["previousValue"], Value::Null);
    assert_eq!(entry["newValue"]["id"], id);
    assert_eq!(entry["newValue"]["price"], 85_000_000);

    let entry = single_entry(&t, &admin, "properties.approve", &admin, json!({ "id": id }));
    assert_eq!(entry["action"], "property_approved");
    assert_eq!(entry["entityId"], id);
    assert_eq!(entry["previousValue"]["isApproved"], false);
    assert_eq!(entry["newValue"]["isApproved"], true);
    assert_eq!(entry["newValue"]["status"], "active");
}

#[test]
fn update_records_old_and_new_values() {
    let t = init_test_app();
    let l = listed(&t);
    rpc(&t, "properties.approve", Some(&l.admin), json!({ "id": l.id }));

    let entry = single_entry(
        &t,
        &l.admin,
        "properties.update",
        &l.agent,
        json!({ "id": l.id, "price": 90_000_000 }),
    );
    assert_eq!(entry["action"], "property_updated");
    assert_eq!(entry["entityId"], l.id);
    assert_eq!(entry["previousValue"]["price"], 85_000_000);
    assert_eq!(entry["newValue"]["price"], 90_000_000);
    assert_eq!(entry["userName"], "Bruno");

    let entry = single_entry(
        &t,
        &l.admin,
        "properties.update",
        &l.agent,
        json!({ "id": l.id, "status": "inactive" }),
    );
    assert_eq!(entry["action"], "property_status_changed");
    assert_eq!(entry["previousValue"]["status"], "active");
    assert_eq!(entry["newValue"]["status"], "inactive");
}

#[test]
fn assignment_records_assignee_names() {
    let t = init_test_app();
    let l = listed(&t);

    let entry = single_entry(
        &t,
        &l.admin,
        "properties.assignAgent",
        &l.admin,
        json!({ "propertyId": l.id, "agentId": l.other_id }),
    );
    assert_eq!(entry["action"], "property_assigned");
    assert_eq!(entry["entityId"], l.id);
    assert_eq!(entry["previousValue"]["assignedAgentName"], Value::Null);
    assert_eq!(entry["newValue"]["assignedAgentName"], "Carla");
    assert_eq!(entry["newValue"]["assignedAgentId"], l.other_id);

    let entry = single_entry(
        &t,
        &l.admin,
        "properties.assignAgent",
        &l.admin,
        json!({ "propertyId": l.id, "agentId": null }),
    );
    assert_eq!(entry["previousValue"]["assignedAgentName"], "Carla");
    assert_eq!(entry["newValue"]["assignedAgentName"], Value::Null);
}

#[test]
fn rejection_records_the_reason() {
    let t = init_test_app();
    let l = listed(&t);

    let entry = single_entry(
        &t,
        &l.admin,
        "properties.reject",
        &l.admin,
        json!({ "id": l.id, "reason": "Endereço incompleto" }),
    );
    assert_eq!(entry["action"], "property_rejected");
    assert_eq!(entry["entityId"], l.id);
    assert_eq!(entry["previousValue"]["status"], "pending_approval");
    assert_eq!(entry["previousValue"]["rejectionReason"], Value::Null);
    assert_eq!(entry["newValue"]["status"], "rejected");
    assert_eq!(entry["newValue"]["rejectionReason"], "Endereço incompleto");
}

#[test]
fn deletion_keeps_the_full_prior_record() {
    let t = init_test_app();
    let l = listed(&t);

    let entry = single_entry(&t, &l.admin, "properties.delete", &l.agent, json!({ "id": l.id }));
    assert_eq!(entry["action"], "property_deleted");
    assert_eq!(entry["entityId"], l.id);
    assert_eq!(entry["entityName"], "Apartamento 2 quartos");
    assert_eq!(entry["newValue"], Value::Null);
    let prior = &entry["previousValue"];
    assert_eq!(prior["id"], l.id);
    assert_eq!(prior["title"], "Apartamento 2 quartos");
    assert_eq!(prior["price"], 85_000_000);
    assert_eq!(prior["transactionType"], "sale");
    assert_eq!(prior["state"], "SP");
}

#[test]
fn commission_status_and_deletion_entries() {
    let t = init_test_app();
    let l = listed(&t);
    rpc(&t, "properties.approve", Some(&l.admin), json!({ "id": l.id }));
    let (_, done) = rpc(
        &t,
        "properties.completeTransaction",
        Some(&l.agent),
        json!({ "propertyId": l.id, "transactionAmount": 80_000_000 }),
    );
    let cid = done["commissionId"].as_i64().unwrap();

    let entry = single_entry(
        &t,
        &l.admin,
        "commissions.updateStatus",
        &l.admin,
        json!({ "id": cid, "status": "paid" }),
    );
    assert_eq!(entry["action"], "commission_paid");
    assert_eq!(entry["entityType"], "commission");
    assert_eq!(entry["entityId"], cid);
    assert_eq!(entry["previousValue"]["status"], "pending");
    assert_eq!(entry["previousValue"]["paymentDate"], Value::Null);
    assert_eq!(entry["newValue"]["status"], "paid");
    assert!(entry["newValue"]["paymentDate"].is_string());

    let entry = single_entry(
        &t,
        &l.admin,
        "commissions.updateStatus",
        &l.admin,
        json!({ "id": cid, "status": "pending" }),
    );
    assert_eq!(entry["action"], "commission_status_changed");
    assert_eq!(entry["previousValue"]["status"], "paid");
    assert_eq!(entry["newValue"]["status"], "pending");

    let entry = single_entry(&t, &l.admin, "commissions.delete", &l.admin, json!({ "id": cid }));
    assert_eq!(entry["action"], "commission_deleted");
    assert_eq!(entry["entityId"], cid);
    assert_eq!(entry["previousValue"]["commissionAmount"], 6_400_000);
    assert_eq!(entry["newValue"], Value::Null);
}
