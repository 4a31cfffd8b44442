use crate::domain::actor::Role;
use crate::tests::utils::{init_test_app, property_body, rpc, sign_in};
use rusqlite::params;
use serde_json::json;

#[test]
fn audit_requires_admin() {
    let t = init_test_app();
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);

    for procedure in ["audit.list", "audit.recent", "audit.stats"] {
        let (status, _) = rpc(&t, procedure, Some(&agent), json!({}));
        assert_eq!(status, 403, "{procedure}");
    }
    let (status, _) = rpc(&t, "audit.list", None, json!({}));
    assert_eq!(status, 401);
}

#[test]
fn filters_pagination_and_stats() {
    let t = init_test_app();
    let (admin_id, admin) = sign_in(&t, "Ana", Role::Admin);
    let (agent_id, agent) = sign_in(&t, "Bruno", Role::Agent);

    for i in 0..3 {
        let mut body = property_body();
        body["title"] = json!(format!("Casa {i}"));
        rpc(&t, "properties.create", Some(&agent), body);
    }
    rpc(&t, "properties.create", Some(&admin), property_body());

    let (status, page) = rpc(
        &t,
        "audit.list",
        Some(&admin),
        json!({ "userId": agent_id, "page": 2, "pageSize": 2 }),
    );
    assert_eq!(status, 200);
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["logs"].as_array().unwrap().len(), 1);
    assert_eq!(page["logs"][0]["entityName"], "Casa 0");

    let (_, found) = rpc(&t, "audit.list", Some(&admin), json!({ "search": "Casa 1" }));
    assert_eq!(found["pagination"]["total"], 1);

    let (status, _) = rpc(&t, "audit.list", Some(&admin), json!({ "page": 0 }));
    assert_eq!(status, 400);
    let (status, _) = rpc(&t, "audit.list", Some(&admin), json!({ "pageSize": 101 }));
    assert_eq!(status, 400);

    let (status, stats) = rpc(&t, "audit.stats", Some(&admin), json!({}));
    assert_eq!(status, 200);
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["byAction"][0]["action"], "property_created");
    assert_eq!(stats["byAction"][0]["count"], 4);
    assert_eq!(stats["topUsers"][0]["userName"], "Bruno");
    assert_eq!(stats["topUsers"][1]["userId"], admin_id);

    let (_, activity) = rpc(
        &t,
        "audit.userActivity",
        Some(&admin),
        json!({ "userId": admin_id }),
    );
    assert_eq!(activity.as_array().unwrap().len(), 1);
}

#[test]
fn agents_read_history_of_their_own_properties() {
    let t = init_test_app();
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);
    let (_, other) = sign_in(&t, "Carla", Role::Agent);
    let (_, created) = rpc(&t, "properties.create", Some(&agent), property_body());
    let id = created["id"].as_i64().unwrap();

    let body = json!({ "entityType": "property", "entityId": id });
    let (status, history) = rpc(&t, "audit.entityHistory", Some(&agent), body.clone());
    assert_eq!(status, 200);
    assert_eq!(history[0]["action"], "property_created");
    assert_eq!(history[0]["userRole"], "agent");
    assert_eq!(history[0]["newValue"]["status"], "pending_approval");

    let (status, _) = rpc(&t, "audit.entityHistory", Some(&other), body);
    assert_eq!(status, 403);
}

#[test]
fn history_survives_actor_deletion() {
    let t = init_test_app();
    let (admin_id, admin) = sign_in(&t, "Ana", Role::Admin);
    let (agent_id, agent) = sign_in(&t, "Bruno", Role::Agent);
    let (_, created) = rpc(&t, "properties.create", Some(&agent), property_body());
    let id = created["id"].as_i64().unwrap();

    t.app
        .db
        .with_conn(|conn| {
            conn.execute("delete from users where id = ?", params![agent_id])?;
            Ok(())
        })
        .unwrap();

    // The property went with its creator; its history did not.
    let (_, history) = rpc(
        &t,
        "audit.entityHistory",
        Some(&admin),
        json!({ "entityType": "property", "entityId": id }),
    );
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["userName"], "Bruno");
    assert_ne!(history[0]["userId"], json!(admin_id));
}

#[test]
fn audit_failure_does_not_fail_the_action() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);
    let (_, created) = rpc(&t, "properties.create", Some(&agent), property_body());
    let id = created["id"].as_i64().unwrap();

    t.app
        .db
        .with_conn(|conn| {
            conn.execute_batch("drop table audit_logs;")?;
            Ok(())
        })
        .unwrap();

    let (status, _) = rpc(&t, "properties.approve", Some(&admin), json!({ "id": id }));
    assert_eq!(status, 200);
    let (_, p) = rpc(&t, "properties.getById", None, json!({ "id": id }));
    assert_eq!(p["isApproved"], true);
}
