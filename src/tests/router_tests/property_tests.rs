use crate::domain::actor::Role;
use crate::tests::utils::{init_test_app, property_body, rpc, sign_in};
use astra::Body;
use http::{Method, Request};
use serde_json::json;

#[test]
fn health_check_responds() {
    let t = init_test_app();
    let req = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = crate::router::handle(req, &t.app).expect("Handler failed");
    assert_eq!(resp.status(), 200);
}

#[test]
fn sale_scenario_end_to_end() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);

    let (status, created) = rpc(&t, "properties.create", Some(&agent), property_body());
    assert_eq!(status, 200, "{created}");
    assert_eq!(created["status"], "pending_approval");
    assert_eq!(created["isApproved"], false);
    assert_eq!(created["needsApproval"], true);
    let id = created["id"].as_i64().unwrap();

    // Not public yet.
    let (status, _) = rpc(&t, "properties.list", None, json!({}));
    assert_eq!(status, 200);
    let (status, _) = rpc(&t, "properties.getById", None, json!({ "id": id }));
    assert_eq!(status, 404);

    let (status, approved) = rpc(&t, "properties.approve", Some(&admin), json!({ "id": id }));
    assert_eq!(status, 200);
    assert_eq!(approved["success"], true);

    let (status, listed) = rpc(&t, "properties.list", None, json!({}));
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["agentName"], "Bruno");
    assert_eq!(listed[0]["state"], "SP");

    let (status, done) = rpc(
        &t,
        "properties.completeTransaction",
        Some(&agent),
        json!({ "propertyId": id, "transactionAmount": 80_000_000, "commissionRate": 9_000 }),
    );
    assert_eq!(status, 200, "{done}");
    assert_eq!(done["status"], "sold");
    assert_eq!(done["commissionRate"], 800);
    assert_eq!(done["commissionAmount"], 6_400_000);
    assert_eq!(done["transactionAmount"], 80_000_000);

    let (status, page) = rpc(&t, "audit.list", Some(&admin), json!({}));
    assert_eq!(status, 200);
    let actions: Vec<&str> = page["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        vec![
            "property_sold",
            "commission_created",
            "property_approved",
            "property_created"
        ]
    );
    assert_eq!(page["pagination"]["total"], 4);

    // A replay is refused and records nothing new.
    let (status, err) = rpc(
        &t,
        "properties.completeTransaction",
        Some(&agent),
        json!({ "propertyId": id, "transactionAmount": 80_000_000 }),
    );
    assert_eq!(status, 409);
    assert_eq!(err["error"], "invalid_state");
    let (_, mine) = rpc(&t, "commissions.myCommissions", Some(&agent), json!({}));
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[test]
fn admin_created_property_is_active_immediately() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);

    let (status, created) = rpc(&t, "properties.create", Some(&admin), property_body());
    assert_eq!(status, 200);
    assert_eq!(created["status"], "active");
    assert_eq!(created["needsApproval"], false);
}

#[test]
fn invalid_input_is_a_validation_error() {
    let t = init_test_app();
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);

    let mut body = property_body();
    body["price"] = json!(0);
    let (status, err) = rpc(&t, "properties.create", Some(&agent), body);
    assert_eq!(status, 400);
    assert_eq!(err["error"], "validation_error");

    let mut body = property_body();
    body["state"] = json!("SPX");
    let (status, _) = rpc(&t, "properties.create", Some(&agent), body);
    assert_eq!(status, 400);

    let (status, err) = rpc(&t, "properties.create", Some(&agent), json!({ "title": "x" }));
    assert_eq!(status, 400);
    assert_eq!(err["error"], "validation_error");

    let mut body = property_body();
    body["price"] = json!(850_000.5);
    let (status, err) = rpc(&t, "properties.create", Some(&agent), body);
    assert_eq!(status, 400);
    assert_eq!(err["error"], "validation_error");
}

#[test]
fn mutations_require_a_session() {
    let t = init_test_app();
    let (status, err) = rpc(&t, "properties.create", None, property_body());
    assert_eq!(status, 401);
    assert_eq!(err["error"], "unauthorized");

    let (status, _) = rpc(&t, "properties.create", Some("not-a-session"), property_body());
    assert_eq!(status, 401);
}

#[test]
fn approval_rules_over_rpc() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);
    let (_, agent) = sign_in(&t, "Bruno", Role::Agent);
    let (_, created) = rpc(&t, "properties.create", Some(&agent), property_body());
    let id = created["id"].as_i64().unwrap();

    let (status, _) = rpc(&t, "properties.approve", Some(&agent), json!({ "id": id }));
    assert_eq!(status, 403);

    let (status, _) = rpc(
        &t,
        "properties.reject",
        Some(&admin),
        json!({ "id": id, "reason": "" }),
    );
    assert_eq!(status, 400);

    let (status, _) = rpc(&t, "properties.approve", Some(&admin), json!({ "id": id }));
    assert_eq!(status, 200);
    let (status, err) = rpc(&t, "properties.approve", Some(&admin), json!({ "id": id }));
    assert_eq!(status, 409);
    assert!(err["message"].as_str().unwrap().contains("already approved"));

    let (status, _) = rpc(
        &t,
        "properties.reject",
        Some(&admin),
        json!({ "id": id, "reason": "Documentação incompleta" }),
    );
    assert_eq!(status, 409);
}

#[test]
fn custom_commission_round_trip() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);
    let (_, created) = rpc(&t, "properties.create", Some(&admin), property_body());
    let id = created["id"].as_i64().unwrap();

    let (status, set) = rpc(
        &t,
        "properties.setCustomCommission",
        Some(&admin),
        json!({ "propertyId": id, "commissionRate": 650 }),
    );
    assert_eq!(status, 200);
    assert_eq!(set["commission"]["effectiveRate"], 650);

    let (status, cleared) = rpc(
        &t,
        "properties.setCustomCommission",
        Some(&admin),
        json!({ "propertyId": id, "commissionRate": null }),
    );
    assert_eq!(status, 200);
    assert_eq!(cleared["commission"]["effectiveRate"], 800);
    assert_eq!(cleared["commission"]["label"], "8% (default)");

    let (status, _) = rpc(
        &t,
        "properties.setCustomCommission",
        Some(&admin),
        json!({ "propertyId": id, "commissionRate": 10_001 }),
    );
    assert_eq!(status, 400);

    let (_, history) = rpc(
        &t,
        "audit.entityHistory",
        Some(&admin),
        json!({ "entityType": "property", "entityId": id }),
    );
    let newest = &history[0];
    assert_eq!(newest["action"], "property_commission_changed");
    assert_eq!(newest["previousValue"]["rate"], "6.5% (custom)");
    assert_eq!(newest["newValue"]["rate"], "8% (default)");
}

#[test]
fn only_owners_edit_and_delete() {
    let t = init_test_app();
    let (_, admin) = sign_in(&t, "Ana", Role::Admin);
    let (_, owner) = sign_in(&t, "Bruno", Role::Agent);
    let (other_id, other) = sign_in(&t, "Carla", Role::Agent);
    let (_, created) = rpc(&t, "properties.create", Some(&owner), property_body());
    let id = created["id"].as_i64().unwrap();
    rpc(&t, "properties.approve", Some(&admin), json!({ "id": id }));

    let (status, err) = rpc(
        &t,
        "properties.update",
        Some(&other),
        json!({ "id": id, "price": 1 }),
    );
    assert_eq!(status, 403);
    assert_eq!(err["error"], "permission_denied");
    let (status, _) = rpc(&t, "properties.delete", Some(&other), json!({ "id": id }));
    assert_eq!(status, 403);

    let (status, assigned) = rpc(
        &t,
        "properties.assignAgent",
        Some(&admin),
        json!({ "propertyId": id, "agentId": other_id }),
    );
    assert_eq!(status, 200);
    assert_eq!(assigned["assignment"]["agentName"], "Carla");

    let (status, updated) = rpc(
        &t,
        "properties.update",
        Some(&other),
        json!({ "id": id, "price": 90_000_000 }),
    );
    assert_eq!(status, 200);
    assert_eq!(updated["property"]["price"], 90_000_000);
    let (status, _) = rpc(&t, "properties.delete", Some(&other), json!({ "id": id }));
    assert_eq!(status, 403);

    let (status, _) = rpc(&t, "properties.delete", Some(&owner), json!({ "id": id }));
    assert_eq!(status, 200);
    let (status, _) = rpc(&t, "properties.getById", Some(&admin), json!({ "id": id }));
    assert_eq!(status, 404);
}

#[test]
fn unknown_procedures_are_not_found() {
    let t = init_test_app();
    let (status, _) = rpc(&t, "properties.explode", None, json!({}));
    assert_eq!(status, 404);
    let (status, _) = rpc(&t, "nothing.here", None, json!({}));
    assert_eq!(status, 404);
}
