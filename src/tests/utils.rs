use crate::auth::sessions::create_session;
use crate::config::AppConfig;
use crate::db::users::create_user;
use crate::db::{init_db, Database};
use crate::domain::actor::Role;
use crate::router::{handle, App};
use astra::Body;
use chrono::Utc;
use http::{Method, Request};
use serde_json::Value;
use std::io::Read;
use std::time::Duration;
use tempfile::TempDir;

/// An app backed by its own SQLite file, removed when dropped.
pub struct TestApp {
    pub app: App,
    _dir: TempDir,
}

/// Initialize a fresh test DB using the production schema.
pub fn init_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let path = dir.path().join("test.sqlite3");
    let db = Database::new(path.to_string_lossy().into_owned(), Duration::from_secs(5));

    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    TestApp {
        app: App::new(db, &AppConfig::default()),
        _dir: dir,
    }
}

/// Creates a user with a live session and returns (user id, session token).
pub fn sign_in(t: &TestApp, name: &str, role: Role) -> (i64, String) {
    t.app
        .db
        .with_conn(|conn| {
            let id = create_user(conn, name, None, role, Utc::now())?;
            let token = create_session(conn, id, Utc::now().timestamp())?;
            Ok((id, token))
        })
        .expect("Failed to sign in")
}

/// POSTs `body` to `/rpc/<procedure>` and returns the status and JSON reply.
/// Error responses are rendered the way the server renders them.
pub fn rpc(t: &TestApp, procedure: &str, session: Option<&str>, body: Value) -> (u16, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(format!("/rpc/{procedure}"))
        .header("Content-Type", "application/json");
    if let Some(token) = session {
        builder = builder.header("Cookie", format!("theme=dark; session={token}"));
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();

    let resp = match handle(req, &t.app) {
        Ok(resp) => resp,
        Err(err) => crate::responses::error_to_response(err),
    };
    let status = resp.status().as_u16();

    let mut raw = String::new();
    resp.into_body().reader().read_to_string(&mut raw).unwrap();
    let json = serde_json::from_str(&raw).unwrap_or(Value::Null);
    (status, json)
}

pub fn property_body() -> Value {
    serde_json::json!({
        "title": "Apartamento 2 quartos",
        "type": "apartment",
        "transactionType": "sale",
        "price": 85_000_000,
        "size": 72,
        "rooms": 2,
        "bathrooms": 1,
        "hasBackyard": false,
        "address": "Rua Augusta, 500",
        "city": "São Paulo",
        "state": "sp",
    })
}
