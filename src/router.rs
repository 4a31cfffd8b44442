use crate::api::{self, Call, Services};
use crate::auth::sessions::load_actor_from_session;
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::ServerError;
use crate::responses::{json_ok, ResultResp};
use astra::Request;
use chrono::Utc;
use serde_json::json;
use std::io::Read;

pub const SESSION_COOKIE: &str = "session";

/// Shared state handed to every request.
#[derive(Clone)]
pub struct App {
    pub db: Database,
    pub services: Services,
}

impl App {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            db,
            services: Services::from_config(config),
        }
    }
}

pub fn handle(mut req: Request, app: &App) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", "/health") => json_ok(&json!({ "status": "ok" })),
        ("POST", p) if p.starts_with("/rpc/") => {
            let (router, procedure) = p["/rpc/".len()..]
                .split_once('.')
                .ok_or_else(|| ServerError::NotFound(format!("Unknown procedure {p}")))?;

            let mut body = Vec::new();
            req.body_mut()
                .reader()
                .read_to_end(&mut body)
                .map_err(|e| ServerError::BadRequest(format!("failed to read body: {e}")))?;
            let token = session_token(&req);

            let now = Utc::now();
            app.db.with_conn(|conn| {
                let actor = match &token {
                    Some(t) => load_actor_from_session(conn, t, now.timestamp())?,
                    None => None,
                };
                let call = Call {
                    conn,
                    services: &app.services,
                    actor: actor.as_ref(),
                    body: &body,
                    now,
                };
                match router {
                    "properties" => api::properties::dispatch(procedure, call),
                    "commissions" => api::commissions::dispatch(procedure, call),
                    "audit" => api::audit::dispatch(procedure, call),
                    other => Err(ServerError::NotFound(format!("Unknown router {other}"))),
                }
            })
        }
        _ => Err(ServerError::NotFound(format!("No route for {method} {path}"))),
    }
}

/// Value of the `session` cookie, if present.
fn session_token(req: &Request) -> Option<String> {
    req.headers()
        .get_all("Cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == SESSION_COOKIE)
        .map(|(_, v)| v.to_string())
}
