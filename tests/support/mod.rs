//! In-process stand-in for the dashboard API, configurable per test.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use clashcheck::schema::COMPARISON_METRICS;

type Reply = (StatusCode, Json<Value>);

/// Characters allowed in a player tag.
const TAG_ALPHABET: &str = "0289PYLQGRJCUV";

#[derive(Clone)]
pub struct Dashboard {
    pub members: Vec<Value>,
    pub percentile: f64,
    pub insights_available: bool,
    pub clamp_days: bool,
    pub health_status: StatusCode,
    /// Serve player data for tags outside [`TAG_ALPHABET`] instead of 400.
    pub accept_invalid_tags: bool,
    /// Answer 400 when `/api/insights` is called without `clanTag`.
    pub require_clan_tag: bool,
    /// Status for a player path with an empty tag segment.
    pub malformed_status: StatusCode,
    /// Requests served under `/api/player/{tag}/...`.
    pub player_calls: Arc<AtomicUsize>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            members: vec![
                member("#2PYLQ9", "warfroggy", "leader"),
                member("#8GRJCU", "DoubleD", "coLeader"),
                member("#V0Q2Y8", "andrew", "member"),
            ],
            percentile: 66.7,
            insights_available: true,
            clamp_days: true,
            health_status: StatusCode::OK,
            accept_invalid_tags: false,
            require_clan_tag: true,
            malformed_status: StatusCode::NOT_FOUND,
            player_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Dashboard {
    pub fn player_calls(&self) -> usize {
        self.player_calls.load(Ordering::SeqCst)
    }
}

pub fn member(tag: &str, name: &str, role: &str) -> Value {
    json!({
        "tag": tag, "name": name, "trophies": 380, "donations": 72,
        "donationsReceived": 12, "role": role, "bk": 45, "aq": 50
    })
}

/// Serve `dashboard` on an ephemeral local port and return its base URL.
pub async fn spawn(dashboard: Dashboard) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(dashboard);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn router(dashboard: Dashboard) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/v2/roster", get(roster))
        .route("/api/player/{tag}/history", get(history))
        .route("/api/player/{tag}/comparison", get(comparison))
        .route("/api/insights", get(insights))
        .fallback(fallback)
        .with_state(Arc::new(dashboard))
}

async fn fallback(State(d): State<Arc<Dashboard>>, uri: Uri) -> Reply {
    if uri.path().starts_with("/api/player//") {
        return malformed(&d);
    }
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Not found" })),
    )
}

fn malformed(d: &Dashboard) -> Reply {
    (
        d.malformed_status,
        Json(json!({ "success": d.malformed_status == StatusCode::OK, "data": [] })),
    )
}

fn bad_tag() -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": "Invalid player tag" })),
    )
}

fn valid_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| TAG_ALPHABET.contains(c))
}

/// `None` when the tag may be served, otherwise the rejection to send.
fn reject_tag(d: &Dashboard, tag: &str) -> Option<Reply> {
    if tag.is_empty() {
        Some(malformed(d))
    } else if !d.accept_invalid_tags && !valid_tag(tag) {
        Some(bad_tag())
    } else {
        None
    }
}

async fn health(
    State(d): State<Arc<Dashboard>>,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    if d.health_status != StatusCode::OK {
        return (d.health_status, Json(json!({ "success": false, "error": "down" })));
    }
    let mut data = json!({ "hasCoC": true, "hasOpenAI": false, "timestamp": "2025-01-15T00:00:00Z" });
    if q.get("mcp").map(String::as_str) == Some("true") {
        data["tools"] = json!([
            { "name": "get_roster", "description": "Fetch clan roster" },
            { "name": "get_player", "description": "Fetch player profile" }
        ]);
    }
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

async fn roster(State(d): State<Arc<Dashboard>>) -> Reply {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "clan": { "name": "Heck Yeah", "tag": "#2PR8R8V8P" },
                "snapshot": { "id": "snap-42", "fetchedAt": "2025-01-15T00:00:00Z" },
                "members": d.members,
            }
        })),
    )
}

async fn history(
    State(d): State<Arc<Dashboard>>,
    Path(tag): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    d.player_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(rejection) = reject_tag(&d, &tag) {
        return rejection;
    }
    let requested: i64 = q.get("days").and_then(|s| s.parse().ok()).unwrap_or(30);
    let days = if d.clamp_days { requested.min(90) } else { requested };
    let point = |date: &str, trophies: i64| {
        json!({ "date": date, "trophies": trophies, "donations": 10, "donationsReceived": 4 })
    };
    let mut second = point("2025-01-02", 385);
    second["deltas"] = json!({ "trophies": 5, "donations": 0, "donationsReceived": 0 });
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": [point("2025-01-01", 380), second],
            "meta": { "snapshotsFound": 2, "days": days, "playerTag": format!("#{tag}") }
        })),
    )
}

async fn comparison(State(d): State<Arc<Dashboard>>, Path(tag): Path<String>) -> Reply {
    d.player_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(rejection) = reject_tag(&d, &tag) {
        return rejection;
    }
    let mut data = json!({ "townHallComparison": { "townHall": 12, "average": 300.0 } });
    for metric in COMPARISON_METRICS {
        data[*metric] = json!({
            "playerValue": 380, "clanAverage": 206.3, "clanMedian": 239,
            "percentile": d.percentile, "rank": 1, "totalPlayers": d.members.len()
        });
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
            "meta": { "playerName": "warfroggy", "clanSize": d.members.len() }
        })),
    )
}

async fn insights(
    State(d): State<Arc<Dashboard>>,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    let clan_tag = match q.get("clanTag") {
        Some(tag) => tag.as_str(),
        None if d.require_clan_tag => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": "clanTag is required" })),
            )
        }
        None => "2PR8R8V8P",
    };
    if !d.insights_available {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "No insights found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "clanTag": format!("#{clan_tag}"),
                "snapshotDate": "2025-01-15",
                "smartInsightsPayload": {
                    "metadata": { "generatedAt": "2025-01-15T06:00:00Z", "source": "nightly" },
                    "headlines": []
                }
            }
        })),
    )
}
