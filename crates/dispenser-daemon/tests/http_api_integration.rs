use std::io::Write;

use dispenser_core::{Dispenser, JsonFileCatalog};
use dispenser_daemon::config::DaemonConfig;
use dispenser_daemon::http_api;
use dispenser_daemon::telemetry::Telemetry;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct Running {
    base: String,
    shutdown: tokio::sync::oneshot::Sender<()>,
    server: tokio::task::JoinHandle<()>,
}

async fn start(catalog: &serde_json::Value) -> (Running, tempfile::NamedTempFile) {
    let mut file = tempfile::NamedTempFile::new().expect("tmp");
    file.write_all(catalog.to_string().as_bytes())
        .expect("write catalog");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");

    let cfg = DaemonConfig {
        listen: addr.to_string(),
        catalog_path: file.path().to_path_buf(),
        max_body_bytes: 256,
    };
    let dispenser = Dispenser::new(JsonFileCatalog::new(&cfg.catalog_path));
    let state = http_api::build_state(cfg, dispenser, Telemetry::new());

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let _ = http_api::serve(listener, state, async move {
            let _ = rx.await;
        })
        .await;
    });

    (
        Running {
            base: format!("http://{addr}"),
            shutdown: tx,
            server,
        },
        file,
    )
}

fn three_territories() -> Value {
    json!([
        {"id": 1, "territory_name": "Territory #001", "map_link": "https://maps.example/1",
         "map_image_url": "/maps/1.svg", "map_description": "first", "active": true},
        {"id": 2, "territory_name": "Territory #002", "map_link": "https://maps.example/2",
         "map_image_url": "/maps/2.svg", "map_description": "second", "active": true},
        {"id": 3, "territory_name": "Territory #003", "map_link": "https://maps.example/3",
         "map_image_url": "/maps/3.svg", "map_description": "third", "active": true}
    ])
}

#[tokio::test]
async fn dispenser_http_toggle_then_exhaust() {
    let (running, _catalog) = start(&three_territories()).await;
    let client = reqwest::Client::new();
    let base = &running.base;

    let list: Value = client
        .get(format!("{base}/api/territories"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    assert_eq!(list.as_array().map(Vec::len), Some(3));
    assert_eq!(list[0]["territory_name"], "Territory #001");

    let first = client
        .get(format!("{base}/api/assign"))
        .send()
        .await
        .expect("assign");
    assert_eq!(first.status(), StatusCode::OK);
    let first: Value = first.json().await.expect("json");
    assert_eq!(first["territory"]["id"], 1);

    let stats: Value = client
        .get(format!("{base}/api/stats"))
        .send()
        .await
        .expect("stats")
        .json()
        .await
        .expect("json");
    assert_eq!(
        stats,
        json!({"total": 3, "assigned": 1, "remaining": 2, "isExhausted": false})
    );

    let toggle = client
        .patch(format!("{base}/api/territories"))
        .json(&json!({"id": 2}))
        .send()
        .await
        .expect("toggle");
    assert_eq!(toggle.status(), StatusCode::OK);
    let toggle: Value = toggle.json().await.expect("json");
    assert_eq!(toggle, json!({"success": true, "active": false}));

    let second: Value = client
        .get(format!("{base}/api/assign"))
        .send()
        .await
        .expect("assign")
        .json()
        .await
        .expect("json");
    assert_eq!(second["territory"]["id"], 3);

    let gone = client
        .get(format!("{base}/api/assign"))
        .send()
        .await
        .expect("assign");
    assert_eq!(gone.status(), StatusCode::GONE);
    let gone: Value = gone.json().await.expect("json");
    assert_eq!(gone["exhausted"], true);
    assert_eq!(gone["error"], "All territories assigned");

    let history: Value = client
        .get(format!("{base}/api/admin/assignments"))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("json");
    let ids: Vec<_> = history
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["territoryId"].as_u64().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let _ = running.shutdown.send(());
    running.server.abort();
}

#[tokio::test]
async fn dispenser_http_admin_surface() {
    let (running, _catalog) = start(&three_territories()).await;
    let client = reqwest::Client::new();
    let base = &running.base;

    let manual = client
        .post(format!("{base}/api/admin/assign"))
        .json(&json!({"id": 2}))
        .send()
        .await
        .expect("manual");
    assert_eq!(manual.status(), StatusCode::OK);

    let again = client
        .post(format!("{base}/api/admin/assign"))
        .json(&json!({"id": 2}))
        .send()
        .await
        .expect("manual again");
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let missing = client
        .post(format!("{base}/api/admin/assign"))
        .json(&json!({"id": 99}))
        .send()
        .await
        .expect("missing");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let bad = client
        .post(format!("{base}/api/admin/assign"))
        .json(&json!({"id": "two"}))
        .send()
        .await
        .expect("bad");
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let reset = client
        .post(format!("{base}/api/admin/reset"))
        .send()
        .await
        .expect("reset");
    assert_eq!(reset.status(), StatusCode::OK);
    let reset: Value = reset.json().await.expect("json");
    assert_eq!(reset["success"], true);
    assert_eq!(reset["message"], "System reset successfully");

    let stats: Value = client
        .get(format!("{base}/api/stats"))
        .send()
        .await
        .expect("stats")
        .json()
        .await
        .expect("json");
    assert_eq!(stats["assigned"], 0);

    let view = client
        .get(format!("{base}/api/territories/3"))
        .send()
        .await
        .expect("view");
    assert_eq!(view.status(), StatusCode::OK);
    let view: Value = view.json().await.expect("json");
    assert_eq!(view["map_link"], "https://maps.example/3");

    let not_numeric = client
        .get(format!("{base}/api/territories/abc"))
        .send()
        .await
        .expect("view");
    assert_eq!(not_numeric.status(), StatusCode::NOT_FOUND);

    let zero = client
        .patch(format!("{base}/api/territories"))
        .json(&json!({"id": 0}))
        .send()
        .await
        .expect("toggle zero");
    assert_eq!(zero.status(), StatusCode::NOT_FOUND);

    let oversized = client
        .patch(format!("{base}/api/territories"))
        .header("content-type", "application/json")
        .body(format!("{{\"id\": 1, \"pad\": \"{}\"}}", "x".repeat(1024)))
        .send()
        .await
        .expect("oversized");
    assert_eq!(oversized.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let metrics = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .expect("metrics")
        .text()
        .await
        .expect("text");
    assert!(metrics.contains("dispenser_resets_total 1"));
    assert!(metrics.contains("dispenser_assignments_total{outcome=\"manual\"} 1"));

    let _ = running.shutdown.send(());
    running.server.abort();
}

#[tokio::test]
async fn dispenser_http_missing_catalog_serves_empty() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let dir = tempfile::tempdir().expect("tmp");
    let cfg = DaemonConfig {
        listen: addr.to_string(),
        catalog_path: dir.path().join("missing.json"),
        ..DaemonConfig::default()
    };
    let dispenser = Dispenser::new(JsonFileCatalog::new(&cfg.catalog_path));
    let state = http_api::build_state(cfg, dispenser, Telemetry::new());
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let _ = http_api::serve(listener, state, async move {
            let _ = rx.await;
        })
        .await;
    });

    let client = reqwest::Client::new();
    let list: Value = client
        .get(format!("http://{addr}/api/territories"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    assert_eq!(list, json!([]));

    let assign = client
        .get(format!("http://{addr}/api/assign"))
        .send()
        .await
        .expect("assign");
    assert_eq!(assign.status(), StatusCode::GONE);

    let _ = tx.send(());
    server.abort();
}
