//! Integration tests for Lenswatch
//!
//! These tests verify that multiple systems work together correctly.

use axum::{Json, Router, extract::State, routing::post};
use lenswatch_core::test_utils::{lens_root, neighbour, owner, process, risk_owner, with_edges, with_scalar};
use lenswatch_poller::{PollConfig, Poller};
use lenswatch_server::{LensServer, ServerConfig};
use lenswatch_store::DgraphConnector;
use serde_json::{Value, json};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Fake Dgraph alpha whose `q0` answer can be swapped mid-test.
async fn spawn_alpha(q0: Arc<Mutex<Value>>) -> String {
    async fn query(State(q0): State<Arc<Mutex<Value>>>, Json(_body): Json<Value>) -> Json<Value> {
        let q0 = q0.lock().unwrap().clone();
        Json(json!({ "data": { "q0": q0 } }))
    }

    let app = Router::new().route("/query", post(query)).with_state(q0);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_lenswatch(alpha: &str, poll: PollConfig) -> String {
    let connector = DgraphConnector::new(alpha, Duration::from_secs(5)).unwrap();
    let server = LensServer::new(Arc::new(connector), Poller::new(poll), ServerConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server.serve(listener, std::future::pending()).await.unwrap();
    });
    format!("http://{}", addr)
}

/// L1 scopes a process whose children include one L1 node, one node owned
/// by another lens, and one surfaced through a risk.
fn l1_scope(risk_score: i64) -> Value {
    let parent = with_edges(
        with_scalar(process("0xa", "winword.exe", 100), "risk_score", json!(risk_score)),
        "children",
        vec![
            neighbour("0xc", vec![owner("0x1", "L1")]),
            neighbour("0xd", vec![owner("0x2", "L2")]),
            neighbour("0xe", vec![owner("0x2", "L2"), risk_owner("0x9", "macro_dropper", 75)]),
        ],
    );
    json!([lens_root("0x1", "L1", vec![parent])])
}

#[tokio::test]
async fn test_update_flow_against_dgraph_http() {
    let q0 = Arc::new(Mutex::new(l1_scope(10)));
    let alpha = spawn_alpha(Arc::clone(&q0)).await;
    let base = spawn_lenswatch(
        &alpha,
        PollConfig::new(Duration::from_secs(3), Duration::from_millis(50)),
    )
    .await;
    let client = reqwest::Client::new();

    // First contact: everything in scope is new.
    let first: Value = client
        .post(format!("{}/update", base))
        .json(&json!({ "lens": "L1", "uid_hashes": {} }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let updated = first["updated_nodes"].as_array().unwrap();
    assert_eq!(updated.len(), 1);
    let children: Vec<&str> = updated[0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["uid"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["0xc", "0xe"]);

    // The store converges on a risk change while the second poll waits.
    let writer = Arc::clone(&q0);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        *writer.lock().unwrap() = l1_scope(90);
    });
    let second: Value = client
        .post(format!("{}/update", base))
        .json(&json!({ "lens": "L1", "uid_hashes": first["uid_hashes"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["updated_nodes"][0]["uid"], json!("0xa"));
    assert_eq!(second["updated_nodes"][0]["risk_score"], json!(90));
    assert_eq!(second["removed_nodes"], json!([]));
}

#[tokio::test]
async fn test_lens_listing_against_dgraph_http() {
    let q0 = Arc::new(Mutex::new(json!([
        { "uid": "0x1", "node_key": "k1", "lens": "L1", "score": 40 }
    ])));
    let alpha = spawn_alpha(q0).await;
    let base = spawn_lenswatch(&alpha, PollConfig::default()).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/getLenses", base))
        .json(&json!({ "prefix": "L1" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["lenses"][0]["node_key"], json!("k1"));
    assert_eq!(body["lenses"][0]["score"], json!(40));
}

/// The CLI polls a memory fixture and prints the diff
#[test]
fn test_cli_update_from_fixture() {
    let dir = tempfile::TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.json");
    std::fs::write(
        &fixture,
        serde_json::to_string(&json!({ "L1": l1_scope(10) })).unwrap(),
    )
    .unwrap();
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(&snapshot, r#"{"0xold": "deadbeef"}"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lenswatch"))
        .args(["--store", "memory", "--fixture"])
        .arg(&fixture)
        .args(["update", "L1", "--snapshot"])
        .arg(&snapshot)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let diff: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diff["updated_nodes"][0]["uid"], json!("0xa"));
    assert_eq!(diff["removed_nodes"], json!(["0xold"]));
}

#[test]
fn test_cli_rejects_empty_lens() {
    let output = Command::new(env!("CARGO_BIN_EXE_lenswatch"))
        .args(["--store", "memory", "update", " "])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("lens name must not be empty"));
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = Command::new(env!("CARGO_BIN_EXE_lenswatch"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lenswatch"));
    assert!(stdout.contains("change detection"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_lenswatch"))
        .arg("version")
        .output()
        .expect("Failed to execute command");
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Lenswatch v"));
}
