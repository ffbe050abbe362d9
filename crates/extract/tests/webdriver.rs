use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};

use cp_domain::config::ExtractConfig;
use cp_extract::{PageRenderer, WebDriverRenderer};

const PAGE: &str = r#"<html><body><div data-test-id="job-details">x</div></body></html>"#;
const PNG: &[u8] = b"png-bytes";

/// A chromedriver stand-in that logs every command it receives.
struct Driver {
    log: Mutex<Vec<String>>,
    cards_present: bool,
    navigation_fails: bool,
}

type Reply = (StatusCode, Json<Value>);

fn ok(value: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "value": value })))
}

async fn new_session(State(d): State<Arc<Driver>>) -> Reply {
    d.log.lock().push("new".into());
    ok(json!({ "sessionId": "s-1", "capabilities": {} }))
}

async fn navigate(State(d): State<Arc<Driver>>, Path(id): Path<String>) -> Reply {
    d.log.lock().push(format!("nav {id}"));
    if d.navigation_fails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "value": { "error": "unknown error", "message": "net::ERR_NAME_NOT_RESOLVED" } })),
        );
    }
    ok(Value::Null)
}

async fn elements(State(d): State<Arc<Driver>>) -> Reply {
    d.log.lock().push("poll".into());
    if d.cards_present {
        ok(json!([{ "element-6066-11e4-a52e-4f735466cecf": "e-1" }]))
    } else {
        ok(json!([]))
    }
}

async fn source(State(d): State<Arc<Driver>>) -> Reply {
    d.log.lock().push("src".into());
    ok(json!(PAGE))
}

async fn screenshot(State(d): State<Arc<Driver>>) -> Reply {
    d.log.lock().push("shot".into());
    ok(json!(base64::engine::general_purpose::STANDARD.encode(PNG)))
}

async fn delete_session(State(d): State<Arc<Driver>>, Path(id): Path<String>) -> Reply {
    d.log.lock().push(format!("del {id}"));
    ok(Value::Null)
}

async fn start(cards_present: bool, navigation_fails: bool) -> (Arc<Driver>, String) {
    let driver = Arc::new(Driver {
        log: Mutex::new(Vec::new()),
        cards_present,
        navigation_fails,
    });
    let app = Router::new()
        .route("/session", post(new_session))
        .route("/session/:id", delete(delete_session))
        .route("/session/:id/url", post(navigate))
        .route("/session/:id/elements", post(elements))
        .route("/session/:id/source", get(source))
        .route("/session/:id/screenshot", get(screenshot))
        .with_state(driver.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (driver, format!("http://{addr}"))
}

fn config(webdriver_url: String, snapshot_dir: &std::path::Path) -> ExtractConfig {
    ExtractConfig {
        webdriver_url,
        wait_timeout_secs: 1,
        settle_delay_ms: 0,
        poll_interval_ms: 50,
        snapshot_dir: snapshot_dir.to_path_buf(),
        ..ExtractConfig::default()
    }
}

#[tokio::test]
async fn loaded_page_is_returned_and_session_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let (driver, url) = start(true, false).await;
    let renderer = WebDriverRenderer::new(config(url, dir.path())).unwrap();

    let page = renderer
        .render("https://www.herkey.com/jobs", r#"[data-test-id="job-details"]"#)
        .await
        .unwrap();

    assert!(!page.timed_out);
    assert!(page.snapshot.is_none());
    assert_eq!(page.html, PAGE);
    let log = driver.log.lock().clone();
    assert_eq!(log, vec!["new", "nav s-1", "poll", "src", "del s-1"]);
}

#[tokio::test]
async fn wait_timeout_keeps_going_with_a_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let (driver, url) = start(false, false).await;
    let renderer = WebDriverRenderer::new(config(url, dir.path())).unwrap();

    let page = renderer
        .render("https://www.herkey.com/jobs", r#"[data-test-id="job-details"]"#)
        .await
        .unwrap();

    assert!(page.timed_out);
    assert_eq!(page.html, PAGE);
    let shot = page.snapshot.expect("screenshot path");
    assert!(shot.starts_with(dir.path()));
    assert!(shot.file_name().unwrap().to_string_lossy().starts_with("wait_failed-"));
    assert_eq!(std::fs::read(&shot).unwrap(), PNG);

    let log = driver.log.lock().clone();
    let polls = log.iter().filter(|l| *l == "poll").count();
    assert!(polls > 1, "polled {polls} times");
    assert_eq!(&log[log.len() - 3..], ["shot", "src", "del s-1"]);
}

#[tokio::test]
async fn session_is_deleted_when_navigation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (driver, url) = start(true, true).await;
    let renderer = WebDriverRenderer::new(config(url, dir.path())).unwrap();

    let err = renderer
        .render("https://nowhere.invalid/jobs", r#"[data-test-id="job-details"]"#)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"), "{err}");
    let log = driver.log.lock().clone();
    assert_eq!(log, vec!["new", "nav s-1", "del s-1"]);
}
