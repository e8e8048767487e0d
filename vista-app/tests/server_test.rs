//! Drives the web API with a scripted provider.

#![allow(clippy::unwrap_used, missing_docs)]

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use vista::analysis::Analyzer;
use vista::providers::MockProvider;
use vista::render::Theme;
use vista_app::server::{AppState, router};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

async fn spawn_app(provider: Arc<MockProvider>) -> String {
    let state = AppState::new(Analyzer::new(provider), Theme::Light);
    let app = router(state, 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn new_session(client: &Client, base: &str) -> String {
    let res = client
        .post(format!("{base}/api/sessions"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    format!("{base}/api/sessions/{}", body["id"].as_str().unwrap())
}

async fn send_event(client: &Client, session: &str, event: Value) {
    let res = client
        .post(format!("{session}/events"))
        .json(&event)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

/// Collects `(event, data)` pairs from a complete SSE body.
fn parse_sse(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    name = Some(v.trim().to_owned());
                } else if let Some(v) = line.strip_prefix("data:") {
                    data = Some(serde_json::from_str(v.trim()).unwrap());
                }
            }
            Some((name?, data?))
        })
        .collect()
}

async fn analyze(client: &Client, session: &str) -> Vec<(String, Value)> {
    let body = client
        .get(format!("{session}/analyze"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    parse_sse(&body)
}

#[tokio::test]
async fn test_page_is_served() {
    let base = spawn_app(Arc::new(MockProvider::new(["x"]))).await;
    let page = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let html = page.text().await.unwrap();
    assert!(html.contains("Análisis Visual con IA"));
    assert!(html.contains(".jpg,.png,.jpeg"));
}

#[tokio::test]
async fn test_missing_inputs_warn_without_calling_provider() {
    let provider = Arc::new(MockProvider::new(["x"]));
    let base = spawn_app(provider.clone()).await;
    let client = Client::new();
    let session = new_session(&client, &base).await;

    let events = analyze(&client, &session).await;
    let names: Vec<_> = events.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["warning", "warning", "done"]);
    assert_eq!(events[0].1["warning"], "missing_image");
    assert_eq!(
        events[1].1["message"],
        "🔑 Ingresa tu API key para continuar."
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_full_run_streams_and_renders_card() {
    let provider = Arc::new(MockProvider::new(["Hola", ", ", "mundo"]));
    let base = spawn_app(provider.clone()).await;
    let client = Client::new();
    let session = new_session(&client, &base).await;

    send_event(&client, &session, json!({"type": "credential_changed", "value": "sk-test"})).await;
    send_event(&client, &session, json!({"type": "theme_changed", "value": "dark"})).await;
    send_event(&client, &session, json!({"type": "context_toggled", "value": true})).await;
    send_event(&client, &session, json!({"type": "context_changed", "value": "¿Dónde?"})).await;

    let upload = client
        .put(format!("{session}/image?name=foto.jpg"))
        .body(JPEG.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);
    let meta: Value = upload.json().await.unwrap();
    assert_eq!(meta, json!({"name": "foto.jpg", "format": "jpeg", "size": JPEG.len()}));

    let preview = client.get(format!("{session}/image")).send().await.unwrap();
    assert_eq!(preview.headers()["content-type"], "image/jpeg");
    assert_eq!(preview.bytes().await.unwrap().as_ref(), JPEG);

    let events = analyze(&client, &session).await;
    let progress: Vec<_> = events
        .iter()
        .filter(|(n, _)| n == "progress")
        .map(|(_, d)| d["text"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(progress, vec!["Hola▌", "Hola, ▌", "Hola, mundo▌"]);

    let (_, completed) = events.iter().find(|(n, _)| n == "completed").unwrap();
    assert_eq!(completed["text"], "Hola, mundo");
    assert_eq!(completed["theme"], "dark");
    assert!(
        completed["html"]
            .as_str()
            .unwrap()
            .contains("background-color: #1E1E1E")
    );

    let request = &provider.requests()[0];
    assert!(request.messages[0].text().ends_with("¿Dónde?"));
}

#[tokio::test]
async fn test_stream_failure_then_retry() {
    let provider = Arc::new(MockProvider::new(["Hola", "mundo"]).fail_after(1, "connection reset"));
    let base = spawn_app(provider.clone()).await;
    let client = Client::new();
    let session = new_session(&client, &base).await;

    send_event(&client, &session, json!({"type": "credential_changed", "value": "sk-test"})).await;
    client
        .put(format!("{session}/image?name=a.png"))
        .body(vec![1_u8, 2, 3])
        .send()
        .await
        .unwrap();

    for _ in 0..2 {
        let events = analyze(&client, &session).await;
        let names: Vec<_> = events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["started", "progress", "failed", "done"]);
        assert_eq!(
            events[2].1["message"],
            "❌ Ocurrió un error: connection reset"
        );
    }
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_upload_rules() {
    let base = spawn_app(Arc::new(MockProvider::new(["x"]))).await;
    let client = Client::new();
    let session = new_session(&client, &base).await;

    let gif = client
        .put(format!("{session}/image?name=anim.gif"))
        .body(vec![0_u8; 4])
        .send()
        .await
        .unwrap();
    assert_eq!(gif.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let too_big = client
        .put(format!("{session}/image?name=big.png"))
        .body(vec![0_u8; 4096])
        .send()
        .await
        .unwrap();
    assert_eq!(too_big.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let none = client.get(format!("{session}/image")).send().await.unwrap();
    assert_eq!(none.status(), StatusCode::NOT_FOUND);

    client
        .put(format!("{session}/image?name=ok.png"))
        .body(vec![1_u8])
        .send()
        .await
        .unwrap();
    let cleared = client.delete(format!("{session}/image")).send().await.unwrap();
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);
    let gone = client.get(format!("{session}/image")).send().await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_theme_stylesheet_follows_session() {
    let base = spawn_app(Arc::new(MockProvider::new(["x"]))).await;
    let client = Client::new();
    let session = new_session(&client, &base).await;

    let light = client
        .get(format!("{session}/theme.css"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(light.contains("#FFFFFF"));

    send_event(&client, &session, json!({"type": "theme_changed", "value": "dark"})).await;
    let dark = client
        .get(format!("{session}/theme.css"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(dark.contains("#121212"));
}

#[tokio::test]
async fn test_unknown_and_deleted_sessions() {
    let base = spawn_app(Arc::new(MockProvider::new(["x"]))).await;
    let client = Client::new();

    let unknown = client
        .get(format!(
            "{base}/api/sessions/00000000-0000-0000-0000-000000000000/analyze"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let body: Value = unknown.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let session = new_session(&client, &base).await;
    let deleted = client.delete(&session).send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let again = client.delete(&session).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}
