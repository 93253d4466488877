//! Integration tests for the admin routes, driven through the router
//! directly so no listener is bound.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use clipledger::config::Config;
use clipledger::db::{
    insert_campaign, insert_clip, insert_user, Database, NewCampaign, NewClip, Platform,
};
use clipledger::error::ExtractError;
use clipledger::extractor::{ClipMetrics, ExtractorRegistry, PlatformExtractor, UrlResolver};
use clipledger::reconciler::Reconciler;
use clipledger::status::LogStatusSink;
use regex::Regex;
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Extractor that parks inside `extract` until released, so a pass can be
/// held mid-flight while the routes are exercised.
struct StallExtractor {
    patterns: Vec<Regex>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl PlatformExtractor for StallExtractor {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn url_patterns(&self) -> &[Regex] {
        &self.patterns
    }

    async fn extract(
        &self,
        _url: &str,
        _http: &reqwest::Client,
        _config: &Config,
    ) -> Result<ClipMetrics, ExtractError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ClipMetrics {
            views: 100,
            ..ClipMetrics::default()
        })
    }
}

struct IdentityResolver;

#[async_trait]
impl UrlResolver for IdentityResolver {
    async fn resolve(&self, url: &str) -> Result<String, ExtractError> {
        Ok(url.to_string())
    }
}

struct Harness {
    app: Router,
    db: Database,
    reconciler: Arc<Reconciler>,
    _temp_dir: TempDir,
}

async fn setup_with(config: Config, registry: ExtractorRegistry) -> Harness {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let reconciler = Arc::new(
        Reconciler::new(
            config.clone(),
            db.clone(),
            Arc::new(registry),
            Arc::new(IdentityResolver),
            Arc::new(LogStatusSink),
        )
        .expect("Failed to build reconciler"),
    );

    let app = clipledger::web::router(&config, db.clone(), Arc::clone(&reconciler));

    Harness {
        app,
        db,
        reconciler,
        _temp_dir: temp_dir,
    }
}

async fn setup() -> Harness {
    setup_with(Config::for_testing(), ExtractorRegistry::new()).await
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Wait for the spawned pass to release the run lock.
async fn wait_until_idle(reconciler: &Reconciler) {
    for _ in 0..500 {
        if !reconciler.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pass never finished");
}

#[tokio::test]
async fn test_healthz() {
    let h = setup().await;

    let response = get(&h.app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_campaign_detail_not_found() {
    let h = setup().await;

    let response = get(&h.app, "/admin/campaigns/9999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_campaign_detail_found() {
    let h = setup().await;
    insert_campaign(
        h.db.pool(),
        &NewCampaign {
            id: 1,
            name: "spring-push".to_string(),
            rate: 0.001,
            max_payout: 100.0,
            allowed_platforms: vec![Platform::TikTok],
        },
    )
    .await
    .unwrap();

    let response = get(&h.app, "/admin/campaigns/1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("spring-push"));
    assert!(body.contains("payments"));
}

#[tokio::test]
async fn test_admin_routes_require_token_when_configured() {
    let mut config = Config::for_testing();
    config.admin_token = Some("sekrit".to_string());
    let h = setup_with(config, ExtractorRegistry::new()).await;

    // No credentials.
    let response = get(&h.app, "/admin/status").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token.
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/status")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct token.
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/status")
                .header("authorization", "Bearer sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The liveness probe stays open.
    let response = get(&h.app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reconcile_trigger_runs_a_pass() {
    let h = setup().await;

    let response = post(&h.app, "/admin/reconcile").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(body_string(response).await.contains("started"));

    wait_until_idle(&h.reconciler).await;
    let summary = h.reconciler.last_pass().await.expect("no pass recorded");
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn test_reconcile_trigger_conflicts_while_pass_in_flight() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let mut registry = ExtractorRegistry::new();
    registry.register(Box::new(StallExtractor {
        patterns: vec![Regex::new(r"^https://fake\.test/").unwrap()],
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    }));
    let h = setup_with(Config::for_testing(), registry).await;

    insert_campaign(
        h.db.pool(),
        &NewCampaign {
            id: 1,
            name: "campaign-1".to_string(),
            rate: 0.001,
            max_payout: 100.0,
            allowed_platforms: vec![Platform::TikTok],
        },
    )
    .await
    .unwrap();
    insert_user(h.db.pool(), "alice", None).await.unwrap();
    insert_clip(
        h.db.pool(),
        &NewClip {
            url: "https://fake.test/stall".to_string(),
            platform: Platform::TikTok,
            campaign_id: 1,
            user_id: "alice".to_string(),
        },
    )
    .await
    .unwrap();

    let response = post(&h.app, "/admin/reconcile").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Hold the pass inside the extractor, then trigger again.
    tokio::time::timeout(Duration::from_secs(5), entered.notified())
        .await
        .expect("pass never reached the extractor");

    let response = post(&h.app, "/admin/reconcile").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    release.notify_one();
    wait_until_idle(&h.reconciler).await;

    let summary = h.reconciler.last_pass().await.expect("no pass recorded");
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.updated, 1);
}
