//! Admin API over a real listener.

use serde_json::Value;
use tokio::net::TcpListener;

use provider_health::admin::{self, AdminState};
use provider_health::lifecycle::{Services, Shutdown};
use provider_health::{HealthConfig, ProviderDescriptor};

mod common;

const KEY: &str = "test-key";

async fn start_admin(config: &HealthConfig) -> (String, Services, Shutdown) {
    let services = Services::build(config).unwrap();
    services.monitor.run_cycle().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = Shutdown::new();
    let state = AdminState {
        services: services.clone(),
        api_key: KEY.into(),
    };
    tokio::spawn(admin::serve(listener, state, shutdown.subscribe()));

    (base, services, shutdown)
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let (base, _services, shutdown) = start_admin(&HealthConfig::default()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{base}/admin/status")).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("{base}/admin/status"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("{base}/admin/status"))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_health_queries_and_operations() {
    let up = common::start_mock_backend(200).await;
    let down = common::start_mock_backend(500).await;
    let config = HealthConfig {
        providers: vec![
            common::provider("down", down),
            common::provider("up", up),
            ProviderDescriptor::new("empty", "No endpoint", Vec::new()),
        ],
        ..Default::default()
    };
    let (base, services, shutdown) = start_admin(&config).await;
    let client = reqwest::Client::new();
    let get = |path: &str| client.get(format!("{base}{path}")).bearer_auth(KEY).send();

    let ranked: Value = get("/admin/providers/ranked").await.unwrap().json().await.unwrap();
    assert_eq!(ranked[0]["provider_id"], "up");
    assert_eq!(ranked[0]["status"], "healthy");
    assert!(ranked[0]["score"].as_f64().unwrap() > 0.9);

    let best: Value = get("/admin/providers/best").await.unwrap().json().await.unwrap();
    assert_eq!(best["provider_id"], "up");

    let res = get("/admin/providers/missing").await.unwrap();
    assert_eq!(res.status(), 404);

    let selection: Value = get("/admin/select?providers=down,up").await.unwrap().json().await.unwrap();
    assert_eq!(selection["provider"], "up");

    let selection: Value = get("/admin/select?providers=up&failed=up")
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(selection["provider"].is_null());

    let res = client
        .post(format!("{base}/admin/providers/up/failure"))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(services.monitor.health("up").unwrap().consecutive_failures, 1);

    let res = client
        .post(format!("{base}/admin/providers/down/reset"))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);
    let down: Value = get("/admin/providers/down").await.unwrap().json().await.unwrap();
    assert_eq!(down["status"], "unknown");
    assert_eq!(down["success_rate"], 1.0);

    shutdown.trigger();
}
