// tests/probe_tests.rs

use alt3r::probe_router;

async fn spawn_probe() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, probe_router()).await.unwrap();
    });

    address
}

#[tokio::test]
async fn get_root_reports_running() {
    let address = spawn_probe().await;
    let client = reqwest::Client::new();

    let response = client.get(&address).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("status: running"));
}

#[tokio::test]
async fn post_root_returns_ok_json() {
    let address = spawn_probe().await;
    let client = reqwest::Client::new();

    let response = client.post(&address).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "ok");
}
