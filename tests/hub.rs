use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use tax4us_agents::hub::HubClient;

/// Serve one canned HTTP response and hand back the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (url, handle)
}

#[tokio::test]
async fn status_from_live_hub() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"blog":{"status":"paused","queueLength":7},"podcast":{"successRate":99.5}}"#,
    )
    .await;

    let snapshot = HubClient::new(&url).fetch_status().await;
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /status "));
    assert!(snapshot.success);
    assert_eq!(snapshot.hub["blog"]["status"], "paused");
    assert_eq!(snapshot.agents[1].status, "paused");
    assert_eq!(snapshot.agents[1].metrics.queue_length, 7);
    assert_eq!(snapshot.agents[2].metrics.success_rate, 99.5);
    assert_eq!(snapshot.agents[0].status, "active");
}

#[tokio::test]
async fn status_error_response_falls_back() {
    let (url, server) = serve_once("503 Service Unavailable", "{}").await;

    let snapshot = HubClient::new(&url).fetch_status().await;
    server.await.unwrap();

    assert!(!snapshot.success);
    assert_eq!(snapshot.hub["status"], "fallback");
    assert_eq!(snapshot.agents.len(), 4);
}

#[tokio::test]
async fn action_is_forwarded() {
    let (url, server) = serve_once("200 OK", r#"{"queued":true}"#).await;

    let envelope = HubClient::new(&url)
        .execute_action("wordpress-blog", "restart", &json!({"reason": "stuck"}))
        .await;
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /agents/wordpress-blog/restart "));
    assert!(request.ends_with(r#"{"reason":"stuck"}"#));
    assert!(envelope.success);
    assert_eq!(envelope.result, Some(json!({"queued": true})));
    assert!(envelope.error.is_none());
}

#[tokio::test]
async fn rejected_action_reports_failure() {
    let (url, server) = serve_once("404 Not Found", "{}").await;

    let envelope = HubClient::new(&url)
        .execute_action("unknown", "start", &json!({}))
        .await;
    server.await.unwrap();

    assert!(!envelope.success);
    assert!(envelope.error.unwrap().contains("404"));
}
