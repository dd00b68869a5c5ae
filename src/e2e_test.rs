//! End-to-end tests: adapter → HTTP sink → local receiver.
//!
//! A small axum server stands in for a broker and records every request
//! it receives, answering with a fixed status and body after an optional
//! delay.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    use crate::config::{Config, SinkConfig};
    use crate::error::{AdapterError, SinkError};
    use crate::heartbeat::{HEARTBEAT_SOURCE, HeartbeatAdapter};
    use crate::sink::create_sink;

    // ── Test Helpers ─────────────────────────────────────────────

    struct Received {
        headers: HeaderMap,
        body: Bytes,
    }

    impl Received {
        fn header(&self, name: &str) -> &str {
            self.headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        }
    }

    /// Start a receiver answering every POST with `status` and `reply`
    /// once `delay` has passed.
    async fn spawn_receiver_with(
        status: StatusCode,
        reply: String,
        delay: Duration,
    ) -> (Url, mpsc::UnboundedReceiver<Received>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/",
            post(move |headers: HeaderMap, body: Bytes| async move {
                let _ = tx.send(Received { headers, body });
                tokio::time::sleep(delay).await;
                (status, reply)
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (Url::parse(&format!("http://{addr}/")).unwrap(), rx)
    }

    async fn spawn_receiver(status: StatusCode) -> (Url, mpsc::UnboundedReceiver<Received>) {
        spawn_receiver_with(status, String::new(), Duration::ZERO).await
    }

    fn http_adapter(uri: &Url, interval: &str) -> HeartbeatAdapter {
        http_adapter_with_timeout(uri, interval, "2s")
    }

    fn http_adapter_with_timeout(uri: &Url, interval: &str, timeout: &str) -> HeartbeatAdapter {
        let config = Config::from_toml_str(&format!(
            "interval = \"{interval}\"\n[sink]\nuri = \"{uri}\"\ntimeout = \"{timeout}\"\n"
        ))
        .unwrap();
        let adapter_config = config.validate().unwrap();
        assert!(matches!(adapter_config.sink, SinkConfig::Http { .. }));

        let sink = create_sink(&adapter_config.sink).unwrap();
        HeartbeatAdapter::from_config(&adapter_config, sink)
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<Received>) -> Received {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("receiver timed out")
            .expect("receiver closed")
    }

    // ── Tests ────────────────────────────────────────────────────

    #[tokio::test]
    async fn delivers_binary_mode_cloudevents_in_order() {
        let (uri, mut rx) = spawn_receiver(StatusCode::ACCEPTED).await;
        let mut adapter = http_adapter(&uri, "20ms");
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { adapter.run(token).await });

        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(recv(&mut rx).await);
        }
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), Ok(()));

        for (i, request) in received.iter().enumerate() {
            assert_eq!(request.header("ce-id"), i.to_string());
            assert_eq!(request.header("ce-specversion"), "1.0");
            assert_eq!(request.header("ce-type"), "com.example.heartbeat");
            assert_eq!(request.header("ce-source"), HEARTBEAT_SOURCE);
            assert_eq!(request.header("content-type"), "text/json");
            assert!(request.header("ce-time").ends_with('Z'));
            assert!(
                request
                    .header("user-agent")
                    .starts_with("heartbeat-source/")
            );

            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            assert_eq!(body, serde_json::json!({ "heartbeat": "20ms" }));
        }
    }

    #[tokio::test]
    async fn rejected_delivery_ends_run_with_error() {
        // 400 three-byte characters: 1200 bytes, over the 1024-byte cap.
        let reply = "あ".repeat(400);
        let (uri, mut rx) =
            spawn_receiver_with(StatusCode::SERVICE_UNAVAILABLE, reply, Duration::ZERO).await;
        let mut adapter = http_adapter(&uri, "10ms");

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            adapter.run(CancellationToken::new()),
        )
        .await
        .expect("adapter did not stop");

        match result {
            Err(AdapterError::Delivery(SinkError::Rejected { status_code, body })) => {
                assert_eq!(status_code, 503);
                assert_eq!(body.len(), 1023);
                assert_eq!(body, "あ".repeat(341));
            }
            other => panic!("expected rejected delivery, got {:?}", other),
        }

        let first = recv(&mut rx).await;
        assert_eq!(first.header("ce-id"), "0");

        // No further ticks after the failure.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(adapter.emitted(), 1);
    }

    #[tokio::test]
    async fn slow_receiver_ends_run_with_timeout() {
        let (uri, mut rx) =
            spawn_receiver_with(StatusCode::OK, String::new(), Duration::from_millis(500)).await;
        let mut adapter = http_adapter_with_timeout(&uri, "10ms", "100ms");

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            adapter.run(CancellationToken::new()),
        )
        .await
        .expect("adapter did not stop");

        assert_eq!(
            result,
            Err(AdapterError::Delivery(SinkError::Timeout { timeout_ms: 100 }))
        );
        assert_eq!(recv(&mut rx).await.header("ce-id"), "0");
        assert_eq!(adapter.emitted(), 1);
    }

    #[tokio::test]
    async fn shared_sink_serves_two_adapters() {
        let (uri, mut rx) = spawn_receiver(StatusCode::OK).await;
        let sink = create_sink(&SinkConfig::Http {
            uri,
            timeout: Duration::from_secs(2),
            user_agent: "test".to_string(),
        })
        .unwrap();

        let cancel = CancellationToken::new();
        let mut handles = Vec::new();
        for _ in 0..2 {
            let mut adapter = HeartbeatAdapter::new(Duration::from_millis(15), Arc::clone(&sink));
            let token = cancel.clone();
            handles.push(tokio::spawn(async move { adapter.run(token).await }));
        }

        let mut zero_ids = 0;
        for _ in 0..4 {
            if recv(&mut rx).await.header("ce-id") == "0" {
                zero_ids += 1;
            }
        }
        cancel.cancel();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(()));
        }

        // Ids are per adapter, so each one starts from "0".
        assert_eq!(zero_ids, 2);
    }
}
