// tests/common/mod.rs
//! Helpers shared by the integration tests.

#![allow(dead_code)]

use obra_partes::{AppState, MockWorkOrders, WorkOrderRepository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A server running on an ephemeral port. Stops when dropped.
pub struct TestServer {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn spawn_server(state: AppState) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        obra_partes::serve(listener, state, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });
    TestServer {
        base_url: format!("http://{}", addr),
        shutdown: Some(tx),
    }
}

/// A server over fresh sample data, with rate limiting off.
pub async fn spawn_mock_server() -> TestServer {
    let repo: Arc<dyn WorkOrderRepository> = Arc::new(MockWorkOrders::default());
    spawn_server(AppState::new(repo).with_rate_limit(0)).await
}
