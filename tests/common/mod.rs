#![allow(dead_code)]

use axum::extract::ConnectInfo;
use shortlink::application::services::{AliasService, AnalyticsService, RateLimiter};
use shortlink::domain::click_event::ClickEvent;
use shortlink::domain::repositories::KvStore;
use shortlink::infrastructure::store::MemoryStore;
use shortlink::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

pub const BASE_URL: &str = "https://sho.rt";
pub const STORE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct TestContext {
    pub state: AppState,
    pub click_rx: mpsc::Receiver<ClickEvent>,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(Arc::new(MemoryStore::new()), 100)
}

pub fn create_test_state_with(store: Arc<MemoryStore>, rate_limit: u64) -> TestContext {
    let kv: Arc<dyn KvStore> = store.clone();

    let alias_service = Arc::new(AliasService::new(kv.clone(), BASE_URL, STORE_TIMEOUT));
    let analytics_service = Arc::new(AnalyticsService::new(kv.clone(), STORE_TIMEOUT));
    let rate_limiter = Arc::new(RateLimiter::new(
        kv.clone(),
        rate_limit,
        Duration::from_secs(60),
        false,
        STORE_TIMEOUT,
    ));

    let (click_tx, click_rx) = mpsc::channel(100);

    let state = AppState::new(
        alias_service,
        analytics_service,
        rate_limiter,
        kv,
        click_tx,
        true,
    );

    TestContext {
        state,
        click_rx,
        store,
    }
}

/// Inserts a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
