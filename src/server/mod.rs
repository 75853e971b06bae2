//! HTTP 服务
//!
//! 路由：
//! - `POST /api/consultar` — 计算 CUIT 并查询门户
//! - `GET  /api/cuit` — 只计算 CUIT
//! - `GET  /health` — 存活探针

pub mod extractors;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::browser::{BrowserLauncher, ChromiumLauncher};
use crate::config::Config;
use crate::orchestrator::VerificationOrchestrator;

/// 所有请求共享的状态，只包含无会话状态的编排器
pub struct AppState<L: BrowserLauncher> {
    pub orchestrator: Arc<VerificationOrchestrator<L>>,
}

impl<L: BrowserLauncher> AppState<L> {
    pub fn new(orchestrator: VerificationOrchestrator<L>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

impl<L: BrowserLauncher> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
        }
    }
}

/// 构建路由
pub fn router<L: BrowserLauncher>(state: AppState<L>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/cuit", get(handlers::preview_cuit))
        .route("/api/consultar", post(handlers::consultar::<L>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动 HTTP 服务，直到收到 Ctrl-C
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let launcher = ChromiumLauncher::from_config(&config);
    let orchestrator = VerificationOrchestrator::new(launcher, &config);
    let app = router(AppState::new(orchestrator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法监听 {}", addr))?;
    info!("✅ 服务已就绪: http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("收到退出信号，正在关闭服务..."),
        Err(e) => {
            error!("无法监听退出信号: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
