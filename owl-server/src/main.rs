//! owl 服务入口

use anyhow::Context;
use common::config::{load_dotenv, AppConfig, LogFormat};
use owl_server::{create_router, AppState, SERVICE_NAME};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 初始化日志追踪
    init_tracing(config.log_format);

    // 创建应用状态（元数据库、文件存储、连接池）
    let state = AppState::new(config.clone())
        .await
        .context("failed to initialize application state (check DATABASE_URL and OWL_DATA_DIR)")?;
    let pool_manager = state.pool_manager.clone();

    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        data_dir = %config.data_dir.display(),
        "启动服务"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务启动失败")?;

    pool_manager.close_all().await;
    info!("服务已停止");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
}
