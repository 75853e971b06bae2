use anyhow::Result;
use censite_verifier::utils::logging::log_startup;
use censite_verifier::{logger, serve, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::load()?;
    log_startup(&config);

    // 启动 HTTP 服务
    serve(config).await
}
