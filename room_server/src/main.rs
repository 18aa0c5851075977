use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{error, info, LevelFilter};
use room_server::config;
use room_server::ws_server::broadcast_router::BroadcastRouter;
use room_server::ws_server::connection_manager::ConnectionManager;
use room_server::ws_server::coordinator::Coordinator;
use room_server::ws_server::service::WsService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 默认 Info 级别，可通过 RUST_LOG 覆盖
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
    info!("[主程序] 日志系统已成功初始化 (env_logger)。");

    let app_config = config::load_config().context("加载应用配置失败")?;
    let server_config = app_config.server;
    info!(
        "[主程序] 配置已加载: {}:{}，生产模式: {}",
        server_config.host, server_config.port, server_config.production
    );

    let connection_manager = Arc::new(ConnectionManager::new());
    info!("[主程序] WebSocket 连接管理器 (ConnectionManager) 已创建。");

    let router = BroadcastRouter::new(Arc::clone(&connection_manager));
    let (coordinator, coordinator_task) = Coordinator::spawn(router, server_config.event_queue_capacity);
    info!("[主程序] 聊天协调器已在后台任务中启动。");

    let ws_service = WsService::new(server_config, Arc::clone(&connection_manager), coordinator);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("[主程序] 收到 Ctrl-C，开始优雅关闭..."),
            Err(e) => error!("[主程序] 监听关闭信号失败: {}", e),
        }
    };

    let result = ws_service.start(shutdown).await;
    // 仍在运行的连接任务也持有协调器句柄，因此只等待有限时间
    drop(ws_service);
    match tokio::time::timeout(Duration::from_secs(5), coordinator_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("[主程序] 协调器任务异常结束: {}", e),
        Err(_) => info!("[主程序] 仍有连接未结束，不再等待协调器。"),
    }

    result.context("WebSocket 服务运行失败")?;
    info!("[主程序] 服务已退出。");
    Ok(())
}
