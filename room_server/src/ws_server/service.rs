// room_server/src/ws_server/service.rs

//! WebSocket 服务：HTTP 监听、静态资源、跨域策略，以及每个连接的读写循环。
//!
//! 传输层只负责把帧解析成强类型的入站事件并提交给协调器，
//! 以及把协调器放入出站队列的消息写回 socket；它不持有任何聊天状态。

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rust_websocket_utils::message::WsMessage;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::ws_server::connection_manager::ConnectionManager;
use crate::ws_server::coordinator::CoordinatorHandle;
use crate::ws_server::events::InboundEvent;

/// 连接结束后等待写任务清空出站队列的最长时间
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// 每个连接任务共享的上下文。
#[derive(Clone)]
struct ConnectionContext {
    connection_manager: Arc<ConnectionManager>,
    coordinator: CoordinatorHandle,
}

/// WebSocket 服务结构体，封装了配置、连接管理器和协调器句柄。
pub struct WsService {
    config: ServerConfig,
    connection_manager: Arc<ConnectionManager>,
    coordinator: CoordinatorHandle,
}

impl WsService {
    pub fn new(config: ServerConfig, connection_manager: Arc<ConnectionManager>, coordinator: CoordinatorHandle) -> Self {
        info!("[WS服务] 已创建服务实例，WebSocket 路径: {}", config.ws_path);
        Self {
            config,
            connection_manager,
            coordinator,
        }
    }

    /// 构建 axum 路由：WebSocket 升级路径 + 静态资源回退 + 跨域 / 请求追踪中间件。
    pub fn router(&self) -> Router {
        let context = ConnectionContext {
            connection_manager: Arc::clone(&self.connection_manager),
            coordinator: self.coordinator.clone(),
        };

        let mut router = Router::new()
            .route(&self.config.ws_path, get(ws_upgrade_handler))
            .with_state(context);

        if self.config.static_dir.is_dir() {
            info!("[WS服务] 静态资源目录: {}", self.config.static_dir.display());
            router = router.fallback_service(ServeDir::new(&self.config.static_dir));
        } else {
            warn!(
                "[WS服务] 静态资源目录 {} 不存在，仅提供 WebSocket 服务",
                self.config.static_dir.display()
            );
        }

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(self.cors_layer()),
        )
    }

    /// 生产模式不放行任何跨域来源；开发模式只放行配置中列出的来源。
    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .config
            .effective_origins()
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("[WS服务] 忽略无效的跨域来源 '{}': {}", origin, e);
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            debug!("[WS服务] 未放行任何跨域来源");
            return CorsLayer::new();
        }
        info!("[WS服务] 放行跨域来源: {:?}", origins);
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }

    /// 绑定配置中的地址并运行，直到 `shutdown` 完成。
    pub async fn start<F>(&self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.listen_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        self.serve(listener, shutdown).await
    }

    /// 在已绑定的监听器上运行服务。测试中可传入绑定到 0 端口的监听器。
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!(
            "[WS服务] 正在监听 http://{}，WebSocket 地址 ws://{}{}",
            local_addr, local_addr, self.config.ws_path
        );

        axum::serve(listener, self.router().into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::WebSocketService(format!("HTTP 服务异常退出: {}", e)))?;

        info!("[WS服务] 服务已停止");
        Ok(())
    }
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(context): State<ConnectionContext>,
) -> impl IntoResponse {
    debug!("[WS服务] 收到来自 {} 的 WebSocket 升级请求", addr);
    ws.on_upgrade(move |socket| handle_socket(socket, addr, context))
}

/// 单个连接的完整生命周期：登记 → 提交 connect → 读循环 → 提交 disconnect → 等待写任务结束。
async fn handle_socket(socket: WebSocket, addr: SocketAddr, context: ConnectionContext) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    // 会话句柄持有出站队列的发送端，这里只保留 ID，会话释放后写任务才能结束
    let client_id = context.connection_manager.add_client(addr, tx).client_id;

    if !context.coordinator.submit(client_id, InboundEvent::Connect).await {
        context.connection_manager.remove_client(&client_id);
        return;
    }

    let mut writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("[WS服务] 连接 {} 的出站消息序列化失败: {}", client_id, e);
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(Message::Text(text)).await {
                debug!("[WS服务] 向连接 {} 写入失败，写任务结束: {}", client_id, e);
                return;
            }
        }
        let _ = ws_sender.close().await;
        debug!("[WS服务] 连接 {} 的出站队列已关闭，写任务结束", client_id);
    });

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => forward_frame(&context, client_id, &text).await,
            Ok(Message::Binary(data)) => {
                warn!("[WS服务] 连接 {} 发送了 {} 字节的二进制帧，已忽略", client_id, data.len());
            }
            Ok(Message::Close(reason)) => {
                debug!("[WS服务] 连接 {} 发起关闭: {:?}", client_id, reason);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("[WS服务] 连接 {} 读取失败: {}", client_id, e);
                break;
            }
        }
    }

    info!("[WS服务] 连接 {} ({}) 已结束", client_id, addr);
    if !context.coordinator.submit(client_id, InboundEvent::Disconnect).await {
        context.connection_manager.remove_client(&client_id);
    }

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        warn!("[WS服务] 连接 {} 的写任务未能按时结束，强制终止", client_id);
        writer.abort();
    }
}

/// 解析一个文本帧并提交给协调器；无法解析的帧只记录日志，连接保持不变。
async fn forward_frame(context: &ConnectionContext, client_id: Uuid, text: &str) {
    let message = match WsMessage::from_json(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("[WS服务] 连接 {} 发送了无法解析的帧: {}", client_id, e);
            return;
        }
    };
    match InboundEvent::try_from(&message) {
        Ok(event) => {
            context.coordinator.submit(client_id, event).await;
        }
        Err(e) => {
            warn!(
                "[WS服务] 连接 {} 的 '{}' 帧被丢弃: {}",
                client_id, message.message_type, e
            );
        }
    }
}
