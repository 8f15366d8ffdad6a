use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use futures_util::SinkExt;
use landlord_core::{Command, GameError, Message};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::directory::{Notice, SessionHandle, SessionId};
use crate::SharedState;

// --- 纯文本行协议 ---

pub async fn serve_tcp(server: SharedState, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, addr) = listener.accept().await?;
        tokio::spawn(handle_tcp(server.clone(), socket, addr));
    }
}

async fn handle_tcp(server: SharedState, socket: TcpStream, addr: SocketAddr) {
    let (read_half, mut write_half) = socket.into_split();
    let SessionHandle { id, mut outbound, kick } = server.directory.register(addr);

    // 一条消息一行 JSON
    tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let Some(mut line) = encode(&msg) else { continue };
            line.push('\n');
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let lines = stream::unfold(BufReader::new(read_half).lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            _ => None,
        }
    });
    run_session(server, id, kick, pin!(lines)).await;
}

// --- WebSocket ---

pub fn router(server: SharedState) -> Router {
    Router::new().route("/ws", get(websocket_handler)).with_state(server)
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(server): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, server))
}

/// 一个文本帧就是一行
async fn handle_socket(socket: WebSocket, addr: SocketAddr, server: SharedState) {
    let (mut sink, frames) = socket.split();
    let SessionHandle { id, mut outbound, kick } = server.directory.register(addr);

    tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let Some(payload) = encode(&msg) else { continue };
            if sink.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let lines = stream::unfold(frames, |mut frames| async move {
        loop {
            match frames.next().await? {
                Ok(WsMessage::Text(text)) => return Some((text.as_str().to_owned(), frames)),
                Ok(WsMessage::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    });
    run_session(server, id, kick, pin!(lines)).await;
}

/// 序列化失败只丢掉这一条
fn encode(msg: &Message) -> Option<String> {
    serde_json::to_string(msg)
        .inspect_err(|err| warn!(%err, "failed to encode message"))
        .ok()
}

// --- 两种连接共用的会话流程 ---

/// 1. 读到非空的一行作为昵称
/// 2. 之后每一行解析成命令放进命令队列
/// 3. 连接断开或超时时，如果还没被移除，就代替玩家发一条退出命令
pub async fn run_session<S>(server: SharedState, id: SessionId, kick: Arc<Notify>, mut lines: S)
where
    S: Stream<Item = String> + Unpin,
{
    let nickname = loop {
        let Some(line) = next_line(&server, id, &kick, &mut lines).await else {
            server.directory.remove(&id);
            return;
        };
        server.directory.touch(&id);
        let name = line.trim();
        if name.is_empty() {
            server.directory.send_to(&id, Message::error("> please type a valid name"));
            continue;
        }
        break name.to_string();
    };

    server.directory.set_nickname(&id, &nickname);
    server.deliver(vec![
        Notice::To(id, Message::info("ok")),
        Notice::To(id, Message::text(format!("> welcome to the server, {}\n  type /ready to join the games", nickname))),
        Notice::others(id, Message::text(format!("> {} join the room", nickname))),
        Notice::RoomInfo,
    ]);

    while let Some(line) = next_line(&server, id, &kick, &mut lines).await {
        if server.intake.send(Command::parse(id, &line)).await.is_err() {
            break;
        }
    }

    if server.directory.contains(&id) {
        info!(%id, nickname = %nickname, "session lost");
        let _ = server.intake.send(Command::quit(id)).await;
    }
}

/// 等下一行输入。被踢出、连接关闭或者超过存活期限时返回 `None`。
async fn next_line<S>(server: &SharedState, id: SessionId, kick: &Notify, lines: &mut S) -> Option<String>
where
    S: Stream<Item = String> + Unpin,
{
    loop {
        let deadline = server.directory.deadline(&id)?;
        tokio::select! {
            line = lines.next() => return line,
            _ = kick.notified() => return None,
            _ = tokio::time::sleep_until(deadline) => {
                // 等待期间期限可能被分发器刷新过
                if server.directory.deadline(&id).is_some_and(|d| d > Instant::now()) {
                    continue;
                }
                warn!(%id, err = %GameError::SessionLost, "session idle");
                server.directory.send_to(&id, Message::error(GameError::SessionLost.to_string()));
                return None;
            }
        }
    }
}

// --- 单元测试 ---
