use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use landlord_core::{Command, Match, MatchState, Message, MessageKind, SeatId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::SharedState;

pub type SessionId = SeatId;

/// 每个连接的发送队列长度
pub const OUTBOUND_CAPACITY: usize = 32;

// 单个连接
struct Session {
    addr: SocketAddr,
    /// 收到第一行有效输入之前是 `None`，这期间不参与广播
    nickname: Option<String>,
    /// 连接的先后顺序，玩家列表按它排序
    seq: u64,
    outbound: mpsc::Sender<Message>,
    deadline: Instant,
    kick: Arc<Notify>,
}

/// 新连接拿到的东西：自己的 id、发送队列的接收端、被踢时的通知
pub struct SessionHandle {
    pub id: SessionId,
    pub outbound: mpsc::Receiver<Message>,
    pub kick: Arc<Notify>,
}

/// 所有在线连接
///
/// 分发器负责改昵称、刷新期限、移除；清理任务只会移除已经断开的连接。
/// 每个方法都只短暂持有 DashMap 的分片锁；发送用 `try_send`，从不等待。
pub struct SessionDirectory {
    sessions: DashMap<SessionId, Session>,
    next_seq: AtomicU64,
    idle_timeout: Duration,
}

impl SessionDirectory {
    pub fn new(idle_timeout: Duration) -> SessionDirectory {
        SessionDirectory {
            sessions: DashMap::new(),
            next_seq: AtomicU64::new(0),
            idle_timeout,
        }
    }

    pub fn register(&self, addr: SocketAddr) -> SessionHandle {
        let id = SessionId::new_v4();
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let kick = Arc::new(Notify::new());
        self.sessions.insert(id, Session {
            addr,
            nickname: None,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            outbound: tx,
            deadline: Instant::now() + self.idle_timeout,
            kick: kick.clone(),
        });
        info!(%id, %addr, "session connected");
        SessionHandle { id, outbound: rx, kick }
    }

    pub fn set_nickname(&self, id: &SessionId, nickname: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) => {
                session.nickname = Some(nickname.to_string());
                info!(%id, addr = %session.addr, nickname, "nickname set");
                true
            }
            None => false,
        }
    }

    pub fn nickname(&self, id: &SessionId) -> Option<String> {
        self.sessions.get(id).and_then(|s| s.nickname.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// 刷新连接的存活期限
    pub fn touch(&self, id: &SessionId) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.deadline = Instant::now() + self.idle_timeout;
        }
    }

    pub fn deadline(&self, id: &SessionId) -> Option<Instant> {
        self.sessions.get(id).map(|s| s.deadline)
    }

    /// 移除连接，并通知它的读任务退出
    pub fn remove(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.kick.notify_one();
                info!(%id, addr = %session.addr, nickname = ?session.nickname, "session removed");
                true
            }
            None => false,
        }
    }

    /// 发给单个连接。发送队列满了就丢掉这一条，不会等待。
    pub fn send_to(&self, id: &SessionId, mut message: Message) {
        let Some((tx, nickname)) = self
            .sessions
            .get(id)
            .map(|s| (s.outbound.clone(), s.nickname.clone().unwrap_or_default()))
        else {
            return;
        };
        message.sender = nickname;
        push(id, &tx, message);
    }

    /// 发给所有已命名的连接，`exclude` 除外
    pub fn broadcast(&self, exclude: Option<SessionId>, message: Message) {
        let targets: Vec<(SessionId, mpsc::Sender<Message>, String)> = self
            .sessions
            .iter()
            .filter(|entry| Some(*entry.key()) != exclude)
            .filter_map(|entry| {
                let nickname = entry.nickname.clone()?;
                Some((*entry.key(), entry.outbound.clone(), nickname))
            })
            .collect();

        for (id, tx, nickname) in targets {
            let mut message = message.clone();
            message.sender = nickname;
            push(&id, &tx, message);
        }
    }

    /// 已命名连接的昵称，按连接先后排序
    fn named(&self) -> Vec<(SessionId, String)> {
        let mut named: Vec<(u64, SessionId, String)> = self
            .sessions
            .iter()
            .filter_map(|entry| Some((entry.seq, *entry.key(), entry.nickname.clone()?)))
            .collect();
        named.sort_by_key(|(seq, _, _)| *seq);
        named.into_iter().map(|(_, id, nickname)| (id, nickname)).collect()
    }

    /// 玩家列表，每个阶段显示的内容不同：
    /// 等待中显示谁准备好了，对局中标出地主和正在出牌的人（只列在座的玩家），结束后只列昵称。
    pub fn list_players(&self, game: &Match) -> Vec<String> {
        self.named()
            .into_iter()
            .filter_map(|(id, nickname)| match game.state {
                MatchState::Waiting => match game.player(&id) {
                    Some(player) if player.ready => Some(format!(" - {} (ready)", nickname)),
                    _ => Some(format!(" - {}", nickname)),
                },
                MatchState::Playing => {
                    let player = game.player(&id)?;
                    let marker = if game.is_current(&id) { ">" } else { "" };
                    let role = if game.landlord == Some(player.id) { " (landlord)" } else { "" };
                    Some(format!(" -{} {}{}", marker, nickname, role))
                }
                MatchState::Over => Some(nickname),
            })
            .collect()
    }

    pub fn room_info(&self, game: &Match) -> Message {
        let content = format!("{}_{}", game.state.label(), self.list_players(game).join("\n"));
        Message::new(MessageKind::RoomInfo, content)
    }

    /// 发送队列已经关闭的连接：`(id, 是否已命名)`
    pub fn dead_sessions(&self) -> Vec<(SessionId, bool)> {
        self.sessions
            .iter()
            .filter(|entry| entry.outbound.is_closed())
            .map(|entry| (*entry.key(), entry.nickname.is_some()))
            .collect()
    }
}

// 不读消息的客户端只会丢掉自己的消息，不能卡住分发器和对局循环
fn push(id: &SessionId, tx: &mpsc::Sender<Message>, message: Message) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(message)) => {
            warn!(%id, content = %message.content, "outbound queue full, message dropped");
        }
        Err(TrySendError::Closed(_)) => debug!(%id, "outbound channel closed"),
    }
}

/// 要投递的一条消息
///
/// 分发器和对局循环在持有牌桌锁时只生成 `Notice`，释放锁之后再统一投递。
#[derive(Debug, Clone)]
pub enum Notice {
    To(SessionId, Message),
    Broadcast { exclude: Option<SessionId>, message: Message },
    /// 投递时按当时的状态生成 `RoomInfo` 并广播
    RoomInfo,
    /// 移除连接并关闭它
    Close(SessionId),
}

impl Notice {
    pub fn all(message: Message) -> Notice {
        Notice::Broadcast { exclude: None, message }
    }

    pub fn others(id: SessionId, message: Message) -> Notice {
        Notice::Broadcast { exclude: Some(id), message }
    }
}

/// 定期清理已经断开的连接
///
/// 没命名的直接移除；已命名的可能还坐在牌桌上，交给分发器按退出处理。
pub async fn janitor(server: SharedState, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        for (id, named) in server.directory.dead_sessions() {
            if named {
                info!(%id, "reaping dead session");
                if server.intake.send(Command::quit(id)).await.is_err() {
                    return;
                }
            } else {
                server.directory.remove(&id);
            }
        }
    }
}

// --- 单元测试 ---
