mod config;
mod directory;
mod dispatcher;
mod game_loop;
mod logging;
mod transport;
mod turn;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use landlord_core::{Command, Match};
use parking_lot::Mutex;
use pico_args::Arguments;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tracing::info;

use crate::config::{ServerConfig, HELP};
use crate::directory::{Notice, SessionDirectory};
use crate::turn::TurnSlot;

const JANITOR_PERIOD: Duration = Duration::from_secs(5);

// 牌桌：对局状态和本轮的出牌交接点放在同一把锁里
pub struct Table {
    pub game: Match,
    pub turn: TurnSlot,
}

// 服务器全局状态
// 重要‼️：锁的顺序固定为 table -> directory（DashMap 分片锁） -> rng，任何锁都不能跨 .await 持有
pub struct Server {
    pub config: ServerConfig,
    pub directory: SessionDirectory,
    pub table: Mutex<Table>,
    /// 所有连接共用的命令队列，深度为 1
    pub intake: mpsc::Sender<Command>,
    /// 有人入座或离开时通知对局循环
    pub seats_changed: Notify,
    pub rng: Mutex<StdRng>,
}

pub type SharedState = Arc<Server>;

impl Server {
    pub fn new(config: ServerConfig) -> (SharedState, mpsc::Receiver<Command>) {
        let (intake, commands) = mpsc::channel(1);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let server = Server {
            directory: SessionDirectory::new(config.idle_timeout),
            table: Mutex::new(Table { game: Match::new(config.seat_count), turn: TurnSlot::default() }),
            intake,
            seats_changed: Notify::new(),
            rng: Mutex::new(rng),
            config,
        };
        (Arc::new(server), commands)
    }

    /// 按顺序投递消息，不会等待。调用时不能持有牌桌锁。
    pub fn deliver(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::To(id, message) => self.directory.send_to(&id, message),
                Notice::Broadcast { exclude, message } => self.directory.broadcast(exclude, message),
                Notice::RoomInfo => {
                    let message = {
                        let table = self.table.lock();
                        self.directory.room_info(&table.game)
                    };
                    self.directory.broadcast(None, message);
                }
                Notice::Close(id) => {
                    self.directory.remove(&id);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let config = ServerConfig::from_args(pargs)?;
    info!(seats = config.seat_count, seed = ?config.seed, "starting landlord server");

    let (server, commands) = Server::new(config);
    tokio::spawn(dispatcher::run(server.clone(), commands));
    tokio::spawn(game_loop::run(server.clone()));
    tokio::spawn(directory::janitor(server.clone(), JANITOR_PERIOD));

    let tcp = TcpListener::bind(server.config.tcp_bind).await?;
    info!("line protocol listening on {}", server.config.tcp_bind);
    let ws = TcpListener::bind(server.config.ws_bind).await?;
    info!("websocket listening on ws://{}/ws", server.config.ws_bind);

    let app = transport::router(server.clone());
    tokio::select! {
        res = transport::serve_tcp(server.clone(), tcp) => res?,
        res = async { axum::serve(ws, app.into_make_service_with_connect_info::<SocketAddr>()).await } => res?,
    }
    Ok(())
}
