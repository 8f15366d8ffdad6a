use landlord_core::logic::{check_pass, leave_seat, play_cards, take_seat};
use landlord_core::{
    parse_cards, Command, CommandId, GameError, Hand, Message, MessageKind, MatchState, HELP,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::directory::{Notice, SessionId};
use crate::{Server, SharedState, Table};

type Handler = fn(&Server, &mut Table, &Command) -> Result<Vec<Notice>, GameError>;

/// 命令执行前要满足的条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precondition {
    /// 对局进行中，并且发送者在座
    InGame,
    /// 轮到发送者，并且对局循环正在等他
    OwnTurn,
}

struct Route {
    preconditions: &'static [Precondition],
    handler: Handler,
}

fn route(id: CommandId) -> Route {
    use Precondition::*;
    match id {
        CommandId::ListCommands => Route { preconditions: &[], handler: list_commands },
        CommandId::ListPlayers => Route { preconditions: &[], handler: list_players },
        CommandId::Quit => Route { preconditions: &[], handler: quit },
        CommandId::Ready => Route { preconditions: &[], handler: ready },
        CommandId::ViewCards => Route { preconditions: &[InGame], handler: view_cards },
        CommandId::UseCards => Route { preconditions: &[InGame, OwnTurn], handler: use_cards },
        CommandId::Pass => Route { preconditions: &[InGame, OwnTurn], handler: pass },
        CommandId::EmptyLine => Route { preconditions: &[], handler: |_, _, _| Ok(Vec::new()) },
        CommandId::Chat => Route { preconditions: &[], handler: chat },
        CommandId::Unknown => Route { preconditions: &[], handler: unknown },
    }
}

fn check(precondition: Precondition, table: &Table, sender: &SessionId) -> Result<(), GameError> {
    let ok = match precondition {
        Precondition::InGame => table.game.state == MatchState::Playing && table.game.is_seated(sender),
        Precondition::OwnTurn => table.game.is_current(sender) && table.turn.is_armed(),
    };
    if ok {
        Ok(())
    } else {
        Err(match precondition {
            Precondition::InGame => GameError::NotInGame,
            Precondition::OwnTurn => GameError::NotYourTurn,
        })
    }
}

/// 命令队列的唯一消费者，一次只处理一条命令
pub async fn run(server: SharedState, mut commands: mpsc::Receiver<Command>) {
    while let Some(command) = commands.recv().await {
        dispatch(&server, command).await;
    }
}

/// 处理一条命令。被拒绝的命令只会给发送者回一条 `Error`；致命错误广播给所有人。
pub async fn dispatch(server: &Server, command: Command) {
    server.directory.touch(&command.sender);
    debug!(sender = %command.sender, id = ?command.id, args = ?command.args, "command");

    let route = route(command.id);
    let result = {
        let mut table = server.table.lock();
        route
            .preconditions
            .iter()
            .try_for_each(|p| check(*p, &table, &command.sender))
            .and_then(|()| (route.handler)(server, &mut table, &command))
    };

    let notices = match result {
        Ok(notices) => notices,
        Err(err) if err.is_fatal() => vec![Notice::all(Message::error(err.to_string()))],
        Err(err) => vec![Notice::To(command.sender, Message::error(err.to_string()))],
    };
    server.deliver(notices);
}

fn nickname(server: &Server, id: &SessionId) -> String {
    server.directory.nickname(id).unwrap_or_default()
}

// --- 各命令的处理函数 ---

fn list_commands(_: &Server, _: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    Ok(vec![Notice::To(command.sender, Message::text(HELP))])
}

fn list_players(server: &Server, table: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let lines = server.directory.list_players(&table.game);
    let content = format!("online players:\n{}", lines.join("\n"));
    Ok(vec![Notice::To(command.sender, Message::text(content))])
}

fn chat(server: &Server, _: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let text = command.args.join(" ");
    let content = format!("{}: {}", nickname(server, &command.sender), text);
    Ok(vec![Notice::others(command.sender, Message::new(MessageKind::Chat, content))])
}

fn unknown(_: &Server, _: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let word = command.args.first().cloned().unwrap_or_default();
    Err(GameError::UnknownCommand(word))
}

fn ready(server: &Server, table: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let sender = command.sender;
    let name = nickname(server, &sender);
    let ready_count = take_seat(&mut table.game, sender, &name)?;
    let seats = table.game.seat_count;

    let mut notices = vec![
        Notice::To(sender, Message::text(format!("> you are ready for the game. {}/{}", ready_count, seats))),
        Notice::others(sender, Message::text(format!("> {} is ready. {}/{}", name, ready_count, seats))),
        Notice::RoomInfo,
    ];
    if table.game.all_ready() {
        notices.push(Notice::all(Message::text("> all players are ready. game will start soon...")));
    }
    server.seats_changed.notify_one();
    info!(nickname = %name, ready_count, seats, "player ready");
    Ok(notices)
}

fn view_cards(_: &Server, table: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let notice = status_notice(table, command.sender).ok_or(GameError::NotInGame)?;
    Ok(vec![notice])
}

fn use_cards(server: &Server, table: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let sender = command.sender;
    let cards = parse_cards(command.args.as_slice())?;
    let last = table.game.last_played.clone();

    let player = table.game.player_mut(&sender).ok_or(GameError::NotInGame)?;
    let played = player.use_cards(cards, &last)?;
    let remaining = player.hand.len();
    let status = player.status(&played);

    play_cards(&mut table.game, sender, &played);
    table.turn.resolve(played.clone());

    let name = nickname(server, &sender);
    debug!(nickname = %name, cards = %played, remaining, "played");
    Ok(vec![
        Notice::To(sender, Message::text(format!("> you used the cards: {}", played))),
        Notice::To(sender, Message::new(MessageKind::PlayerStatus, status)),
        Notice::others(sender, Message::text(format!("> {} used the cards: {} ({} remaining)", name, played, remaining))),
    ])
}

fn pass(server: &Server, table: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let sender = command.sender;
    check_pass(&table.game)?;
    table.turn.resolve(Hand::empty());

    let name = nickname(server, &sender);
    debug!(nickname = %name, "passed");
    Ok(vec![
        Notice::To(sender, Message::text("> you passed your turn")),
        Notice::others(sender, Message::text(format!("> {} passed their turn", name))),
    ])
}

/// 退出：先告别，再关连接，最后更新房间信息。重复退出不会有任何效果。
fn quit(server: &Server, table: &mut Table, command: &Command) -> Result<Vec<Notice>, GameError> {
    let sender = command.sender;
    if !server.directory.contains(&sender) && !table.game.is_seated(&sender) {
        return Ok(Vec::new());
    }

    let name = nickname(server, &sender);
    let was_playing = table.game.state == MatchState::Playing;
    let mut notices = vec![
        Notice::To(sender, Message::stop("> see you next time")),
        Notice::Close(sender),
    ];
    match leave_seat(&mut table.game, &sender) {
        Some(_) if was_playing => {
            table.turn.cancel();
            info!(nickname = %name, "player left mid-game, game ends");
            notices.push(Notice::others(sender, Message::text(format!("> {} left the room, game ends", name))));
        }
        _ => {
            notices.push(Notice::others(sender, Message::text(format!("> {} left the room", name))));
        }
    }
    notices.push(Notice::RoomInfo);
    server.seats_changed.notify_one();
    Ok(notices)
}

/// 某个玩家的身份和手牌
pub fn status_notice(table: &Table, id: SessionId) -> Option<Notice> {
    let player = table.game.player(&id)?;
    let status = player.status(&table.game.last_played);
    Some(Notice::To(id, Message::new(MessageKind::PlayerStatus, status)))
}

// --- 单元测试 ---
