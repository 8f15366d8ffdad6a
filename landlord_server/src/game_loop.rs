use landlord_core::logic::{advance_turn, begin_turn, finish_match, next_match, start_match, winner};
use landlord_core::{Hand, MatchState, Message, MessageKind, Role};
use tracing::{debug, info, warn};

use crate::directory::{Notice, SessionId};
use crate::dispatcher::status_notice;
use crate::turn::TurnSlot;
use crate::{Server, SharedState, Table};

/// 对局循环：等人坐满、发牌、一轮一轮等出牌，结束后重置
pub async fn run(server: SharedState) {
    loop {
        wait_for_full_table(&server).await;
        tokio::time::sleep(server.config.pace).await;
        if play_match(&server).await {
            close_match(&server).await;
        }
    }
}

async fn wait_for_full_table(server: &Server) {
    loop {
        {
            let table = server.table.lock();
            if table.game.state == MatchState::Waiting && table.game.all_ready() {
                return;
            }
        }
        server.seats_changed.notified().await;
    }
}

/// 所有座位都还有人时对局才继续
fn still_running(table: &Table) -> bool {
    table.game.state == MatchState::Playing && table.game.seated_count() == table.game.seat_count
}

/// 打一整局。没能开局（倒计时期间有人离开）时返回 `false`。
async fn play_match(server: &Server) -> bool {
    let notices = {
        let mut table = server.table.lock();
        if table.game.state != MatchState::Waiting || !table.game.all_ready() {
            return false;
        }
        let dealt = start_match(&mut table.game, &mut *server.rng.lock());
        match dealt {
            Ok(landlord) => deal_notices(server, &table, landlord),
            Err(err) => {
                warn!(%err, "failed to start game");
                finish_match(&mut table.game);
                vec![Notice::all(Message::error(err.to_string()))]
            }
        }
    };
    server.deliver(notices);

    loop {
        let (rx, notices) = {
            let mut table = server.table.lock();
            if !still_running(&table) {
                info!("game aborted");
                return true;
            }
            let Some((current, to_beat)) = begin_turn(&mut table.game) else {
                finish_match(&mut table.game);
                return true;
            };
            let rx = table.turn.arm();
            (rx, turn_notices(server, &table, current, &to_beat))
        };
        server.deliver(notices);

        // 发送端被丢掉只会发生在对局被重置时，按“过”处理
        let played = rx.await.unwrap_or_default();

        let finished = {
            let mut table = server.table.lock();
            if table.game.state != MatchState::Playing {
                info!("game aborted");
                return true;
            }
            debug!(cards = %played, "turn finished");
            if let Some(champion) = winner(&table.game) {
                let name = server.directory.nickname(&champion.id).unwrap_or_else(|| champion.nickname.clone());
                let side = match champion.role {
                    Role::Landlord => "> the landlord wins",
                    Role::Farmer => "> the farmers win",
                };
                info!(winner = %name, role = %champion.role, "game over");
                let notices = vec![
                    Notice::all(Message::text(format!("> {} won the game", name))),
                    Notice::all(Message::text(side)),
                ];
                finish_match(&mut table.game);
                Some(notices)
            } else {
                advance_turn(&mut table.game);
                None
            }
        };
        if let Some(notices) = finished {
            server.deliver(notices);
            return true;
        }
    }
}

fn deal_notices(server: &Server, table: &Table, landlord: SessionId) -> Vec<Notice> {
    let name = server.directory.nickname(&landlord).unwrap_or_default();
    info!(landlord = %name, seats = table.game.seat_count, "game started");

    let mut notices = vec![
        Notice::To(landlord, Message::text("> you are the landlord")),
        Notice::others(landlord, Message::text(format!("> {} is the landlord", name))),
        Notice::RoomInfo,
    ];
    notices.extend(table.game.seating.iter().filter_map(|id| status_notice(table, *id)));
    notices
}

fn turn_notices(server: &Server, table: &Table, current: SessionId, to_beat: &Hand) -> Vec<Notice> {
    let mut notices = vec![
        Notice::RoomInfo,
        Notice::To(current, Message::info("> it's your turn")),
    ];

    if to_beat.is_empty() {
        notices.push(Notice::To(current, Message::info("  you can play any cards")));
    } else {
        let from = table
            .game
            .last_played_by
            .and_then(|id| server.directory.nickname(&id))
            .unwrap_or_default();
        notices.push(Notice::To(current, Message::info(format!("  you have to beat {} from {}", to_beat, from))));
    }
    notices.extend(status_notice(table, current));

    let advice = table.game.player(&current).map(|p| p.recommend(to_beat)).unwrap_or_default();
    let hint = if advice.is_empty() {
        "> you can't beat the last player".to_string()
    } else {
        format!("> recommend: {}", advice)
    };
    notices.push(Notice::To(current, Message::info(hint)));

    let name = server.directory.nickname(&current).unwrap_or_default();
    notices.push(Notice::others(current, Message::new(MessageKind::Info, format!("> waiting for {}'s action...", name))));
    notices
}

/// 一局结束后等一会儿，再换成新的一局
async fn close_match(server: &Server) {
    tokio::time::sleep(server.config.pace).await;
    {
        let mut table = server.table.lock();
        table.game = next_match(&table.game);
        table.turn = TurnSlot::default();
    }
    server.deliver(vec![
        Notice::all(Message::text("> type /ready to start a new game or /quit to quit")),
        Notice::RoomInfo,
    ]);
}

// --- 单元测试 ---
