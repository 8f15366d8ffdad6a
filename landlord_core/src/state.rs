use crate::card::Card;
use crate::deck::Deck;
use crate::hand::Hand;
use crate::player::Player;
use std::collections::HashMap;
use uuid::Uuid;

/// 座位（也就是连接）的唯一标识
pub type SeatId = Uuid;

/// 对局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// 等人准备
    Waiting,
    Playing,
    /// 已分出胜负或有人中途离开，等待重置
    Over,
}

impl MatchState {
    /// `RoomInfo` 消息里用的文字
    pub fn label(self) -> &'static str {
        match self {
            MatchState::Waiting => "waiting",
            MatchState::Playing => "playing",
            MatchState::Over => "over",
        }
    }
}

/// 一局斗地主的全部状态
///
/// 每张牌任何时候都只属于三处之一：牌堆剩余部分、某个玩家的手牌、弃牌堆，总数恒为 54。
#[derive(Debug, Clone)]
pub struct Match {
    pub state: MatchState,
    /// 开局需要的人数，整个进程内不变
    pub seat_count: usize,
    pub players: HashMap<SeatId, Player>,
    /// 入座顺序
    pub seating: Vec<SeatId>,
    pub deck: Deck,

    // --- 以下字段在发牌时确定 ---
    pub turn_order: Vec<SeatId>,
    pub landlord: Option<SeatId>,

    // --- 以下字段每一轮都会变化 ---
    pub current_player: Option<SeatId>,
    /// 当前需要压过的牌，空表示可以随便出
    pub last_played: Hand,
    pub last_played_by: Option<SeatId>,
    /// 已经打出去的牌
    pub discard: Vec<Card>,
}

impl Match {
    pub fn new(seat_count: usize) -> Match {
        Match {
            state: MatchState::Waiting,
            seat_count,
            players: HashMap::new(),
            seating: Vec::new(),
            deck: Deck::new(),
            turn_order: Vec::new(),
            landlord: None,
            current_player: None,
            last_played: Hand::empty(),
            last_played_by: None,
            discard: Vec::new(),
        }
    }

    pub fn ready_count(&self) -> usize {
        self.players.values().filter(|p| p.ready).count()
    }

    pub fn seated_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_seated(&self, id: &SeatId) -> bool {
        self.players.contains_key(id)
    }

    pub fn player(&self, id: &SeatId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &SeatId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// 正在行动的玩家
    pub fn current(&self) -> Option<&Player> {
        self.current_player.and_then(|id| self.players.get(&id))
    }

    pub fn is_current(&self, id: &SeatId) -> bool {
        self.current_player.as_ref() == Some(id)
    }

    /// 是否所有座位都已坐满并准备好
    pub fn all_ready(&self) -> bool {
        self.seating.len() == self.seat_count && self.ready_count() == self.seat_count
    }

    /// 牌堆、手牌、弃牌堆里的牌数之和
    pub fn card_total(&self) -> usize {
        self.deck.remaining()
            + self.players.values().map(|p| p.hand.len()).sum::<usize>()
            + self.discard.len()
    }

    /// 按入座顺序列出玩家
    pub fn seated_players(&self) -> impl Iterator<Item = &Player> {
        self.seating.iter().filter_map(|id| self.players.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_match_is_waiting_with_full_deck() {
        let game = Match::new(3);
        assert_eq!(game.state, MatchState::Waiting);
        assert_eq!(game.card_total(), 54);
        assert_eq!(game.seated_count(), 0);
        assert!(game.current().is_none());
        assert!(!game.all_ready());
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(MatchState::Waiting.label(), "waiting");
        assert_eq!(MatchState::Playing.label(), "playing");
        assert_eq!(MatchState::Over.label(), "over");
    }

    #[test]
    fn test_ready_count_ignores_unready_players() {
        let mut game = Match::new(2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut alice = Player::new(a, "alice");
        alice.ready = true;
        game.players.insert(a, alice);
        game.players.insert(b, Player::new(b, "bob"));
        game.seating = vec![a, b];

        assert_eq!(game.ready_count(), 1);
        assert_eq!(game.seated_count(), 2);
        assert!(!game.all_ready());
        let names: Vec<&str> = game.seated_players().map(|p| p.nickname.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }
}
