use crate::deck::{Deck, DECK_SIZE};
use crate::error::GameError;
use crate::hand::Hand;
use crate::player::{Player, Role};
use crate::state::*;
use rand::Rng;

/// 地主额外拿的牌数
pub const LANDLORD_BONUS: usize = 3;

// --- 入座与离座 ---

/// 玩家准备（第一次准备时入座）
///
/// 返回已准备的人数。
pub fn take_seat(state: &mut Match, id: SeatId, nickname: &str) -> Result<usize, GameError> {
    match state.state {
        MatchState::Waiting => {}
        MatchState::Playing => return Err(GameError::AlreadyInGame),
        MatchState::Over => return Err(GameError::MatchEnding),
    }

    match state.players.get_mut(&id) {
        Some(player) if player.ready => return Err(GameError::AlreadyReady),
        Some(player) => player.ready = true,
        None => {
            if state.seated_count() >= state.seat_count {
                return Err(GameError::TableFull);
            }
            let mut player = Player::new(id, nickname);
            player.ready = true;
            state.players.insert(id, player);
            state.seating.push(id);
        }
    }
    Ok(state.ready_count())
}

/// 玩家离开。对局进行中离开的话，手牌进弃牌堆，对局直接结束。
///
/// 返回离开的玩家；本来就不在座位上时返回 `None`。
pub fn leave_seat(state: &mut Match, id: &SeatId) -> Option<Player> {
    let mut player = state.players.remove(id)?;
    state.seating.retain(|seat| seat != id);
    state.discard.append(&mut player.hand);
    if state.state == MatchState::Playing {
        finish_match(state);
    }
    Some(player)
}

// --- 核心游戏流程函数 ---

/// 开始新的一局
///
/// 1. 换一副新牌并洗牌。
/// 2. 每人发 `(54 - 3) / 人数` 张。
/// 3. 随机选出地主，再发给地主 3 张。
/// 4. 出牌顺序就是入座顺序，从地主开始。
///
/// 返回地主的座位。
pub fn start_match<R: Rng>(state: &mut Match, rng: &mut R) -> Result<SeatId, GameError> {
    if state.seating.is_empty() {
        return Err(GameError::NotInGame);
    }

    let mut deck = Deck::new();
    deck.shuffle(rng);
    state.deck = deck;
    state.discard.clear();

    let per_seat = (DECK_SIZE - LANDLORD_BONUS) / state.seating.len();
    for id in &state.seating {
        if let Some(player) = state.players.get_mut(id) {
            player.hand.clear();
            player.role = Role::Farmer;
            player.deal(&mut state.deck, per_seat)?;
        }
    }

    let landlord = state.seating[rng.random_range(0..state.seating.len())];
    if let Some(player) = state.players.get_mut(&landlord) {
        player.role = Role::Landlord;
        player.deal(&mut state.deck, LANDLORD_BONUS)?;
    }

    state.turn_order = state.seating.clone();
    state.landlord = Some(landlord);
    state.current_player = Some(landlord);
    state.last_played = Hand::empty();
    state.last_played_by = None;
    state.state = MatchState::Playing;
    Ok(landlord)
}

/// 一轮开始：如果出牌权回到了最后出牌的人手里，就清空需要压的牌。
///
/// 返回当前玩家和需要压过的牌。
pub fn begin_turn(state: &mut Match) -> Option<(SeatId, Hand)> {
    let current = state.current_player?;
    if state.last_played_by == Some(current) {
        state.last_played = Hand::empty();
        state.last_played_by = None;
    }
    Some((current, state.last_played.clone()))
}

/// 记录打出的牌，它成为新的需要压过的牌
pub fn play_cards(state: &mut Match, id: SeatId, played: &Hand) {
    state.discard.extend_from_slice(played);
    state.last_played = played.clone();
    state.last_played_by = Some(id);
}

/// 检查当前玩家能不能“过”。需要压的牌为空时必须出牌。
pub fn check_pass(state: &Match) -> Result<(), GameError> {
    if state.last_played.is_empty() {
        return Err(GameError::CannotPass);
    }
    Ok(())
}

/// 出牌权按座位顺序交给下一个人
pub fn advance_turn(state: &mut Match) {
    let Some(current) = state.current_player else {
        return;
    };
    if let Some(idx) = state.turn_order.iter().position(|id| *id == current) {
        let next = (idx + 1) % state.turn_order.len();
        state.current_player = Some(state.turn_order[next]);
    }
}

/// 当前玩家出完了牌就是赢家
pub fn winner(state: &Match) -> Option<&Player> {
    state.current().filter(|p| p.hand.is_empty())
}

pub fn finish_match(state: &mut Match) {
    state.state = MatchState::Over;
    state.current_player = None;
}

/// 为下一局准备新的 `Match`：人数和在座的玩家保留，大家都回到未准备状态。
pub fn next_match(state: &Match) -> Match {
    let mut fresh = Match::new(state.seat_count);
    for player in state.seated_players() {
        let mut player = Player::new(player.id, player.nickname.clone());
        player.ready = false;
        fresh.seating.push(player.id);
        fresh.players.insert(player.id, player);
    }
    fresh
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, Rank};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use uuid::Uuid;

    fn seated(n: usize) -> (Match, Vec<SeatId>) {
        let mut game = Match::new(n);
        let ids: Vec<SeatId> = (0..n).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            take_seat(&mut game, *id, &format!("p{}", i)).unwrap();
        }
        (game, ids)
    }

    fn started(n: usize, seed: u64) -> (Match, Vec<SeatId>, SeatId) {
        let (mut game, ids) = seated(n);
        let landlord = start_match(&mut game, &mut StdRng::seed_from_u64(seed)).unwrap();
        (game, ids, landlord)
    }

    #[test]
    fn test_take_seat_counts_and_rejects() {
        let mut game = Match::new(2);
        let a = Uuid::new_v4();
        assert_eq!(take_seat(&mut game, a, "a"), Ok(1));
        assert_eq!(take_seat(&mut game, a, "a"), Err(GameError::AlreadyReady));
        assert_eq!(take_seat(&mut game, Uuid::new_v4(), "b"), Ok(2));
        assert!(game.all_ready());
        assert_eq!(take_seat(&mut game, Uuid::new_v4(), "c"), Err(GameError::TableFull));

        game.state = MatchState::Playing;
        assert_eq!(take_seat(&mut game, a, "a"), Err(GameError::AlreadyInGame));
        game.state = MatchState::Over;
        assert_eq!(take_seat(&mut game, a, "a"), Err(GameError::MatchEnding));
    }

    #[test]
    fn test_three_player_deal() {
        let (game, ids, landlord) = started(3, 7);
        assert_eq!(game.state, MatchState::Playing);
        assert_eq!(game.current_player, Some(landlord));
        assert_eq!(game.turn_order, ids);
        for id in &ids {
            let player = game.player(id).unwrap();
            if *id == landlord {
                assert_eq!(player.hand.len(), 20);
                assert_eq!(player.role, Role::Landlord);
            } else {
                assert_eq!(player.hand.len(), 17);
                assert_eq!(player.role, Role::Farmer);
            }
        }
        assert_eq!(game.deck.remaining(), 0);
        assert_eq!(game.card_total(), 54);
    }

    #[test]
    fn test_deal_is_reproducible_with_seed() {
        let (a, _, _) = started(3, 42);
        let (b, _, _) = started(3, 42);
        let hands = |g: &Match| -> Vec<Vec<Card>> { g.seated_players().map(|p| p.hand.clone()).collect() };
        let (ha, hb) = (hands(&a), hands(&b));
        assert_eq!(ha.len(), hb.len());
        for (x, y) in ha.iter().zip(&hb) {
            assert!(x.iter().zip(y).all(|(c, d)| c.same_face(d)));
        }
    }

    #[test]
    fn test_four_players_leave_cards_in_deck() {
        let (game, _, _) = started(4, 1);
        assert_eq!(game.deck.remaining(), 54 - 4 * 12 - 3);
        assert_eq!(game.card_total(), 54);
    }

    #[test]
    fn test_turns_rotate_from_landlord() {
        let (mut game, ids, landlord) = started(3, 3);
        let start = ids.iter().position(|id| *id == landlord).unwrap();
        for step in 1..=4 {
            advance_turn(&mut game);
            assert_eq!(game.current_player, Some(ids[(start + step) % 3]));
        }
    }

    #[test]
    fn test_free_play_resets_when_play_returns() {
        let (mut game, _, landlord) = started(3, 5);
        let (current, to_beat) = begin_turn(&mut game).unwrap();
        assert_eq!(current, landlord);
        assert!(to_beat.is_empty());
        assert_eq!(check_pass(&game), Err(GameError::CannotPass));

        let lowest = *game.player(&landlord).unwrap().hand.last().unwrap();
        let played = game
            .player_mut(&landlord)
            .unwrap()
            .use_cards(vec![Card::blank(lowest.rank)], &to_beat)
            .unwrap();
        play_cards(&mut game, landlord, &played);
        assert_eq!(game.card_total(), 54);

        // 另外两人都过
        for _ in 0..2 {
            advance_turn(&mut game);
            let (_, to_beat) = begin_turn(&mut game).unwrap();
            assert_eq!(to_beat, played);
            assert!(check_pass(&game).is_ok());
        }
        advance_turn(&mut game);
        let (current, to_beat) = begin_turn(&mut game).unwrap();
        assert_eq!(current, landlord);
        assert!(to_beat.is_empty());
    }

    #[test]
    fn test_winner_is_current_player_with_empty_hand() {
        let (mut game, _, landlord) = started(3, 9);
        assert!(winner(&game).is_none());
        game.player_mut(&landlord).unwrap().hand.clear();
        assert_eq!(winner(&game).map(|p| p.id), Some(landlord));
    }

    #[test]
    fn test_leave_mid_match_ends_it_and_keeps_card_total() {
        let (mut game, ids, _) = started(3, 11);
        let gone = leave_seat(&mut game, &ids[1]).unwrap();
        assert!(gone.hand.is_empty());
        assert_eq!(game.state, MatchState::Over);
        assert_eq!(game.seated_count(), 2);
        assert_eq!(game.card_total(), 54);
        assert!(leave_seat(&mut game, &ids[1]).is_none());
    }

    #[test]
    fn test_next_match_keeps_roster_unready() {
        let (mut game, ids, _) = started(3, 13);
        play_cards(&mut game, ids[0], &Hand::new(vec![Card::blank(Rank::Three)]));
        finish_match(&mut game);

        let fresh = next_match(&game);
        assert_eq!(fresh.state, MatchState::Waiting);
        assert_eq!(fresh.seat_count, 3);
        assert_eq!(fresh.seating, ids);
        assert_eq!(fresh.ready_count(), 0);
        assert!(fresh.seated_players().all(|p| p.hand.is_empty() && p.role == Role::Farmer));
        assert!(fresh.last_played.is_empty());
        assert_eq!(fresh.card_total(), 54);
    }

    #[test]
    fn test_start_without_players_fails() {
        let mut game = Match::new(3);
        assert!(start_match(&mut game, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
