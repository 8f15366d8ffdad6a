use crate::card::{Card, Rank, Suit, NATURAL_RANKS, SUITS};
use crate::error::GameError;
use rand::Rng;
use rand::seq::SliceRandom;

pub const DECK_SIZE: usize = 54;

/// 一副 54 张的牌
///
/// `cards[..remaining]` 是还没发出去的部分，发牌从 `remaining - 1` 往下取。
#[derive(Debug, Clone)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    remaining: usize,
}

impl Deck {
    /// 按固定顺序生成整副牌：四种花色各 13 张，最后是小王和大王
    pub fn new() -> Deck {
        let mut cards = [Card::blank(Rank::Three); DECK_SIZE];
        for (s, &suit) in SUITS.iter().enumerate() {
            for (r, &rank) in NATURAL_RANKS.iter().enumerate() {
                cards[s * NATURAL_RANKS.len() + r] = Card::new(rank, suit);
            }
        }
        cards[DECK_SIZE - 2] = Card::new(Rank::SmallJoker, Suit::Blank);
        cards[DECK_SIZE - 1] = Card::new(Rank::BigJoker, Suit::Blank);
        Deck { cards, remaining: DECK_SIZE }
    }

    /// 洗还没发出去的牌（Fisher–Yates）
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards[..self.remaining].shuffle(rng);
    }

    /// 从牌堆顶取 `n` 张。牌不够时返回 `InsufficientCards`，这会终止当前对局。
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > self.remaining {
            return Err(GameError::InsufficientCards { requested: n, remaining: self.remaining });
        }
        let start = self.remaining - n;
        let dealt = self.cards[start..self.remaining].iter().rev().copied().collect();
        self.remaining = start;
        Ok(dealt)
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn remaining_cards(&self) -> &[Card] {
        &self.cards[..self.remaining]
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_deck_has_54_distinct_faces() {
        let deck = Deck::new();
        let cards = deck.remaining_cards();
        assert_eq!(cards.len(), DECK_SIZE);
        for (i, a) in cards.iter().enumerate() {
            for b in &cards[i + 1..] {
                assert!(!a.same_face(b), "duplicate card {a}");
            }
        }
        assert_eq!(cards.iter().filter(|c| c.rank.is_joker()).count(), 2);
        assert_eq!(cards.iter().filter(|c| c.rank == Rank::Ace).count(), 4);
    }

    #[test]
    fn test_deal_takes_from_top() {
        let mut deck = Deck::new();
        let dealt = deck.deal(2).unwrap();
        assert_eq!(dealt[0].rank, Rank::BigJoker);
        assert_eq!(dealt[1].rank, Rank::SmallJoker);
        assert_eq!(deck.remaining(), DECK_SIZE - 2);
    }

    #[test]
    fn test_deal_decreases_remaining_by_n() {
        let mut deck = Deck::new();
        deck.shuffle(&mut StdRng::seed_from_u64(7));
        let mut dealt = 0;
        for n in [17, 17, 17, 3] {
            let before = deck.remaining();
            dealt += deck.deal(n).unwrap().len();
            assert_eq!(deck.remaining(), before - n);
            assert_eq!(deck.remaining() + dealt, DECK_SIZE);
        }
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn test_deal_too_many_fails() {
        let mut deck = Deck::new();
        deck.deal(50).unwrap();
        assert_eq!(
            deck.deal(5).unwrap_err(),
            GameError::InsufficientCards { requested: 5, remaining: 4 }
        );
        assert_eq!(deck.remaining(), 4);
    }

    #[test]
    fn test_shuffle_keeps_every_card() {
        let mut deck = Deck::new();
        deck.shuffle(&mut StdRng::seed_from_u64(42));
        let fresh = Deck::new();
        for card in fresh.remaining_cards() {
            assert!(deck.remaining_cards().iter().any(|c| c.same_face(card)));
        }
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut a = Deck::new();
        let mut b = Deck::new();
        a.shuffle(&mut StdRng::seed_from_u64(9));
        b.shuffle(&mut StdRng::seed_from_u64(9));
        assert!(a.remaining_cards().iter().zip(b.remaining_cards()).all(|(x, y)| x.same_face(y)));
    }
}
