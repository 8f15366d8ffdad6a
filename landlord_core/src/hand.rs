use crate::card::Card;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// 一手牌 (Hand)
///
/// 构造时总是经过 [`sort_for_play`]，所以任何 `Hand` 都可以直接拿去判断牌型和比较大小。
/// 空的 `Hand` 表示“过”，或者当前没有需要压的牌。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand(Vec<Card>);

impl Hand {
    pub fn new(mut cards: Vec<Card>) -> Hand {
        sort_for_play(&mut cards);
        Hand(cards)
    }

    pub fn empty() -> Hand {
        Hand(Vec::new())
    }

    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    /// 只允许改花色，点数顺序不能动
    pub(crate) fn fill_suits(&mut self, owned: &[Card]) {
        for (card, real) in self.0.iter_mut().zip(owned) {
            debug_assert_eq!(card.rank, real.rank);
            card.suit = real.suit;
        }
    }
}

impl Deref for Hand {
    type Target = [Card];

    fn deref(&self) -> &[Card] {
        &self.0
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Hand::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cards: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", cards.join(" "))
    }
}

/// 出牌用的排序
///
/// 1. 先按点数从小到大排。
/// 2. 对 4、5 张以及 6、8、10 张的牌，把第一组三张相同的牌转到最前面；
///    6、8、10 张时再把第二组三张转到第 3~5 位。
///
/// 这样主牌（比较大小时用的点数）永远在第 0 位。
pub fn sort_for_play(cards: &mut [Card]) {
    cards.sort_by_key(|c| c.rank);
    match cards.len() {
        4 | 5 => {
            bring_triple_forward(cards, 0);
        }
        6 | 8 | 10 => {
            bring_triple_forward(cards, 0);
            bring_triple_forward(cards, 3);
        }
        _ => {}
    }
}

/// 在 `cards[start..]` 里找第一组三张相同的牌，转到 `start` 位置
fn bring_triple_forward(cards: &mut [Card], start: usize) {
    if cards.len() < start + 3 {
        return;
    }
    let found = (start..cards.len() - 2)
        .find(|&i| cards[i].rank == cards[i + 1].rank && cards[i].rank == cards[i + 2].rank);
    if let Some(i) = found {
        cards[start..i + 3].rotate_right(3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Rank::*, Suit::*};

    fn ranks(cards: &[Card]) -> Vec<Rank> {
        cards.iter().map(|c| c.rank).collect()
    }

    fn blanks(ranks: &[Rank]) -> Vec<Card> {
        ranks.iter().map(|&r| Card::blank(r)).collect()
    }

    #[test]
    fn test_plain_sort_is_ascending() {
        let hand = Hand::new(blanks(&[King, Three, Two, Ten]));
        assert_eq!(ranks(&hand), vec![Three, Ten, King, Two]);
    }

    #[test]
    fn test_triple_with_one_puts_triple_first() {
        let hand = Hand::new(blanks(&[Five, Three, Five, Five]));
        assert_eq!(ranks(&hand), vec![Five, Five, Five, Three]);
    }

    #[test]
    fn test_triple_with_two_keeps_pair_after_triple() {
        let hand = Hand::new(blanks(&[Three, Four, Three, Four, Four]));
        assert_eq!(ranks(&hand), vec![Four, Four, Four, Three, Three]);
    }

    #[test]
    fn test_airplane_with_singles_reorders_both_triples() {
        let hand = Hand::new(blanks(&[Three, Four, Four, Four, Five, Five, Five, Six]));
        assert_eq!(ranks(&hand), vec![Four, Four, Four, Five, Five, Five, Three, Six]);
    }

    #[test]
    fn test_airplane_with_pairs_reorders_both_triples() {
        let hand = Hand::new(blanks(&[Three, Three, Four, Four, Four, Five, Five, Five, Six, Six]));
        assert_eq!(
            ranks(&hand),
            vec![Four, Four, Four, Five, Five, Five, Three, Three, Six, Six]
        );
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let mut cards = blanks(&[Three, Four, Four, Four, Five, Five, Five, Six]);
        sort_for_play(&mut cards);
        let once = ranks(&cards);
        sort_for_play(&mut cards);
        assert_eq!(ranks(&cards), once);
    }

    #[test]
    fn test_display_joins_with_spaces() {
        let hand = Hand::new(vec![Card::new(Three, Spade), Card::new(Three, Heart)]);
        assert_eq!(hand.to_string(), "[♠3 ♥3]");
        assert_eq!(Hand::empty().to_string(), "[]");
    }
}
