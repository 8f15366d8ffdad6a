//! 牌型判断、大小比较以及出牌推荐
//!
//! 这里的函数都是无状态的纯函数，输入的牌必须已经按 [`sort_for_play`](crate::sort_for_play)
//! 排好序（`Hand` 天然满足）。

use crate::card::{Card, Rank};
use crate::hand::Hand;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 牌型 (Shape)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Single,
    Pair,
    Triple,
    TripleWithOne,
    TripleWithTwo,
    /// 顺子：至少 5 张连续的单牌，不能带王
    Straight,
    /// 连对：至少 3 组连续的对子
    ConsecutivePairs,
    /// 飞机：两组连续的三张，可以带两张单牌或两对
    Airplane,
    /// 炸弹：四张相同，或者大小王
    Bomb,
    Invalid,
}

impl Shape {
    /// 推荐出牌时用的权重，炸弹最高
    pub fn weight(self) -> u32 {
        match self {
            Shape::Bomb => 1000,
            Shape::Airplane => 900,
            Shape::ConsecutivePairs => 800,
            Shape::Straight => 700,
            Shape::TripleWithTwo => 600,
            Shape::TripleWithOne => 500,
            Shape::Triple => 400,
            Shape::Pair => 300,
            Shape::Single => 200,
            Shape::Invalid => 0,
        }
    }

    pub fn is_valid(self) -> bool {
        self != Shape::Invalid
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Shape::Single => "single",
            Shape::Pair => "pair",
            Shape::Triple => "triple",
            Shape::TripleWithOne => "triple with one",
            Shape::TripleWithTwo => "triple with two",
            Shape::Straight => "straight",
            Shape::ConsecutivePairs => "consecutive pairs",
            Shape::Airplane => "airplane",
            Shape::Bomb => "bomb",
            Shape::Invalid => "invalid",
        })
    }
}

// --- 牌型判断 ---

/// 判断一手牌的牌型。空牌返回 `Invalid`。
///
/// 各个牌型按长度和结构互斥，判断顺序不影响结果。
pub fn classify(cards: &[Card]) -> Shape {
    if is_bomb(cards) {
        Shape::Bomb
    } else if cards.len() == 1 {
        Shape::Single
    } else if is_pair(cards) {
        Shape::Pair
    } else if is_triple(cards) {
        Shape::Triple
    } else if is_triple_with_one(cards) {
        Shape::TripleWithOne
    } else if is_triple_with_two(cards) {
        Shape::TripleWithTwo
    } else if is_straight(cards) {
        Shape::Straight
    } else if is_consecutive_pairs(cards) {
        Shape::ConsecutivePairs
    } else if is_airplane(cards) {
        Shape::Airplane
    } else {
        Shape::Invalid
    }
}

fn same_rank(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].rank == w[1].rank)
}

fn is_bomb(cards: &[Card]) -> bool {
    match cards.len() {
        4 => same_rank(cards),
        2 => cards[0].rank == Rank::SmallJoker && cards[1].rank == Rank::BigJoker,
        _ => false,
    }
}

fn is_pair(cards: &[Card]) -> bool {
    cards.len() == 2 && same_rank(cards)
}

fn is_triple(cards: &[Card]) -> bool {
    cards.len() == 3 && same_rank(cards)
}

fn is_triple_with_one(cards: &[Card]) -> bool {
    cards.len() == 4 && same_rank(&cards[..3]) && cards[3].rank != cards[0].rank
}

fn is_triple_with_two(cards: &[Card]) -> bool {
    cards.len() == 5
        && same_rank(&cards[..3])
        && is_pair(&cards[3..])
        && cards[3].rank != cards[0].rank
}

fn is_straight(cards: &[Card]) -> bool {
    cards.len() >= 5
        && cards.iter().all(|c| !c.rank.is_joker())
        && cards.windows(2).all(|w| w[0].rank.is_followed_by(w[1].rank))
}

fn is_consecutive_pairs(cards: &[Card]) -> bool {
    if cards.len() < 6 || cards.len() % 2 != 0 || cards.iter().any(|c| c.rank.is_joker()) {
        return false;
    }
    let pairs: Vec<&[Card]> = cards.chunks(2).collect();
    pairs.iter().all(|p| is_pair(p)) && pairs.windows(2).all(|w| w[0][0].rank.is_followed_by(w[1][0].rank))
}

fn is_airplane(cards: &[Card]) -> bool {
    if !matches!(cards.len(), 6 | 8 | 10) {
        return false;
    }
    if !is_triple(&cards[..3]) || !is_triple(&cards[3..6]) || !cards[0].rank.is_followed_by(cards[3].rank) {
        return false;
    }
    match cards.len() {
        10 => is_pair(&cards[6..8]) && is_pair(&cards[8..10]),
        _ => true,
    }
}

// --- 大小比较 ---

/// `hand` 能否压过 `last`
///
/// - 炸弹压任何非炸弹；两个炸弹比主牌点数。
/// - `last` 为空时，任何合法的非空牌都可以出。
/// - 其余情况必须牌型相同、张数相同，并且主牌更大。
pub fn compare(hand: &Hand, last: &Hand) -> bool {
    let shape = classify(hand);
    if !shape.is_valid() {
        return false;
    }
    if last.is_empty() {
        return true;
    }
    let last_shape = classify(last);
    if !last_shape.is_valid() {
        return false;
    }

    let higher = hand[0].rank > last[0].rank;
    match (shape, last_shape) {
        (Shape::Bomb, Shape::Bomb) => higher,
        (Shape::Bomb, _) => true,
        (_, Shape::Bomb) => false,
        _ => shape == last_shape && hand.len() == last.len() && higher,
    }
}

/// `owned` 里是否有 `requested` 要的所有牌（只看点数，每张牌只能用一次）
pub fn contains(owned: &[Card], requested: &[Card]) -> bool {
    if requested.len() > owned.len() {
        return false;
    }
    let mut used = vec![false; owned.len()];
    requested.iter().all(|want| {
        match (0..owned.len()).find(|&i| !used[i] && owned[i] == *want) {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// 推荐时的打分：牌型权重加主牌点数。只用于推荐，不影响出牌是否合法。
pub fn score(hand: &Hand) -> u32 {
    let shape = classify(hand);
    match hand.first() {
        Some(card) if shape.is_valid() => shape.weight() + u32::from(card.rank.ordinal()),
        _ => 0,
    }
}

// --- 出牌推荐 ---

/// 从手牌（点数从大到小排列）里找能压过 `last` 的最小的一手牌。
///
/// 只考虑手牌中连续的一段，长度等于 `last` 的张数（`last` 为空时为 1）。
/// 先在非炸弹里按分数选最小的；实在没有，再在同样长度的段里从最小的炸弹开始找。
/// 找不到时返回空牌。
pub fn recommend(owned: &[Card], last: &Hand) -> Hand {
    let width = last.len().max(1);

    let mut best: Option<(u32, Hand)> = None;
    for candidate in windows_weakest_first(owned, width) {
        if classify(&candidate) == Shape::Bomb || !compare(&candidate, last) {
            continue;
        }
        let candidate_score = score(&candidate);
        if best.as_ref().is_none_or(|(s, _)| candidate_score < *s) {
            best = Some((candidate_score, candidate));
        }
    }
    if let Some((_, hand)) = best {
        return hand;
    }

    windows_weakest_first(owned, width)
        .find(|candidate| classify(candidate) == Shape::Bomb && compare(candidate, last))
        .unwrap_or_default()
}

/// 从最小的一端开始，依次取出每一段长度为 `width` 的连续手牌
fn windows_weakest_first(owned: &[Card], width: usize) -> impl Iterator<Item = Hand> + '_ {
    let count = if width == 0 || owned.len() < width { 0 } else { owned.len() - width + 1 };
    (0..count).rev().map(move |start| Hand::new(owned[start..start + width].to_vec()))
}

// --- 单元测试 ---
