use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::GameError;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 花色只用于显示，比较和匹配都只看点数。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade,   // 黑桃 ♠
    Club,    // 梅花 ♣
    Heart,   // 红心 ♥
    Diamond, // 方块 ♦
    /// 无花色：大小王，以及玩家请求中还没有和实牌对上的牌
    Blank,
}

/// 点数 (Rank)
/// 变体顺序就是斗地主的大小顺序：3 最小，2 比 A 大，大王最大。
/// Ord 的派生让比较直接可用。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
    SmallJoker,
    BigJoker,
}

/// 单张牌 (Card)
///
/// 相等、排序和哈希都只看点数。玩家出牌时只报点数，
/// 花色在从手牌里扣除时才补上。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

pub const SUITS: [Suit; 4] = [Suit::Spade, Suit::Club, Suit::Heart, Suit::Diamond];

/// 四种花色都有的 13 个点数
pub const NATURAL_RANKS: [Rank; 13] = [
    Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine,
    Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace, Rank::Two,
];

impl Rank {
    pub fn is_joker(self) -> bool {
        matches!(self, Rank::SmallJoker | Rank::BigJoker)
    }

    /// 在大小顺序里的位置，3 是 0
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// `next` 是否紧跟在 `self` 之后
    pub fn is_followed_by(self, next: Rank) -> bool {
        next.ordinal() == self.ordinal() + 1
    }

    /// 把 `/use` 的参数解析成点数。
    /// 普通点数不区分大小写；`joker` 是小王，`JOKER` 是大王，其它写法都不认。
    pub fn from_token(token: &str) -> Option<Rank> {
        match token {
            "joker" => return Some(Rank::SmallJoker),
            "JOKER" => return Some(Rank::BigJoker),
            _ => {}
        }
        let rank = match token.to_ascii_uppercase().as_str() {
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            "2" => Rank::Two,
            _ => return None,
        };
        Some(rank)
    }
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// 只有点数、还没有花色的牌
    pub fn blank(rank: Rank) -> Card {
        Card { rank, suit: Suit::Blank }
    }

    /// 点数和花色都相同，即同一张实体牌
    pub fn same_face(&self, other: &Card) -> bool {
        self.rank == other.rank && self.suit == other.suit
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank)
    }
}

/// 解析 `/use` 后面的所有参数。
///
/// 不认识的参数会全部收集起来一起报错；一张牌都没有也算错误。
pub fn parse_cards<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Card>, GameError> {
    let mut cards = Vec::with_capacity(tokens.len());
    let mut invalid = Vec::new();
    for token in tokens {
        match Rank::from_token(token.as_ref()) {
            Some(rank) => cards.push(Card::blank(rank)),
            None => invalid.push(token.as_ref().to_string()),
        }
    }
    if !invalid.is_empty() {
        return Err(GameError::InvalidCards(invalid));
    }
    if cards.is_empty() {
        return Err(GameError::NoCardsSelected);
    }
    Ok(cards)
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Spade => "♠",
            Suit::Club => "♣",
            Suit::Heart => "♥",
            Suit::Diamond => "♦",
            Suit::Blank => "",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::SmallJoker => "joker",
            Rank::BigJoker => "JOKER",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit, self.rank)
    }
}

// --- 单元测试 ---
