use crate::card::Card;
use crate::deck::Deck;
use crate::error::GameError;
use crate::hand::Hand;
use crate::rules::{classify, compare, contains, recommend};
use crate::state::SeatId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 身份：地主或农民
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Landlord,
    Farmer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Role::Landlord => "landlord",
            Role::Farmer => "farmer",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: SeatId,
    pub nickname: String,
    /// 手牌，始终按点数从大到小排列
    pub hand: Vec<Card>,
    pub role: Role,
    pub ready: bool,
}

impl Player {
    pub fn new(id: SeatId, nickname: impl Into<String>) -> Player {
        Player {
            id,
            nickname: nickname.into(),
            hand: Vec::new(),
            role: Role::Farmer,
            ready: false,
        }
    }

    /// 从牌堆发 `n` 张牌，然后重新排序
    pub fn deal(&mut self, deck: &mut Deck, n: usize) -> Result<(), GameError> {
        self.hand.extend(deck.deal(n)?);
        self.sort_hand();
        Ok(())
    }

    fn sort_hand(&mut self) {
        self.hand.sort_by(|a, b| b.rank.cmp(&a.rank));
    }

    /// 出牌
    ///
    /// 依次检查：牌型是否合法、手里是否有这些牌、能否压过 `last`，第一个不满足的检查决定错误类型。
    /// 成功后从手牌中扣掉对应的实牌，返回带上真实花色的这手牌。
    pub fn use_cards(&mut self, requested: Vec<Card>, last: &Hand) -> Result<Hand, GameError> {
        let mut played = Hand::new(requested);
        if !classify(&played).is_valid() {
            return Err(GameError::InvalidHandShape);
        }
        if !contains(&self.hand, &played) {
            return Err(GameError::NotOwned);
        }
        if !compare(&played, last) {
            return Err(GameError::DoesNotBeat);
        }

        let mut taken = vec![false; self.hand.len()];
        let mut matched = Vec::with_capacity(played.len());
        for want in played.iter() {
            // contains 已经保证一定能找到
            if let Some(i) = (0..self.hand.len()).find(|&i| !taken[i] && self.hand[i] == *want) {
                taken[i] = true;
                matched.push(self.hand[i]);
            }
        }
        played.fill_suits(&matched);

        let mut index = 0;
        self.hand.retain(|_| {
            let keep = !taken[index];
            index += 1;
            keep
        });
        self.sort_hand();
        Ok(played)
    }

    /// 针对 `last` 给出推荐的出牌
    pub fn recommend(&self, last: &Hand) -> Hand {
        recommend(&self.hand, last)
    }

    /// 渲染手牌，推荐出牌里的牌用 `["n"]...[""]` 标出来，供客户端做选择
    pub fn highlight(&self, last: &Hand) -> String {
        let recommended = self.recommend(last);
        let mut selection = 1;
        let cards: Vec<String> = self
            .hand
            .iter()
            .map(|card| {
                if recommended.iter().any(|r| r.same_face(card)) {
                    let marked = format!("[\"{}\"]{}[\"\"]", selection, card);
                    selection += 1;
                    marked
                } else {
                    card.to_string()
                }
            })
            .collect();
        format!("[{}]", cards.join(", "))
    }

    /// `PlayerStatus` 消息的内容：`<身份>_<手牌>`
    pub fn status(&self, last: &Hand) -> String {
        format!("{}_{}", self.role, self.highlight(last))
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cards: Vec<String> = self.hand.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", cards.join(", "))
    }
}
