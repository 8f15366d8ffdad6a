//! # 斗地主核心逻辑库
//!
//! 牌、牌堆、牌型判断与比较、出牌推荐、玩家、对局状态机，
//! 以及客户端和服务器之间的消息与命令定义。
//! 不依赖异步运行时，也不做任何 I/O，服务器和客户端都可以直接使用。

mod card;
mod deck;
mod error;
mod hand;
pub mod logic;
mod message;
mod player;
pub mod rules;
mod state;

pub use card::*;
pub use deck::*;
pub use error::*;
pub use hand::*;
pub use message::*;
pub use player::*;
pub use rules::{classify, compare, contains, recommend, score, Shape};
pub use state::*;
