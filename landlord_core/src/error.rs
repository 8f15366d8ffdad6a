use thiserror::Error;

/// 对局中可能出现的错误
///
/// `Display` 的内容就是发给玩家的提示文字。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("> invalid cards: these cards don't form a valid combination")]
    InvalidHandShape,
    #[error("> you don't have the cards")]
    NotOwned,
    #[error("> cards can't beat last played cards")]
    DoesNotBeat,
    #[error("> it's not your turn")]
    NotYourTurn,
    #[error("> you're already ready")]
    AlreadyReady,
    #[error("> you're already in a game")]
    AlreadyInGame,
    #[error("> you must first join a game")]
    NotInGame,
    #[error("> unknown command: {0}. type /commands to see available commands")]
    UnknownCommand(String),
    #[error("> failed to deal {requested} card(s) from deck of size {remaining}")]
    InsufficientCards { requested: usize, remaining: usize },
    #[error("> connection lost")]
    SessionLost,

    #[error("> invalid cards: {0:?}")]
    InvalidCards(Vec<String>),
    #[error("> please select at least one card")]
    NoCardsSelected,
    #[error("> you have to play cards to start this round")]
    CannotPass,
    #[error("> all seats are taken, wait for the next game")]
    TableFull,
    #[error("> the game just ended, type /ready again in a moment")]
    MatchEnding,
}

impl GameError {
    /// 致命错误会终止当前对局，并广播给所有人
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::InsufficientCards { .. } | GameError::SessionLost)
    }
}
