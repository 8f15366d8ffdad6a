use landlord_core::Hand;
use tokio::sync::oneshot;

/// 每一轮的出牌结果交接点
///
/// 对局循环在轮到某人时 `arm` 出一个接收端并等待；分发器在这个人出牌或者过牌后 `resolve`。
/// 有人中途离开时用 `cancel` 塞一手空牌，让对局循环不会一直卡住。
#[derive(Debug, Default)]
pub struct TurnSlot {
    pending: Option<oneshot::Sender<Hand>>,
}

impl TurnSlot {
    pub fn arm(&mut self) -> oneshot::Receiver<Hand> {
        let (tx, rx) = oneshot::channel();
        self.pending = Some(tx);
        rx
    }

    /// 是否有对局循环在等这一轮的结果
    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// 交出本轮结果，每轮只能成功一次
    pub fn resolve(&mut self, hand: Hand) -> bool {
        match self.pending.take() {
            Some(tx) => tx.send(hand).is_ok(),
            None => false,
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.resolve(Hand::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landlord_core::{Card, Rank};

    #[tokio::test]
    async fn test_resolve_once_per_turn() {
        let mut slot = TurnSlot::default();
        assert!(!slot.is_armed());

        let rx = slot.arm();
        assert!(slot.is_armed());
        let played = Hand::new(vec![Card::blank(Rank::Ace)]);
        assert!(slot.resolve(played.clone()));
        assert!(!slot.is_armed());
        assert!(!slot.resolve(Hand::empty()));
        assert_eq!(rx.await.unwrap(), played);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_with_empty_hand() {
        let mut slot = TurnSlot::default();
        let rx = slot.arm();
        let waiter = tokio::spawn(rx);
        assert!(slot.cancel());
        assert!(waiter.await.unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_dropped_receiver_disarms() {
        let mut slot = TurnSlot::default();
        drop(slot.arm());
        assert!(!slot.is_armed());
        assert!(!slot.cancel());
    }
}
