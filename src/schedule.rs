//! 对手延迟出手的取消机制。
//!
//! 每次排队都会拿到一张带纪元号的票据；重置或取消会推进纪元，
//! 旧票据到期后执行时即为空操作，不会改动新开的对局。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpponentTicket {
    epoch: u64,
}

impl OpponentTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, Default)]
pub struct Epoch {
    current: u64,
}

impl Epoch {
    pub fn issue(&self) -> OpponentTicket {
        OpponentTicket {
            epoch: self.current,
        }
    }

    pub fn is_current(&self, ticket: OpponentTicket) -> bool {
        ticket.epoch == self.current
    }

    pub fn advance(&mut self) {
        self.current = self.current.wrapping_add(1);
    }
}
