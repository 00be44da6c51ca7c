//! 对手 AI：在存活的手中均匀随机选择。

pub mod random;

pub use random::{OpponentAgent, OpponentDecision, OpponentMove};
