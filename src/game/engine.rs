use crate::ai::{OpponentAgent, OpponentDecision};
use crate::schedule::{Epoch, OpponentTicket};

use super::rules::{GameConfig, RuleEngine, RuleError};
use super::state::{GameEvent, GameState, HandSide, Player};

/// 对局的唯一所有者，也是唯一合法的修改入口。
///
/// 非法操作（打死手、抢回合、终局后继续操作）一律静默忽略：返回空事件，
/// 状态保持原样。需要知道拒绝原因时使用对应的 `try_*` 方法。
#[derive(Debug, Clone)]
pub struct Engine {
    state: GameState,
    rules: RuleEngine,
    agent: OpponentAgent,
    epoch: Epoch,
}

impl Engine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_agent(config, OpponentAgent::new())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_agent(config, OpponentAgent::with_seed(seed))
    }

    pub fn with_agent(config: GameConfig, agent: OpponentAgent) -> Self {
        Self {
            state: GameState::new(),
            rules: RuleEngine::new(config),
            agent,
            epoch: Epoch::default(),
        }
    }

    /// 直接装入一个已有局面，主要供测试和前端恢复使用。
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = state;
        self.epoch.advance();
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        self.rules.config()
    }

    pub fn replace_state(&mut self, state: GameState) {
        self.state = state;
        self.epoch.advance();
    }

    pub fn try_select_hand(&mut self, hand: HandSide) -> Result<Vec<GameEvent>, RuleError> {
        self.rules.select_hand(&mut self.state, hand)
    }

    pub fn select_hand(&mut self, hand: HandSide) -> Vec<GameEvent> {
        self.try_select_hand(hand).unwrap_or_default()
    }

    /// 玩家本人用 `turn.active_hand` 攻击 `target_player` 的 `target_hand`。
    ///
    /// 对手回合内的点击一律忽略，对手只通过 `step_opponent_move` 出手。
    pub fn try_attack(
        &mut self,
        target_player: Player,
        target_hand: HandSide,
    ) -> Result<Vec<GameEvent>, RuleError> {
        self.rules
            .player_attack(&mut self.state, target_player, target_hand)
    }

    pub fn attack(&mut self, target_player: Player, target_hand: HandSide) -> Vec<GameEvent> {
        self.try_attack(target_player, target_hand)
            .unwrap_or_default()
    }

    pub fn try_step_opponent_move(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        if self.state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        let Some(chosen) = self.agent.choose_move(&self.state) else {
            return Err(RuleError::NotPlayerTurn {
                player: Player::Opponent,
            });
        };
        self.rules.attack(&mut self.state, chosen.into_action())
    }

    pub fn step_opponent_move(&mut self) -> Vec<GameEvent> {
        self.try_step_opponent_move().unwrap_or_default()
    }

    /// 预览下一次 `step_opponent_move` 会走的那一步，不改动状态。
    pub fn preview_opponent_move(&self) -> OpponentDecision {
        let mut agent = self.agent.clone();
        agent.decide(&self.state, &self.rules)
    }

    pub fn reset(&mut self) -> Vec<GameEvent> {
        self.epoch.advance();
        self.rules.reset(&mut self.state)
    }

    pub fn is_opponent_turn(&self) -> bool {
        !self.state.is_finished() && self.state.is_turn_of(Player::Opponent)
    }

    /// 轮到对手时签发一张延迟出手的票据。
    pub fn schedule_opponent_move(&self) -> Option<OpponentTicket> {
        self.is_opponent_turn().then(|| self.epoch.issue())
    }

    /// 让所有已签发的票据失效，但不重置对局。
    pub fn cancel_scheduled(&mut self) {
        self.epoch.advance();
    }

    /// 执行到期的票据；过期票据或已不是对手回合时为空操作。
    pub fn run_scheduled(&mut self, ticket: OpponentTicket) -> Vec<GameEvent> {
        if !self.epoch.is_current(ticket) {
            return Vec::new();
        }
        self.step_opponent_move()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
