use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{
    AttackAction, GameState, HandSide, Player, RuleEngine, RuleError, RuleResolution,
};

/// 对手的一步：用哪只手打玩家的哪只手。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpponentMove {
    pub source_hand: HandSide,
    pub target_hand: HandSide,
}

impl OpponentMove {
    pub fn into_action(self) -> AttackAction {
        AttackAction {
            attacker: Player::Opponent,
            source_hand: self.source_hand,
            target_hand: self.target_hand,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<OpponentMove>,
    pub damage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<RuleResolution>,
}

/// 均匀随机的对手：攻击手与目标手分别从存活的手中独立抽取。
#[derive(Debug, Clone)]
pub struct OpponentAgent {
    rng: SmallRng,
}

impl OpponentAgent {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn draw(&mut self, candidates: &[HandSide]) -> Option<HandSide> {
        candidates.choose(&mut self.rng).copied()
    }

    pub fn choose_source_hand(&mut self, state: &GameState) -> Option<HandSide> {
        if state.is_finished() || !state.is_turn_of(Player::Opponent) {
            return None;
        }
        self.draw(&state.alive_hands(Player::Opponent))
    }

    pub fn choose_move(&mut self, state: &GameState) -> Option<OpponentMove> {
        let source_hand = self.choose_source_hand(state)?;
        let target_hand = self.draw(&state.alive_hands(Player::You))?;
        Some(OpponentMove {
            source_hand,
            target_hand,
        })
    }

    /// 选出一步并在状态副本上预演其结果。
    pub fn decide(&mut self, state: &GameState, rules: &RuleEngine) -> OpponentDecision {
        let Some(action) = self.choose_move(state) else {
            return OpponentDecision {
                action: None,
                damage: 0,
                resolution: None,
            };
        };

        let damage = state.fingers(Player::Opponent, action.source_hand);
        let resolution = simulate(state, rules, action).ok();
        OpponentDecision {
            action: Some(action),
            damage,
            resolution,
        }
    }
}

impl Default for OpponentAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn simulate(
    state: &GameState,
    rules: &RuleEngine,
    action: OpponentMove,
) -> Result<RuleResolution, RuleError> {
    let mut next_state = state.clone();
    let events = rules.attack(&mut next_state, action.into_action())?;
    Ok(RuleResolution::new(next_state, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GamePhase, HandState};

    fn opponent_to_move(yours: HandState, theirs: HandState) -> GameState {
        GameState::new()
            .with_hands(yours, theirs)
            .with_active_player(Player::Opponent)
    }

    #[test]
    fn never_picks_a_dead_hand() {
        let mut agent = OpponentAgent::with_seed(7);
        let state = opponent_to_move(HandState::new(0, 3), HandState::new(2, 0));

        for _ in 0..500 {
            let chosen = agent.choose_move(&state).expect("opponent should have a move");
            assert_eq!(chosen.source_hand, HandSide::Left);
            assert_eq!(chosen.target_hand, HandSide::Right);
        }
    }

    #[test]
    fn draws_cover_every_live_hand() {
        let mut agent = OpponentAgent::with_seed(42);
        let state = opponent_to_move(HandState::new(1, 2), HandState::new(3, 4));

        let mut seen = Vec::new();
        for _ in 0..200 {
            let chosen = agent.choose_move(&state).expect("opponent should have a move");
            if !seen.contains(&chosen) {
                seen.push(chosen);
            }
        }
        assert_eq!(seen.len(), 4, "all source/target combinations should appear");
    }

    #[test]
    fn same_seed_gives_same_moves() {
        let state = opponent_to_move(HandState::new(1, 2), HandState::new(3, 4));
        let mut first = OpponentAgent::with_seed(99);
        let mut second = OpponentAgent::with_seed(99);

        for _ in 0..20 {
            assert_eq!(first.choose_move(&state), second.choose_move(&state));
        }
    }

    #[test]
    fn no_move_on_your_turn_or_after_game_end() {
        let mut agent = OpponentAgent::with_seed(1);
        assert!(agent.choose_move(&GameState::new()).is_none());

        let mut finished = opponent_to_move(HandState::new(1, 1), HandState::new(1, 1));
        finished.phase = GamePhase::Tie;
        let decision = agent.decide(&finished, &RuleEngine::default());
        assert!(decision.action.is_none());
        assert!(decision.resolution.is_none());
    }

    #[test]
    fn decision_previews_resulting_state() {
        let mut agent = OpponentAgent::with_seed(3);
        let state = opponent_to_move(HandState::new(4, 0), HandState::new(1, 0));

        let decision = agent.decide(&state, &RuleEngine::default());

        assert_eq!(decision.damage, 1);
        let resolution = decision.resolution.expect("preview should resolve");
        assert_eq!(resolution.phase, GamePhase::YouLose);
        assert_eq!(state.phase, GamePhase::Playing, "preview must not touch the input");
    }
}
