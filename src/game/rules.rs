use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, GameState, HandSide, IntegrityError, Player};

/// 未分胜负时，完成这么多次攻击后判平局。
pub const TURN_LIMIT: u32 = 30;
/// 对手“思考”的默认延迟（毫秒）。
pub const DEFAULT_OPPONENT_DELAY_MS: u32 = 2_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub turn_limit: u32,
    pub opponent_delay_ms: u32,
}

impl GameConfig {
    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    pub fn with_opponent_delay(mut self, delay_ms: u32) -> Self {
        self.opponent_delay_ms = delay_ms;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_limit: TURN_LIMIT,
            opponent_delay_ms: DEFAULT_OPPONENT_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackAction {
    pub attacker: Player,
    pub source_hand: HandSide,
    pub target_hand: HandSide,
}

impl AttackAction {
    pub fn target_player(&self) -> Player {
        self.attacker.other()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    NotPlayerTurn { player: Player },
    CannotAttackOwnHand,
    DeadTargetHand { player: Player, hand: HandSide },
    DeadSourceHand { player: Player, hand: HandSide },
    DeadHandSelected { hand: HandSide },
    IntegrityViolation { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub phase: GamePhase,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let phase = state.phase;
        Self {
            state,
            events,
            phase,
        }
    }
}

/// 校验并执行状态转移。每个操作都先完成全部校验再修改状态，
/// 因此返回 `Err` 时状态保持不变。
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: GameConfig,
}

impl RuleEngine {
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn ensure_playing(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_turn_owner(state: &GameState, player: Player) -> Result<(), RuleError> {
        if !state.is_turn_of(player) {
            return Err(RuleError::NotPlayerTurn { player });
        }
        Ok(())
    }

    fn ensure_integrity(&self, state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check(self.config.turn_limit)
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    pub fn select_hand(
        &self,
        state: &mut GameState,
        hand: HandSide,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_playing(state)?;
        self.ensure_integrity(state)?;
        Self::ensure_turn_owner(state, Player::You)?;

        if !state.your_hands.is_alive(hand) {
            return Err(RuleError::DeadHandSelected { hand });
        }

        state.turn.active_hand = hand;
        Ok(vec![GameEvent::HandSelected { hand }])
    }

    /// 玩家本人的攻击意图：用 `turn.active_hand` 打对手的 `target_hand`。
    ///
    /// 只在轮到玩家本人时生效；对手只能通过自己的出手流程攻击。
    pub fn player_attack(
        &self,
        state: &mut GameState,
        target_player: Player,
        target_hand: HandSide,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_playing(state)?;
        self.ensure_integrity(state)?;
        Self::ensure_turn_owner(state, Player::You)?;

        if target_player == Player::You {
            return Err(RuleError::CannotAttackOwnHand);
        }

        let action = AttackAction {
            attacker: Player::You,
            source_hand: state.turn.active_hand,
            target_hand,
        };
        self.attack(state, action)
    }

    pub fn attack(
        &self,
        state: &mut GameState,
        action: AttackAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_playing(state)?;
        self.ensure_integrity(state)?;
        Self::ensure_turn_owner(state, action.attacker)?;

        let target_player = action.target_player();
        let attacker_hands = state.hands(action.attacker);
        if !attacker_hands.is_alive(action.source_hand) {
            return Err(RuleError::DeadSourceHand {
                player: action.attacker,
                hand: action.source_hand,
            });
        }
        if !state.hands(target_player).is_alive(action.target_hand) {
            return Err(RuleError::DeadTargetHand {
                player: target_player,
                hand: action.target_hand,
            });
        }

        let damage = attacker_hands.get(action.source_hand);
        let before = state.fingers(target_player, action.target_hand);
        let after = state
            .hands_mut(target_player)
            .add_fingers(action.target_hand, damage);

        let mut events = vec![GameEvent::AttackResolved {
            attacker: action.attacker,
            source_hand: action.source_hand,
            target_player,
            target_hand: action.target_hand,
            damage,
            before,
            after,
        }];
        if after == 0 {
            events.push(GameEvent::HandDied {
                player: target_player,
                hand: action.target_hand,
            });
        }

        state.turn.turn_count = state.turn.turn_count.saturating_add(1);
        state.turn.active_player = target_player;
        events.push(GameEvent::TurnPassed {
            next_player: target_player,
            turn_count: state.turn.turn_count,
        });

        state.phase = state.evaluate_phase(self.config.turn_limit);
        if state.is_finished() {
            events.push(GameEvent::GameEnded { phase: state.phase });
            return Ok(events);
        }

        if let Some(switched) = state.ensure_active_hand_alive() {
            events.push(switched);
        }

        Ok(events)
    }

    pub fn reset(&self, state: &mut GameState) -> Vec<GameEvent> {
        *state = GameState::new();
        vec![GameEvent::GameReset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::HandState;

    fn you_attack(source_hand: HandSide, target_hand: HandSide) -> AttackAction {
        AttackAction {
            attacker: Player::You,
            source_hand,
            target_hand,
        }
    }

    #[test]
    fn attack_adds_source_fingers_to_target() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_hands(HandState::new(2, 1), HandState::new(3, 1));

        let events = engine
            .attack(&mut state, you_attack(HandSide::Left, HandSide::Left))
            .expect("attack should succeed");

        assert_eq!(state.opponent_hands, HandState::new(0, 1), "3 + 2 kills the hand");
        assert_eq!(state.turn.turn_count, 1);
        assert_eq!(state.turn.active_player, Player::Opponent);
        assert!(events.contains(&GameEvent::HandDied {
            player: Player::Opponent,
            hand: HandSide::Left,
        }));
    }

    #[test]
    fn attack_with_three_on_three_wraps_to_one() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_hands(HandState::new(3, 1), HandState::new(3, 1));

        engine
            .attack(&mut state, you_attack(HandSide::Left, HandSide::Left))
            .expect("attack should succeed");

        assert_eq!(state.opponent_hands.left, 1);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn rejects_out_of_turn_attack() {
        let engine = RuleEngine::default();
        let mut state = GameState::new();
        let before = state.clone();

        let result = engine.attack(
            &mut state,
            AttackAction {
                attacker: Player::Opponent,
                source_hand: HandSide::Left,
                target_hand: HandSide::Left,
            },
        );

        assert_eq!(
            result,
            Err(RuleError::NotPlayerTurn {
                player: Player::Opponent
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn rejects_attack_on_own_hand() {
        let engine = RuleEngine::default();
        let mut state = GameState::new();

        assert_eq!(
            engine.player_attack(&mut state, Player::You, HandSide::Right),
            Err(RuleError::CannotAttackOwnHand)
        );
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn player_attack_is_refused_on_opponent_turn() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_active_player(Player::Opponent);
        let before = state.clone();

        for target_player in [Player::You, Player::Opponent] {
            assert_eq!(
                engine.player_attack(&mut state, target_player, HandSide::Left),
                Err(RuleError::NotPlayerTurn { player: Player::You })
            );
            assert_eq!(state, before);
        }
    }

    #[test]
    fn player_attack_uses_active_hand() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_hands(HandState::new(1, 3), HandState::new(1, 1));
        state.turn.active_hand = HandSide::Right;

        engine
            .player_attack(&mut state, Player::Opponent, HandSide::Left)
            .expect("attack should succeed");

        assert_eq!(state.opponent_hands, HandState::new(4, 1));
    }

    #[test]
    fn state_at_turn_limit_is_refused_instead_of_overflowing() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_turn_count(u32::MAX);
        let before = state.clone();

        let result = engine.player_attack(&mut state, Player::Opponent, HandSide::Left);

        assert_eq!(
            result,
            Err(RuleError::IntegrityViolation {
                error: IntegrityError::TurnLimitReached {
                    turn_count: u32::MAX,
                    turn_limit: TURN_LIMIT,
                },
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let engine = RuleEngine::default();
        let mut state = GameState::new()
            .with_hands(HandState::new(0, 2), HandState::new(3, 0))
            .with_turn_count(12);
        state.phase = GamePhase::Tie;

        assert_eq!(engine.reset(&mut state), vec![GameEvent::GameReset]);
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn opponent_kill_switches_your_active_hand() {
        let engine = RuleEngine::default();
        let mut state = GameState::new()
            .with_hands(HandState::new(4, 2), HandState::new(1, 1))
            .with_active_player(Player::Opponent);

        let events = engine
            .attack(
                &mut state,
                AttackAction {
                    attacker: Player::Opponent,
                    source_hand: HandSide::Right,
                    target_hand: HandSide::Left,
                },
            )
            .expect("attack should succeed");

        assert_eq!(state.your_hands, HandState::new(0, 2));
        assert_eq!(state.turn.active_hand, HandSide::Right);
        assert!(events.contains(&GameEvent::ActiveHandSwitched {
            from: HandSide::Left,
            to: HandSide::Right,
        }));
        assert!(state.integrity_check(TURN_LIMIT).is_ok());
    }

    #[test]
    fn last_hand_killed_ends_game_and_freezes_turns() {
        let engine = RuleEngine::default();
        let mut state = GameState::new()
            .with_hands(HandState::new(1, 0), HandState::new(4, 1))
            .with_active_player(Player::Opponent)
            .with_turn_count(7);

        let events = engine
            .attack(
                &mut state,
                AttackAction {
                    attacker: Player::Opponent,
                    source_hand: HandSide::Left,
                    target_hand: HandSide::Left,
                },
            )
            .expect("attack should succeed");

        assert_eq!(state.phase, GamePhase::YouLose);
        assert_eq!(state.turn.turn_count, 8);
        assert_eq!(events.last(), Some(&GameEvent::GameEnded { phase: GamePhase::YouLose }));

        let frozen = state.clone();
        let result = engine.attack(
            &mut state,
            AttackAction {
                attacker: Player::You,
                source_hand: HandSide::Left,
                target_hand: HandSide::Right,
            },
        );
        assert_eq!(result, Err(RuleError::GameFinished));
        assert_eq!(state, frozen);
    }

    #[test]
    fn custom_turn_limit_is_respected() {
        let engine = RuleEngine::new(GameConfig::default().with_turn_limit(1));
        let mut state = GameState::new();

        engine
            .attack(&mut state, you_attack(HandSide::Left, HandSide::Right))
            .expect("attack should succeed");

        assert_eq!(state.phase, GamePhase::Tie);
        assert_eq!(engine.config().turn_limit, 1);
    }

    #[test]
    fn select_hand_rejects_dead_hand() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_hands(HandState::new(1, 0), HandState::new(1, 1));

        assert_eq!(
            engine.select_hand(&mut state, HandSide::Right),
            Err(RuleError::DeadHandSelected {
                hand: HandSide::Right
            })
        );
        assert_eq!(state.turn.active_hand, HandSide::Left);
    }

    #[test]
    fn corrupted_state_is_refused() {
        let engine = RuleEngine::default();
        let mut state = GameState::new().with_hands(HandState::new(1, 1), HandState::new(7, 1));

        let result = engine.attack(&mut state, you_attack(HandSide::Left, HandSide::Right));

        assert!(matches!(result, Err(RuleError::IntegrityViolation { .. })));
    }
}
