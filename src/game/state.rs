use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 单只手允许的最大手指数。
pub const MAX_FINGERS: u8 = 4;
/// 手指数取模的基数，凑满 5 即归零（死手）。
pub const FINGER_MODULUS: u8 = 5;

/// 玩家的左手或右手。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    #[default]
    Left,
    Right,
}

impl HandSide {
    pub const ALL: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    pub fn other(self) -> Self {
        match self {
            HandSide::Left => HandSide::Right,
            HandSide::Right => HandSide::Left,
        }
    }
}

impl FromStr for HandSide {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(HandSide::Left),
            "right" | "r" => Ok(HandSide::Right),
            _ => Err(()),
        }
    }
}

/// 对局双方：玩家本人与电脑对手。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    You,
    Opponent,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::You => Player::Opponent,
            Player::Opponent => Player::You,
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "you" | "player" | "human" => Ok(Player::You),
            "opponent" | "ai" | "cpu" => Ok(Player::Opponent),
            _ => Err(()),
        }
    }
}

/// 一名玩家两只手的手指数，0 表示死手。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandState {
    pub left: u8,
    pub right: u8,
}

impl HandState {
    pub fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    pub fn get(&self, side: HandSide) -> u8 {
        match side {
            HandSide::Left => self.left,
            HandSide::Right => self.right,
        }
    }

    pub fn set(&mut self, side: HandSide, fingers: u8) {
        let value = fingers % FINGER_MODULUS;
        match side {
            HandSide::Left => self.left = value,
            HandSide::Right => self.right = value,
        }
    }

    pub fn is_alive(&self, side: HandSide) -> bool {
        self.get(side) > 0
    }

    pub fn is_eliminated(&self) -> bool {
        self.left == 0 && self.right == 0
    }

    pub fn alive(&self) -> Vec<HandSide> {
        HandSide::ALL
            .into_iter()
            .filter(|side| self.is_alive(*side))
            .collect()
    }

    /// 把 `amount` 根手指加到指定的手上，按 5 取模。返回新的手指数。
    pub fn add_fingers(&mut self, side: HandSide, amount: u8) -> u8 {
        let next = (self.get(side) + amount) % FINGER_MODULUS;
        self.set(side, next);
        next
    }
}

impl Default for HandState {
    fn default() -> Self {
        Self { left: 1, right: 1 }
    }
}

/// 对局阶段，只有 `Playing` 是非终局。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Playing,
    YouWin,
    YouLose,
    Tie,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GamePhase::Playing)
    }
}

/// 回合信息。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnState {
    pub active_player: Player,
    /// 玩家本人下一次出手时使用的手，仅在轮到 `Player::You` 时有意义。
    pub active_hand: HandSide,
    pub turn_count: u32,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            active_player: Player::You,
            active_hand: HandSide::Left,
            turn_count: 0,
        }
    }
}

/// 对局过程中产生的事件，随操作返回给前端，不做持久记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    HandSelected {
        hand: HandSide,
    },
    AttackResolved {
        attacker: Player,
        source_hand: HandSide,
        target_player: Player,
        target_hand: HandSide,
        damage: u8,
        before: u8,
        after: u8,
    },
    HandDied {
        player: Player,
        hand: HandSide,
    },
    ActiveHandSwitched {
        from: HandSide,
        to: HandSide,
    },
    TurnPassed {
        next_player: Player,
        turn_count: u32,
    },
    GameEnded {
        phase: GamePhase,
    },
    GameReset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    FingerCountOutOfRange {
        player: Player,
        hand: HandSide,
        value: u8,
    },
    ActiveHandDead {
        hand: HandSide,
    },
    EliminatedWhilePlaying {
        player: Player,
    },
    TurnLimitReached {
        turn_count: u32,
        turn_limit: u32,
    },
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub your_hands: HandState,
    pub opponent_hands: HandState,
    pub turn: TurnState,
    pub phase: GamePhase,
}

impl GameState {
    /// 开局状态：双方两只手都是 1，轮到玩家本人，左手出手。
    pub fn new() -> Self {
        Self {
            your_hands: HandState::default(),
            opponent_hands: HandState::default(),
            turn: TurnState::default(),
            phase: GamePhase::Playing,
        }
    }

    pub fn with_hands(mut self, yours: HandState, opponent: HandState) -> Self {
        self.your_hands = yours;
        self.opponent_hands = opponent;
        self
    }

    pub fn with_turn_count(mut self, turn_count: u32) -> Self {
        self.turn.turn_count = turn_count;
        self
    }

    pub fn with_active_player(mut self, player: Player) -> Self {
        self.turn.active_player = player;
        self
    }

    pub fn hands(&self, player: Player) -> &HandState {
        match player {
            Player::You => &self.your_hands,
            Player::Opponent => &self.opponent_hands,
        }
    }

    pub fn hands_mut(&mut self, player: Player) -> &mut HandState {
        match player {
            Player::You => &mut self.your_hands,
            Player::Opponent => &mut self.opponent_hands,
        }
    }

    pub fn fingers(&self, player: Player, side: HandSide) -> u8 {
        self.hands(player).get(side)
    }

    pub fn alive_hands(&self, player: Player) -> Vec<HandSide> {
        self.hands(player).alive()
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_turn_of(&self, player: Player) -> bool {
        self.turn.active_player == player
    }

    pub fn can_select(&self, hand: HandSide) -> bool {
        !self.is_finished() && self.is_turn_of(Player::You) && self.your_hands.is_alive(hand)
    }

    /// 当前行动方能否攻击 `target_player` 的 `target_hand`。
    pub fn can_attack(&self, target_player: Player, target_hand: HandSide) -> bool {
        !self.is_finished()
            && target_player != self.turn.active_player
            && self.hands(target_player).is_alive(target_hand)
    }

    /// 当前行动方可以攻击的所有 (玩家, 手)。
    pub fn legal_targets(&self) -> Vec<(Player, HandSide)> {
        if self.is_finished() {
            return Vec::new();
        }
        let target = self.turn.active_player.other();
        self.alive_hands(target)
            .into_iter()
            .map(|side| (target, side))
            .collect()
    }

    /// 按胜 → 负 → 平的顺序判定终局，胜负优先于回合上限。
    pub fn evaluate_phase(&self, turn_limit: u32) -> GamePhase {
        if self.opponent_hands.is_eliminated() {
            GamePhase::YouWin
        } else if self.your_hands.is_eliminated() {
            GamePhase::YouLose
        } else if self.turn.turn_count >= turn_limit {
            GamePhase::Tie
        } else {
            GamePhase::Playing
        }
    }

    /// 当前出手的手死掉时切换到另一只活着的手。
    pub fn ensure_active_hand_alive(&mut self) -> Option<GameEvent> {
        let current = self.turn.active_hand;
        if self.your_hands.is_alive(current) {
            return None;
        }
        let other = current.other();
        if !self.your_hands.is_alive(other) {
            return None;
        }
        self.turn.active_hand = other;
        Some(GameEvent::ActiveHandSwitched {
            from: current,
            to: other,
        })
    }

    /// 校验局面是否可能由正常对局产生；`turn_limit` 为当前配置的回合上限。
    pub fn integrity_check(&self, turn_limit: u32) -> Result<(), IntegrityError> {
        for player in [Player::You, Player::Opponent] {
            for hand in HandSide::ALL {
                let value = self.fingers(player, hand);
                if value > MAX_FINGERS {
                    return Err(IntegrityError::FingerCountOutOfRange {
                        player,
                        hand,
                        value,
                    });
                }
            }
        }

        if self.phase == GamePhase::Playing {
            for player in [Player::You, Player::Opponent] {
                if self.hands(player).is_eliminated() {
                    return Err(IntegrityError::EliminatedWhilePlaying { player });
                }
            }
            let active = self.turn.active_hand;
            if !self.your_hands.is_alive(active) {
                return Err(IntegrityError::ActiveHandDead { hand: active });
            }
            if self.turn.turn_count >= turn_limit {
                return Err(IntegrityError::TurnLimitReached {
                    turn_count: self.turn.turn_count,
                    turn_limit,
                });
            }
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
