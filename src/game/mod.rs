//! 游戏核心逻辑模块（状态、规则引擎、对局引擎）。

pub mod engine;
pub mod rules;
pub mod state;

pub use engine::Engine;
pub use rules::{
    AttackAction,
    GameConfig,
    RuleEngine,
    RuleError,
    RuleResolution,
    DEFAULT_OPPONENT_DELAY_MS,
    TURN_LIMIT,
};
pub use state::{
    GameEvent,
    GamePhase,
    GameState,
    HandSide,
    HandState,
    IntegrityError,
    Player,
    TurnState,
    FINGER_MODULUS,
    MAX_FINGERS,
};
