pub mod ai;
pub mod game;
pub mod schedule;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::{Function, Promise};

pub use ai::{OpponentAgent, OpponentDecision, OpponentMove};
pub use game::{
    AttackAction, Engine, GameConfig, GameEvent, GamePhase, GameState, HandSide, HandState,
    IntegrityError, Player, RuleEngine, RuleError, RuleResolution, TurnState,
    DEFAULT_OPPONENT_DELAY_MS, TURN_LIMIT,
};
pub use schedule::OpponentTicket;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn resolution_from_events(state: &GameState, events: Vec<GameEvent>) -> RuleResolution {
    RuleResolution::new(state.clone(), events)
}

fn parse_hand(value: &str) -> Result<HandSide, JsValue> {
    value
        .parse()
        .map_err(|_| JsValue::from_str(&format!("unknown hand: {value}")))
}

fn parse_player(value: &str) -> Result<Player, JsValue> {
    value
        .parse()
        .map_err(|_| JsValue::from_str(&format!("unknown player: {value}")))
}

fn warn_rejected(intent: &str, error: RuleError) {
    web_sys::console::warn_2(
        &JsValue::from_str(&format!("{intent} ignored")),
        &to_js_error(error),
    );
}

fn checked_state(state: GameState, turn_limit: u32) -> Result<GameState, JsValue> {
    state
        .integrity_check(turn_limit)
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(state)
}

/// 浏览器侧持有的对局句柄。
///
/// 对手的延迟出手由这里的 `Timeout` 驱动；重置、取消、重新排队以及 JS 调用
/// `free()` 都会丢弃它，从而清掉浏览器里的定时器。
#[wasm_bindgen]
pub struct GameEngine {
    inner: Rc<RefCell<Engine>>,
    pending: Option<Timeout>,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u32>, turn_limit: Option<u32>) -> GameEngine {
        let mut config = GameConfig::default();
        if let Some(limit) = turn_limit {
            config = config.with_turn_limit(limit);
        }
        let engine = match seed {
            Some(seed) => Engine::with_seed(config, u64::from(seed)),
            None => Engine::new(config),
        };
        GameEngine {
            inner: Rc::new(RefCell::new(engine)),
            pending: None,
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.borrow().state()).map_err(serde_to_js_error)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_value(self.inner.borrow().state()).map_err(JsValue::from)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        let turn_limit = self.inner.borrow().config().turn_limit;
        let state = checked_state(state, turn_limit)?;
        self.pending = None;
        self.inner.borrow_mut().replace_state(state);
        Ok(())
    }

    pub fn select_hand(&mut self, hand: &str) -> Result<String, JsValue> {
        let hand = parse_hand(hand)?;
        self.apply_intent("select_hand", |engine| engine.try_select_hand(hand))
    }

    pub fn attack(&mut self, target_player: &str, target_hand: &str) -> Result<String, JsValue> {
        let target_player = parse_player(target_player)?;
        let target_hand = parse_hand(target_hand)?;
        self.apply_intent("attack", |engine| {
            engine.try_attack(target_player, target_hand)
        })
    }

    pub fn step_opponent_move(&mut self) -> Result<String, JsValue> {
        self.apply_intent("step_opponent_move", Engine::try_step_opponent_move)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        self.pending = None;
        let mut engine = self.inner.borrow_mut();
        let events = engine.reset();
        make_resolution_json(resolution_from_events(engine.state(), events))
    }

    pub fn is_opponent_turn(&self) -> bool {
        self.inner.borrow().is_opponent_turn()
    }

    pub fn opponent_delay_ms(&self) -> u32 {
        self.inner.borrow().config().opponent_delay_ms
    }

    /// 轮到对手时排队一次延迟出手，到期后以 `RuleResolution` JSON 调用 `on_move`。
    /// 不是对手回合时返回 `false`，什么也不做。
    pub fn schedule_opponent_move(&mut self, on_move: Function, delay_ms: Option<u32>) -> bool {
        let engine = self.inner.borrow();
        let Some(ticket) = engine.schedule_opponent_move() else {
            return false;
        };
        let delay = delay_ms.unwrap_or(engine.config().opponent_delay_ms);
        drop(engine);

        let fired = Rc::clone(&self.inner);
        let timeout = Timeout::new(delay, move || {
            let resolution = {
                let mut engine = fired.borrow_mut();
                let events = engine.run_scheduled(ticket);
                if events.is_empty() {
                    return;
                }
                resolution_from_events(engine.state(), events)
            };
            match make_resolution_json(resolution) {
                Ok(json) => {
                    if let Err(error) = on_move.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        web_sys::console::error_1(&error);
                    }
                }
                Err(error) => web_sys::console::error_1(&error),
            }
        });
        self.pending = Some(timeout);
        true
    }

    pub fn cancel_opponent_move(&mut self) {
        self.pending = None;
        self.inner.borrow_mut().cancel_scheduled();
    }

    /// 等待 `delay_ms` 后给出对手下一步的预览，不修改对局。
    pub fn think_opponent(&self, delay_ms: Option<u32>) -> Promise {
        let snapshot = self.inner.borrow().clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = snapshot.preview_opponent_move();
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

impl GameEngine {
    fn apply_intent<F>(&mut self, intent: &str, action: F) -> Result<String, JsValue>
    where
        F: FnOnce(&mut Engine) -> Result<Vec<GameEvent>, RuleError>,
    {
        let mut engine = self.inner.borrow_mut();
        let events = match action(&mut *engine) {
            Ok(events) => events,
            Err(error) => {
                warn_rejected(intent, error);
                Vec::new()
            }
        };
        make_resolution_json(resolution_from_events(engine.state(), events))
    }
}

/// 返回开局状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::new()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    checked_state(state, TURN_LIMIT).map(|_| ())
}

#[wasm_bindgen(js_name = "turnLimit")]
pub fn turn_limit() -> u32 {
    TURN_LIMIT
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
