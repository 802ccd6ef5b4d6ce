//! Generic finite state machine shared by every actor family.
//!
//! A [`StateMachine`] is generic over an [`Owner`]: a marker type naming the
//! closed set of state tags for one actor family and the context its states
//! receive. The tag→state map is resolved once, when the machine is built, so
//! nothing re-matches on the tag every frame.
//!
//! # Transition law
//!
//! - `set_state(None)` leaves the machine untouched
//! - moving from `A` to `B` calls `A.end()` strictly before `B.start()`
//! - `start()` runs exactly once per entry into a state
//! - re-entering the current tag ends it and starts it again
//!
//! # Example
//!
//! ```ignore
//! let mut fsm = StateMachine::<EnemyOwner>::new()
//!     .with_state(EnemyState::Idle, EnemyIdle::default())
//!     .with_state(EnemyState::Walk, EnemyWalk::default());
//! fsm.set_state(Some(EnemyState::Idle), &mut ctx);
//! fsm.update(&mut ctx, delta);
//! ```
//!
//! # Related
//!
//! - [`crate::components::brain::Brain`] – per-actor component wrapping a machine
//! - [`crate::states`] – concrete states for players and enemies

use log::error;
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;

/// An actor family: its state tags and the context handed to its states.
pub trait Owner: 'static {
    type Tag: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    type Ctx<'a>;
}

/// One state of an [`Owner`]'s machine.
///
/// States carry no meaning between entries: anything counted while in the
/// state (time spent, hits landed) must be reset in [`start`](State::start).
pub trait State<O: Owner>: Send + Sync {
    fn start(&mut self, _ctx: &mut O::Ctx<'_>) {}

    /// Advance the state. Returning `Some(tag)` requests a transition.
    fn update(&mut self, ctx: &mut O::Ctx<'_>, delta: f32) -> Option<O::Tag>;

    fn end(&mut self, _ctx: &mut O::Ctx<'_>) {}
}

pub struct StateMachine<O: Owner> {
    states: FxHashMap<O::Tag, Box<dyn State<O>>>,
    current: Option<O::Tag>,
}

impl<O: Owner> Default for StateMachine<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Owner> StateMachine<O> {
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
            current: None,
        }
    }

    /// Register the state run for `tag` (builder pattern).
    pub fn with_state(mut self, tag: O::Tag, state: impl State<O> + 'static) -> Self {
        self.states.insert(tag, Box::new(state));
        self
    }

    /// The active state's tag, or `None` before the first transition.
    pub fn get_state(&self) -> Option<O::Tag> {
        self.current
    }

    pub fn has_state(&self, tag: O::Tag) -> bool {
        self.states.contains_key(&tag)
    }

    pub fn is_in(&self, tag: O::Tag) -> bool {
        self.current == Some(tag)
    }

    /// Switch to `next`. `None` is a no-op.
    ///
    /// Switching to a tag with no registered state is a programming error:
    /// it asserts in debug builds and is logged and ignored otherwise.
    pub fn set_state(&mut self, next: Option<O::Tag>, ctx: &mut O::Ctx<'_>) {
        let Some(next) = next else {
            return;
        };
        if !self.states.contains_key(&next) {
            debug_assert!(false, "transition into unregistered state {:?}", next);
            error!("transition into unregistered state {:?} ignored", next);
            return;
        }

        if let Some(previous) = self.current {
            if let Some(state) = self.states.get_mut(&previous) {
                state.end(ctx);
            }
        }
        self.current = Some(next);
        if let Some(state) = self.states.get_mut(&next) {
            state.start(ctx);
        }
    }

    /// Forward `update` to the current state and apply any transition it asks for.
    pub fn update(&mut self, ctx: &mut O::Ctx<'_>, delta: f32) {
        let Some(current) = self.current else {
            return;
        };
        let next = match self.states.get_mut(&current) {
            Some(state) => state.update(ctx, delta),
            None => None,
        };
        self.set_state(next, ctx);
    }
}

impl<O: Owner> fmt::Debug for StateMachine<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}
