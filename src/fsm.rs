/// Small finite-state-machine container used by the locomotion controller.
///
/// `S` is the state enum. The machine remembers the current and previous
/// state and how long (in seconds of accumulated `dt`) it has been in the
/// current one. Transition rules live with whoever drives the machine; this
/// type only does the bookkeeping so every re-entry arms its timer the same
/// way.
///
/// ```
/// use avatar_rig::fsm::StateMachine;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Door { Closed, Open }
///
/// let mut fsm = StateMachine::new(Door::Closed);
/// fsm.tick(0.5);
/// fsm.go(Door::Open);
/// assert_eq!(fsm.elapsed, 0.0);
/// assert_eq!(fsm.previous, Door::Closed);
/// ```
#[derive(Debug, Clone)]
pub struct StateMachine<S: Copy + PartialEq> {
    pub state: S,
    pub previous: S,
    /// Seconds spent in the current state. Reset to 0.0 on every entry.
    pub elapsed: f32,
    entered_this_frame: bool,
}

impl<S: Copy + PartialEq> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            previous: initial,
            state: initial,
            elapsed: 0.0,
            entered_this_frame: true,
        }
    }

    /// Transition to `next` if it differs from the current state.
    /// Returns `true` when a transition happened.
    pub fn go(&mut self, next: S) -> bool {
        if self.state == next {
            return false;
        }
        self.force_go(next);
        true
    }

    /// Always (re-)enter `next`, even when already in it. Re-arms the timer.
    pub fn force_go(&mut self, next: S) {
        self.previous = std::mem::replace(&mut self.state, next);
        self.elapsed = 0.0;
        self.entered_this_frame = true;
    }

    /// Accumulate `dt` into the in-state timer and clear the entry flag.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
        self.entered_this_frame = false;
    }

    /// `true` from the moment of a transition until the next `tick`.
    pub fn just_entered(&self) -> bool {
        self.entered_this_frame
    }

    pub fn is(&self, state: S) -> bool {
        self.state == state
    }
}
