//! Speaking-state animation for live sessions
//!
//! A two-state machine that turns speech-activity events into visual cues
//! for the session's client. Debouncing keeps a stream of repeated
//! speech-start events from re-emitting the talking cue.

/// Visual state of the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    /// Idle; the initial state
    Quiet,
    /// Currently producing speech
    Talking,
}

/// Speech-activity driven animation state machine
#[derive(Debug)]
pub struct Animator {
    state: AnimationState,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    /// Create an animator in the `Quiet` state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AnimationState::Quiet,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> AnimationState {
        self.state
    }

    /// React to a speech-start event.
    ///
    /// Returns `Some(Talking)` exactly once per contiguous speech run;
    /// repeated starts while already talking emit nothing.
    pub fn speech_started(&mut self) -> Option<AnimationState> {
        if self.state == AnimationState::Talking {
            return None;
        }
        self.state = AnimationState::Talking;
        Some(AnimationState::Talking)
    }

    /// React to a speech-stop event.
    ///
    /// Always returns `Some(Quiet)`: every stop emits the quiet cue, even
    /// when the machine was already quiet.
    pub fn speech_stopped(&mut self) -> Option<AnimationState> {
        self.state = AnimationState::Quiet;
        Some(AnimationState::Quiet)
    }
}
