//! Phase state machine
//!
//! Four ordered phases, advanced by timers scheduled from session start or
//! early by the accept action. The controller never moves backwards.
//!
//! There is no event loop here: timers are pending deadlines, and the host
//! calls [`PhaseController::advance`] with the elapsed session time from its
//! own loop (animation frame, timeout callback, test script).

use serde::{Deserialize, Serialize};

use crate::config::PhaseTimings;

/// Stage of the experience, in strict order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Flower blooms in
    Intro,
    /// Lead-in text appears
    Greeting,
    /// Headline and the two buttons
    Prompt,
    /// Accepted (terminal)
    Resolved,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Self::Intro, Self::Greeting, Self::Prompt, Self::Resolved];

    /// Position in the phase order
    pub fn order(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Greeting => "greeting",
            Self::Prompt => "prompt",
            Self::Resolved => "resolved",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Resolved
    }
}

/// A transition delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
    /// Session time when it happened (ms)
    pub at_ms: f64,
}

/// A scheduled automatic transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTimer {
    pub at_ms: f64,
    pub target: Phase,
}

/// Handle returned by [`PhaseController::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&PhaseChange)>;

/// Single source of truth for the current phase
pub struct PhaseController {
    phase: Phase,
    /// Sorted by deadline
    timers: Vec<PendingTimer>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u32,
    /// Latest session time seen, used to stamp accept events
    now_ms: f64,
    torn_down: bool,
}

impl std::fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseController")
            .field("phase", &self.phase)
            .field("timers", &self.timers)
            .field("listeners", &self.listeners.len())
            .field("now_ms", &self.now_ms)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

impl PhaseController {
    /// Start a session at `Intro` with both timers scheduled from time zero
    pub fn new(timings: &PhaseTimings) -> Self {
        let mut timers = vec![
            PendingTimer {
                at_ms: timings.greeting_at_ms,
                target: Phase::Greeting,
            },
            PendingTimer {
                at_ms: timings.prompt_at_ms,
                target: Phase::Prompt,
            },
        ];
        timers.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

        Self {
            phase: Phase::Intro,
            timers,
            listeners: Vec::new(),
            next_subscription: 1,
            now_ms: 0.0,
            torn_down: false,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    /// Whether the current phase is `phase` or later
    pub fn is_at_least(&self, phase: Phase) -> bool {
        self.phase >= phase
    }

    /// Timers that have not fired or been cancelled yet
    pub fn pending_timers(&self) -> &[PendingTimer] {
        &self.timers
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Fire every timer due at `now_ms`, in deadline order
    ///
    /// Returns the phase after advancing.
    pub fn advance(&mut self, now_ms: f64) -> Phase {
        if self.torn_down {
            return self.phase;
        }
        self.now_ms = self.now_ms.max(now_ms);

        let due = self.timers.partition_point(|t| t.at_ms <= now_ms);
        let fired: Vec<PendingTimer> = self.timers.drain(..due).collect();
        for timer in fired {
            self.transition_to(timer.target, timer.at_ms);
        }
        self.phase
    }

    /// The user accepted: jump straight to `Resolved`
    pub fn on_accept(&mut self) {
        if self.torn_down || self.phase.is_terminal() {
            return;
        }
        self.cancel_timers();
        self.transition_to(Phase::Resolved, self.now_ms);
    }

    /// Move forward to `target`; earlier or equal phases are ignored
    ///
    /// Returns whether the phase changed.
    pub fn set_phase(&mut self, target: Phase) -> bool {
        if self.torn_down {
            return false;
        }
        let changed = self.transition_to(target, self.now_ms);
        if self.phase.is_terminal() {
            self.cancel_timers();
        }
        changed
    }

    /// Register a callback for every future transition
    pub fn subscribe(&mut self, listener: impl FnMut(&PhaseChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was unknown
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Cancel pending timers and drop subscribers; the phase is frozen after this
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        log::debug!(
            "Phase controller torn down in {} ({} timers cancelled)",
            self.phase.label(),
            self.timers.len()
        );
        self.cancel_timers();
        self.listeners.clear();
        self.torn_down = true;
    }

    fn cancel_timers(&mut self) {
        self.timers.clear();
    }

    fn transition_to(&mut self, target: Phase, at_ms: f64) -> bool {
        if target <= self.phase {
            return false;
        }
        let change = PhaseChange {
            from: self.phase,
            to: target,
            at_ms,
        };
        self.phase = target;
        log::info!(
            "Phase {} -> {} at {:.0} ms",
            change.from.label(),
            change.to.label(),
            at_ms
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
        true
    }
}
