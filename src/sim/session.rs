//! One run of the experience
//!
//! Ties the phase controller to the runaway tracker and a seeded RNG. The
//! host feeds it elapsed time and pointer events; it answers with the phase,
//! what should be visible, and where the No button goes.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::phase::{Phase, PhaseChange, PhaseController, SubscriptionId};
use super::runaway::{Relocation, RunawayTracker, Tease};
use crate::config::Config;
use crate::{Point, Rect, Size};

/// Which content blocks the renderer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    pub flower: bool,
    pub greeting: bool,
    /// Headline plus the Yes/No buttons
    pub prompt: bool,
    pub celebration: bool,
}

impl Visibility {
    pub fn for_controller(pc: &PhaseController) -> Self {
        let resolved = pc.is_at_least(Phase::Resolved);
        Self {
            flower: true,
            greeting: pc.is_at_least(Phase::Greeting) && !resolved,
            prompt: pc.is_at_least(Phase::Prompt) && !resolved,
            celebration: resolved,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    seed: u64,
    rng: Pcg32,
    phases: PhaseController,
    runaway: RunawayTracker,
    now_ms: f64,
}

impl Session {
    pub fn new(config: &Config, seed: u64) -> Self {
        log::info!("Session started with seed {seed}");
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phases: PhaseController::new(&config.phases),
            runaway: RunawayTracker::new(config.evasion.clone(), config.tease.clone()),
            now_ms: 0.0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.phases.current_phase()
    }

    pub fn phases(&self) -> &PhaseController {
        &self.phases
    }

    pub fn runaway(&self) -> &RunawayTracker {
        &self.runaway
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::for_controller(&self.phases)
    }

    /// Advance the session clock (ms since start) and fire due timers
    pub fn advance(&mut self, now_ms: f64) -> Phase {
        self.now_ms = self.now_ms.max(now_ms);
        self.phases.advance(self.now_ms)
    }

    /// Pointer tracking only runs while the buttons are on screen
    fn tracking(&self) -> bool {
        self.phase() == Phase::Prompt && !self.phases.is_torn_down()
    }

    pub fn pointer_move(
        &mut self,
        pointer: Point,
        element: Option<&Rect>,
        anchor: Option<&Rect>,
        viewport: Size,
    ) -> Option<Relocation> {
        if !self.tracking() {
            return None;
        }
        self.runaway.on_pointer_move(
            &mut self.rng,
            pointer,
            element,
            anchor,
            viewport,
            self.now_ms,
        )
    }

    /// Click or touch on the No button itself
    pub fn press_runaway(
        &mut self,
        element: Option<&Rect>,
        anchor: Option<&Rect>,
        viewport: Size,
    ) -> Option<Relocation> {
        if !self.tracking() {
            return None;
        }
        self.runaway
            .request_relocation(&mut self.rng, element, anchor, viewport, self.now_ms)
    }

    pub fn tease(&self) -> Option<&Tease> {
        if !self.tracking() {
            return None;
        }
        self.runaway.tease_visible(self.now_ms)
    }

    /// The Yes button
    pub fn accept(&mut self) {
        self.phases.on_accept();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&PhaseChange) + 'static) -> SubscriptionId {
        self.phases.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.phases.unsubscribe(id)
    }

    pub fn teardown(&mut self) {
        log::info!(
            "Session torn down in {} after {} runaway attempts",
            self.phase().label(),
            self.runaway.state().attempt_count
        );
        self.phases.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const VIEWPORT: Size = Size::new(1280.0, 720.0);

    fn buttons() -> (Rect, Rect) {
        (
            Rect::new(560.0, 400.0, 100.0, 48.0),
            Rect::new(680.0, 400.0, 100.0, 48.0),
        )
    }

    #[test]
    fn test_visibility_follows_phase() {
        let mut session = Session::new(&Config::default(), 1);
        assert_eq!(
            session.visibility(),
            Visibility {
                flower: true,
                ..Visibility::default()
            }
        );

        session.advance(3000.0);
        let v = session.visibility();
        assert!(v.greeting && !v.prompt);

        session.advance(5000.0);
        let v = session.visibility();
        assert!(v.greeting && v.prompt && !v.celebration);

        session.accept();
        let v = session.visibility();
        assert!(v.flower && v.celebration && !v.prompt && !v.greeting);
    }

    #[test]
    fn test_pointer_ignored_before_prompt() {
        let mut session = Session::new(&Config::default(), 2);
        let (yes, no) = buttons();
        session.advance(4000.0);
        let pointer = no.center();
        assert!(
            session
                .pointer_move(pointer, Some(&no), Some(&yes), VIEWPORT)
                .is_none()
        );
        assert_eq!(session.runaway().state().attempt_count, 0);
    }

    #[test]
    fn test_runaway_during_prompt_then_stops_after_accept() {
        let mut session = Session::new(&Config::default(), 3);
        let (yes, no) = buttons();
        session.advance(5000.0);

        let r = session
            .pointer_move(no.center() + Vec2::new(5.0, 5.0), Some(&no), Some(&yes), VIEWPORT)
            .unwrap();
        assert!(r.position.is_some());
        assert!(session.tease().is_some());

        session.advance(6000.0);
        session.accept();
        assert_eq!(session.phase(), Phase::Resolved);
        assert!(
            session
                .press_runaway(Some(&no), Some(&yes), VIEWPORT)
                .is_none()
        );
        assert!(session.tease().is_none());
    }

    #[test]
    fn test_same_seed_same_moves() {
        let run = |seed| {
            let mut session = Session::new(&Config::default(), seed);
            let (yes, mut no) = buttons();
            let mut out = Vec::new();
            for i in 0..5 {
                session.advance(5000.0 + i as f64 * 600.0);
                let r = session.press_runaway(Some(&no), Some(&yes), VIEWPORT).unwrap();
                let pos = r.position.unwrap();
                no = Rect::from_origin(pos, no.size());
                out.push(pos);
            }
            out
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_teardown_freezes_phase() {
        let mut session = Session::new(&Config::default(), 4);
        session.advance(1000.0);
        session.teardown();
        session.advance(9000.0);
        assert_eq!(session.phase(), Phase::Intro);
    }
}
