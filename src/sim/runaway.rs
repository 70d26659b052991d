//! Pointer tracking for the runaway button
//!
//! Owns the per-session [`EvasionState`], decides when the pointer is close
//! enough to trigger a move, rate-limits moves, and turns engine output into
//! a [`Relocation`] the renderer can animate.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::evasion::EvasionEngine;
use crate::config::{EvasionConfig, TeaseConfig};
use crate::{Point, Rect, Size, clamp_lenient, distance_between, rect_center};

/// Mutable state of the evading element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvasionState {
    /// Left the inline layout and switched to free positioning
    pub escaped: bool,
    /// Latest target top-left; `None` until the first move
    pub current_position: Option<Point>,
    /// Honored relocation requests so far
    pub attempt_count: u32,
    /// Session time of the last honored request (ms)
    pub last_relocation_ms: Option<f64>,
}

/// Toast shown next to the button after it moves
#[derive(Debug, Clone, PartialEq)]
pub struct Tease {
    pub message: String,
    /// Top-left of the toast
    pub position: Point,
    /// Session time after which the toast should be hidden (ms)
    pub hide_at_ms: f64,
}

/// One honored relocation request
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    /// 1-based attempt number
    pub attempt: u32,
    /// Inline top-left to animate from, set on the escaping move only
    pub start_position: Option<Point>,
    /// New top-left, or `None` if the search had nothing to offer
    pub position: Option<Point>,
    /// Suggested animation length (s)
    pub duration_secs: f32,
    /// Playful tilt (degrees)
    pub rotation_deg: f32,
    pub tease: Option<Tease>,
}

/// Interaction-layer owner of the evading element
#[derive(Debug, Clone)]
pub struct RunawayTracker {
    engine: EvasionEngine,
    tease: TeaseConfig,
    state: EvasionState,
    /// Most recent toast, kept for `tease_visible`
    last_tease: Option<Tease>,
}

impl RunawayTracker {
    pub fn new(evasion: EvasionConfig, tease: TeaseConfig) -> Self {
        Self {
            engine: EvasionEngine::new(evasion),
            tease,
            state: EvasionState::default(),
            last_tease: None,
        }
    }

    pub fn state(&self) -> &EvasionState {
        &self.state
    }

    pub fn engine(&self) -> &EvasionEngine {
        &self.engine
    }

    /// Toast to show at `now_ms`, if one is still up
    pub fn tease_visible(&self, now_ms: f64) -> Option<&Tease> {
        self.last_tease.as_ref().filter(|t| now_ms < t.hide_at_ms)
    }

    /// Whether the pointer is inside the danger radius of the element
    pub fn in_danger(&self, pointer: Point, element: &Rect) -> bool {
        distance_between(pointer, rect_center(element)) < self.engine.config().danger_radius
    }

    /// Handle a pointer move; relocates only when the pointer gets too close
    pub fn on_pointer_move<R: Rng>(
        &mut self,
        rng: &mut R,
        pointer: Point,
        element: Option<&Rect>,
        anchor: Option<&Rect>,
        viewport: Size,
        now_ms: f64,
    ) -> Option<Relocation> {
        let element = element?;
        if !self.in_danger(pointer, element) {
            return None;
        }
        self.request_relocation(rng, Some(element), anchor, viewport, now_ms)
    }

    /// Direct request (click or touch on the element), subject to the rate limit
    ///
    /// Requests inside the throttle window leave the state untouched.
    pub fn request_relocation<R: Rng>(
        &mut self,
        rng: &mut R,
        element: Option<&Rect>,
        anchor: Option<&Rect>,
        viewport: Size,
        now_ms: f64,
    ) -> Option<Relocation> {
        let cfg = self.engine.config();
        if let Some(last) = self.state.last_relocation_ms {
            if now_ms - last < cfg.throttle_ms() {
                log::trace!("Relocation throttled ({:.0} ms since last)", now_ms - last);
                return None;
            }
        }
        self.state.last_relocation_ms = Some(now_ms);

        let size = element.map_or(cfg.fallback_element_size, Rect::size);
        let escaping = !self.state.escaped;

        // First move places freely; later moves jump from where it is now
        let previous_center = if escaping {
            None
        } else {
            element.map(rect_center).or_else(|| {
                self.state
                    .current_position
                    .map(|p| p + Vec2::new(size.width / 2.0, size.height / 2.0))
            })
        };

        let position =
            self.engine
                .compute_new_position(rng, viewport, size, anchor, previous_center);

        let (start_position, duration_secs) = if escaping {
            (element.map(Rect::origin), 0.3)
        } else {
            (None, 0.28 + rng.random::<f32>() * 0.1)
        };
        let rotation_deg = (rng.random::<f32>() - 0.5) * 4.0;

        if let Some(pos) = position {
            self.state.escaped = true;
            self.state.current_position = Some(pos);
        }
        self.state.attempt_count += 1;
        let attempt = self.state.attempt_count;

        let tease = self.make_tease(attempt, position, viewport, now_ms);
        self.last_tease = tease.clone();

        log::debug!(
            "Relocation #{attempt}: {:?} -> {:?}",
            previous_center,
            position
        );

        Some(Relocation {
            attempt,
            start_position: if position.is_some() { start_position } else { None },
            position,
            duration_secs,
            rotation_deg,
            tease,
        })
    }

    /// Cycle messages by attempt; keep the toast on screen near the button
    fn make_tease(
        &self,
        attempt: u32,
        position: Option<Point>,
        viewport: Size,
        now_ms: f64,
    ) -> Option<Tease> {
        let messages = &self.tease.messages;
        if messages.is_empty() {
            return None;
        }
        let index = (attempt.saturating_sub(1) as usize) % messages.len();
        let message = messages[index].clone();

        // Without a new spot the toast stays where the last one was
        let anchor = position
            .or(self.state.current_position)
            .or_else(|| self.last_tease.as_ref().map(|t| t.position))?;

        let margin = self.tease.edge_margin;
        let position = Vec2::new(
            clamp_lenient(anchor.x, margin, viewport.width - self.tease.reserved_width),
            (anchor.y - self.tease.offset_y).max(margin),
        );

        Some(Tease {
            message,
            position,
            hide_at_ms: now_ms + self.tease.visible_ms,
        })
    }
}

impl Default for RunawayTracker {
    fn default() -> Self {
        Self::new(EvasionConfig::default(), TeaseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const VIEWPORT: Size = Size::new(1000.0, 800.0);

    fn inline_no_button() -> Rect {
        Rect::new(520.0, 400.0, 100.0, 48.0)
    }

    fn yes_button() -> Rect {
        Rect::new(400.0, 400.0, 100.0, 48.0)
    }

    #[test]
    fn test_far_pointer_does_nothing() {
        let mut tracker = RunawayTracker::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let no = inline_no_button();

        let pointer = rect_center(&no) + Vec2::new(72.0, 0.0);
        let r = tracker.on_pointer_move(&mut rng, pointer, Some(&no), None, VIEWPORT, 0.0);
        assert!(r.is_none());
        assert_eq!(*tracker.state(), EvasionState::default());
    }

    #[test]
    fn test_first_escape() {
        let mut tracker = RunawayTracker::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let no = inline_no_button();
        let yes = yes_button();

        let pointer = rect_center(&no) + Vec2::new(10.0, 0.0);
        let r = tracker
            .on_pointer_move(&mut rng, pointer, Some(&no), Some(&yes), VIEWPORT, 100.0)
            .unwrap();

        assert_eq!(r.attempt, 1);
        assert_eq!(r.start_position, Some(Vec2::new(520.0, 400.0)));
        assert_eq!(r.duration_secs, 0.3);
        assert!(r.rotation_deg.abs() <= 2.0);

        let state = tracker.state();
        assert!(state.escaped);
        assert_eq!(state.current_position, r.position);
        assert_eq!(state.attempt_count, 1);
        assert_eq!(state.last_relocation_ms, Some(100.0));
    }

    #[test]
    fn test_throttle_ignores_close_requests() {
        let mut tracker = RunawayTracker::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let no = inline_no_button();

        assert!(
            tracker
                .request_relocation(&mut rng, Some(&no), None, VIEWPORT, 0.0)
                .is_some()
        );
        let after_first = tracker.state().clone();

        let moved = Rect::from_origin(after_first.current_position.unwrap(), no.size());
        assert!(
            tracker
                .request_relocation(&mut rng, Some(&moved), None, VIEWPORT, 300.0)
                .is_none()
        );
        assert_eq!(*tracker.state(), after_first);

        let r = tracker
            .request_relocation(&mut rng, Some(&moved), None, VIEWPORT, 500.0)
            .unwrap();
        assert_eq!(r.attempt, 2);
        assert_eq!(r.start_position, None);
        assert!((0.28..0.38).contains(&r.duration_secs));
    }

    #[test]
    fn test_later_moves_jump_from_current_bounds() {
        let mut tracker = RunawayTracker::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut no = inline_no_button();

        for i in 0..10 {
            let now = i as f64 * 500.0;
            let r = tracker
                .request_relocation(&mut rng, Some(&no), None, VIEWPORT, now)
                .unwrap();
            let pos = r.position.unwrap();
            let moved = Rect::from_origin(pos, no.size());
            if i > 0 {
                assert!(distance_between(rect_center(&moved), rect_center(&no)) >= 80.0);
            }
            no = moved;
        }
        assert_eq!(tracker.state().attempt_count, 10);
    }

    #[test]
    fn test_missing_bounds_use_fallback_size() {
        let mut tracker = RunawayTracker::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let r = tracker
            .request_relocation(&mut rng, None, None, VIEWPORT, 0.0)
            .unwrap();
        let pos = r.position.unwrap();
        assert!(pos.x <= 1000.0 - 100.0 - 24.0);
        assert!(pos.y <= 800.0 - 48.0 - 24.0);
        assert_eq!(r.start_position, None);
    }

    #[test]
    fn test_tease_cycles_and_hides() {
        let tease = TeaseConfig {
            messages: vec!["one".into(), "two".into()],
            ..TeaseConfig::default()
        };
        let mut tracker = RunawayTracker::new(EvasionConfig::default(), tease);
        let mut rng = Pcg32::seed_from_u64(6);
        let no = inline_no_button();

        let mut seen = Vec::new();
        for i in 0..3 {
            let r = tracker
                .request_relocation(&mut rng, Some(&no), None, VIEWPORT, i as f64 * 1000.0)
                .unwrap();
            seen.push(r.tease.unwrap().message);
        }
        assert_eq!(seen, vec!["one", "two", "one"]);

        assert!(tracker.tease_visible(2000.0 + 1599.0).is_some());
        assert!(tracker.tease_visible(2000.0 + 1600.0).is_none());
    }

    #[test]
    fn test_tease_position_clamped() {
        let tracker = RunawayTracker::default();
        let t = tracker
            .make_tease(1, Some(Vec2::new(900.0, 20.0)), VIEWPORT, 0.0)
            .unwrap();
        assert_eq!(t.position, Vec2::new(760.0, 10.0));

        let t = tracker
            .make_tease(1, Some(Vec2::new(2.0, 300.0)), VIEWPORT, 0.0)
            .unwrap();
        assert_eq!(t.position, Vec2::new(10.0, 256.0));
    }

    #[test]
    fn test_no_messages_no_tease() {
        let tease = TeaseConfig {
            messages: Vec::new(),
            ..TeaseConfig::default()
        };
        let mut tracker = RunawayTracker::new(EvasionConfig::default(), tease);
        let mut rng = Pcg32::seed_from_u64(7);
        let r = tracker
            .request_relocation(&mut rng, None, None, VIEWPORT, 0.0)
            .unwrap();
        assert!(r.tease.is_none());
    }
}
