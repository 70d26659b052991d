//! Runaway Ask - a phase-scripted question with a No button that runs away
//!
//! Core modules:
//! - `sim`: Deterministic core (phase machine, evasion search, interaction state)
//! - `config`: Data-driven timings and evasion tuning
//!
//! Rendering is left to the host: the core only says which phase is active,
//! what should be visible, and where the evading button should go next.

pub mod config;
pub mod sim;

pub use config::{Config, ConfigError, EvasionConfig, PhaseTimings, TeaseConfig};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A point in viewport pixel space
pub type Point = Vec2;

/// Default tuning constants
pub mod consts {
    /// Pointer proximity that triggers a relocation request (px)
    pub const DANGER_RADIUS: f32 = 72.0;
    /// Minimum margin from any viewport edge (px)
    pub const SAFE_PADDING: f32 = 24.0;
    /// Relocations honored per second
    pub const MAX_MOVES_PER_SECOND: f64 = 2.0;
    /// Minimum distance from the anchor (Yes button) center (px)
    pub const MIN_DIST_FROM_ANCHOR: f32 = 100.0;
    /// Minimum distance from the previous center (px)
    pub const MIN_DIST_FROM_PREV: f32 = 80.0;
    /// Jump radius bounds when a previous position exists (px)
    pub const MIN_JUMP_DISTANCE: f32 = 150.0;
    pub const MAX_JUMP_DISTANCE: f32 = 500.0;
    /// Bounded search attempts
    pub const MAX_TRIES: u32 = 24;
    /// Minimum interval between honored relocations (ms)
    pub const THROTTLE_MS: f64 = 1000.0 / MAX_MOVES_PER_SECOND;

    /// Phase timers, measured from session start (ms)
    pub const GREETING_AT_MS: f64 = 3000.0;
    pub const PROMPT_AT_MS: f64 = 5000.0;

    /// Button size used when the host cannot measure it
    pub const FALLBACK_ELEMENT_WIDTH: f32 = 100.0;
    pub const FALLBACK_ELEMENT_HEIGHT: f32 = 48.0;
}

/// Width/height pair for viewports and elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box, as reported by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect with the given top-left corner and size
    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[inline]
    pub fn origin(&self) -> Point {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Point {
        rect_center(self)
    }
}

/// Euclidean distance between two points
#[inline]
pub fn distance_between(a: Point, b: Point) -> f32 {
    a.distance(b)
}

/// Center of a rect
#[inline]
pub fn rect_center(rect: &Rect) -> Point {
    Vec2::new(rect.left + rect.width / 2.0, rect.top + rect.height / 2.0)
}

/// Clamp that never panics: when `min > max` the lower bound wins
#[inline]
pub fn clamp_lenient(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rect_center() {
        let rect = Rect::new(500.0, 700.0, 100.0, 48.0);
        assert_eq!(rect_center(&rect), Vec2::new(550.0, 724.0));
        assert_eq!(rect.center(), rect_center(&rect));
    }

    #[test]
    fn test_distance_between() {
        let d = distance_between(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_lenient_inverted_bounds() {
        // Empty interval: lower bound wins instead of panicking
        assert_eq!(clamp_lenient(5.0, 24.0, 10.0), 24.0);
        assert_eq!(clamp_lenient(50.0, 24.0, 10.0), 24.0);
        assert_eq!(clamp_lenient(15.0, 10.0, 20.0), 15.0);
    }

    #[test]
    fn test_throttle_derived_from_rate() {
        assert_eq!(consts::THROTTLE_MS, 500.0);
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(
            ax in -5000.0f32..5000.0, ay in -5000.0f32..5000.0,
            bx in -5000.0f32..5000.0, by in -5000.0f32..5000.0,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            prop_assert_eq!(distance_between(a, b), distance_between(b, a));
            prop_assert!(distance_between(a, b) >= 0.0);
        }
    }
}
