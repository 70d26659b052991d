//! Runaway relocation search
//!
//! Picks a new top-left position for the evading button. Candidates are
//! sampled at random (uniformly on the first move, as a bounded polar jump
//! afterwards) and accepted as soon as they clear both the anchor and the
//! previous spot. If nothing clears both within the try budget, the best
//! scoring candidate wins, so tiny viewports still get an answer.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::config::EvasionConfig;
use crate::{Point, Rect, Size, clamp_lenient, distance_between, rect_center};

/// Stateless search over candidate positions
#[derive(Debug, Clone)]
pub struct EvasionEngine {
    config: EvasionConfig,
}

impl EvasionEngine {
    pub fn new(config: EvasionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvasionConfig {
        &self.config
    }

    /// Safe interior for the element's top-left corner: (min, max) per axis
    ///
    /// `max < min` when the viewport is too small to fit the padding.
    pub fn safe_bounds(&self, viewport: Size, element: Size) -> (Vec2, Vec2) {
        let pad = self.config.safe_padding;
        (
            Vec2::splat(pad),
            Vec2::new(
                viewport.width - element.width - pad,
                viewport.height - element.height - pad,
            ),
        )
    }

    /// Compute a new top-left position for the evading element
    ///
    /// `previous_center` is the element's center before this move, if it has
    /// moved before. Returns `None` only when no candidate was scored.
    pub fn compute_new_position<R: Rng>(
        &self,
        rng: &mut R,
        viewport: Size,
        element: Size,
        anchor: Option<&Rect>,
        previous_center: Option<Point>,
    ) -> Option<Point> {
        let cfg = &self.config;
        let anchor_center = anchor.map(rect_center);
        let (lo, hi) = self.safe_bounds(viewport, element);
        let half = Vec2::new(element.width / 2.0, element.height / 2.0);

        let mut best: Option<Point> = None;
        let mut best_score = f32::NEG_INFINITY;

        for attempt in 0..cfg.max_tries {
            let candidate = match previous_center {
                Some(prev) => {
                    let angle = rng.random::<f32>() * TAU;
                    let dist = cfg.min_jump_distance
                        + rng.random::<f32>() * (cfg.max_jump_distance - cfg.min_jump_distance);
                    let jumped = prev + Vec2::new(angle.cos(), angle.sin()) * dist;
                    Vec2::new(
                        clamp_lenient(jumped.x, lo.x, hi.x),
                        clamp_lenient(jumped.y, lo.y, hi.y),
                    )
                }
                // First move: anywhere inside the safe interior
                None => Vec2::new(
                    lo.x + rng.random::<f32>() * (hi.x - lo.x),
                    lo.y + rng.random::<f32>() * (hi.y - lo.y),
                ),
            };

            let center = candidate + half;
            let dist_to_anchor = anchor_center.map(|a| distance_between(center, a));
            let dist_to_prev = previous_center.map(|p| distance_between(center, p));

            let score = self.score(dist_to_anchor, dist_to_prev);
            if score > best_score {
                best_score = score;
                best = Some(candidate);
            }

            let clear_of_anchor = dist_to_anchor.is_none_or(|d| d >= cfg.min_dist_from_anchor);
            let clear_of_prev = dist_to_prev.is_none_or(|d| d >= cfg.min_dist_from_prev);
            if clear_of_anchor && clear_of_prev {
                log::trace!("Runaway candidate accepted on try {}", attempt + 1);
                return Some(candidate);
            }
        }

        if best.is_some() {
            log::debug!(
                "No candidate cleared both constraints in {} tries, using best (score {:.1})",
                cfg.max_tries,
                best_score
            );
        } else {
            log::warn!("Runaway search produced no candidate");
        }
        best
    }

    /// Reward distance, penalize intrusion; intrusion on the previous spot counts double
    fn score(&self, dist_to_anchor: Option<f32>, dist_to_prev: Option<f32>) -> f32 {
        let cfg = &self.config;
        let mut score = 0.0;

        if let Some(d) = dist_to_anchor {
            if d < cfg.min_dist_from_anchor {
                score -= cfg.min_dist_from_anchor - d;
            } else {
                score += d * 0.5;
            }
        }

        if let Some(d) = dist_to_prev {
            if d < cfg.min_dist_from_prev {
                score -= (cfg.min_dist_from_prev - d) * 2.0;
            } else {
                score += d;
            }
        }

        score
    }
}

impl Default for EvasionEngine {
    fn default() -> Self {
        Self::new(EvasionConfig::default())
    }
}
