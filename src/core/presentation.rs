use std::time::{Duration, Instant};

use super::geometry::Bounds;

/// Whether geometry changes should be smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Direct feedback while a drag or resize is in progress.
    Immediate,
    Animated(Duration),
}

/// Visual state the chrome applies on top of a window's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub opacity: f32,
    pub scale: f32,
    pub offset_y: i32,
    /// False while the window is fading out or hidden; pointer hits pass through.
    pub interactive: bool,
    pub transition: Transition,
}

impl Presentation {
    pub fn new(
        mounting: bool,
        closing: bool,
        minimized: bool,
        gesture_active: bool,
        transition: Duration,
    ) -> Self {
        let (opacity, scale, offset_y, interactive) = if mounting {
            (0.0, 0.95, 4, true)
        } else if closing {
            (0.0, 0.90, 4, false)
        } else if minimized {
            (0.0, 0.75, 24, false)
        } else {
            (1.0, 1.0, 0, true)
        };
        Self {
            opacity,
            scale,
            offset_y,
            interactive,
            transition: if gesture_active {
                Transition::Immediate
            } else {
                Transition::Animated(transition)
            },
        }
    }

    pub fn is_settled(&self) -> bool {
        self.opacity >= 1.0
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[derive(Debug, Clone, Copy)]
struct Tween {
    from: Bounds,
    to: Bounds,
    started: Instant,
    duration: Duration,
}

impl Tween {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    fn sample(&self, now: Instant) -> Bounds {
        self.from.lerp(self.to, ease_out_cubic(self.progress(now)))
    }
}

/// Tracks the on-screen geometry of one window so idle-state changes such as
/// maximize glide into place while drags snap immediately.
#[derive(Debug, Clone, Default)]
pub struct GeometryAnimator {
    shown: Option<Bounds>,
    tween: Option<Tween>,
}

impl GeometryAnimator {
    pub fn follow(&mut self, target: Bounds, transition: Transition, now: Instant) -> Bounds {
        let current = self.displayed(now);
        let Some(current) = current else {
            self.shown = Some(target);
            return target;
        };

        let heading = self.tween.map(|t| t.to).or(self.shown);
        if heading != Some(target) {
            match transition {
                Transition::Immediate => {
                    self.tween = None;
                    self.shown = Some(target);
                }
                Transition::Animated(duration) => {
                    self.tween = Some(Tween {
                        from: current,
                        to: target,
                        started: now,
                        duration,
                    });
                }
            }
        } else if transition == Transition::Immediate && self.tween.is_some() {
            self.tween = None;
            self.shown = Some(target);
        }

        let shown = self.displayed(now).unwrap_or(target);
        if let Some(tween) = self.tween {
            if tween.progress(now) >= 1.0 {
                self.tween = None;
                self.shown = Some(tween.to);
            }
        }
        shown
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    fn displayed(&self, now: Instant) -> Option<Bounds> {
        match self.tween {
            Some(tween) => Some(tween.sample(now)),
            None => self.shown,
        }
    }
}
