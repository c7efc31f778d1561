//! Animation module
//!
//! Time-based opacity animations used for slide crossfades. Every value is
//! sampled against an explicit `Instant` so the owner decides what "now" is.

use std::time::{Duration, Instant};

use crate::catalog::SlideId;

/// Easing function type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EasingFunction {
    /// Linear interpolation
    Linear,
    /// Half cosine wave, slow at both ends
    Swing,
    /// Smooth ease-out (deceleration)
    EaseOut,
    /// Smooth ease-in-out
    EaseInOut,
}

impl EasingFunction {
    /// Apply the easing function to a value t in [0, 1]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,

            EasingFunction::Swing => 0.5 - (t * std::f32::consts::PI).cos() / 2.0,

            EasingFunction::EaseOut => {
                // Cubic ease-out: 1 - (1 - t)^3
                1.0 - (1.0 - t).powi(3)
            }

            EasingFunction::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "swing" | "default" => Some(Self::Swing),
            "ease_out" | "easeout" | "ease-out" => Some(Self::EaseOut),
            "ease_in_out" | "easeinout" | "ease-in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Swing => "swing",
            Self::EaseOut => "ease_out",
            Self::EaseInOut => "ease_in_out",
        }
    }
}

/// A single animation instance
#[derive(Debug, Clone)]
pub struct Animation {
    /// Start value
    pub start: f32,
    /// End value
    pub end: f32,
    /// Animation duration
    pub duration: Duration,
    /// When the animation started
    pub start_time: Instant,
    /// Easing function to use
    pub easing: EasingFunction,
}

impl Animation {
    pub fn new(start: f32, end: f32, duration: Duration, easing: EasingFunction, now: Instant) -> Self {
        Self {
            start,
            end,
            duration,
            start_time: now,
            easing,
        }
    }

    /// Animated value at `now`
    pub fn value_at(&self, now: Instant) -> f32 {
        if self.is_complete_at(now) {
            return self.end;
        }

        let elapsed = now.saturating_duration_since(self.start_time);
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.start + (self.end - self.start) * self.easing.apply(t)
    }

    pub fn is_complete_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start_time) >= self.duration
    }

    /// Continue from the current value towards a new target
    pub fn retarget(&mut self, new_end: f32, new_duration: Duration, now: Instant) {
        self.start = self.value_at(now);
        self.end = new_end;
        self.duration = new_duration;
        self.start_time = now;
    }
}

/// Slides whose fades finished during one [`Crossfade::advance`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FadeProgress {
    pub shown: Option<SlideId>,
    pub hidden: Vec<SlideId>,
}

/// Tracks the incoming slide's fade-in and any outgoing fade-outs.
#[derive(Debug, Clone)]
pub struct Crossfade {
    easing: EasingFunction,
    incoming: Option<(SlideId, Animation)>,
    outgoing: Vec<(SlideId, Animation)>,
}

impl Crossfade {
    pub fn new(easing: EasingFunction) -> Self {
        Self {
            easing,
            incoming: None,
            outgoing: Vec::new(),
        }
    }

    pub fn set_easing(&mut self, easing: EasingFunction) {
        self.easing = easing;
    }

    /// Start fading `slide` in. A slide that was fading out resumes from its
    /// current opacity.
    pub fn fade_in(&mut self, slide: SlideId, duration: Duration, now: Instant) {
        let mut from = self.take_outgoing(slide).map_or(0.0, |a| a.value_at(now));
        if let Some((previous, anim)) = self.incoming.take() {
            if previous == slide {
                from = anim.value_at(now);
            } else {
                self.push_outgoing(previous, anim, duration, now);
            }
        }
        self.incoming = Some((slide, Animation::new(from, 1.0, duration, self.easing, now)));
    }

    /// Start fading `slide` out from whatever opacity it has now.
    pub fn fade_out(&mut self, slide: SlideId, duration: Duration, now: Instant) {
        match self.incoming.take() {
            Some((incoming, anim)) if incoming == slide => {
                self.push_outgoing(slide, anim, duration, now);
            }
            other => {
                self.incoming = other;
                if self.outgoing.iter().all(|(id, _)| *id != slide) {
                    self.outgoing
                        .push((slide, Animation::new(1.0, 0.0, duration, self.easing, now)));
                }
            }
        }
    }

    fn push_outgoing(&mut self, slide: SlideId, mut anim: Animation, duration: Duration, now: Instant) {
        anim.retarget(0.0, duration, now);
        self.outgoing.push((slide, anim));
    }

    fn take_outgoing(&mut self, slide: SlideId) -> Option<Animation> {
        let pos = self.outgoing.iter().position(|(id, _)| *id == slide)?;
        Some(self.outgoing.remove(pos).1)
    }

    /// Drop any fade for `slide` without reporting completion.
    pub fn cancel(&mut self, slide: SlideId) {
        if self.incoming.as_ref().is_some_and(|(id, _)| *id == slide) {
            self.incoming = None;
        }
        self.outgoing.retain(|(id, _)| *id != slide);
    }

    pub fn clear(&mut self) {
        self.incoming = None;
        self.outgoing.clear();
    }

    /// Retire finished fades and report which slides completed.
    pub fn advance(&mut self, now: Instant) -> FadeProgress {
        let mut progress = FadeProgress::default();

        if let Some((slide, anim)) = &self.incoming {
            if anim.is_complete_at(now) {
                progress.shown = Some(*slide);
                self.incoming = None;
            }
        }

        self.outgoing.retain(|(slide, anim)| {
            let done = anim.is_complete_at(now);
            if done {
                progress.hidden.push(*slide);
            }
            !done
        });

        progress
    }

    /// Opacity of a slide that is currently fading, if any.
    pub fn opacity(&self, slide: SlideId, now: Instant) -> Option<f32> {
        if let Some((id, anim)) = &self.incoming {
            if *id == slide {
                return Some(anim.value_at(now));
            }
        }
        self.outgoing
            .iter()
            .find(|(id, _)| *id == slide)
            .map(|(_, anim)| anim.value_at(now))
    }

    pub fn fading_out(&self) -> impl Iterator<Item = SlideId> + '_ {
        self.outgoing.iter().map(|(id, _)| *id)
    }

    pub fn is_active(&self) -> bool {
        self.incoming.is_some() || !self.outgoing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: SlideId = SlideId { gallery: 0, index: 0 };
    const B: SlideId = SlideId { gallery: 0, index: 1 };

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::Swing,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
        }
        assert!((EasingFunction::Swing.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn animation_samples_against_given_instant() {
        let t0 = Instant::now();
        let anim = Animation::new(0.0, 1.0, ms(400), EasingFunction::Linear, t0);

        assert!((anim.value_at(t0 + ms(100)) - 0.25).abs() < 1e-3);
        assert!(!anim.is_complete_at(t0 + ms(399)));
        assert_eq!(anim.value_at(t0 + ms(500)), 1.0);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let t0 = Instant::now();
        let mut fade = Crossfade::new(EasingFunction::Swing);
        fade.fade_in(A, Duration::ZERO, t0);

        assert_eq!(fade.advance(t0).shown, Some(A));
        assert!(!fade.is_active());
    }

    #[test]
    fn crossfade_reports_both_sides() {
        let t0 = Instant::now();
        let mut fade = Crossfade::new(EasingFunction::Linear);
        fade.fade_out(A, ms(200), t0);
        fade.fade_in(B, ms(400), t0);

        let mid = fade.advance(t0 + ms(250));
        assert_eq!(mid.hidden, vec![A]);
        assert_eq!(mid.shown, None);
        assert!((fade.opacity(B, t0 + ms(200)).unwrap_or_default() - 0.5).abs() < 1e-3);

        let end = fade.advance(t0 + ms(400));
        assert_eq!(end.shown, Some(B));
    }

    #[test]
    fn fading_in_slide_can_reverse() {
        let t0 = Instant::now();
        let mut fade = Crossfade::new(EasingFunction::Linear);
        fade.fade_in(A, ms(400), t0);
        fade.fade_out(A, ms(400), t0 + ms(200));

        let opacity = fade.opacity(A, t0 + ms(200)).unwrap_or_default();
        assert!((opacity - 0.5).abs() < 1e-3);
        assert_eq!(fade.fading_out().collect::<Vec<_>>(), vec![A]);
    }

    #[test]
    fn cancel_drops_without_completion() {
        let t0 = Instant::now();
        let mut fade = Crossfade::new(EasingFunction::Linear);
        fade.fade_in(A, ms(10), t0);
        fade.cancel(A);

        assert_eq!(fade.advance(t0 + ms(20)), FadeProgress::default());
    }
}
