//! Cancellable parameter interpolation
//!
//! A [`Tweener`] animates scalar values over time on named channels. Each
//! channel is advanced by an explicit [`Tweener::step`] once per frame and
//! reports values through callbacks that receive the caller's context, so the
//! callbacks can reach the effects they animate without shared ownership.
//!
//! Starting a channel that is already running replaces it; the replaced
//! animation never reports completion.

/// Elapsed time for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeStep {
    /// Seconds, multiplied by the clock's time scale.
    pub delta: f32,
    /// Wall-clock seconds.
    pub unscaled_delta: f32,
}

impl TimeStep {
    /// A step where scaled and unscaled time agree.
    pub fn new(delta: f32) -> Self {
        Self {
            delta,
            unscaled_delta: delta,
        }
    }

    /// A step whose scaled delta is `delta * time_scale`.
    pub fn scaled(delta: f32, time_scale: f32) -> Self {
        Self {
            delta: delta * time_scale,
            unscaled_delta: delta,
        }
    }
}

/// Turns raw frame durations into [`TimeStep`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    time_scale: f32,
    elapsed: f64,
    unscaled_elapsed: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            elapsed: 0.0,
            unscaled_elapsed: 0.0,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the multiplier for scaled time. Negative values clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Scaled seconds since the clock started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn unscaled_elapsed(&self) -> f64 {
        self.unscaled_elapsed
    }

    /// Advance by `delta_time` wall-clock seconds.
    pub fn advance(&mut self, delta_time: f64) -> TimeStep {
        let step = TimeStep::scaled(delta_time as f32, self.time_scale);
        self.elapsed += f64::from(step.delta);
        self.unscaled_elapsed += delta_time;
        step
    }
}

/// Which clock a channel counts down with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeMode {
    #[default]
    Scaled,
    Unscaled,
}

type ValueCallback<C> = Box<dyn FnMut(&mut C, f32)>;
type FinishCallback<C> = Box<dyn FnOnce(&mut C)>;

/// Description of one animation, handed to [`Tweener::start`].
pub struct Tween<C> {
    start: f32,
    end: f32,
    duration: f32,
    mode: TimeMode,
    on_value: ValueCallback<C>,
    on_finished: Option<FinishCallback<C>>,
}

impl<C> Tween<C> {
    /// Animate from `start` to `end` over `duration` seconds, reporting each value to `on_value`.
    pub fn new<F>(start: f32, end: f32, duration: f32, on_value: F) -> Self
    where
        F: FnMut(&mut C, f32) + 'static,
    {
        Self {
            start,
            end,
            duration,
            mode: TimeMode::Scaled,
            on_value: Box::new(on_value),
            on_finished: None,
        }
    }

    /// Run `f` once after the final value, unless the animation is cancelled.
    pub fn on_finished<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut C) + 'static,
    {
        self.on_finished = Some(Box::new(f));
        self
    }

    pub fn time_mode(mut self, mode: TimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Count down with wall-clock time.
    pub fn unscaled(self) -> Self {
        self.time_mode(TimeMode::Unscaled)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

struct Channel<C> {
    key: String,
    tween: Tween<C>,
    remaining: f32,
}

impl<C> Channel<C> {
    /// Advance by one frame. Returns `true` once the channel has finished.
    fn advance(&mut self, ctx: &mut C, time: TimeStep) -> bool {
        let tween = &mut self.tween;
        self.remaining -= match tween.mode {
            TimeMode::Scaled => time.delta,
            TimeMode::Unscaled => time.unscaled_delta,
        };

        // Interpolate from the end so a full countdown reports `start`
        let t = if tween.duration > 0.0 {
            (self.remaining / tween.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (tween.on_value)(ctx, lerp(tween.end, tween.start, t));

        if self.remaining < 0.0 || tween.duration <= 0.0 {
            (tween.on_value)(ctx, tween.end);
            if let Some(on_finished) = tween.on_finished.take() {
                on_finished(ctx);
            }
            tracing::debug!(channel = %self.key, "tween finished");
            return true;
        }
        false
    }
}

/// Keyed set of running animations over a context `C`.
pub struct Tweener<C> {
    channels: Vec<Channel<C>>,
}

impl<C> Default for Tweener<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Tweener<C> {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Start `tween` on `key`, cancelling whatever was running there.
    ///
    /// The first value is reported on the next [`Tweener::step`].
    pub fn start(&mut self, key: impl Into<String>, tween: Tween<C>) {
        let key = key.into();
        self.cancel(&key);
        tracing::debug!(
            channel = %key,
            start = tween.start,
            end = tween.end,
            duration = tween.duration,
            "tween started"
        );
        self.channels.push(Channel {
            remaining: tween.duration,
            key,
            tween,
        });
    }

    /// Drop the channel without running its finished callback.
    ///
    /// Returns `false` if nothing was running on `key`.
    pub fn cancel(&mut self, key: &str) -> bool {
        let Some(index) = self.channels.iter().position(|ch| ch.key == key) else {
            return false;
        };
        self.channels.remove(index);
        tracing::debug!(channel = %key, "tween cancelled");
        true
    }

    /// Advance every channel by one frame, in start order.
    pub fn step(&mut self, ctx: &mut C, time: TimeStep) {
        self.channels
            .retain_mut(|channel| !channel.advance(ctx, time));
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.channels.iter().any(|ch| ch.key == key)
    }

    /// Seconds left on `key`, if running.
    pub fn remaining(&self, key: &str) -> Option<f32> {
        self.channels
            .iter()
            .find(|ch| ch.key == key)
            .map(|ch| ch.remaining)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Cancel every channel.
    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
