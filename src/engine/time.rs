//! Frame timing resource and plugin.
//!
//! [`TimePlugin`] inserts a [`Time`] resource and a `pre_update` system
//! that advances it from the monotonic clock at the start of every frame.
//! Application systems read delta and elapsed time from the resource
//! rather than sampling clocks themselves.

use std::time::Instant;

use crate::engine::app::App;
use crate::engine::error::EcsResult;
use crate::engine::plugin::Plugin;
use crate::engine::systems::{FnSystem, Stage};


/// Name of the system registered by [`TimePlugin`].
pub const TIME_SYSTEM: &str = "time::advance";

/// Frame timing state, updated at the start of each frame.
#[derive(Clone, Copy, Debug)]
pub struct Time {
    /// Seconds elapsed between the two most recent frames.
    pub delta_seconds: f64,

    /// Seconds elapsed since the plugin was built.
    pub elapsed_seconds: f64,

    /// Number of frames advanced so far.
    pub frame_number: u64,

    /// Monotonic timestamp of the most recent advance.
    pub last_update: Instant,
}

impl Time {
    /// Creates a zeroed clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            delta_seconds: 0.0,
            elapsed_seconds: 0.0,
            frame_number: 0,
            last_update: Instant::now(),
        }
    }

    /// Advances the clock to `now`.
    pub fn advance(&mut self, now: Instant) {
        self.delta_seconds = now.duration_since(self.last_update).as_secs_f64();
        self.elapsed_seconds += self.delta_seconds;
        self.frame_number += 1;
        self.last_update = now;
    }

    /// Estimated frames per second based on the last delta.
    pub fn fps(&self) -> f64 {
        if self.delta_seconds > 0.0 {
            1.0 / self.delta_seconds
        } else {
            0.0
        }
    }
}

/// Inserts the [`Time`] resource and its advance system.
pub struct TimePlugin;

impl Plugin for TimePlugin {
    fn name(&self) -> &str {
        "time"
    }

    fn build(&mut self, app: &mut App) -> EcsResult<()> {
        app.insert_resource(Time::new());

        // High priority so the clock advances before anything else in
        // pre_update reads it.
        app.add_system(
            FnSystem::new(TIME_SYSTEM, |app: &mut App, _dt| {
                if let Some(time) = app.resources.get_mut::<Time>() {
                    time.advance(Instant::now());
                }
                Ok(())
            })
            .with_priority(1000),
            Stage::PreUpdate,
        )
    }
}
