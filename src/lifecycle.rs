//! Spawn scheduling and per-frame plane updates.
//!
//! [`LifecycleManager`] owns every live [`Plane`]. Each call to
//! [`update`](LifecycleManager::update) is one frame:
//!
//! 1. **Spawn**: if more than `spawn_interval` seconds passed since the last
//!    burst, fire one burst of `branches` planes at evenly spaced angles.
//!    At most one burst per frame, however long the frame took.
//! 2. **Animate**: for every plane, in creation order, recompute age,
//!    opacity and scale, then apply the radius step.
//! 3. **Retire**: planes at or below the removal threshold are dropped after
//!    the pass and reported so the renderer can free their GPU bindings.
//!
//! # Example
//!
//! ```ignore
//! let pool = TexturePool::procedural(8);
//! let mut lifecycle = LifecycleManager::new(SpawnConfig::default(), TextureCycler::new(pool)?)?;
//!
//! for now in [0.0, 0.5, 0.9] {
//!     let report = lifecycle.update(now);
//!     println!("+{} -{}", report.spawned, report.retired.len());
//! }
//! assert_eq!(lifecycle.len(), 5);
//! ```

use crate::config::SpawnConfig;
use crate::error::MandalaError;
use crate::plane::{Plane, PlaneFactory, RetiredPlane};
use crate::textures::TextureCycler;

/// What happened during one [`LifecycleManager::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Clock value the frame ran at.
    pub now: f32,
    /// Planes created this frame (0 or `branches`).
    pub spawned: usize,
    /// Planes removed this frame, in creation order.
    pub retired: Vec<RetiredPlane>,
    /// `false` when the tick did not advance time and the frame was skipped.
    pub advanced: bool,
}

/// Spawn scheduler and per-frame updater for the plane field.
#[derive(Debug)]
pub struct LifecycleManager {
    config: SpawnConfig,
    cycler: TextureCycler,
    /// Creation order, which is also strictly decreasing priority order.
    live: Vec<Plane>,
    last_spawn_time: f32,
    next_priority: i32,
    last_tick: Option<f32>,
    total_spawned: u64,
    total_retired: u64,
}

impl LifecycleManager {
    /// Create a manager with no live planes.
    ///
    /// Fails with [`MandalaError::InvalidConfig`] if the config does not
    /// validate.
    pub fn new(config: SpawnConfig, cycler: TextureCycler) -> Result<Self, MandalaError> {
        config.validate()?;
        Ok(Self {
            config,
            cycler,
            live: Vec::new(),
            last_spawn_time: 0.0,
            next_priority: 0,
            last_tick: None,
            total_spawned: 0,
            total_retired: 0,
        })
    }

    /// Run one frame at clock time `now`.
    ///
    /// Ticks that do not move past the previous tick are ignored so that
    /// plane ages strictly increase between processed frames.
    pub fn update(&mut self, now: f32) -> FrameReport {
        let first_frame = match self.last_tick {
            Some(last) if now <= last => {
                // A held tick is a paused clock; only going backwards is suspect
                if now < last {
                    log::warn!("Ignoring clock tick {now:.4}s, before previous {last:.4}s");
                } else {
                    log::trace!("Clock held at {now:.4}s, skipping update");
                }
                return FrameReport {
                    now,
                    ..Default::default()
                };
            }
            Some(_) => false,
            None => true,
        };
        self.last_tick = Some(now);

        let mut spawned = 0;
        if first_frame && self.config.initial_burst {
            spawned = self.spawn_burst(now, now);
        } else if now - self.last_spawn_time > self.config.spawn_interval {
            spawned = self.spawn_burst(now, self.burst_timestamp(now));
        }

        self.animate(now);
        let retired = self.retire();

        FrameReport {
            now,
            spawned,
            retired,
            advanced: true,
        }
    }

    /// Moment a due burst is stamped with: when it fell due, but never more
    /// than one interval before `now`.
    fn burst_timestamp(&self, now: f32) -> f32 {
        let due = self.last_spawn_time + self.config.spawn_interval;
        due.max(now - self.config.spawn_interval).min(now)
    }

    fn spawn_burst(&mut self, now: f32, stamp: f32) -> usize {
        // Config was validated in `new`, so every arm gets a plane
        let spawned = self.config.branches as usize;
        for i in 0..self.config.branches {
            let angle = self.config.arm_angle(i);
            let texture = self.cycler.next();
            let plane = PlaneFactory::spawn(angle, texture, self.next_priority, stamp, &self.config);
            self.live.push(plane);
            self.next_priority -= 1;
        }
        self.last_spawn_time = now;
        self.total_spawned += spawned as u64;
        log::debug!(
            "Burst of {spawned} planes at {now:.3}s (stamped {stamp:.3}s), {} live",
            self.live.len()
        );
        spawned
    }

    fn animate(&mut self, now: f32) {
        let config = &self.config;
        for plane in &mut self.live {
            let passed = now - plane.creation_time();
            plane.age = passed;
            plane.opacity = config.opacity_at(passed);
            // Scale reads the radius from before this frame's step
            plane.scale = config.scale_for(plane.radius);
            plane.radius += config.radius_step(passed);
        }
    }

    fn retire(&mut self) -> Vec<RetiredPlane> {
        let threshold = self.config.removal_threshold;
        let mut retired = Vec::new();
        self.live.retain(|plane| {
            if plane.radius <= threshold {
                retired.push(RetiredPlane::from(plane));
                false
            } else {
                true
            }
        });
        if !retired.is_empty() {
            self.total_retired += retired.len() as u64;
            log::debug!("Retired {} planes, {} live", retired.len(), self.live.len());
        }
        retired
    }

    /// Live planes in creation order.
    pub fn live(&self) -> &[Plane] {
        &self.live
    }

    /// Number of live planes.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no planes are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// The validated configuration.
    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Clock time of the last burst.
    pub fn last_spawn_time(&self) -> f32 {
        self.last_spawn_time
    }

    /// Priority the next spawned plane will receive.
    pub fn next_priority(&self) -> i32 {
        self.next_priority
    }

    /// Planes spawned since construction.
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// Planes retired since construction.
    pub fn total_retired(&self) -> u64 {
        self.total_retired
    }

    /// The texture cycler feeding new planes.
    pub fn cycler(&self) -> &TextureCycler {
        &self.cycler
    }
}
