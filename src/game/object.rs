//! Falling Objects and the Object Generator
//!
//! One object per call, drawn from the round's random source in a fixed order:
//! kind, horizontal position, fall duration.

use serde::{Deserialize, Serialize};

use crate::core::rng::RandomSource;
use crate::core::timer::{Millis, TimerId};
use crate::game::config::SpawnConfig;

/// Object identifier, unique within an engine (monotonic counter).
pub type ObjectId = u32;

/// What fell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectKind {
    /// Melon: +points
    Fruit = 0,
    /// Bomb: -points, screen shake
    Hazard = 1,
    /// Ice: freezes the clock and the field
    Freeze = 2,
}

impl ObjectKind {
    /// Pick a kind from a uniform draw in [0, 1).
    pub fn from_draw(r: f64, config: &SpawnConfig) -> Self {
        if r > config.freeze_threshold {
            ObjectKind::Freeze
        } else if r > config.hazard_threshold {
            ObjectKind::Hazard
        } else {
            ObjectKind::Fruit
        }
    }
}

/// How an object left the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// Still falling
    #[default]
    Pending,
    /// Tapped
    Hit,
    /// Fell out of the field
    Missed,
}

/// An object currently (or formerly) on the field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FallingObject {
    /// Unique id
    pub id: ObjectId,
    /// Kind
    pub kind: ObjectKind,
    /// Horizontal position, percent of field width
    pub x: u8,
    /// Fall duration in seconds
    pub fall_secs: f64,
    /// Timeline instant the object entered the field
    pub created_at: Millis,
    /// At-most-once resolution flag
    pub resolution: Resolution,
    /// Fall time left while the field is frozen
    pub paused_remaining: Option<Millis>,
    /// Pending expiry timer
    #[serde(skip)]
    pub expiry: Option<TimerId>,
}

impl FallingObject {
    /// Create a pending object.
    pub fn new(id: ObjectId, kind: ObjectKind, x: u8, fall_secs: f64, created_at: Millis) -> Self {
        Self {
            id,
            kind,
            x,
            fall_secs,
            created_at,
            resolution: Resolution::Pending,
            paused_remaining: None,
            expiry: None,
        }
    }

    /// Fall duration in whole milliseconds.
    #[inline]
    pub fn fall_ms(&self) -> Millis {
        (self.fall_secs * 1000.0) as Millis
    }

    /// Can this object still be hit or missed?
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.resolution == Resolution::Pending
    }

    /// Check-and-set the resolution. Returns false if already resolved.
    pub fn resolve(&mut self, resolution: Resolution) -> bool {
        if !self.is_pending() || resolution == Resolution::Pending {
            return false;
        }
        self.resolution = resolution;
        true
    }
}

/// Produce one object from the random source.
pub fn generate_object<R: RandomSource + ?Sized>(
    rng: &mut R,
    id: ObjectId,
    now: Millis,
    config: &SpawnConfig,
) -> FallingObject {
    let kind = ObjectKind::from_draw(rng.next_unit(), config);

    let span = config.max_x.saturating_sub(config.min_x) as f64 + 1.0;
    let offset = (rng.next_unit() * span).floor() as u8;
    let x = config.min_x.saturating_add(offset).min(config.max_x);

    let fall_range = config.max_fall_secs - config.min_fall_secs;
    let fall_secs = config.min_fall_secs + rng.next_unit() * fall_range;

    FallingObject::new(id, kind, x, fall_secs, now)
}
