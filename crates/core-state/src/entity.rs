//! Live per-object state: transform, visuals, pens, dialog, timed-block
//! slots, and the thread states of the scripts running on the object.

use std::collections::BTreeMap;
use std::sync::Arc;

use core_model::ObjectInfo;

use crate::thread::{ScriptThreadState, ThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationMethod {
    #[default]
    Free,
    None,
    Vertical,
    Horizontal,
}

/// Wall contacted by the last bounce test. Kept across frames as a
/// one-frame hysteresis: a second collision with the same side is
/// ignored until the entity has left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionSide {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

/// Color/brightness/transparency effect state. `alpha` is stored as an
/// opacity factor in [0, 1]; the transparency block speaks percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effects {
    pub hue: f64,
    pub brightness: f64,
    pub alpha: f64,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            hue: 0.0,
            brightness: 0.0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenKind {
    Brush,
    Paint,
}

/// Pen state. `stopped` suppresses line emission but the last position
/// keeps tracking the entity, so resuming draws from the current spot,
/// not from where the pen stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PenState {
    pub is_down: bool,
    pub stopped: bool,
    pub last_pos: (f64, f64),
    pub color: String,
}

impl PenState {
    fn new(x: f64, y: f64) -> Self {
        Self {
            is_down: false,
            stopped: false,
            last_pos: (x, y),
            color: "#ff0000".to_owned(),
        }
    }

    /// Track a position change. Returns the segment to emit when the pen
    /// is down and not stopped.
    pub fn track(&mut self, x: f64, y: f64) -> Option<((f64, f64), (f64, f64))> {
        let from = self.last_pos;
        self.last_pos = (x, y);
        (self.is_down && !self.stopped && from != (x, y)).then_some((from, (x, y)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Speak,
    Think,
}

/// Active dialog bubble. `duration_ms == 0` means sticky until replaced
/// or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub text: String,
    pub kind: DialogKind,
    pub start_ms: u64,
    pub duration_ms: u64,
}

/// Frame-stepped move toward a fixed target (`move_xy_time`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMove {
    pub target_x: f64,
    pub target_y: f64,
    pub remaining_frames: u64,
}

/// Frame-stepped move toward a moving target (`locate_object_time`).
/// The target position is re-read every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedMoveToObject {
    pub target_id: String,
    pub remaining_frames: u64,
}

/// Which angle field a timed rotation advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationField {
    Rotation,
    Direction,
}

/// Frame-stepped rotation (`rotate_by_time`, `direction_relative_duration`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedRotation {
    pub field: RotationField,
    pub step_deg: f64,
    pub remaining_frames: u64,
}

/// A live stage object. Originals are created from `ObjectInfo` at load;
/// clones copy the live state of their source and share the `ObjectInfo`.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub name: String,
    /// Authored data, shared with the original for clones.
    pub info: Arc<ObjectInfo>,
    pub is_clone: bool,
    /// For clones, the id of the object they were cloned from; original
    /// entities point at themselves.
    pub original_id: String,

    pub x: f64,
    pub y: f64,
    pub reg_x: f64,
    pub reg_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees, clockwise positive.
    pub rotation: f64,
    /// Movement heading in degrees.
    pub direction: f64,
    pub width: f64,
    pub height: f64,
    pub visible: bool,
    pub rotation_method: RotationMethod,

    pub effects: Effects,
    pub last_collision_side: CollisionSide,
    pub brush: PenState,
    pub paint: PenState,
    pub dialog: Option<Dialog>,

    pub current_costume_id: String,
    /// Live textbox content/colors; `None` for sprites.
    pub text_content: Option<String>,
    pub text_color: String,
    pub text_background_color: String,

    pub timed_move: Option<TimedMove>,
    pub timed_move_to_object: Option<TimedMoveToObject>,
    pub timed_rotation: Option<TimedRotation>,

    /// Thread states of scripts running on this entity, ordered by
    /// dispatch sequence (thread ids are globally monotonic).
    pub threads: BTreeMap<ThreadId, ScriptThreadState>,
}

impl Entity {
    /// Build an original entity from authored data.
    pub fn from_info(info: Arc<ObjectInfo>) -> Self {
        let init = info.init;
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            is_clone: false,
            original_id: info.id.clone(),
            x: init.x,
            y: init.y,
            reg_x: init.reg_x,
            reg_y: init.reg_y,
            scale_x: init.scale_x,
            scale_y: init.scale_y,
            rotation: init.rotation,
            direction: init.direction,
            width: init.width,
            height: init.height,
            visible: init.visible,
            rotation_method: RotationMethod::default(),
            effects: Effects::default(),
            last_collision_side: CollisionSide::None,
            brush: PenState::new(init.x, init.y),
            paint: PenState::new(init.x, init.y),
            dialog: None,
            current_costume_id: info.selected_costume_id.clone(),
            text_content: info.text_style.as_ref().map(|t| t.content.clone()),
            text_color: info
                .text_style
                .as_ref()
                .map(|t| t.font_color.clone())
                .unwrap_or_else(|| "#000000".to_owned()),
            text_background_color: info
                .text_style
                .as_ref()
                .map(|t| t.background_color.clone())
                .unwrap_or_default(),
            timed_move: None,
            timed_move_to_object: None,
            timed_rotation: None,
            threads: BTreeMap::new(),
            info,
        }
    }

    /// Build a clone: live state copied from the source, authored data
    /// shared, scripts not carried (the engine dispatches
    /// `when_clone_start` separately).
    pub fn clone_from(source: &Entity, clone_id: String) -> Self {
        Self {
            id: clone_id,
            is_clone: true,
            original_id: source.original_id.clone(),
            threads: BTreeMap::new(),
            dialog: None,
            timed_move: None,
            timed_move_to_object: None,
            timed_rotation: None,
            info: Arc::clone(&source.info),
            ..source.clone()
        }
    }

    /// Scaled half extents of the bounding box.
    pub fn half_extents(&self) -> (f64, f64) {
        (
            (self.width * self.scale_x).abs() / 2.0,
            (self.height * self.scale_y).abs() / 2.0,
        )
    }

    /// Axis-aligned bounding-box test against a stage point.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        let (hx, hy) = self.half_extents();
        (px - self.x).abs() <= hx && (py - self.y).abs() <= hy
    }

    /// Axis-aligned bounding-box intersection with another entity.
    pub fn intersects(&self, other: &Entity) -> bool {
        let (ahx, ahy) = self.half_extents();
        let (bhx, bhy) = other.half_extents();
        (self.x - other.x).abs() <= ahx + bhx && (self.y - other.y).abs() <= ahy + bhy
    }

    /// Move to a position, tracking both pens. Returned segments are the
    /// lines to append to the world's pen buffer.
    pub fn set_position(&mut self, x: f64, y: f64) -> Vec<((f64, f64), (f64, f64), PenKind)> {
        self.x = x;
        self.y = y;
        let mut lines = Vec::new();
        if let Some((from, to)) = self.brush.track(x, y) {
            lines.push((from, to, PenKind::Brush));
        }
        if let Some((from, to)) = self.paint.track(x, y) {
            lines.push((from, to, PenKind::Paint));
        }
        lines
    }

    /// Current costume position in the authored list.
    pub fn costume_index(&self) -> Option<usize> {
        self.info.costume_index(&self.current_costume_id)
    }

    /// Request termination of every thread on this entity.
    pub fn terminate_all_threads(&mut self) {
        for state in self.threads.values_mut() {
            state.terminate_requested = true;
        }
    }
}

pub use normalize::normalize_degrees;

mod normalize {
    /// Normalize an angle to [0, 360).
    pub fn normalize_degrees(deg: f64) -> f64 {
        let normalized = deg % 360.0;
        if normalized < 0.0 {
            normalized + 360.0
        } else {
            normalized
        }
    }
}
