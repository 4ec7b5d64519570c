//! Stage geometry and window↔stage coordinate mapping.
//!
//! Stage coordinates: origin at center, x right-positive, y up-positive.
//! Window (screen) coordinates: origin top-left, y down-positive.

/// Default stage width in stage units (16:9).
pub const STAGE_WIDTH: f64 = 480.0;
/// Default stage height in stage units.
pub const STAGE_HEIGHT: f64 = 270.0;

/// Logical stage dimensions for a project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for StageSize {
    fn default() -> Self {
        Self {
            width: STAGE_WIDTH,
            height: STAGE_HEIGHT,
        }
    }
}

impl StageSize {
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// True when a stage-coordinate point lies inside the stage rect.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x.abs() <= self.half_width() && y.abs() <= self.half_height()
    }
}

/// Map a window pixel position onto the stage plane. The stage is
/// letterboxed into `(window_w, window_h)` preserving aspect; returns
/// `None` when the pixel falls outside the stage display area.
pub fn window_to_stage(
    stage: StageSize,
    window_w: u32,
    window_h: u32,
    px: f64,
    py: f64,
) -> Option<(f64, f64)> {
    if window_w == 0 || window_h == 0 {
        return None;
    }
    let scale = (window_w as f64 / stage.width).min(window_h as f64 / stage.height);
    let view_w = stage.width * scale;
    let view_h = stage.height * scale;
    let off_x = (window_w as f64 - view_w) / 2.0;
    let off_y = (window_h as f64 - view_h) / 2.0;

    let local_x = px - off_x;
    let local_y = py - off_y;
    if local_x < 0.0 || local_y < 0.0 || local_x > view_w || local_y > view_h {
        return None;
    }
    // Center the origin and flip y to up-positive.
    let sx = local_x / scale - stage.half_width();
    let sy = stage.half_height() - local_y / scale;
    Some((sx, sy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_center_and_corners() {
        let stage = StageSize::default();
        // Window exactly 2x the stage, no letterbox.
        assert_eq!(window_to_stage(stage, 960, 540, 480.0, 270.0), Some((0.0, 0.0)));
        assert_eq!(window_to_stage(stage, 960, 540, 0.0, 0.0), Some((-240.0, 135.0)));
        assert_eq!(window_to_stage(stage, 960, 540, 960.0, 540.0), Some((240.0, -135.0)));
    }

    #[test]
    fn letterbox_bars_are_off_stage() {
        let stage = StageSize::default();
        // Tall window: vertical bars above and below the 16:9 view.
        assert_eq!(window_to_stage(stage, 480, 500, 240.0, 10.0), None);
        assert!(window_to_stage(stage, 480, 500, 240.0, 250.0).is_some());
    }

    #[test]
    fn contains_uses_half_extents() {
        let stage = StageSize::default();
        assert!(stage.contains(240.0, 135.0));
        assert!(!stage.contains(240.1, 0.0));
    }
}
