//! Renderer contract, consumed only. The engine hands the compositor a
//! read-only view of entity state between ticks; these calls are the
//! narrow surface the compositor needs back from the host.

/// Opaque decoded-image handle issued by the asset provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Destination rectangle in stage coordinates (center origin, y-up);
/// `x, y` name the rect center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlipState {
    pub horizontal: bool,
    pub vertical: bool,
}

pub trait RendererBackend: Send {
    fn texture_size(&self, handle: TextureHandle) -> (f64, f64);
    fn draw_texture_rotated(
        &mut self,
        handle: TextureHandle,
        dst: StageRegion,
        angle_deg: f64,
        center: (f64, f64),
        flip: FlipState,
    );
    /// `color` is `#RRGGBB`.
    fn draw_text(&mut self, font: &str, text: &str, color: &str, dst: StageRegion);
    fn present(&mut self);
}

/// Headless renderer: accepts everything, draws nothing. Every texture
/// reports a 1x1 size so layout math stays finite.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RendererBackend for NullRenderer {
    fn texture_size(&self, _handle: TextureHandle) -> (f64, f64) {
        (1.0, 1.0)
    }

    fn draw_texture_rotated(
        &mut self,
        _handle: TextureHandle,
        _dst: StageRegion,
        _angle_deg: f64,
        _center: (f64, f64),
        _flip: FlipState,
    ) {
    }

    fn draw_text(&mut self, _font: &str, _text: &str, _color: &str, _dst: StageRegion) {}

    fn present(&mut self) {}
}
