//! Text shape with a wrap width.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id, to_local};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// A block of text wrapped at `width`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Top-left corner of the text box.
    pub position: Point,
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Wrap width. Resizing a text box changes this instead of scaling glyphs.
    pub width: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    /// `stroke_color` is the glyph color.
    pub style: ShapeStyle,
    /// Layout size (width, height) computed by the renderer.
    /// If None, approximate bounds are used.
    #[serde(skip)]
    cached_size: RwLock<Option<(f64, f64)>>,
}

impl Clone for Text {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            position: self.position,
            content: self.content.clone(),
            font_size: self.font_size,
            width: self.width,
            rotation: self.rotation,
            style: self.style.clone(),
            cached_size: RwLock::new(self.cached_size()),
        }
    }
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    /// Text boxes never get narrower than this.
    pub const MIN_WIDTH: f64 = 5.0;
    const LINE_HEIGHT: f64 = 1.2;

    pub fn new(position: Point, content: impl Into<String>, width: f64) -> Self {
        Self {
            id: new_id(),
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            width: width.max(Self::MIN_WIDTH),
            rotation: 0.0,
            style: ShapeStyle::default(),
            cached_size: RwLock::new(None),
        }
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace the content and drop the stale layout size.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.invalidate_cache();
    }

    /// Set the wrap width, clamped to [`Text::MIN_WIDTH`].
    pub fn set_width(&mut self, width: f64) {
        self.width = width.max(Self::MIN_WIDTH);
        self.invalidate_cache();
    }

    /// Set the cached layout size (computed by the renderer).
    pub fn set_cached_size(&self, width: f64, height: f64) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = Some((width, height));
        }
    }

    pub fn cached_size(&self) -> Option<(f64, f64)> {
        self.cached_size.read().ok().and_then(|guard| *guard)
    }

    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = None;
        }
    }

    /// Rough height: wraps by an average glyph advance of 0.6em.
    fn approximate_height(&self) -> f64 {
        let chars_per_line = (self.width / (self.font_size * 0.6)).floor().max(1.0) as usize;
        let lines: usize = self
            .content
            .split('\n')
            .map(|line| line.chars().count().div_ceil(chars_per_line).max(1))
            .sum();
        lines as f64 * self.font_size * Self::LINE_HEIGHT
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let height = self
            .cached_size()
            .map(|(_, h)| h)
            .unwrap_or_else(|| self.approximate_height());
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let bounds = self.bounds();
        let local = to_local(point, bounds.center(), self.rotation);
        bounds.inflate(tolerance, tolerance).contains(local)
    }

    fn to_path(&self) -> BezPath {
        let bounds = self.bounds();
        let path = bounds.to_path(0.1);
        if self.rotation == 0.0 {
            path
        } else {
            Affine::rotate_about(self.rotation, bounds.center()) * path
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    /// Horizontal scale turns into a new wrap width; the glyphs keep their size.
    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let scale_x = affine.as_coeffs()[0].abs();
        if (scale_x - 1.0).abs() > f64::EPSILON {
            self.set_width(self.width * scale_x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = Text::new(Point::new(50.0, 80.0), "Some text here", 200.0);
        assert_eq!(text.content, "Some text here");
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cached_size_drives_bounds() {
        let text = Text::new(Point::ZERO, "hello", 200.0);
        text.set_cached_size(180.0, 30.0);
        let bounds = text.bounds();
        assert!((bounds.width() - 200.0).abs() < f64::EPSILON);
        assert!((bounds.height() - 30.0).abs() < f64::EPSILON);

        let cloned = text.clone();
        assert_eq!(cloned.cached_size(), Some((180.0, 30.0)));
    }

    #[test]
    fn test_approximate_height_wraps() {
        let short = Text::new(Point::ZERO, "hi", 200.0);
        let long = Text::new(Point::ZERO, "x".repeat(100), 200.0);
        assert!(long.bounds().height() > short.bounds().height());
    }

    #[test]
    fn test_scale_changes_width_only() {
        let mut text = Text::new(Point::new(10.0, 10.0), "abc", 200.0);
        text.transform(Affine::scale_non_uniform(0.5, 3.0));
        assert!((text.width - 100.0).abs() < f64::EPSILON);
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_width_clamped() {
        let mut text = Text::new(Point::ZERO, "abc", 200.0);
        text.set_width(1.0);
        assert!((text.width - Text::MIN_WIDTH).abs() < f64::EPSILON);
    }
}
