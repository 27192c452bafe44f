//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer};
use crate::text_editor::TextEditState;
use inkboard_core::shapes::{
    Arrow, Composite, Image, Line, Shape, ShapeId, ShapeStyle, ShapeTrait, Text,
};
use inkboard_core::stage::Layer;
use inkboard_core::transformer::{HANDLE_SIZE, Handle, HandleKind, Transformer};
use kurbo::{Affine, BezPath, Cap, Join, Point, Rect, Shape as KurboShape, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Blob, BlendMode, Brush, Color, Compose, Fill, ImageBrush, Mix};
use std::collections::HashMap;
use std::sync::Arc;
use vello::Scene;

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    scene: Scene,
    selection_color: Color,
    /// Erase strokes are clipped to this.
    stage_bounds: Rect,
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
    /// Decoded images keyed by shape, so each image is decoded once.
    image_cache: HashMap<ShapeId, peniko::ImageData>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a Parley BoundingBox to a Kurbo Rect.
fn convert_rect(rect: &parley::BoundingBox) -> Rect {
    Rect::new(rect.x0, rect.y0, rect.x1, rect.y1)
}

impl VelloRenderer {
    /// Create a renderer using the system font collection.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            selection_color: Color::from_rgba8(0, 161, 255, 255),
            stage_bounds: Rect::ZERO,
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            image_cache: HashMap::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Font and layout contexts, for driving a [`TextEditState`].
    pub fn contexts_mut(&mut self) -> (&mut FontContext, &mut LayoutContext<Brush>) {
        (&mut self.font_cx, &mut self.layout_cx)
    }

    /// Number of decoded images held.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    fn render_shape(&mut self, shape: &Shape, transform: Affine) {
        match shape {
            Shape::Circle(_) | Shape::Rectangle(_) => {
                self.render_path(&shape.to_path(), shape.style(), transform);
            }
            Shape::Line(line) => self.render_line(line, transform),
            Shape::Arrow(arrow) => self.render_arrow(arrow, transform),
            Shape::Text(text) => self.render_text(text, transform),
            Shape::Image(image) => self.render_image(image, transform),
        }
    }

    /// Fill (if any) then stroke.
    fn render_path(&mut self, path: &BezPath, style: &ShapeStyle, transform: Affine) {
        if let Some(fill_color) = style.fill_with_opacity() {
            self.scene.fill(Fill::NonZero, transform, fill_color, None, path);
        }
        if style.stroke_width > 0.0 {
            let stroke = Stroke::new(style.stroke_width);
            self.scene
                .stroke(&stroke, transform, style.stroke_with_opacity(), None, path);
        }
    }

    /// Freehand strokes. Erase strokes punch through the shapes below
    /// down to the stage.
    fn render_line(&mut self, line: &Line, transform: Affine) {
        let stroke = Stroke::new(line.style.stroke_width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);
        let path = line.to_path();
        match line.mode.composite() {
            Composite::SourceOver => {
                self.scene
                    .stroke(&stroke, transform, line.style.stroke_with_opacity(), None, &path);
            }
            composite @ Composite::DestinationOut => {
                // Only coverage matters under destination-out
                self.scene.push_layer(
                    Fill::NonZero,
                    blend_mode(composite),
                    1.0,
                    transform,
                    &self.stage_bounds,
                );
                self.scene.stroke(&stroke, transform, Color::BLACK, None, &path);
                self.scene.pop_layer();
            }
        }
    }

    fn render_arrow(&mut self, arrow: &Arrow, transform: Affine) {
        let style = &arrow.style;
        let stroke = Stroke::new(style.stroke_width).with_join(Join::Miter);
        let stroke_color = style.stroke_with_opacity();
        self.scene
            .stroke(&stroke, transform, stroke_color, None, &arrow.to_path());

        let head = arrow.head_path();
        let head_fill = style.fill_with_opacity().unwrap_or(stroke_color);
        self.scene.fill(Fill::NonZero, transform, head_fill, None, &head);
        self.scene.stroke(&stroke, transform, stroke_color, None, &head);
    }

    /// Transform placing a text node's layout: translate to its top-left,
    /// rotated about its center.
    fn text_transform(text: &Text, transform: Affine) -> Affine {
        let bounds = text.bounds();
        transform
            * Affine::rotate_about(text.rotation, bounds.center())
            * Affine::translate(text.position.to_vec2())
    }

    /// Render a text shape using Parley for layout, wrapped at its width.
    fn render_text(&mut self, text: &Text, transform: Affine) {
        let brush = Brush::Solid(text.style.stroke_with_opacity());

        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, &text.content, 1.0, false);
        builder.push_default(StyleProperty::FontSize(text.font_size as f32));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Generic(parley::GenericFamily::SansSerif),
        )));
        let mut layout = builder.build(&text.content);
        layout.break_all_lines(Some(text.width as f32));
        layout.align(
            Some(text.width as f32),
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        // Real layout height feeds hit-testing and handle placement.
        // Keep one line's height when no font could be found
        let height = (layout.height() as f64).max(text.font_size * 1.2);
        text.set_cached_size(layout.width() as f64, height);

        let text_transform = Self::text_transform(text, transform);
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let glyph_xform = run
                    .synthesis()
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(run.font())
                        .brush(&brush)
                        .hint(true)
                        .transform(text_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run.font_size())
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }
    }

    /// Decode once, then draw the cached pixels stretched over the shape.
    fn render_image(&mut self, image: &Image, transform: Affine) {
        let Some(image_data) = self.decoded_image(image) else {
            self.render_image_placeholder(image, transform);
            return;
        };

        let bounds = image.bounds();
        let scale_x = bounds.width() / image_data.width as f64;
        let scale_y = bounds.height() / image_data.height as f64;
        let image_transform = transform
            * Affine::rotate_about(image.rotation, bounds.center())
            * Affine::translate((bounds.x0, bounds.y0))
            * Affine::scale_non_uniform(scale_x, scale_y);

        self.scene
            .draw_image(&ImageBrush::from(image_data), image_transform);
    }

    fn decoded_image(&mut self, image: &Image) -> Option<peniko::ImageData> {
        if let Some(cached) = self.image_cache.get(&image.id()) {
            return Some(cached.clone());
        }
        let decoded = match ::image::load_from_memory_with_format(
            image.data(),
            image.format.to_image_format(),
        ) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::error!("Failed to decode image {}: {}", image.id(), e);
                return None;
            }
        };
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = peniko::ImageData {
            data: Blob::new(Arc::new(rgba.into_vec())),
            format: peniko::ImageFormat::Rgba8,
            width,
            height,
            alpha_type: peniko::ImageAlphaType::Alpha,
        };
        self.image_cache.insert(image.id(), data.clone());
        Some(data)
    }

    /// Gray box with an X, for images that couldn't be decoded.
    fn render_image_placeholder(&mut self, image: &Image, transform: Affine) {
        let path = image.to_path();
        let bounds = image.bounds();
        let stroke = Stroke::new(2.0);
        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(200, 200, 200, 255),
            None,
            &path,
        );
        let mut cross = BezPath::new();
        cross.move_to(Point::new(bounds.x0, bounds.y0));
        cross.line_to(Point::new(bounds.x1, bounds.y1));
        cross.move_to(Point::new(bounds.x1, bounds.y0));
        cross.line_to(Point::new(bounds.x0, bounds.y1));
        let cross_transform = transform * Affine::rotate_about(image.rotation, bounds.center());
        self.scene.stroke(
            &stroke,
            cross_transform,
            Color::from_rgba8(150, 150, 150, 255),
            None,
            &cross,
        );
    }

    /// Render the text node being edited, with its selection and caret.
    pub fn render_text_editing(
        &mut self,
        text: &Text,
        edit_state: &mut TextEditState,
        scale_factor: f64,
    ) {
        let brush = Brush::Solid(text.style.stroke_with_opacity());
        edit_state.set_font_size(text.font_size as f32);
        edit_state.set_brush(brush.clone());
        edit_state.editor_mut().set_width(Some(text.width as f32));

        let text_transform = Self::text_transform(text, Affine::scale(scale_factor));

        // Layout must be computed before cursor and selection geometry
        let layout = edit_state
            .editor_mut()
            .layout(&mut self.font_cx, &mut self.layout_cx);
        let layout_height = layout.height() as f64;
        text.set_cached_size(layout.width() as f64, layout_height);

        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let glyph_style = glyph_run.style();
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();
                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(run.font())
                        .brush(&glyph_style.brush)
                        .hint(true)
                        .transform(text_transform)
                        .font_size(run.font_size())
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        let selection_color = Color::from_rgba8(70, 130, 180, 128);
        edit_state.editor().selection_geometry_with(|rect, _| {
            self.scene.fill(
                Fill::NonZero,
                text_transform,
                selection_color,
                None,
                &convert_rect(&rect),
            );
        });

        if edit_state.is_cursor_visible() {
            let caret = edit_state
                .editor()
                .cursor_geometry(1.5)
                .map(|cursor| convert_rect(&cursor))
                .unwrap_or_else(|| Rect::new(0.0, 0.0, 1.5, text.font_size * 1.2));
            self.scene
                .fill(Fill::NonZero, text_transform, Color::BLACK, None, &caret);
        }

        // Dashed frame around the edit area
        let frame = Rect::new(0.0, 0.0, text.width, layout_height.max(text.font_size * 1.2));
        let stroke = Stroke::new(1.0).with_dashes(0.0, [4.0, 4.0]);
        self.scene
            .stroke(&stroke, text_transform, self.selection_color, None, &frame);
    }

    /// Bounding outline and anchors of the active transformer.
    fn render_transformer(&mut self, transformer: &Transformer, layer: &Layer, transform: Affine) {
        let Some(shape) = transformer.node().and_then(|id| layer.get(id)) else {
            return;
        };
        let handles = transformer.handles(layer);
        if handles.is_empty() {
            return;
        }

        if !matches!(shape, Shape::Arrow(_)) {
            let bounds = shape.bounds();
            let outline =
                Affine::rotate_about(shape.rotation(), bounds.center()) * bounds.to_path(0.1);
            self.scene.stroke(
                &Stroke::new(1.0),
                transform,
                self.selection_color,
                None,
                &outline,
            );
        }

        for handle in &handles {
            self.render_handle(handle, transform);
        }
    }

    fn render_handle(&mut self, handle: &Handle, transform: Affine) {
        let half = HANDLE_SIZE / 2.0;
        let path = match handle.kind {
            HandleKind::Corner(_) | HandleKind::Edge(_) => {
                Rect::from_center_size(handle.position, (HANDLE_SIZE, HANDLE_SIZE)).to_path(0.1)
            }
            HandleKind::Endpoint(_) | HandleKind::Rotate => {
                kurbo::Circle::new(handle.position, half).to_path(0.1)
            }
        };
        self.scene.fill(Fill::NonZero, transform, Color::WHITE, None, &path);
        self.scene.stroke(
            &Stroke::new(1.5),
            transform,
            self.selection_color,
            None,
            &path,
        );
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        self.selection_color = ctx.selection_color;

        let board = ctx.board;
        let layer = board.layer();
        let transform = Affine::scale(ctx.scale_factor);
        self.stage_bounds = board.stage().bounds();

        self.scene.fill(
            Fill::NonZero,
            transform,
            ctx.stage_color,
            None,
            &self.stage_bounds,
        );

        // Shapes live in their own group so erasing reveals the stage fill,
        // and nothing spills onto the surround.
        self.scene.push_layer(
            Fill::NonZero,
            blend_mode(Composite::SourceOver),
            1.0,
            transform,
            &self.stage_bounds,
        );
        for shape in layer.iter() {
            if ctx.editing_shape_id == Some(shape.id()) {
                continue;
            }
            self.render_shape(shape, transform);
        }
        self.scene.pop_layer();

        if let Some(transformer) = board.active_transformer() {
            self.render_transformer(transformer, layer, transform);
        }

        // Forget images that left the layer
        self.image_cache.retain(|id, _| layer.contains(*id));
    }
}

fn blend_mode(composite: Composite) -> BlendMode {
    match composite {
        Composite::SourceOver => BlendMode::new(Mix::Normal, Compose::SrcOver),
        Composite::DestinationOut => BlendMode::new(Mix::Normal, Compose::DestOut),
    }
}
