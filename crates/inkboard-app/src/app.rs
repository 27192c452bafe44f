//! Core application state and lifecycle.

use inkboard_core::input::Instant;
use inkboard_core::shapes::{Shape, ShapeId};
use inkboard_core::{BoardConfig, ImportError, Modifiers, PointerEvent, PointerSource, Whiteboard};
use inkboard_render::{
    RenderContext, RenderResult, Renderer, RendererError, TextEditResult, TextEditState,
    VelloRenderer,
};
use kurbo::{Point, Size};
use peniko::Color;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions};
use winit::application::ApplicationHandler;
#[cfg(not(target_arch = "wasm32"))]
use winit::dpi::LogicalSize;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, StartCause, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::Key;
use winit::window::{Window, WindowId};

use crate::input_map;
use crate::ui::{render_ui, UiAction, UiState};

#[cfg(feature = "native")]
mod file_ops {
    use std::path::PathBuf;

    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

    /// Ask for an image file with the native dialog.
    pub fn pick_image() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Import image")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
    }
}

#[cfg(target_arch = "wasm32")]
mod file_ops {
    use std::cell::RefCell;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    thread_local! {
        static PENDING_IMAGE: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
    }

    pub fn take_pending_image() -> Option<Vec<u8>> {
        PENDING_IMAGE.with(|cell| cell.borrow_mut().take())
    }

    fn set_pending_image(bytes: Vec<u8>) {
        PENDING_IMAGE.with(|cell| {
            *cell.borrow_mut() = Some(bytes);
        });
    }

    /// Open the browser file picker. The file's bytes land in the pending
    /// slot once read.
    pub fn pick_image_async() {
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            log::error!("No document to attach the file input to");
            return;
        };
        let input = match document
            .create_element("input")
            .map(|element| element.dyn_into::<web_sys::HtmlInputElement>())
        {
            Ok(Ok(input)) => input,
            _ => {
                log::error!("Failed to create file input");
                return;
            }
        };

        input.set_type("file");
        input.set_accept("image/png,image/jpeg,image/webp");
        input.style().set_property("display", "none").ok();

        let input_clone = input.clone();
        let onchange = Closure::once(Box::new(move |_event: web_sys::Event| {
            if let Some(file) = input_clone.files().and_then(|files| files.get(0)) {
                read_file(file);
            }
            input_clone.remove();
        }) as Box<dyn FnOnce(_)>);

        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        if let Some(body) = document.body() {
            body.append_child(&input).ok();
        }
        input.click();
    }

    fn read_file(file: web_sys::File) {
        let Ok(reader) = web_sys::FileReader::new() else {
            log::error!("Failed to create FileReader");
            return;
        };
        let reader_clone = reader.clone();
        let name = file.name();

        let onload = Closure::once(Box::new(move |_event: web_sys::Event| {
            match reader_clone.result() {
                Ok(result) => {
                    let bytes = js_sys::Uint8Array::new(&result).to_vec();
                    log::info!("Read {} ({} bytes)", name, bytes.len());
                    set_pending_image(bytes);
                }
                Err(_) => log::error!("Failed to read {}", name),
            }
        }) as Box<dyn FnOnce(_)>);

        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();

        if reader.read_as_array_buffer(&file).is_err() {
            log::error!("Failed to start reading file");
        }
    }
}

/// Failure to bring an image file onto the board.
#[derive(Debug, Error)]
pub enum FileImportError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Import(#[from] ImportError),
}

#[cfg(not(target_arch = "wasm32"))]
fn import_file(board: &mut Whiteboard, path: &std::path::Path) -> Result<ShapeId, FileImportError> {
    let bytes = std::fs::read(path).map_err(|source| FileImportError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(board.import_image(bytes)?)
}

/// Position of `position` relative to the top-left of the text node being
/// edited.
fn editor_local(board: &Whiteboard, position: Point) -> Option<(f32, f32)> {
    let edit = board.text_edit()?;
    let text = board.layer().get(edit.shape_id)?.as_text()?;
    Some((
        (position.x - text.position.x) as f32,
        (position.y - text.position.y) as f32,
    ))
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Window color around the stage.
    pub background_color: Color,
    pub board: BoardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Inkboard".to_string(),
            width: 1280,
            height: 800,
            background_color: Color::from_rgba8(235, 235, 235, 255),
            board: BoardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, with the board section read from the file named by
    /// `INKBOARD_CONFIG` when it is set.
    pub fn from_env() -> Self {
        #[allow(unused_mut)]
        let mut config = Self::default();
        #[cfg(not(target_arch = "wasm32"))]
        if let Ok(path) = std::env::var("INKBOARD_CONFIG") {
            match BoardConfig::from_file(&path) {
                Ok(board) => {
                    log::info!("Loaded board config from {}", path);
                    config.board = board;
                }
                Err(e) => log::error!("Ignoring board config {}: {}", path, e),
            }
        }
        config
    }
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    shape_renderer: VelloRenderer,
    /// Vello renders to Rgba8Unorm; the surface may be Bgra8Unorm.
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    ui_state: UiState,

    // State
    board: Whiteboard,
    config: AppConfig,
    modifiers: Modifiers,
    /// Last cursor position in logical pixels.
    cursor: Point,
    /// Finger driving the board. Other touches are ignored.
    active_touch: Option<u64>,

    // Text editing state (when a text node is being edited)
    text_edit_state: Option<TextEditState>,
    /// Last press inside the edited node, for word selection.
    last_editor_press: Option<Instant>,

    /// A file picker is open and its bytes have not arrived yet.
    #[cfg(target_arch = "wasm32")]
    awaiting_image: bool,
}

impl AppState {
    fn logical(&self, position: PhysicalPosition<f64>) -> Point {
        let position = position.to_logical::<f64>(self.window.scale_factor());
        Point::new(position.x, position.y)
    }

    fn logical_window_size(&self) -> Size {
        let size = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        Size::new(size.width, size.height)
    }

    fn request_redraw_if_needed(&mut self) {
        if self.board.take_redraw() {
            self.window.request_redraw();
        }
    }

    // --- Pointer -------------------------------------------------------------

    fn pointer_pressed(&mut self, position: Point, source: PointerSource) {
        if self.board.text_edit().is_some() {
            if self.board.text_edit_contains(position) {
                self.press_in_editor(position);
                return;
            }
            self.commit_text_edit();
        }
        self.board
            .handle_pointer_event(PointerEvent::Down { position, source });
    }

    fn pointer_moved(&mut self, position: Point, source: PointerSource) {
        if let Some(edit_state) = self.text_edit_state.as_mut().filter(|s| s.is_dragging()) {
            if let Some((x, y)) = editor_local(&self.board, position) {
                let (font_cx, layout_cx) = self.shape_renderer.contexts_mut();
                edit_state.handle_mouse_drag(x, y, font_cx, layout_cx);
                self.window.request_redraw();
            }
            return;
        }
        self.board
            .handle_pointer_event(PointerEvent::Move { position, source });
    }

    fn pointer_released(&mut self, position: Point, source: PointerSource) {
        if let Some(edit_state) = &mut self.text_edit_state {
            edit_state.handle_mouse_up();
        }
        self.board
            .handle_pointer_event(PointerEvent::Up { position, source });
        self.sync_text_edit();
    }

    fn press_in_editor(&mut self, position: Point) {
        let Some((x, y)) = editor_local(&self.board, position) else {
            return;
        };
        let window = Duration::from_millis(self.board.config().double_click_ms);
        let now = Instant::now();
        let is_double = self
            .last_editor_press
            .is_some_and(|last| now.duration_since(last) <= window);
        self.last_editor_press = (!is_double).then_some(now);

        let Some(edit_state) = &mut self.text_edit_state else {
            return;
        };
        let (font_cx, layout_cx) = self.shape_renderer.contexts_mut();
        if is_double {
            edit_state.handle_double_click(x, y, font_cx, layout_cx);
        } else {
            edit_state.handle_mouse_down(x, y, self.modifiers.shift, font_cx, layout_cx);
        }
        self.window.request_redraw();
    }

    // --- Keyboard ------------------------------------------------------------

    fn key_pressed(&mut self, key: &Key) {
        if self.board.text_edit().is_some() {
            self.sync_text_edit();
            let Some(text_key) = input_map::text_key(key) else {
                return;
            };
            let Some(edit_state) = &mut self.text_edit_state else {
                return;
            };
            let (font_cx, layout_cx) = self.shape_renderer.contexts_mut();
            match edit_state.handle_key(text_key, self.modifiers, font_cx, layout_cx) {
                TextEditResult::Commit => self.commit_text_edit(),
                TextEditResult::Cancel => self.cancel_text_edit(),
                TextEditResult::Handled | TextEditResult::NotHandled => {}
            }
            self.window.request_redraw();
            return;
        }

        if let Some(event) = input_map::board_key(key, self.modifiers) {
            if !self.board.key_down(&event) {
                log::trace!("No binding for {}", event.key);
            }
        }
    }

    // --- Text editing --------------------------------------------------------

    /// Open or drop the editor to match the board's edit session.
    fn sync_text_edit(&mut self) {
        match (self.board.text_edit(), self.text_edit_state.is_some()) {
            (Some(edit), false) => {
                let Some(text) = self.board.layer().get(edit.shape_id).and_then(Shape::as_text)
                else {
                    return;
                };
                let mut edit_state =
                    TextEditState::new(&text.content, text.font_size as f32, text.width as f32);
                edit_state.cursor_reset();
                let (font_cx, layout_cx) = self.shape_renderer.contexts_mut();
                edit_state.driver(font_cx, layout_cx).move_to_text_end();
                self.text_edit_state = Some(edit_state);
                self.last_editor_press = None;
                log::info!("Editing text {}", edit.shape_id);
            }
            (None, true) => self.text_edit_state = None,
            _ => {}
        }
    }

    fn commit_text_edit(&mut self) {
        if let Some(edit_state) = self.text_edit_state.take() {
            self.board.commit_text_edit(&edit_state.text());
        }
    }

    fn cancel_text_edit(&mut self) {
        self.text_edit_state = None;
        self.board.cancel_text_edit();
    }

    // --- Toolbar -------------------------------------------------------------

    fn apply_ui_action(&mut self, action: UiAction) {
        match action {
            UiAction::SelectTool(tool) => {
                self.commit_text_edit();
                self.board.add_shape(tool);
                self.sync_text_edit();
            }
            UiAction::ImportImage => {
                #[cfg(feature = "native")]
                if let Some(path) = file_ops::pick_image() {
                    self.import_path(&path);
                }
                #[cfg(target_arch = "wasm32")]
                {
                    file_ops::pick_image_async();
                    self.awaiting_image = true;
                }
                #[cfg(not(any(feature = "native", target_arch = "wasm32")))]
                log::warn!("Image import needs the native feature");
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn import_path(&mut self, path: &std::path::Path) {
        self.commit_text_edit();
        match import_file(&mut self.board, path) {
            Ok(id) => log::info!("Imported {} as {}", path.display(), id),
            Err(e) => log::error!("Image import failed: {}", e),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn import_bytes(&mut self, bytes: Vec<u8>) {
        self.commit_text_edit();
        if let Err(e) = self.board.import_image(bytes).map_err(FileImportError::from) {
            log::error!("Image import failed: {}", e);
        }
    }

    // --- Frame ---------------------------------------------------------------

    fn redraw(&mut self, render_cx: &vello::util::RenderContext) {
        #[cfg(target_arch = "wasm32")]
        if let Some(bytes) = file_ops::take_pending_image() {
            self.awaiting_image = false;
            self.import_bytes(bytes);
        }

        // Run egui and get any actions
        self.ui_state.sync_from(&self.board);
        let egui_input = self.egui_state.take_egui_input(&self.window);
        let mut action = None;
        let egui_output = self.egui_ctx.run(egui_input, |ctx| {
            action = render_ui(ctx, &self.ui_state);
        });
        self.egui_state
            .handle_platform_output(&self.window, egui_output.platform_output);
        let egui_primitives = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);
        let egui_repaint = egui_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|viewport| viewport.repaint_delay.is_zero());

        if let Some(action) = action {
            self.apply_ui_action(action);
        }

        // This frame draws whatever the layer asked for
        let layer_dirty = self.board.take_redraw();

        // Build Vello scene
        let scale_factor = self.window.scale_factor();
        let viewport_size = Size::new(
            self.surface.config.width as f64,
            self.surface.config.height as f64,
        );
        let render_ctx = RenderContext::new(&self.board, viewport_size)
            .with_scale_factor(scale_factor)
            .with_background(self.config.background_color);
        self.shape_renderer.build_scene(&render_ctx);

        // Render text in edit mode (with cursor and selection)
        if let Some(edit) = self.board.text_edit() {
            let text = self.board.layer().get(edit.shape_id).and_then(Shape::as_text);
            if let (Some(text), Some(edit_state)) = (text, &mut self.text_edit_state) {
                edit_state.cursor_blink();
                self.shape_renderer
                    .render_text_editing(text, edit_state, scale_factor);
            }
        }

        let scene = self.shape_renderer.take_scene();

        let device_handle = &render_cx.devices[self.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("{}", RendererError::Surface(format!("{:?}", e)));
                return;
            }
        };

        let width = self.surface.config.width;
        let height = self.surface.config.height;

        let params = RenderParams {
            base_color: self.config.background_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Vello's compute shaders need a StorageBinding texture, which WebGPU
        // only allows for Rgba8Unorm. It is blitted to the surface afterwards.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_texture_view =
            render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        if let Err(e) = self.vello_renderer.render_to_texture(
            device,
            queue,
            &scene,
            &render_texture_view,
            &params,
        ) {
            log::error!("{}", RendererError::RenderFailed(format!("{:?}", e)));
            return;
        }

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        {
            let mut blit_encoder =
                device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                    label: Some("blit encoder"),
                });
            self.texture_blitter.copy(
                device,
                &mut blit_encoder,
                &render_texture_view,
                &surface_view,
            );
            queue.submit(std::iter::once(blit_encoder.finish()));
        }

        for (id, image_delta) in &egui_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        // Render egui on top
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: egui_output.pixels_per_point,
        };

        {
            let mut egui_encoder =
                device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                    label: Some("egui encoder"),
                });
            self.egui_renderer.update_buffers(
                device,
                queue,
                &mut egui_encoder,
                &egui_primitives,
                &screen_descriptor,
            );

            let render_pass = egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: vello::wgpu::Operations {
                        load: vello::wgpu::LoadOp::Load,
                        store: vello::wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // egui-wgpu wants a 'static pass
            let mut render_pass = render_pass.forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &egui_primitives, &screen_descriptor);
            drop(render_pass);

            queue.submit(std::iter::once(egui_encoder.finish()));
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        surface_texture.present();

        // Applying a toolbar action may have dirtied the layer again
        if egui_repaint || self.board.take_redraw() {
            self.window.request_redraw();
        }
        log::trace!("Frame {}x{} (layer dirty: {})", width, height, layer_dirty);
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
    /// Window waiting for async surface creation (WASM only)
    pending_window: Option<Arc<Window>>,
    /// Flag to indicate async init is in progress
    #[cfg(target_arch = "wasm32")]
    init_in_progress: std::cell::Cell<bool>,
}

impl App {
    /// Create a new application, reading board settings from the environment.
    pub fn new() -> Self {
        Self::with_config(AppConfig::from_env())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            render_cx: None,
            pending_window: None,
            #[cfg(target_arch = "wasm32")]
            init_in_progress: std::cell::Cell::new(false),
        }
    }

    /// Run the application.
    pub async fn run() {
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        let app = App::new();

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::EventLoopExtWebSys;
            event_loop.spawn_app(app);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut app = app;
            event_loop.run_app(&mut app).expect("Event loop error");
        }
    }

    /// Finish initialization after surface is created.
    fn finish_init(
        &mut self,
        window: Arc<Window>,
        surface: RenderSurface<'static>,
    ) -> RenderResult<()> {
        let render_cx = self
            .render_cx
            .as_ref()
            .ok_or_else(|| RendererError::InitFailed("render context missing".to_string()))?;
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| RendererError::InitFailed(format!("{:?}", e)))?;

        let texture_blitter = vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        let logical = window.inner_size().to_logical::<f64>(window.scale_factor());
        let board = Whiteboard::new(
            self.config.board.clone(),
            Size::new(logical.width, logical.height),
        );

        log::info!(
            "Inkboard initialized - {}x{}",
            surface.config.width,
            surface.config.height
        );
        log::info!("Keyboard shortcuts:");
        board.keymap().log_bindings();

        self.state = Some(AppState {
            window: window.clone(),
            surface,
            vello_renderer,
            shape_renderer: VelloRenderer::new(),
            texture_blitter,
            egui_ctx,
            egui_state,
            egui_renderer,
            ui_state: UiState::default(),
            board,
            config: self.config.clone(),
            modifiers: Modifiers::NONE,
            cursor: Point::ZERO,
            active_touch: None,
            text_edit_state: None,
            last_editor_press: None,
            #[cfg(target_arch = "wasm32")]
            awaiting_image: false,
        });

        self.pending_window = None;
        window.request_redraw();
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.pending_window.is_some() {
            return;
        }

        log::info!("Creating window...");

        #[cfg(not(target_arch = "wasm32"))]
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        // On WASM, attach canvas to DOM and use full viewport
        #[cfg(target_arch = "wasm32")]
        let window_attrs = {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let web_window = web_sys::window().expect("No window");
            let document = web_window.document().expect("No document");

            let viewport_width = web_window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(self.config.width as f64);
            let viewport_height = web_window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(self.config.height as f64);

            if let Some(loading) = document.get_element_by_id("loading") {
                loading.remove();
            }

            let canvas = document
                .get_element_by_id("inkboard-canvas")
                .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
                .or_else(|| {
                    let app_div = document.get_element_by_id("app")?;
                    let canvas = document.create_element("canvas").ok()?;
                    canvas.set_id("inkboard-canvas");
                    app_div.append_child(&canvas).ok()?;
                    canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok()
                })
                .expect("Failed to create canvas");

            // Physical pixels for sharp rendering
            let dpr = web_window.device_pixel_ratio();
            canvas.set_width((viewport_width * dpr) as u32);
            canvas.set_height((viewport_height * dpr) as u32);
            let style = canvas.style();
            let _ = style.set_property("width", "100%");
            let _ = style.set_property("height", "100%");
            let _ = style.set_property("display", "block");
            let _ = style.set_property("position", "fixed");
            let _ = style.set_property("top", "0");
            let _ = style.set_property("left", "0");

            log::info!(
                "Canvas created: {}x{} (dpr: {})",
                viewport_width,
                viewport_height,
                dpr
            );

            Window::default_attributes()
                .with_title(&self.config.title)
                .with_canvas(Some(canvas))
        };

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };

        log::info!("Surface size: {}x{}", width, height);

        // On native, block on async surface creation
        #[cfg(not(target_arch = "wasm32"))]
        {
            let render_cx = self
                .render_cx
                .get_or_insert_with(vello::util::RenderContext::new);

            let surface = pollster::block_on(render_cx.create_surface(
                window.clone(),
                width,
                height,
                PresentMode::AutoVsync,
            ))
            .expect("Failed to create surface");

            // The surface borrows the window, which the Arc keeps alive for
            // as long as App holds the state.
            let surface: RenderSurface<'static> = unsafe { std::mem::transmute(surface) };
            if let Err(e) = self.finish_init(window, surface) {
                log::error!("{}", e);
                event_loop.exit();
            }
        }

        // On WASM, store window for later async initialization
        #[cfg(target_arch = "wasm32")]
        {
            self.pending_window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // On WASM, handle async initialization
        #[cfg(target_arch = "wasm32")]
        if self.state.is_none() {
            if let Some(window) = self.pending_window.clone() {
                if !self.init_in_progress.get() {
                    self.init_in_progress.set(true);

                    let web_window = web_sys::window().expect("No window");
                    let dpr = web_window.device_pixel_ratio();
                    let viewport_width = web_window
                        .inner_width()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(self.config.width as f64);
                    let viewport_height = web_window
                        .inner_height()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(self.config.height as f64);
                    let width = (viewport_width * dpr) as u32;
                    let height = (viewport_height * dpr) as u32;

                    let self_ptr = self as *mut Self;
                    let window_clone = window.clone();

                    wasm_bindgen_futures::spawn_local(async move {
                        let mut render_cx = vello::util::RenderContext::new();
                        match render_cx
                            .create_surface(
                                window_clone.clone(),
                                width,
                                height,
                                PresentMode::AutoVsync,
                            )
                            .await
                        {
                            Ok(surface) => {
                                let surface: RenderSurface<'static> =
                                    unsafe { std::mem::transmute(surface) };

                                // SAFETY: WASM is single-threaded and the event
                                // loop keeps App alive.
                                let app = unsafe { &mut *self_ptr };
                                app.render_cx = Some(render_cx);
                                if let Err(e) = app.finish_init(window_clone, surface) {
                                    log::error!("{}", e);
                                    app.init_in_progress.set(false);
                                }
                            }
                            Err(e) => {
                                log::error!("Failed to create surface: {:?}", e);
                                let app = unsafe { &mut *self_ptr };
                                app.init_in_progress.set(false);
                            }
                        }
                    });
                }

                window.request_redraw();
            }
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        // Let egui process the event first
        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        if egui_response.repaint {
            state.window.request_redraw();
        }
        let egui_wants_input = egui_response.consumed
            || state.egui_ctx.is_pointer_over_area()
            || state.egui_ctx.wants_pointer_input()
            || state.egui_ctx.wants_keyboard_input();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                let window_size = state.logical_window_size();
                state.board.set_window_size(window_size);
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if let Some(render_cx) = self.render_cx.as_ref() {
                    state.redraw(render_cx);
                }
                return;
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.modifiers = input_map::modifiers(modifiers.state());
                state.board.set_modifiers(state.modifiers);
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = state.logical(position);
                if egui_wants_input {
                    return;
                }
                state.pointer_moved(state.cursor, PointerSource::Mouse);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => {
                    if egui_wants_input {
                        return;
                    }
                    state.pointer_pressed(state.cursor, PointerSource::Mouse);
                }
                // A release without a board press is a no-op, so the board
                // always sees it and never keeps a stale press.
                ElementState::Released => {
                    state.pointer_released(state.cursor, PointerSource::Mouse);
                }
            },

            WindowEvent::Touch(touch) => {
                if egui_wants_input && touch.phase == TouchPhase::Started {
                    return;
                }
                let position = state.logical(touch.location);
                match touch.phase {
                    TouchPhase::Started => {
                        if state.active_touch.is_none() {
                            state.active_touch = Some(touch.id);
                            state.pointer_pressed(position, PointerSource::Touch);
                        }
                    }
                    TouchPhase::Moved => {
                        if state.active_touch == Some(touch.id) {
                            state.pointer_moved(position, PointerSource::Touch);
                        }
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        if state.active_touch == Some(touch.id) {
                            state.active_touch = None;
                            state.pointer_released(position, PointerSource::Touch);
                        }
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if egui_wants_input || event.state != ElementState::Pressed {
                    return;
                }
                state.key_pressed(&event.logical_key);
            }

            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::DroppedFile(path) => {
                let is_image = path.extension().is_some_and(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "webp")
                });
                if is_image {
                    state.import_path(&path);
                } else {
                    log::warn!("Ignoring dropped file {}", path.display());
                }
            }

            _ => {}
        }

        state.request_redraw_if_needed();
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        // Caret blink deadline
        if let (StartCause::ResumeTimeReached { .. }, Some(state)) = (cause, &self.state) {
            state.window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &self.state else {
            return;
        };
        #[cfg(target_arch = "wasm32")]
        if state.awaiting_image {
            state.window.request_redraw();
        }
        match state
            .text_edit_state
            .as_ref()
            .and_then(TextEditState::next_blink_time)
        {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
