//! Windowed viewer: winit event loop, wgpu backend and background sequence loading
//!
//! Controls:
//! - Left / Right: previous / next frame
//! - Mouse wheel: zoom
//! - Left click: select the detection under the cursor
//! - C: cycle the detection color mode
//! - D: toggle Doppler arrows
//! - + / -: lengthen / shorten Doppler arrows
//! - T: toggle dark mode
//! - O: open a sequence file

use crate::canvas::RadarCanvas;
use crate::settings::Settings;
use crate::timeline::Timeline;
use radarview_core::{ColorBy, Result};
use radarview_gpu::WgpuBackend;
use radarview_io::{read_mesh, read_sequence, Sequence};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

/// Doppler arrow scale change per key press
const DOPPLER_SCALE_STEP: f32 = 0.05;

/// How often the event loop wakes up to check for finished loads
const LOADER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What to show when the viewer starts
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub sequence: Option<PathBuf>,
    pub mesh: Option<PathBuf>,
    pub color_by: Option<ColorBy>,
}

/// Result of a background load
#[derive(Debug)]
pub enum LoaderMessage {
    Loaded(Sequence),
    Failed { path: PathBuf, error: String },
}

/// Reads sequence files on worker threads and hands the results back over a channel
pub struct SequenceLoader {
    sender: flume::Sender<LoaderMessage>,
    receiver: flume::Receiver<LoaderMessage>,
}

impl SequenceLoader {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Start reading `path` in the background
    pub fn load(&self, path: PathBuf) {
        log::info!("Loading sequence {}", path.display());
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let message = match read_sequence(&path) {
                Ok(sequence) => LoaderMessage::Loaded(sequence),
                Err(e) => LoaderMessage::Failed { path, error: e.to_string() },
            };
            if sender.send(message).is_err() {
                log::debug!("Viewer closed before the sequence finished loading");
            }
        });
    }

    /// A finished load, if one is waiting
    pub fn poll(&self) -> Option<LoaderMessage> {
        self.receiver.try_recv().ok()
    }

    /// Block until a load finishes or `timeout` passes
    pub fn wait(&self, timeout: Duration) -> Option<LoaderMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl Default for SequenceLoader {
    fn default() -> Self {
        Self::new()
    }
}

struct ViewerApp {
    window: Arc<Window>,
    backend: WgpuBackend,
    canvas: RadarCanvas,
    title: String,
    sequence: Option<Sequence>,
    timeline: Timeline,
    color_by: ColorBy,
    loader: SequenceLoader,
    cursor: Option<PhysicalPosition<f64>>,
}

impl ViewerApp {
    fn show_current_frame(&mut self) -> Result<()> {
        let (Some(sequence), Some(timestamp)) = (self.sequence.as_ref(), self.timeline.current()) else {
            return Ok(());
        };
        let frame = sequence.window_at(timestamp);
        self.canvas.update_scene(&frame.detections(), self.color_by)?;

        let status = self.timeline.status_line(frame.window_size_ms());
        self.window.set_title(&format!("{} - {}", self.title, status));
        log::info!("{}", status);
        self.window.request_redraw();
        Ok(())
    }

    fn poll_loader(&mut self) {
        while let Some(message) = self.loader.poll() {
            match message {
                LoaderMessage::Loaded(sequence) => {
                    self.timeline = Timeline::from_sequence(&sequence);
                    self.title = format!("{} - {}", self.canvas.settings().program_title, sequence.name());
                    self.sequence = Some(sequence);
                    if let Err(e) = self.show_current_frame() {
                        log::error!("Failed to show frame: {}", e);
                    }
                }
                LoaderMessage::Failed { path, error } => {
                    log::error!("Failed to load sequence {}: {}", path.display(), error);
                }
            }
        }
    }

    fn step(&mut self, delta: i64) -> Result<()> {
        if self.timeline.step(delta) {
            self.show_current_frame()?;
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &Key) -> Result<()> {
        match key {
            Key::Named(NamedKey::ArrowRight) => self.step(1)?,
            Key::Named(NamedKey::ArrowLeft) => self.step(-1)?,
            Key::Character(c) => match c.to_lowercase().as_str() {
                "c" => {
                    self.color_by = self.color_by.next();
                    self.canvas.set_color_by(self.color_by)?;
                    log::info!("Coloring detections by {}", self.color_by.label());
                }
                "d" => {
                    let enabled = !self.canvas.settings().draw_doppler_arrows;
                    self.canvas.set_draw_doppler_arrows(enabled)?;
                    log::info!("Doppler arrows {}", if enabled { "on" } else { "off" });
                }
                "+" | "=" => self.change_doppler_scale(DOPPLER_SCALE_STEP)?,
                "-" => self.change_doppler_scale(-DOPPLER_SCALE_STEP)?,
                "t" => {
                    let dark_mode = !self.canvas.settings().dark_mode;
                    self.canvas.set_dark_mode(dark_mode)?;
                }
                "o" => self.open_dialog(),
                _ => return Ok(()),
            },
            _ => return Ok(()),
        }
        self.window.request_redraw();
        Ok(())
    }

    fn change_doppler_scale(&mut self, delta: f32) -> Result<()> {
        let scale = self.canvas.settings().doppler_arrow_scale + delta;
        self.canvas.set_doppler_arrow_scale(scale)?;
        log::info!("Doppler arrow scale {:.2}", self.canvas.settings().doppler_arrow_scale);
        Ok(())
    }

    fn open_dialog(&self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open radar sequence")
            .add_filter("Radar sequence", &["csv", "tsv", "txt"])
            .pick_file();
        if let Some(path) = picked {
            self.loader.load(path);
        }
    }

    fn select_at_cursor(&mut self) -> Result<()> {
        let Some(cursor) = self.cursor else { return Ok(()) };
        let (width, height) = self.backend.size();
        let Some(ray) = self.canvas.ray_at([cursor.x as f32, cursor.y as f32], [width as f32, height as f32]) else {
            return Ok(());
        };

        let hit = self.canvas.pick(&ray)?;
        match self.canvas.select(hit)? {
            Some(detection) => log::info!("Selected detection\n{}", detection.info_text()),
            None => log::debug!("No detection under the cursor"),
        }
        self.window.request_redraw();
        Ok(())
    }

    fn zoom(&mut self, delta: MouseScrollDelta) -> Result<()> {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 100.0,
        };
        self.canvas.zoom(&mut self.backend, steps)?;
        self.window.request_redraw();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.backend.resize(width, height);
        self.canvas.resize(&mut self.backend, width, height)
    }

    fn render(&mut self) -> Result<()> {
        self.backend.begin_frame()?;
        self.canvas.render(&mut self.backend)?;
        self.backend.end_frame(self.canvas.clear_color())
    }

    fn handle_window_event(&mut self, event: WindowEvent) -> Result<()> {
        match event {
            WindowEvent::Resized(size) => self.resize(size.width, size.height)?,
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.canvas.set_pixel_scale(scale_factor as f32);
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                self.select_at_cursor()?
            }
            WindowEvent::MouseWheel { delta, .. } => self.zoom(delta)?,
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.handle_key(&event.logical_key)?
            }
            WindowEvent::RedrawRequested => self.render()?,
            _ => {}
        }
        Ok(())
    }
}

/// Open the viewer window and run until it is closed
pub fn run(settings: Settings, options: LaunchOptions) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(settings.program_title.as_str())
            .with_inner_size(LogicalSize::new(settings.window_width, settings.window_height))
            .build(&event_loop)?,
    );

    let mut backend = pollster::block_on(WgpuBackend::new(window.clone()))?;
    let title = settings.program_title.clone();
    let color_by = options.color_by.unwrap_or(settings.color_by);
    let aspect_ratio = backend.aspect_ratio();
    let mut canvas = RadarCanvas::new(&mut backend, settings, aspect_ratio)?;
    canvas.set_pixel_scale(window.scale_factor() as f32);

    if let Some(path) = &options.mesh {
        let mesh = read_mesh(path)?;
        canvas.set_car_mesh(&mut backend, &mesh)?;
    }

    let mut app = ViewerApp {
        window,
        backend,
        canvas,
        title,
        sequence: None,
        timeline: Timeline::default(),
        color_by,
        loader: SequenceLoader::new(),
        cursor: None,
    };
    if let Some(path) = options.sequence {
        app.loader.load(path);
    }

    log::info!("Viewer started");
    event_loop.run(move |event, target| match event {
        Event::WindowEvent { event, window_id } if window_id == app.window.id() => {
            if matches!(event, WindowEvent::CloseRequested) {
                target.exit();
                return;
            }
            if let Err(e) = app.handle_window_event(event) {
                log::error!("{}", e);
            }
        }
        Event::AboutToWait => {
            app.poll_loader();
            target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + LOADER_POLL_INTERVAL));
        }
        _ => {}
    })?;

    Ok(())
}
