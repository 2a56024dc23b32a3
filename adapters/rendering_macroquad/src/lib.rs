#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Grid Walkers.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module so the control panel
//! can host buttons. All UI-specific calls live inside the local `ui` module to
//! avoid leaking Macroquad UI types throughout the renderer.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelUiResult};
use anyhow::{ensure, Result};
use glam::Vec2;
use grid_walkers_core::ControlKey;
use grid_walkers_rendering::{
    Color, FrameInput, Presentation, RenderingBackend, Scene, TracePresentation,
    WalkerPresentation,
};
use macroquad::input::{
    is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton,
};
use macroquad::math::Vec2 as MacroquadVec2;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::info;

/// Width of the control panel docked to the right of the grid, in pixels.
pub const CONTROL_PANEL_WIDTH: f32 = 280.0;

const PANEL_BACKGROUND: Color = Color::from_rgb_u8(28, 30, 38);
const TRACE_THICKNESS: f32 = 3.0;

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    latched: Option<ControlKey>,
}

impl ControlPanelInputState {
    /// Returns the control requested through the panel and clears the latch so
    /// the action fires only once.
    pub fn take(&mut self) -> Option<ControlKey> {
        self.latched.take()
    }

    /// Records that a control-panel button was pressed this frame.
    pub fn register(&mut self, key: ControlKey) {
        self.latched = Some(key);
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyboardShortcuts {
    /// `Q` quits the render loop.
    quit_requested: bool,
    /// Lifecycle control bound to the pressed key.
    control: Option<ControlKey>,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self::from_pressed(is_key_pressed)
    }

    fn from_pressed<F>(pressed: F) -> Self
    where
        F: Fn(KeyCode) -> bool,
    {
        let control = [
            (KeyCode::Enter, ControlKey::Start),
            (KeyCode::KpEnter, ControlKey::Start),
            (KeyCode::P, ControlKey::Pause),
            (KeyCode::R, ControlKey::Resume),
            (KeyCode::Backspace, ControlKey::Reset),
            (KeyCode::Escape, ControlKey::Cancel),
        ]
        .into_iter()
        .find_map(|(code, key)| pressed(code).then_some(key));

        Self {
            quit_requested: pressed(KeyCode::Q),
            control,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Time spent on a single frame, split by phase.
#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    update: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    update_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_update: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.update_accum += breakdown.update;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            match self.frame_times.pop_front() {
                Some(removed) => {
                    self.window_duration = self.window_duration.saturating_sub(removed);
                }
                None => break,
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_update: self.update_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.update_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        ensure!(
            scene.grid.width > 0.0 && scene.grid.height > 0.0,
            "scene has no drawable area ({}x{})",
            scene.grid.width,
            scene.grid.height
        );

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: (scene.grid.width + CONTROL_PANEL_WIDTH).round() as i32,
            window_height: scene.grid.height.round() as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let metrics_before = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let (cursor_x, cursor_y) = mouse_position();
                let frame_input = gather_frame_input(
                    &metrics_before,
                    Vec2::new(cursor_x, cursor_y),
                    is_mouse_button_pressed(MouseButton::Left),
                    control_panel_input.take().or(keyboard.control),
                );

                let update_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let update_duration = update_start.elapsed();

                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let render_start = Instant::now();
                draw_traces(&scene.traces, &metrics);
                draw_traces(&scene.in_flight, &metrics);
                draw_grid_points(&scene, &metrics);
                draw_walkers(&scene.walkers, scene.grid.walker_radius(), &metrics);

                let headline = scene.status.headline();
                let ControlPanelUiResult { pressed } = draw_control_panel(
                    &metrics,
                    screen_height,
                    headline.as_str(),
                    scene.status.instructions(),
                );
                if let Some(key) = pressed {
                    control_panel_input.register(key);
                }
                let render_duration = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    update: update_duration,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_update,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            fps_10s = trailing_ten_seconds,
                            update_ms = avg_update.as_secs_f64() * 1_000.0,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Mapping between scene pixels and screen pixels for the current window size.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    scene_width: f32,
    scene_height: f32,
    panel_left: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let scene_width = scene.grid.width;
        let scene_height = scene.grid.height;
        let panel_width = CONTROL_PANEL_WIDTH.min(screen_width);
        let available_width = (screen_width - panel_width).max(0.0);
        let scale = if scene_width <= f32::EPSILON || scene_height <= f32::EPSILON {
            1.0
        } else {
            (available_width / scene_width)
                .min(screen_height / scene_height)
                .max(0.0)
        };

        let offset_x = ((available_width - scene_width * scale) * 0.5).max(0.0);
        let offset_y = ((screen_height - scene_height * scale) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
            scene_width,
            scene_height,
            panel_left: available_width,
        }
    }

    fn to_screen(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + position.x * self.scale,
            self.offset_y + position.y * self.scale,
        )
    }

    /// Converts a screen position into scene pixels, if it lies over the drawable area.
    fn to_scene(&self, position: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON || position.x >= self.panel_left {
            return None;
        }
        let scene = Vec2::new(
            (position.x - self.offset_x) / self.scale,
            (position.y - self.offset_y) / self.scale,
        );
        let inside = scene.x >= 0.0
            && scene.y >= 0.0
            && scene.x <= self.scene_width
            && scene.y <= self.scene_height;
        inside.then_some(scene)
    }
}

fn gather_frame_input(
    metrics: &SceneMetrics,
    cursor_position: Vec2,
    clicked: bool,
    key: Option<ControlKey>,
) -> FrameInput {
    let click = if clicked {
        metrics.to_scene(cursor_position)
    } else {
        None
    };
    FrameInput { click, key }
}

fn draw_traces(traces: &[TracePresentation], metrics: &SceneMetrics) {
    let thickness = (TRACE_THICKNESS * metrics.scale).max(1.0);
    for trace in traces {
        let from = metrics.to_screen(trace.from);
        let to = metrics.to_screen(trace.to);
        macroquad::shapes::draw_line(
            from.x,
            from.y,
            to.x,
            to.y,
            thickness,
            to_macroquad_color(trace.color),
        );
    }
}

fn draw_grid_points(scene: &Scene, metrics: &SceneMetrics) {
    let radius = scene.grid.point_radius() * metrics.scale;
    let color = to_macroquad_color(scene.grid.point_color);
    for point in &scene.grid.points {
        let center = metrics.to_screen(point.position);
        macroquad::shapes::draw_circle(center.x, center.y, radius, color);
    }
}

fn draw_walkers(walkers: &[WalkerPresentation], radius: f32, metrics: &SceneMetrics) {
    let radius = radius * metrics.scale;
    for walker in walkers {
        let center = metrics.to_screen(walker.position);
        let fill = if walker.finished {
            walker.color.lighten(0.55)
        } else {
            walker.color
        };
        macroquad::shapes::draw_circle(center.x, center.y, radius, to_macroquad_color(fill));
        if walker.focused {
            macroquad::shapes::draw_circle_lines(
                center.x,
                center.y,
                radius * 1.5,
                2.0,
                macroquad::color::WHITE,
            );
        }
    }
}

fn draw_control_panel(
    metrics: &SceneMetrics,
    screen_height: f32,
    headline: &str,
    instructions: &str,
) -> ControlPanelUiResult {
    let background = to_macroquad_color(PANEL_BACKGROUND);
    macroquad::shapes::draw_rectangle(
        metrics.panel_left,
        0.0,
        CONTROL_PANEL_WIDTH,
        screen_height,
        background,
    );

    let mut control_panel_ui = macroquad::ui::root_ui();
    draw_control_panel_ui(
        &mut control_panel_ui,
        ControlPanelUiContext {
            origin: MacroquadVec2::new(metrics.panel_left, 0.0),
            size: MacroquadVec2::new(CONTROL_PANEL_WIDTH, screen_height),
            background,
            headline,
            instructions,
        },
    )
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
