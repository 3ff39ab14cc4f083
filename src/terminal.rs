// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera screen
//!
//! Renders the preview to the terminal using Unicode half-block characters
//! for improved vertical resolution, with a status bar carrying the effect
//! and shutter indicators.

use crate::app::preview::{PreviewLayer, SourceRect};
use crate::app::{Bounds, CameraController, ControllerEvent, InterfaceOrientation};
use crate::backends::camera::types::CameraFrame;
use crate::config::Config;
use crate::constants::ui::EVENT_POLL_INTERVAL;
use crate::storage::PicturesLibrary;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Run the interactive camera screen
pub fn run(config: &Config, runtime: &Handle) -> Result<(), Box<dyn std::error::Error>> {
    let backend = config.create_backend()?;
    let library = Arc::new(PicturesLibrary::new(
        config.photo_directory(),
        config.encoder(),
        runtime.clone(),
    ));
    let mut controller = CameraController::new(backend, library, runtime.clone());

    // Load before touching the terminal so a missing camera is reported plainly
    let (columns, rows) = crossterm::terminal::size()?;
    controller.load(preview_bounds(columns, rows))?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut controller);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Preview bounds in half-block pixels for a terminal of the given size
///
/// The bottom row is reserved for the status bar.
fn preview_bounds(columns: u16, rows: u16) -> Bounds {
    Bounds::new(columns as u32, rows.saturating_sub(1) as u32 * 2)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut CameraController,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut status_message = build_status_message();

    // First layout pass with the real terminal size
    let area = terminal.size()?;
    let bounds = preview_bounds(area.width, area.height);
    controller.layout(bounds, InterfaceOrientation::from_bounds(bounds));

    loop {
        for event in controller.poll() {
            status_message = describe_event(&event).unwrap_or_else(build_status_message);
        }

        let now = Instant::now();
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(
                FrameWidget {
                    preview: controller.preview(),
                },
                camera_area,
            );

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let status = StatusBar {
                message: &status_message,
                effect_opacity: controller.effect().opacity(),
                shutter_opacity: controller.shutter().opacity_at(now),
                orientation: controller
                    .preview()
                    .connection()
                    .map(|c| c.video_orientation.to_string()),
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input with timeout for frame updates
        if !event::poll(EVENT_POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Resize(columns, rows) => {
                let bounds = preview_bounds(columns, rows);
                controller.layout(bounds, InterfaceOrientation::from_bounds(bounds));
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }

                match key.code {
                    KeyCode::Char(' ') | KeyCode::Char('p') => {
                        if controller.shutter_pressed() {
                            status_message = "Capturing...".to_string();
                        } else {
                            debug!("Shutter ignored, no photo output");
                        }
                    }
                    KeyCode::Char('e') => {
                        controller.toggle_effect();
                        status_message = build_status_message();
                    }
                    KeyCode::Char('q') => break,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    info!(captures = controller.captures_submitted(), "Leaving camera screen");
    Ok(())
}

fn build_status_message() -> String {
    "'space' shutter | 'e' effect | 'q' quit".to_string()
}

/// Status text for an event
///
/// Failures only go to the log; `None` puts the key help back.
fn describe_event(event: &ControllerEvent) -> Option<String> {
    match event {
        ControllerEvent::PhotoCaptured { .. } => Some("Processing...".to_string()),
        ControllerEvent::PhotoSaved(Ok(path)) => Some(format!("Saved: {}", path.display())),
        ControllerEvent::PhotoSaved(Err(e)) | ControllerEvent::CaptureFailed(e) => {
            debug!(error = %e, "Capture dropped");
            None
        }
    }
}

/// Widget that renders the preview layer using half-block characters
struct FrameWidget<'a> {
    preview: &'a PreviewLayer,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.preview.latest_frame() else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };
        if area.width == 0 || area.height == 0 || frame.width == 0 || frame.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels, so the viewport is
        // area.width x (area.height * 2) pixels, filled edge to edge
        let pixel_rows = area.height as f64 * 2.0;
        let viewport_aspect = area.width as f64 / pixel_rows;
        let rect = self
            .preview
            .source_rect(frame.width, frame.height, viewport_aspect);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..area.height {
            for tx in 0..area.width {
                let u = tx as f64 / area.width as f64;
                let top = sample(frame, &rect, u, (ty as f64 * 2.0) / pixel_rows);
                let bottom = sample(frame, &rect, u, (ty as f64 * 2.0 + 1.0) / pixel_rows);

                if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Color at normalised viewport position (u, v) within the visible source rect
fn sample(frame: &CameraFrame, rect: &SourceRect, u: f64, v: f64) -> Color {
    let x = (rect.x + u * rect.width) as u32;
    let y = (rect.y + v * rect.height) as u32;
    let (r, g, b) = sample_pixel_rgb(frame, x, y);
    Color::Rgb(r, g, b)
}

fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let idx = (y * frame.stride + x * frame.format.bytes_per_pixel()) as usize;
    match frame.data.get(idx..idx + 3) {
        Some(px) => (px[0], px[1], px[2]),
        None => (0, 0, 0),
    }
}

/// Grey level for an indicator drawn at `opacity` over the dark status bar
fn indicator_color(opacity: f32) -> Color {
    let level = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color::Rgb(level, level, level)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    effect_opacity: f32,
    shutter_opacity: f32,
    orientation: Option<String>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let base = ratatui::style::Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray);

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        // Indicators on the left: shutter, then effect
        let (x, _) = buf.set_stringn(
            area.x,
            area.y,
            " ● ",
            area.width as usize,
            base.fg(indicator_color(self.shutter_opacity)),
        );
        let (x, _) = buf.set_stringn(
            x,
            area.y,
            "FX ",
            (area.x + area.width).saturating_sub(x) as usize,
            base.fg(indicator_color(self.effect_opacity)),
        );

        let mut text = self.message.to_string();
        if let Some(orientation) = self.orientation {
            text.push_str(&format!(" | {}", orientation));
        }
        buf.set_stringn(
            x,
            area.y,
            &text,
            (area.x + area.width).saturating_sub(x) as usize,
            base,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PhotoError;

    #[test]
    fn test_preview_bounds_reserve_status_row() {
        assert_eq!(preview_bounds(80, 25), Bounds::new(80, 48));
        assert_eq!(preview_bounds(80, 0), Bounds::new(80, 0));
    }

    #[test]
    fn test_indicator_color_follows_opacity() {
        assert_eq!(indicator_color(1.0), Color::Rgb(255, 255, 255));
        assert_eq!(indicator_color(0.3), Color::Rgb(76, 76, 76));
    }

    #[test]
    fn test_failures_keep_key_help() {
        let failures = [
            ControllerEvent::CaptureFailed(PhotoError::DecodeFailed("bad".into())),
            ControllerEvent::CaptureFailed(PhotoError::MissingImageData),
            ControllerEvent::PhotoSaved(Err(PhotoError::SaveFailed("disk full".into()))),
        ];
        for event in &failures {
            assert_eq!(describe_event(event), None);
        }
    }

    #[test]
    fn test_saved_photo_shows_path() {
        let event = ControllerEvent::PhotoSaved(Ok("/pictures/IMG_1.jpg".into()));
        assert_eq!(describe_event(&event).unwrap(), "Saved: /pictures/IMG_1.jpg");
    }

    #[test]
    fn test_sample_clamps_to_frame() {
        let frame = CameraFrame::from_rgba(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 255]);
        assert_eq!(sample_pixel_rgb(&frame, 0, 0), (10, 20, 30));
        assert_eq!(sample_pixel_rgb(&frame, 9, 9), (40, 50, 60));
    }
}
