//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use grid_walkers_core::ControlKey;
use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};

/// Buttons shown on the control panel, in display order.
const BUTTONS: [(&str, ControlKey); 5] = [
    ("Start (Enter)", ControlKey::Start),
    ("Pause (P)", ControlKey::Pause),
    ("Resume (R)", ControlKey::Resume),
    ("Reset (Backspace)", ControlKey::Reset),
    ("Cancel removal (Esc)", ControlKey::Cancel),
];

/// Outcome of rendering the control panel UI for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlPanelUiResult {
    /// Control requested through a button, if any.
    pub(crate) pressed: Option<ControlKey>,
}

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Debug)]
pub(crate) struct ControlPanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub(crate) origin: Vec2,
    /// Panel dimensions in screen space.
    pub(crate) size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub(crate) background: Color,
    /// State label and walker counts.
    pub(crate) headline: &'a str,
    /// Instructions for the current lifecycle state.
    pub(crate) instructions: &'a str,
}

/// Renders the control panel's labels and buttons for the current frame.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext<'_>,
) -> ControlPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(62, 66, 80, 255))
        .color_hovered(Color::from_rgba(88, 94, 112, 255))
        .color_clicked(Color::from_rgba(48, 52, 64, 255))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut pressed = None;
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        ui.label(None, context.headline);
        for line in wrap_words(context.instructions, 28) {
            ui.label(None, line.as_str());
        }

        for (label, key) in BUTTONS {
            if ui.button(None, label) {
                pressed = Some(key);
            }
        }
    });

    ui.pop_skin();

    ControlPanelUiResult { pressed }
}

/// Greedily splits `text` into lines of at most `width` characters.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
