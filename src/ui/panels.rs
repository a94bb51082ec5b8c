use std::path::PathBuf;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Sense, Stroke, Ui, vec2};

use crate::config::AppConfig;
use crate::controller::SessionView;
use crate::data::payload::{UploadBatch, UploadedFile};
use crate::session::{Mode, Slot};
use crate::state::{HelpWindow, UiState};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Title, Help and Reset.
pub fn top_bar(ui: &mut Ui, state: &mut UiState, view: &SessionView, config: &AppConfig) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.strong("Dynamic Mode Decomposition Dashboard");
        ui.separator();

        if ui.button("Help").clicked() {
            state.help = Some(HelpWindow::General);
        }
        if ui.button("Reset").clicked() {
            state.reset(config);
        }

        ui.separator();
        if let Some(atlas) = &view.atlas_name {
            ui.label(format!("Atlas: {atlas}"));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – setting and selection
// ---------------------------------------------------------------------------

/// Setting radio buttons, numeric inputs, selected files and Run.
pub fn selection_panel(ui: &mut Ui, state: &mut UiState, view: &SessionView) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Setting");
            ui.separator();

            let mut mode = state.mode;
            for (label, value) in [
                ("Analysis", Mode::Analysis),
                ("Comparison", Mode::Comparison),
                ("Mode Matching", Mode::MatchModes),
            ] {
                ui.radio_value(&mut mode, Some(value), label);
            }
            state.select_mode(mode);

            ui.add_space(8.0);
            ui.heading("Selection");
            ui.separator();

            ui.label("Sampling Time (seconds)");
            let dt = ui.add(
                DragValue::new(&mut state.sampling_time)
                    .range(0.001..=f64::MAX)
                    .speed(0.01)
                    .max_decimals(4),
            );
            if dt.drag_stopped() || (dt.changed() && !dt.dragged()) {
                state.sampling_time_changed();
            }

            ui.label("Number of modes to plot");
            let modes = ui.add(DragValue::new(&mut state.mode_count).range(1..=50));
            if view.valid && (modes.drag_stopped() || (modes.changed() && !modes.dragged())) {
                state.request_figures();
            }

            if view.layout.approx_visible {
                ui.label("Approximation degree");
                ui.add(DragValue::new(&mut state.approx_degree).range(0..=100).suffix(" %"));
            }

            if ui
                .checkbox(&mut state.show_imaginary, "Plot Imaginary Values")
                .changed()
            {
                state.send(crate::controller::Event::ImaginaryToggled(state.show_imaginary));
                if view.valid {
                    state.request_figures();
                }
            }

            ui.add_space(8.0);
            selected_files(ui, view);

            if let Some(alert) = &view.import_alert {
                ui.label(RichText::new(alert).color(Color32::RED));
            }

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Help").clicked() {
                    state.help = Some(HelpWindow::Selection);
                }
                if ui.button(RichText::new("Run").strong()).clicked() {
                    state.run();
                }
            });
            if let Some(alert) = &view.message_alert {
                ui.label(RichText::new(alert).color(Color32::RED));
            }
        });
}

fn selected_files(ui: &mut Ui, view: &SessionView) {
    for slot in [Slot::First, Slot::Second] {
        let i = slot.index();
        let Some(title) = view.layout.group_titles[i] else {
            continue;
        };
        ui.strong(title);
        if view.files[i].is_empty() {
            ui.weak("none");
        }
        for name in &view.files[i] {
            ui.label(name);
        }
        for name in &view.skipped[i] {
            ui.label(RichText::new(format!("{name} (skipped)")).color(Color32::GRAY));
        }
    }
}

// ---------------------------------------------------------------------------
// Upload row
// ---------------------------------------------------------------------------

/// Drop regions with a Browse button each. Hidden once inputs are validated.
pub fn upload_row(ui: &mut Ui, state: &mut UiState, view: &SessionView) {
    state.drop_zones = [None, None];
    if !view.upload_row_visible() {
        return;
    }
    let visible: Vec<Slot> = [Slot::First, Slot::Second]
        .into_iter()
        .filter(|s| view.layout.upload_visible[s.index()])
        .collect();
    if visible.is_empty() {
        ui.label("Choose a setting to start.");
        return;
    }

    let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
    let pointer = ui.ctx().input(|i| i.pointer.hover_pos());
    let width = (ui.available_width() - 8.0 * (visible.len() - 1) as f32) / visible.len() as f32;

    ui.horizontal(|ui: &mut Ui| {
        for slot in visible {
            let (rect, response) = ui.allocate_exact_size(vec2(width, 64.0), Sense::click());
            state.drop_zones[slot.index()] = Some(rect);

            let highlighted = hovering && pointer.is_some_and(|p| rect.contains(p));
            let stroke = if highlighted {
                Stroke::new(2.0, ui.visuals().selection.stroke.color)
            } else {
                Stroke::new(1.0, Color32::GRAY)
            };
            ui.painter().rect_stroke(rect, 6.0, stroke, egui::StrokeKind::Inside);
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                view.layout.upload_prompts[slot.index()],
                egui::FontId::proportional(14.0),
                ui.visuals().text_color(),
            );

            if response.on_hover_text("Click to browse").clicked() {
                if let Some(batch) = pick_files(state) {
                    state.upload(slot, batch);
                }
            }
        }
    });
}

/// Build a batch from dropped or picked paths, reporting unreadable files.
pub fn batch_from_paths(paths: &[PathBuf], state: &mut UiState) -> Option<UploadBatch> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match UploadedFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                log::error!("Failed to read upload: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
    if files.is_empty() {
        None
    } else {
        log::info!("{} file(s) selected", files.len());
        Some(UploadBatch::new(files))
    }
}

fn pick_files(state: &mut UiState) -> Option<UploadBatch> {
    let paths = rfd::FileDialog::new()
        .set_title("Select time-series files")
        .add_filter("Supported files", &["mat", "csv"])
        .add_filter("MATLAB", &["mat"])
        .add_filter("CSV", &["csv"])
        .pick_files()?;
    batch_from_paths(&paths, state)
}
