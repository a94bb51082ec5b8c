use eframe::egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::analysis::ModeRow;
use crate::download::{self, SaveTarget, DATA_MIME};
use crate::state::UiState;

const ROW_HEIGHT: f32 = 20.0;

/// Mode table with a CSV export button. `name` is the default export stem.
pub fn mode_table(ui: &mut Ui, state: &mut UiState, rows: Option<&[ModeRow]>, name: &str) {
    let Some(rows) = rows else {
        ui.label("No decomposition loaded.");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{} modes", rows.len()));
        if ui.button("Export CSV").clicked() {
            export(state, rows, name);
        }
    });

    let formatted = download::table_rows(rows);
    TableBuilder::new(ui)
        .id_salt(name)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(50.0))
        .column(Column::auto().at_least(180.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::remainder())
        .header(ROW_HEIGHT, |mut header| {
            for title in ["Mode", "Value", "Damping Time", "Period"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, formatted.len(), |mut row| {
                let r = &formatted[row.index()];
                row.col(|ui: &mut Ui| {
                    ui.label(r.mode.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(RichText::new(&r.value).monospace());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(RichText::new(&r.damping_time).monospace());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(RichText::new(&r.period).monospace());
                });
            });
        });
}

fn export(state: &mut UiState, rows: &[ModeRow], name: &str) {
    let result = download::table_csv(rows).and_then(|csv| {
        download::save(&SaveTarget::for_content(DATA_MIME, Some(name)), csv.as_bytes())
    });
    if let Err(e) = result {
        log::error!("Failed to export table: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}

/// Log lines, newest at the bottom.
pub fn log_view(ui: &mut Ui, lines: &[String]) {
    eframe::egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show_rows(ui, ROW_HEIGHT - 4.0, lines.len(), |ui: &mut Ui, range| {
            for line in &lines[range] {
                let color = if line.contains("| ERROR") {
                    Color32::RED
                } else if line.contains("| WARN") {
                    Color32::YELLOW
                } else {
                    ui.visuals().text_color()
                };
                ui.label(RichText::new(line).monospace().color(color));
            }
        });
}
