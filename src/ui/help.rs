use eframe::egui::{self, Context, Ui};

use crate::state::{HelpWindow, UiState};

fn section(ui: &mut Ui, title: &str, body: &str) {
    ui.add_space(6.0);
    ui.strong(title);
    ui.label(body);
}

fn general(ui: &mut Ui) {
    ui.label(
        "Based on 'Dynamic mode decomposition of resting-state and task fMRI' by Casorso et al., \
         the dashboard analyses, compares and displays the dynamic mode decomposition of fMRI \
         time-series data.",
    );
    section(
        ui,
        "Analysis",
        "Decompose one or several time-series files. Set the sampling time, select the file(s) \
         and choose how many modes to visualise.",
    );
    section(
        ui,
        "Comparison",
        "Decompose two groups of files and inspect the similarities and differences between \
         their decompositions.",
    );
    section(
        ui,
        "Mode Matching",
        "Match a group's decomposition onto a reference group. Select the Reference group before \
         the Match group. The top 10 modes of the Match group are approximated with a share of \
         the reference modes given by the approximation degree (0 to 100); higher degrees take \
         longer. Set the degree before uploading the Match data.",
    );
    ui.add_space(6.0);
    ui.weak("This window stays available through the Help button.");
}

fn selection(ui: &mut Ui) {
    ui.label("All parameters of the decomposition visualisation are set here.");
    section(
        ui,
        "File Selection",
        "MATLAB (.mat) and .csv files are accepted. For MATLAB files the last matrix in the file \
         is used. Accepted file names are listed above the Run button; errors appear below the \
         file list and the Log tab always has the details.",
    );
    section(
        ui,
        "Sampling Time (seconds)",
        "Sampling interval of the recording, used for damping times, periods and the activity \
         of each mode over time.",
    );
    section(
        ui,
        "Number of modes",
        "Cortical surface plots are costly, so only the first n modes are visualised.",
    );
    section(
        ui,
        "[Mode Matching] Approximation degree",
        "Percentage of the atlas regions used as reference modes for the approximation. For \
         example, to use the first 50 modes of Schaefer data (400 regions), choose 25.",
    );
    section(
        ui,
        "Plot imaginary values",
        "Also draw the imaginary parts of the mode vectors in the radar and cortical plots.",
    );
}

/// Show the open help window, if any.
pub fn help_window(ctx: &Context, state: &mut UiState) {
    let Some(which) = state.help else {
        return;
    };
    let title = match which {
        HelpWindow::General => "Welcome to the Dynamic Mode Decomposition Dashboard!",
        HelpWindow::Selection => "Welcome to the Selection toolbar!",
    };

    let mut open = true;
    egui::Window::new(title)
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(480.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| match which {
            HelpWindow::General => general(ui),
            HelpWindow::Selection => selection(ui),
        });
    if !open {
        state.help = None;
    }
}
