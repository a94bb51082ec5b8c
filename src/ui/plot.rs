use std::f64::consts::TAU;

use eframe::egui::{self, Color32, ProgressBar, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::{diverging, group_color, mode_color};
use crate::controller::SessionView;
use crate::download::{self, SaveTarget, SVG_MIME};
use crate::figures::{BrainFigure, FigureSet, RadarFigure, Series, SpectreFigure};
use crate::state::UiState;
use crate::svg_export::SvgPlot;

const SVG_SIZE: (f64, f64) = (800.0, 500.0);

fn placeholder(ui: &mut Ui, state: &UiState) {
    ui.centered_and_justified(|ui: &mut Ui| {
        if state.computing {
            ui.spinner();
        } else {
            ui.heading("Choose a setting, select files and press Run");
        }
    });
}

fn save_svg(state: &mut UiState, name: &str, svg: String) {
    if let Err(e) = download::save(&SaveTarget::for_content(SVG_MIME, Some(name)), svg.as_bytes()) {
        log::error!("Failed to save {name}: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}

// ---------------------------------------------------------------------------
// Graphs tab: radar, spectre, time plot
// ---------------------------------------------------------------------------

pub fn graphs_tab(ui: &mut Ui, state: &mut UiState, view: &SessionView) {
    let Some(figures) = view.figures.clone() else {
        placeholder(ui, state);
        return;
    };
    let half = ui.available_height() / 2.0;

    ui.columns(2, |cols| {
        radar_plot(&mut cols[0], state, &figures.radar, half);
        spectre_plot(&mut cols[1], state, &figures, half);
    });
    timeplot(ui, state, &figures.timeplot);
}

fn series_color(label: &str, index: usize, total: usize) -> Color32 {
    if label.starts_with("Group 2") {
        group_color(1)
    } else if label.starts_with("Group 1") && total <= 2 {
        group_color(0)
    } else {
        mode_color(index + 1, total)
    }
}

fn spectre_plot(ui: &mut Ui, state: &mut UiState, figures: &FigureSet, height: f32) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Spectre");
        if ui.small_button("Save SVG").clicked() {
            save_svg(state, "spectre", spectre_svg(&figures.spectre));
        }
    });

    match &figures.spectre {
        SpectreFigure::Groups(groups) => {
            Plot::new("spectre")
                .legend(Legend::default())
                .x_axis_label("Frequency (Hz)")
                .y_axis_label("Absolute value of eigenvalue")
                .height(height - 30.0)
                .show(ui, |plot_ui| {
                    for (i, series) in groups.iter().enumerate() {
                        plot_ui.points(
                            Points::new(finite(&series.points))
                                .name(&series.label)
                                .color(group_color(i))
                                .radius(3.0),
                        );
                    }
                });
        }
        SpectreFigure::Correlation { approximated, real } => {
            let points: Vec<[f64; 2]> = approximated
                .iter()
                .zip(real)
                .map(|(&a, &r)| [a, r])
                .collect();
            Plot::new("spectre")
                .x_axis_label("Approximated")
                .y_axis_label("Real")
                .data_aspect(1.0)
                .height(height - 30.0)
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(vec![[0.0, 0.0], [1.0, 1.0]])
                            .color(Color32::GRAY)
                            .style(egui_plot::LineStyle::dashed_dense()),
                    );
                    plot_ui.points(
                        Points::new(points)
                            .name("Matched modes")
                            .color(group_color(0))
                            .radius(3.0),
                    );
                });
        }
    }
}

fn spectre_svg(figure: &SpectreFigure) -> String {
    let mut svg = SvgPlot::new(SVG_SIZE.0, SVG_SIZE.1).title("Spectre");
    match figure {
        SpectreFigure::Groups(groups) => {
            svg = svg.axes("Frequency (Hz)", "Absolute value of eigenvalue");
            for (i, series) in groups.iter().enumerate() {
                svg.scatter(series, group_color(i));
            }
        }
        SpectreFigure::Correlation { approximated, real } => {
            svg = svg.axes("Approximated", "Real");
            let series = Series {
                label: "Matched modes".to_string(),
                points: approximated.iter().zip(real).map(|(&a, &r)| [a, r]).collect(),
            };
            svg.scatter(&series, group_color(0));
        }
    }
    svg.finish()
}

fn timeplot(ui: &mut Ui, state: &mut UiState, series: &[Series]) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Activity of modes over time");
        if ui.small_button("Save SVG").clicked() {
            let mut svg = SvgPlot::new(SVG_SIZE.0, SVG_SIZE.1)
                .title("Time plot")
                .axes("Time (s)", "Activity");
            for (i, s) in series.iter().enumerate() {
                svg.line(s, series_color(&s.label, i, series.len()));
            }
            save_svg(state, "timeplot", svg.finish());
        }
    });

    Plot::new("timeplot")
        .legend(Legend::default())
        .x_axis_label("Time (s)")
        .y_axis_label("Activity")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, s) in series.iter().enumerate() {
                plot_ui.line(
                    Line::new(finite(&s.points))
                        .name(&s.label)
                        .color(series_color(&s.label, i, series.len()))
                        .width(1.5),
                );
            }
        });
}

/// Polar plot drawn as closed lines, one spoke per network.
fn radar_plot(ui: &mut Ui, state: &mut UiState, figure: &RadarFigure, height: f32) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Network activation");
        if ui.small_button("Save SVG").clicked() {
            let mut svg = SvgPlot::new(SVG_SIZE.1, SVG_SIZE.1).title("Network activation");
            for (i, s) in radar_series(figure).iter().enumerate() {
                svg.line(s, mode_color(i + 1, figure.series.len()));
            }
            save_svg(state, "radar", svg.finish());
        }
    });

    let n = figure.axes.len().max(1);
    Plot::new("radar")
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .height(height - 30.0)
        .show(ui, |plot_ui| {
            for (k, axis) in figure.axes.iter().enumerate() {
                let angle = TAU * k as f64 / n as f64;
                let tip = [angle.cos(), angle.sin()];
                plot_ui.line(Line::new(vec![[0.0, 0.0], tip]).color(Color32::DARK_GRAY));
                plot_ui.text(Text::new(
                    PlotPoint::new(1.15 * tip[0], 1.15 * tip[1]),
                    axis.as_str(),
                ));
            }
            for (i, s) in radar_series(figure).into_iter().enumerate() {
                plot_ui.line(
                    Line::new(s.points)
                        .name(&s.label)
                        .color(mode_color(i + 1, figure.series.len()))
                        .width(1.5),
                );
            }
        });
}

/// Radar values as closed polygons in cartesian coordinates.
pub fn radar_series(figure: &RadarFigure) -> Vec<Series> {
    let n = figure.axes.len();
    if n == 0 {
        return Vec::new();
    }
    figure
        .series
        .iter()
        .map(|s| {
            let mut points: Vec<[f64; 2]> = s
                .values
                .iter()
                .enumerate()
                .map(|(k, &r)| {
                    let angle = TAU * k as f64 / n as f64;
                    [r * angle.cos(), r * angle.sin()]
                })
                .collect();
            if let Some(&first) = points.first() {
                points.push(first);
            }
            Series {
                label: s.label.clone(),
                points,
            }
        })
        .collect()
}

fn finite(points: &[[f64; 2]]) -> PlotPoints {
    points
        .iter()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Cortical plots tab
// ---------------------------------------------------------------------------

pub fn cortical_tab(ui: &mut Ui, state: &mut UiState, view: &SessionView, progress: &(u32, String)) {
    if state.computing {
        ui.label("Loading cortical surface graphs...");
        ui.add(
            ProgressBar::new(progress.0 as f32 / 100.0)
                .text(progress.1.as_str())
                .desired_width(ui.available_width() * 0.7),
        );
    }
    let Some(figures) = view.figures.clone() else {
        if !state.computing {
            placeholder(ui, state);
        }
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for brain in &figures.brains {
                brain_plot(ui, brain);
                ui.separator();
            }
        });
}

fn brain_plot(ui: &mut Ui, figure: &BrainFigure) {
    ui.strong(format!("Mode {}", figure.mode));
    let panels: Vec<(String, &[f64])> = figure
        .groups
        .iter()
        .flat_map(|g| {
            let mut out = vec![(format!("{} (real)", g.label), g.real.as_slice())];
            if let Some(imag) = &g.imag {
                out.push((format!("{} (imag)", g.label), imag.as_slice()));
            }
            out
        })
        .collect();

    ui.columns(panels.len().max(1), |cols| {
        for (col, (label, values)) in cols.iter_mut().zip(&panels) {
            col.label(label);
            let scale = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            Plot::new(format!("brain-{}-{label}", figure.mode))
                .data_aspect(1.0)
                .show_axes(false)
                .show_grid(false)
                .allow_drag(false)
                .allow_scroll(false)
                .height(220.0)
                .show(col, |plot_ui| {
                    for (coord, &v) in figure.coords.iter().zip(values.iter()) {
                        let normalised = if scale > 0.0 { v / scale } else { 0.0 };
                        plot_ui.points(
                            Points::new(vec![*coord])
                                .color(diverging(normalised))
                                .radius(4.0)
                                .filled(true),
                        );
                    }
                });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figures::RadarSeries;

    #[test]
    fn radar_polygons_are_closed() {
        let figure = RadarFigure {
            axes: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            series: vec![RadarSeries {
                label: "Mode 1".into(),
                values: vec![1.0, 0.5, 0.0, 0.25],
            }],
        };
        let series = radar_series(&figure);
        assert_eq!(series.len(), 1);
        let points = &series[0].points;
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], points[4]);
        assert!((points[1][1] - 0.5).abs() < 1e-12);
        assert!(points[2][0].abs() < 1e-12);
    }

    #[test]
    fn radar_without_axes_is_empty() {
        let figure = RadarFigure {
            axes: Vec::new(),
            series: Vec::new(),
        };
        assert!(radar_series(&figure).is_empty());
    }

    #[test]
    fn spectre_svg_has_one_marker_per_finite_point() {
        let figure = SpectreFigure::Groups(vec![Series {
            label: "Modes".into(),
            points: vec![[0.0, 1.0], [0.1, 0.9], [f64::NAN, 0.5]],
        }]);
        let svg = spectre_svg(&figure);
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn group_two_keeps_its_colour() {
        assert_eq!(series_color("Group 2 · Mode 3", 7, 10), group_color(1));
        assert_eq!(series_color("Group 1 · Mode 1", 0, 2), group_color(0));
    }
}
