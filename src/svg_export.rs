use eframe::egui::Color32;

use crate::figures::Series;

const MARGIN: f64 = 48.0;

/// Minimal SVG writer for line and scatter figures. Data coordinates are
/// mapped onto the plot area when [`SvgPlot::finish`] is called.
pub struct SvgPlot {
    width: f64,
    height: f64,
    title: String,
    x_label: String,
    y_label: String,
    layers: Vec<Layer>,
}

struct Layer {
    label: String,
    points: Vec<[f64; 2]>,
    color: Color32,
    scatter: bool,
}

impl SvgPlot {
    pub fn new(width: f64, height: f64) -> Self {
        SvgPlot {
            width: width.max(2.0 * MARGIN + 1.0),
            height: height.max(2.0 * MARGIN + 1.0),
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            layers: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    pub fn line(&mut self, series: &Series, color: Color32) {
        self.layers.push(Layer {
            label: series.label.clone(),
            points: series.points.clone(),
            color,
            scatter: false,
        });
    }

    pub fn scatter(&mut self, series: &Series, color: Color32) {
        self.layers.push(Layer {
            label: series.label.clone(),
            points: series.points.clone(),
            color,
            scatter: true,
        });
    }

    fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for p in self.layers.iter().flat_map(|l| &l.points) {
            if p[0].is_finite() && p[1].is_finite() {
                x = [x[0].min(p[0]), x[1].max(p[0])];
                y = [y[0].min(p[1]), y[1].max(p[1])];
            }
        }
        let widen = |r: [f64; 2]| {
            if !r[0].is_finite() {
                [0.0, 1.0]
            } else if r[1] - r[0] < f64::EPSILON {
                [r[0] - 0.5, r[1] + 0.5]
            } else {
                r
            }
        };
        (widen(x), widen(y))
    }

    pub fn finish(self) -> String {
        let (xr, yr) = self.bounds();
        let (w, h) = (self.width, self.height);
        let plot_w = w - 2.0 * MARGIN;
        let plot_h = h - 2.0 * MARGIN;
        let to_px = |p: [f64; 2]| {
            (
                MARGIN + (p[0] - xr[0]) / (xr[1] - xr[0]) * plot_w,
                h - MARGIN - (p[1] - yr[0]) / (yr[1] - yr[0]) * plot_h,
            )
        };

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        svg.push_str(&format!(
            "\n<rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"#ffffff\" />"
        ));
        svg.push_str(&format!(
            "\n<rect x=\"{MARGIN}\" y=\"{MARGIN}\" width=\"{plot_w}\" height=\"{plot_h}\" fill=\"none\" stroke=\"#888888\" stroke-width=\"1\" />"
        ));
        if !self.title.is_empty() {
            svg.push_str(&format!(
                "\n<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"16\">{}</text>",
                w / 2.0,
                MARGIN / 2.0,
                escape_text(&self.title)
            ));
        }
        svg.push_str(&format!(
            "\n<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\">{}</text>",
            w / 2.0,
            h - MARGIN / 4.0,
            escape_text(&self.x_label)
        ));
        svg.push_str(&format!(
            "\n<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\" transform=\"rotate(-90 {x} {y})\">{}</text>",
            escape_text(&self.y_label),
            x = MARGIN / 3.0,
            y = h / 2.0,
        ));
        for (label, value, (px, py)) in [
            ("x-min", xr[0], to_px([xr[0], yr[0]])),
            ("x-max", xr[1], to_px([xr[1], yr[0]])),
        ] {
            svg.push_str(&format!(
                "\n<text class=\"{label}\" x=\"{px}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"10\">{value:.3}</text>",
                py + 14.0
            ));
        }
        for (label, value, (px, py)) in [
            ("y-min", yr[0], to_px([xr[0], yr[0]])),
            ("y-max", yr[1], to_px([xr[0], yr[1]])),
        ] {
            svg.push_str(&format!(
                "\n<text class=\"{label}\" x=\"{}\" y=\"{py}\" text-anchor=\"end\" font-family=\"sans-serif\" font-size=\"10\">{value:.3}</text>",
                px - 4.0
            ));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            let color = color_to_rgb(layer.color);
            let finite = layer
                .points
                .iter()
                .filter(|p| p[0].is_finite() && p[1].is_finite())
                .map(|&p| to_px(p));
            if layer.scatter {
                for (x, y) in finite {
                    svg.push_str(&format!(
                        "\n<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"3\" fill=\"{color}\" />"
                    ));
                }
            } else {
                let coords: Vec<String> = finite.map(|(x, y)| format!("{x:.2},{y:.2}")).collect();
                svg.push_str(&format!(
                    "\n<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" />",
                    coords.join(" ")
                ));
            }
            // Legend entry.
            let ly = MARGIN + 14.0 * (i as f64 + 1.0);
            svg.push_str(&format!(
                "\n<text x=\"{}\" y=\"{ly}\" text-anchor=\"end\" font-family=\"sans-serif\" font-size=\"11\" fill=\"{color}\">{}</text>",
                w - MARGIN - 6.0,
                escape_text(&layer.label)
            ));
        }

        svg.push_str("\n</svg>");
        svg
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn color_to_rgb(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(label: &str, points: Vec<[f64; 2]>) -> Series {
        Series {
            label: label.to_string(),
            points,
        }
    }

    #[test]
    fn writes_polyline_and_escaped_labels() {
        let mut plot = SvgPlot::new(400.0, 300.0)
            .title("Spectre <Group 1 & 2>")
            .axes("Frequency", "Magnitude");
        plot.line(&series("Group 1", vec![[0.0, 0.0], [1.0, 1.0]]), Color32::RED);
        let svg = plot.finish();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Spectre &lt;Group 1 &amp; 2&gt;"));
        // Corners of the plot area.
        assert!(svg.contains("points=\"48.00,252.00 352.00,48.00\""));
        assert!(svg.contains("stroke=\"#ff0000\""));
    }

    #[test]
    fn scatter_skips_non_finite_points() {
        let mut plot = SvgPlot::new(200.0, 200.0);
        plot.scatter(
            &series("Modes", vec![[0.0, 1.0], [f64::INFINITY, 2.0], [1.0, 2.0]]),
            Color32::BLUE,
        );
        let svg = plot.finish();
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn empty_plot_is_still_valid() {
        let svg = SvgPlot::new(10.0, 10.0).finish();
        assert!(svg.contains("viewBox"));
        assert!(!svg.contains("NaN"));
    }
}
