use crate::analysis::{Complex64, Decomposition, MatchResult};
use crate::error::{DashboardError, Result};
use crate::session::{ProgressCounter, Session};

// ---------------------------------------------------------------------------
// Figure data handed to the renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpectreFigure {
    /// Mode magnitude against frequency, one series per group.
    Groups(Vec<Series>),
    /// Approximated against real eigenvalue magnitudes of a match.
    Correlation { approximated: Vec<f64>, real: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarSeries {
    pub label: String,
    /// One value per network axis, scaled to a maximum of 1.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarFigure {
    pub axes: Vec<String>,
    pub series: Vec<RadarSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrainGroup {
    pub label: String,
    pub real: Vec<f64>,
    pub imag: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrainFigure {
    pub mode: usize,
    pub coords: Vec<[f64; 2]>,
    pub groups: Vec<BrainGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureSet {
    pub spectre: SpectreFigure,
    pub timeplot: Vec<Series>,
    pub radar: RadarFigure,
    pub brains: Vec<BrainFigure>,
}

// ---------------------------------------------------------------------------
// Selection of what to draw from the populated session fields
// ---------------------------------------------------------------------------

/// Which result objects the figures are built from.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Reference(&'a Decomposition),
    Pair(&'a Decomposition, &'a Decomposition),
    Match(&'a Decomposition, &'a MatchResult),
}

impl<'a> Selection<'a> {
    pub fn from_session(session: &'a Session) -> Result<Self> {
        let reference = session
            .reference()
            .ok_or(DashboardError::MissingReference)?;
        if let Some(comparison) = session.comparison() {
            return Ok(Selection::Pair(reference, comparison));
        }
        if let Some(result) = session.match_result() {
            return Ok(Selection::Match(reference, result));
        }
        Ok(Selection::Reference(reference))
    }

    /// Groups drawn in time, radar and brain figures, with their labels.
    /// A match contributes only its reference.
    fn groups(&self) -> Vec<(&'a str, &'a Decomposition)> {
        match *self {
            Selection::Reference(r) | Selection::Match(r, _) => vec![("", r)],
            Selection::Pair(a, b) => vec![("Group 1", a), ("Group 2", b)],
        }
    }
}

/// Build every figure for the first `mode_count` modes. Returns `None` when
/// the inputs have not been validated yet.
///
/// Progress advances by 10 before the cortical plots and by `90 / mode_count`
/// after each one.
pub fn compute(session: &Session, mode_count: usize) -> Result<Option<FigureSet>> {
    if !session.valid {
        return Ok(None);
    }
    let selection = Selection::from_session(session)?;

    log::info!("Computing spectre of dynamical modes");
    let spectre = spectre(&selection);

    log::info!("Computing time series activation of dominant modes");
    let timeplot = timeplot(&selection, mode_count);

    log::info!("Computing cortical network activation");
    let radar = radar(&selection, mode_count, session.show_imaginary)?;

    log::info!("Computing cortical surface representations");
    let brains = brains(
        &selection,
        mode_count,
        session.show_imaginary,
        &session.progress,
    );

    Ok(Some(FigureSet {
        spectre,
        timeplot,
        radar,
        brains,
    }))
}

fn group_label(group: &str, mode: usize) -> String {
    if group.is_empty() {
        format!("Mode {mode}")
    } else {
        format!("{group} · Mode {mode}")
    }
}

pub fn spectre(selection: &Selection<'_>) -> SpectreFigure {
    log::info!("Filtering Spectre data");
    let series = |label: &str, d: &Decomposition| Series {
        label: label.to_string(),
        points: d
            .table()
            .iter()
            .map(|row| {
                let frequency = if row.period.is_finite() {
                    1.0 / row.period
                } else {
                    0.0
                };
                [frequency, row.value.norm()]
            })
            .collect(),
    };

    match *selection {
        Selection::Reference(r) => SpectreFigure::Groups(vec![series("Modes", r)]),
        Selection::Pair(a, b) => {
            SpectreFigure::Groups(vec![series("Group 1", a), series("Group 2", b)])
        }
        Selection::Match(_, result) => SpectreFigure::Correlation {
            approximated: result.approximated.clone(),
            real: result.real.clone(),
        },
    }
}

/// Real part of each mode's temporal evolution `λ^t` over the recording.
pub fn timeplot(selection: &Selection<'_>, mode_count: usize) -> Vec<Series> {
    log::info!("Filtering TimePlot data");
    let mut out = Vec::new();
    for (group, d) in selection.groups() {
        let dt = d.sampling_time();
        for row in d.table().iter().take(mode_count) {
            let points = (0..d.samples())
                .map(|t| [t as f64 * dt, row.value.powu(t as u32).re])
                .collect();
            out.push(Series {
                label: group_label(group, row.mode),
                points,
            });
        }
    }
    out
}

pub fn radar(
    selection: &Selection<'_>,
    mode_count: usize,
    show_imaginary: bool,
) -> Result<RadarFigure> {
    log::info!("Filtering Radar data");
    let groups = selection.groups();
    if let [(_, a), (_, b)] = groups.as_slice() {
        if a.atlas() != b.atlas() {
            return Err(DashboardError::AnalysisLibraryFailure(
                "groups were decomposed with different atlases".into(),
            ));
        }
    }

    let atlas = groups[0].1.atlas();
    let axes = atlas.network_names();
    let mut series = Vec::new();

    for (group, d) in &groups {
        for order in 1..=mode_count.min(d.table().len()) {
            let Some(vector) = d.mode_vector(order) else {
                log::warn!("No spatial vector for mode {order}, skipped in radar");
                continue;
            };
            let label = group_label(group, order);
            series.push(RadarSeries {
                label: label.clone(),
                values: network_activation(&axes, &atlas.networks, vector.iter(), |c| c.re),
            });
            if show_imaginary {
                series.push(RadarSeries {
                    label: format!("{label} (imag)"),
                    values: network_activation(&axes, &atlas.networks, vector.iter(), |c| c.im),
                });
            }
        }
    }

    Ok(RadarFigure { axes, series })
}

/// Mean absolute component per network, scaled so the largest is 1.
fn network_activation<'v>(
    axes: &[String],
    networks: &[String],
    vector: impl Iterator<Item = &'v Complex64>,
    part: impl Fn(&Complex64) -> f64,
) -> Vec<f64> {
    let mut sums = vec![0.0; axes.len()];
    let mut counts = vec![0usize; axes.len()];
    for (c, network) in vector.zip(networks) {
        if let Some(i) = axes.iter().position(|a| a == network) {
            sums[i] += part(c).abs();
            counts[i] += 1;
        }
    }
    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| if n == 0 { 0.0 } else { s / n as f64 })
        .collect();
    let max = means.iter().cloned().fold(0.0, f64::max);
    if max > 0.0 {
        means.iter().map(|m| m / max).collect()
    } else {
        means
    }
}

pub fn brains(
    selection: &Selection<'_>,
    mode_count: usize,
    show_imaginary: bool,
    progress: &ProgressCounter,
) -> Vec<BrainFigure> {
    progress.add(10.0);
    let groups = selection.groups();
    let coords = groups[0].1.atlas().coords_2d.clone();
    let mut out = Vec::with_capacity(mode_count);

    for order in 1..=mode_count {
        log::info!("Filtering Brain data for Mode {order}");
        let figure_groups: Vec<BrainGroup> = groups
            .iter()
            .filter_map(|(group, d)| {
                let vector = d.mode_vector(order)?;
                Some(BrainGroup {
                    label: if group.is_empty() {
                        "Modes".to_string()
                    } else {
                        group.to_string()
                    },
                    real: vector.iter().map(|c| c.re).collect(),
                    imag: show_imaginary.then(|| vector.iter().map(|c| c.im).collect()),
                })
            })
            .collect();

        if !figure_groups.is_empty() {
            out.push(BrainFigure {
                mode: order,
                coords: coords.clone(),
                groups: figure_groups,
            });
        }
        progress.add(90.0 / mode_count as f64);
    }
    out
}
