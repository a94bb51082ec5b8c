/// Seam to the decomposition library.
///
/// The dashboard never looks inside a [`Decomposition`] beyond handing it to
/// the renderer: the table, the atlas and on-demand mode vectors are all it
/// needs. [`dmd::NativeDmd`] is the implementation shipped with the app.
pub mod dmd;

use std::f64::consts::PI;

use nalgebra::{Complex, DMatrix, DVector};
use thiserror::Error;

pub type Complex64 = Complex<f64>;

// ---------------------------------------------------------------------------
// Errors raised by the library
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no time series to decompose")]
    NoData,

    #[error("sampling time must be a positive number, got {0}")]
    InvalidSamplingTime(f64),

    #[error("time series need at least 2 samples, file {index} has {samples}")]
    TooFewSamples { index: usize, samples: usize },

    #[error("file {index} has {found} regions, expected {expected}")]
    RegionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("time series {0} contains non-finite values")]
    NonFinite(usize),

    #[error("numerical failure: {0}")]
    Numerical(String),
}

// ---------------------------------------------------------------------------
// Atlas
// ---------------------------------------------------------------------------

/// Number of contiguous region blocks used as networks for the radar view.
const NETWORK_COUNT: usize = 7;

/// Region labels, network membership and flat 2D coordinates of a parcellation.
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    pub name: String,
    pub labels: Vec<String>,
    /// Network label per region, same length as `labels`.
    pub networks: Vec<String>,
    /// Flattened cortical layout, one point per region.
    pub coords_2d: Vec<[f64; 2]>,
}

impl Atlas {
    /// Build the atlas for a parcellation with `regions` regions.
    ///
    /// The two known parcellations are recognised by size; anything else gets
    /// a generic name. Regions are split into two hemispheres laid out on two
    /// rings, and grouped into contiguous network blocks.
    pub fn for_regions(regions: usize) -> Self {
        let name = match regions {
            360 => "Glasser",
            400 => "Schaefer",
            _ => "Generic",
        }
        .to_string();

        let labels = (1..=regions).map(|i| format!("R{i}")).collect();

        let block = regions.div_ceil(NETWORK_COUNT).max(1);
        let networks = (0..regions)
            .map(|i| format!("Network {}", i / block + 1))
            .collect();

        let half = regions.div_ceil(2).max(1);
        let coords_2d = (0..regions)
            .map(|i| {
                let (center, j, count) = if i < half {
                    (-1.2, i, half)
                } else {
                    (1.2, i - half, (regions - half).max(1))
                };
                let angle = 2.0 * PI * j as f64 / count as f64;
                [center + angle.cos(), angle.sin()]
            })
            .collect();

        Atlas {
            name,
            labels,
            networks,
            coords_2d,
        }
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Distinct network names in first-appearance order.
    pub fn network_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for n in &self.networks {
            if !names.contains(n) {
                names.push(n.clone());
            }
        }
        names
    }
}

// ---------------------------------------------------------------------------
// Decomposition
// ---------------------------------------------------------------------------

/// One row of the mode table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeRow {
    /// 1-based mode number, ordered by decreasing eigenvalue magnitude.
    pub mode: usize,
    pub value: Complex64,
    /// Seconds; infinite for modes on the unit circle.
    pub damping_time: f64,
    /// Seconds; infinite for non-oscillating modes.
    pub period: f64,
}

impl ModeRow {
    pub fn from_eigenvalue(mode: usize, value: Complex64, sampling_time: f64) -> Self {
        let log_modulus = value.norm().ln();
        let damping_time = if log_modulus == 0.0 {
            f64::INFINITY
        } else {
            -sampling_time / log_modulus
        };
        let angle = value.arg().abs();
        let period = if angle < 1e-12 {
            f64::INFINITY
        } else {
            2.0 * PI * sampling_time / angle
        };
        ModeRow {
            mode,
            value,
            damping_time,
            period,
        }
    }
}

/// Result of decomposing a group of time series.
#[derive(Debug, Clone)]
pub struct Decomposition {
    table: Vec<ModeRow>,
    atlas: Atlas,
    operator: DMatrix<f64>,
    sampling_time: f64,
    samples: usize,
}

impl Decomposition {
    pub fn new(
        table: Vec<ModeRow>,
        atlas: Atlas,
        operator: DMatrix<f64>,
        sampling_time: f64,
        samples: usize,
    ) -> Self {
        Decomposition {
            table,
            atlas,
            operator,
            sampling_time,
            samples,
        }
    }

    pub fn table(&self) -> &[ModeRow] {
        &self.table
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn operator(&self) -> &DMatrix<f64> {
        &self.operator
    }

    pub fn sampling_time(&self) -> f64 {
        self.sampling_time
    }

    /// Time points in the first series of the group.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Spatial vector of mode `order` (1-based), unit norm with its largest
    /// component real and positive. `None` if the order is out of range or
    /// the eigenvector could not be recovered.
    pub fn mode_vector(&self, order: usize) -> Option<DVector<Complex64>> {
        let row = self.table.get(order.checked_sub(1)?)?;
        dmd::eigenvector(&self.operator, row.value)
    }
}

/// Outcome of matching a target group onto a reference decomposition.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Approximated target modes.
    pub table: Vec<ModeRow>,
    /// Eigenvalue magnitudes of the approximated modes.
    pub approximated: Vec<f64>,
    /// Eigenvalue magnitudes of the target's own leading modes.
    pub real: Vec<f64>,
}

// ---------------------------------------------------------------------------
// The library seam
// ---------------------------------------------------------------------------

pub trait AnalysisLibrary: Send + Sync {
    /// Decompose one group of region × time matrices sampled every
    /// `sampling_time` seconds.
    fn decompose(
        &self,
        data: Vec<DMatrix<f64>>,
        sampling_time: f64,
    ) -> Result<Decomposition, AnalysisError>;

    /// Approximate the leading modes of `target` using the first `modes`
    /// modes of `reference`.
    fn compute_match(
        &self,
        reference: &Decomposition,
        target: &Decomposition,
        modes: usize,
    ) -> Result<MatchResult, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_is_sized_and_named_by_region_count() {
        let atlas = Atlas::for_regions(400);
        assert_eq!(atlas.name, "Schaefer");
        assert_eq!(atlas.size(), 400);
        assert_eq!(atlas.coords_2d.len(), 400);
        assert_eq!(atlas.network_names().len(), 7);

        let small = Atlas::for_regions(10);
        assert_eq!(small.name, "Generic");
        assert_eq!(small.networks.len(), 10);
        assert_eq!(small.networks[0], "Network 1");
        assert_eq!(small.networks[9], "Network 5");
    }

    #[test]
    fn mode_row_times() {
        let dt = 0.72;
        let real = ModeRow::from_eigenvalue(1, Complex::new(0.5, 0.0), dt);
        assert!(real.period.is_infinite());
        assert!((real.damping_time - (-dt / 0.5f64.ln())).abs() < 1e-12);

        let unit = ModeRow::from_eigenvalue(2, Complex::from_polar(1.0, PI / 2.0), dt);
        assert!(unit.damping_time.is_infinite());
        assert!((unit.period - 4.0 * dt).abs() < 1e-9);
    }
}
