use nalgebra::{Complex, DMatrix, DVector};

use super::{AnalysisError, AnalysisLibrary, Atlas, Complex64, Decomposition, MatchResult, ModeRow};

/// Number of leading target modes approximated by [`NativeDmd::compute_match`].
pub const MATCHED_MODES: usize = 10;

// ---------------------------------------------------------------------------
// Native exact-DMD backend
// ---------------------------------------------------------------------------

/// Exact dynamic mode decomposition on z-scored, stacked time series.
///
/// Each input matrix is oriented as regions × time (the shorter side is taken
/// as regions). Consecutive snapshot pairs of every series are stacked into
/// `X`, `Y` and the linear operator `A = Y X⁺` is fitted by least squares.
#[derive(Debug, Clone)]
pub struct NativeDmd {
    /// Singular values below this are treated as zero in the pseudo-inverse.
    pub rank_tolerance: f64,
}

impl Default for NativeDmd {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-10,
        }
    }
}

impl AnalysisLibrary for NativeDmd {
    fn decompose(
        &self,
        data: Vec<DMatrix<f64>>,
        sampling_time: f64,
    ) -> Result<Decomposition, AnalysisError> {
        if !(sampling_time.is_finite() && sampling_time > 0.0) {
            return Err(AnalysisError::InvalidSamplingTime(sampling_time));
        }
        if data.is_empty() {
            return Err(AnalysisError::NoData);
        }

        let series: Vec<DMatrix<f64>> = data.into_iter().map(orient).collect();
        let regions = series[0].nrows();

        for (index, m) in series.iter().enumerate() {
            if m.nrows() != regions {
                return Err(AnalysisError::RegionMismatch {
                    index,
                    expected: regions,
                    found: m.nrows(),
                });
            }
            if m.ncols() < 2 {
                return Err(AnalysisError::TooFewSamples {
                    index,
                    samples: m.ncols(),
                });
            }
            if m.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::NonFinite(index));
            }
        }

        let normalized: Vec<DMatrix<f64>> = series.iter().map(zscore).collect();
        let pairs: usize = normalized.iter().map(|m| m.ncols() - 1).sum();

        let mut x = DMatrix::zeros(regions, pairs);
        let mut y = DMatrix::zeros(regions, pairs);
        let mut col = 0;
        for m in &normalized {
            for t in 0..m.ncols() - 1 {
                x.set_column(col, &m.column(t));
                y.set_column(col, &m.column(t + 1));
                col += 1;
            }
        }

        let pinv = x
            .pseudo_inverse(self.rank_tolerance)
            .map_err(|e| AnalysisError::Numerical(e.to_string()))?;
        let operator = y * pinv;
        let table = mode_table(&operator, sampling_time);

        log::debug!(
            "Decomposed {} series of {regions} regions into {} modes",
            normalized.len(),
            table.len()
        );

        Ok(Decomposition::new(
            table,
            Atlas::for_regions(regions),
            operator,
            sampling_time,
            series[0].ncols(),
        ))
    }

    fn compute_match(
        &self,
        reference: &Decomposition,
        target: &Decomposition,
        modes: usize,
    ) -> Result<MatchResult, AnalysisError> {
        let regions = reference.operator().nrows();
        if target.operator().nrows() != regions {
            return Err(AnalysisError::RegionMismatch {
                index: 0,
                expected: regions,
                found: target.operator().nrows(),
            });
        }
        if reference.table().is_empty() {
            return Err(AnalysisError::Numerical("reference has no modes".into()));
        }

        let count = modes.clamp(1, reference.table().len());

        // Real basis spanning the first `count` reference modes.
        let mut columns: Vec<DVector<f64>> = Vec::with_capacity(2 * count);
        for order in 1..=count {
            let v = reference.mode_vector(order).ok_or_else(|| {
                AnalysisError::Numerical(format!("no eigenvector for reference mode {order}"))
            })?;
            columns.push(v.map(|c| c.re));
            let imag = v.map(|c| c.im);
            if imag.norm() > 1e-9 {
                columns.push(imag);
            }
        }
        let basis = DMatrix::from_columns(&columns).qr().q();

        let reduced = basis.transpose() * target.operator() * &basis;
        let mut table = mode_table(&reduced, target.sampling_time());
        table.truncate(MATCHED_MODES);

        let approximated: Vec<f64> = table.iter().map(|r| r.value.norm()).collect();
        let real: Vec<f64> = target
            .table()
            .iter()
            .take(approximated.len())
            .map(|r| r.value.norm())
            .collect();
        let approximated = approximated[..real.len()].to_vec();

        Ok(MatchResult {
            table,
            approximated,
            real,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Regions along rows: the shorter side of the matrix.
fn orient(m: DMatrix<f64>) -> DMatrix<f64> {
    if m.nrows() > m.ncols() {
        m.transpose()
    } else {
        m
    }
}

/// Center each region's series and scale it to unit variance. Flat series
/// are only centered.
fn zscore(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    let n = m.ncols() as f64;
    for mut row in out.row_iter_mut() {
        let mean = row.sum() / n;
        let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        for v in row.iter_mut() {
            *v -= mean;
            if std > f64::EPSILON {
                *v /= std;
            }
        }
    }
    out
}

/// Mode table of a real operator: one row per conjugate pair (or real
/// eigenvalue), sorted by decreasing magnitude.
pub fn mode_table(operator: &DMatrix<f64>, sampling_time: f64) -> Vec<ModeRow> {
    if operator.is_empty() {
        return Vec::new();
    }
    let mut values: Vec<Complex64> = operator
        .complex_eigenvalues()
        .iter()
        .copied()
        .filter(|v| v.im >= -1e-12)
        .collect();
    values.sort_by(|a, b| b.norm().total_cmp(&a.norm()));

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| ModeRow::from_eigenvalue(i + 1, v, sampling_time))
        .collect()
}

/// Eigenvector of `operator` for `value` by shifted inverse iteration.
pub fn eigenvector(operator: &DMatrix<f64>, value: Complex64) -> Option<DVector<Complex64>> {
    let n = operator.nrows();
    if n == 0 {
        return None;
    }
    let shift = value + Complex::new(1e-9, 1e-9);
    let shifted = operator.map(|x| Complex::new(x, 0.0)) - DMatrix::<Complex64>::identity(n, n) * shift;
    let lu = shifted.lu();

    let mut v = DVector::from_element(n, Complex::new(1.0, 0.0));
    for _ in 0..3 {
        v = lu.solve(&v)?;
        let norm = v.norm();
        if !norm.is_finite() || norm == 0.0 {
            return None;
        }
        v = v.unscale(norm);
    }

    // Fix the arbitrary phase: largest component real and positive.
    let pivot = v.iter().copied().max_by(|a, b| a.norm().total_cmp(&b.norm()))?;
    let phase = pivot.conj() / pivot.norm();
    Some(v.map(|c| c * phase))
}
