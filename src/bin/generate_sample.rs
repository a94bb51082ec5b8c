use std::path::Path;

use anyhow::{Context, Result};

/// Latent oscillators: (modulus, angular step per sample).
const GROUP_MODES: [&[(f64, f64)]; 2] = [
    &[(0.99, 0.05), (0.97, 0.12), (0.95, 0.30), (0.93, 0.45), (0.90, 0.80)],
    &[(0.99, 0.06), (0.96, 0.15), (0.94, 0.28), (0.92, 0.60), (0.88, 1.10)],
];

const REGIONS: usize = 400;
const SAMPLES: usize = 240;
const SUBJECTS: usize = 3;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Region × time series built from damped oscillators with random spatial
/// patterns, plus white noise.
fn generate_series(modes: &[(f64, f64)], noise_level: f64, rng: &mut SimpleRng) -> Vec<Vec<f64>> {
    let patterns: Vec<(Vec<f64>, Vec<f64>)> = modes
        .iter()
        .map(|_| {
            let re: Vec<f64> = (0..REGIONS).map(|_| rng.gauss(0.0, 1.0)).collect();
            let im: Vec<f64> = (0..REGIONS).map(|_| rng.gauss(0.0, 1.0)).collect();
            (re, im)
        })
        .collect();

    (0..REGIONS)
        .map(|region| {
            (0..SAMPLES)
                .map(|t| {
                    let signal: f64 = modes
                        .iter()
                        .zip(&patterns)
                        .map(|(&(modulus, angle), (re, im))| {
                            let decay = modulus.powf(t as f64 / 10.0);
                            let phase = angle * t as f64;
                            decay * (re[region] * phase.cos() - im[region] * phase.sin())
                        })
                        .sum();
                    signal + rng.gauss(0.0, noise_level)
                })
                .collect()
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Vec<f64>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer
            .write_record(row.iter().map(|v| format!("{v:.6}")))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data".to_string());
    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut written = 0;
    for (group, modes) in GROUP_MODES.iter().enumerate() {
        for subject in 1..=SUBJECTS {
            let rows = generate_series(modes, 0.05, &mut rng);
            let path = out_dir.join(format!("group{}_subject{subject}.csv", group + 1));
            write_csv(&path, &rows)?;
            written += 1;
        }
    }

    println!(
        "Wrote {written} time series ({REGIONS} regions × {SAMPLES} samples each) to {}",
        out_dir.display()
    );
    Ok(())
}
