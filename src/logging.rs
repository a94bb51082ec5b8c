use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

/// `HH:MM:SS,mmm | LEVEL — message`
pub fn format_line(time: &chrono::NaiveTime, level: log::Level, message: &str) -> String {
    format!("{} | {} — {}", time.format("%H:%M:%S,%3f"), level, message)
}

fn open(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Route the `log` facade into the session log file. Filter defaults to
/// `info` and follows `RUST_LOG` when set.
pub fn init(log_file: &Path) -> Result<()> {
    let file = open(log_file)?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let now = chrono::Local::now().time();
            writeln!(buf, "{}", format_line(&now, record.level(), &record.args().to_string()))
        })
        .try_init()
        .context("installing logger")?;
    Ok(())
}
