use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub const SESSION_START: &str = "———— SESSION START ————";

/// Tails the session log file for the Log tab. Only complete lines are
/// published; a trailing partial line waits for the next poll.
#[derive(Debug)]
pub struct LogRelay {
    path: PathBuf,
    offset: u64,
    /// Bytes after the last newline, possibly ending mid-character.
    partial: Vec<u8>,
    lines: Vec<String>,
}

impl LogRelay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LogRelay {
            path: path.into(),
            offset: 0,
            partial: Vec::new(),
            lines: vec![SESSION_START.to_string()],
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Read whatever was appended since the last poll. Returns the number of
    /// new complete lines. A missing file reads as empty.
    pub fn poll(&mut self) -> io::Result<usize> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            // Truncated underneath us: start over, keep what was shown.
            self.offset = 0;
            self.partial.clear();
        }
        if len == self.offset {
            return Ok(0);
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut chunk = Vec::with_capacity((len - self.offset) as usize);
        file.by_ref().take(len - self.offset).read_to_end(&mut chunk)?;
        self.offset += chunk.len() as u64;
        self.partial.extend_from_slice(&chunk);

        let Some(last_newline) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Ok(0);
        };
        let rest = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, rest);

        let before = self.lines.len();
        self.lines.extend(
            String::from_utf8_lossy(&complete)
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string()),
        );
        Ok(self.lines.len() - before)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write;

    use super::*;

    fn append(path: &Path, text: &str) {
        append_bytes(path, text.as_bytes());
    }

    fn append_bytes(path: &Path, bytes: &[u8]) {
        let mut f = OpenOptions::new().create(true).append(true).open(path).unwrap();
        f.write_all(bytes).unwrap();
    }

    #[test]
    fn starts_with_sentinel_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut relay = LogRelay::new(dir.path().join("log.log"));
        assert_eq!(relay.poll().unwrap(), 0);
        assert_eq!(relay.lines(), &[SESSION_START.to_string()]);
    }

    #[test]
    fn only_complete_lines_are_published() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.log");
        let mut relay = LogRelay::new(&path);

        append(&path, "10:00:00,000 | INFO — one\n10:00:00,001 | INFO — tw");
        assert_eq!(relay.poll().unwrap(), 1);
        assert_eq!(relay.lines().last().unwrap(), "10:00:00,000 | INFO — one");

        assert_eq!(relay.poll().unwrap(), 0);

        append(&path, "o\n");
        assert_eq!(relay.poll().unwrap(), 1);
        assert_eq!(relay.lines().last().unwrap(), "10:00:00,001 | INFO — two");
        assert_eq!(relay.lines().len(), 3);
    }

    #[test]
    fn character_split_across_polls_is_kept_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.log");
        let mut relay = LogRelay::new(&path);

        let line = "10:00:00,000 | INFO — hello\n".as_bytes();
        let dash = line.iter().position(|&b| b == 0xE2).unwrap();
        append_bytes(&path, &line[..dash + 1]);
        assert_eq!(relay.poll().unwrap(), 0);

        append_bytes(&path, &line[dash + 1..]);
        assert_eq!(relay.poll().unwrap(), 1);
        assert_eq!(relay.lines().last().unwrap(), "10:00:00,000 | INFO — hello");
    }

    #[test]
    fn truncation_restarts_without_dropping_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.log");
        let mut relay = LogRelay::new(&path);

        append(&path, "first line that is fairly long\n");
        relay.poll().unwrap();
        std::fs::write(&path, "new\n").unwrap();
        assert_eq!(relay.poll().unwrap(), 1);
        assert_eq!(
            relay.lines(),
            &[
                SESSION_START.to_string(),
                "first line that is fairly long".to_string(),
                "new".to_string()
            ]
        );
    }
}
