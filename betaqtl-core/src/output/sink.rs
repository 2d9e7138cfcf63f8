//! Line-oriented output sinks shared by gene workers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Destination for complete output lines. Safe to share between threads.
pub trait LineSink: Send + Sync {
    fn append_line(&self, line: &str) -> Result<()>;

    /// Flush and close. Lines appended afterwards are an error.
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

enum FileWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl FileWriter {
    fn as_write(&mut self) -> &mut dyn Write {
        match self {
            FileWriter::Plain(w) => w,
            FileWriter::Gzip(w) => w,
        }
    }

    fn close(self) -> std::io::Result<()> {
        match self {
            FileWriter::Plain(mut w) => w.flush(),
            FileWriter::Gzip(w) => w.finish()?.flush(),
        }
    }
}

/// File sink, gzip-compressed when the path ends in `.gz`.
pub struct FileSink {
    path: String,
    writer: Mutex<Option<FileWriter>>,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        let buf = BufWriter::new(file);
        let is_gz = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);
        let writer = if is_gz {
            FileWriter::Gzip(GzEncoder::new(buf, Compression::default()))
        } else {
            FileWriter::Plain(buf)
        };
        Ok(Self {
            path: path.display().to_string(),
            writer: Mutex::new(Some(writer)),
        })
    }
}

impl LineSink for FileSink {
    fn append_line(&self, line: &str) -> Result<()> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Output lock poisoned for {}", self.path))?;
        let writer = guard
            .as_mut()
            .ok_or_else(|| anyhow!("Output {} is already closed", self.path))?;
        writeln!(writer.as_write(), "{}", line)
            .with_context(|| format!("Failed to write to {}", self.path))
    }

    fn finish(&self) -> Result<()> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Output lock poisoned for {}", self.path))?;
        if let Some(writer) = guard.take() {
            writer
                .close()
                .with_context(|| format!("Failed to close {}", self.path))?;
        }
        Ok(())
    }
}

/// In-memory sink. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl LineSink for MemorySink {
    fn append_line(&self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .map_err(|_| anyhow!("Memory sink lock poisoned"))?
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_plain_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = FileSink::create(&path).unwrap();
        sink.append_line("a\tb").unwrap();
        sink.append_line("c\td").unwrap();
        sink.finish().unwrap();
        assert!(sink.append_line("late").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\tb\nc\td\n");
    }

    #[test]
    fn test_gz_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt.gz");
        let sink = FileSink::create(&path).unwrap();
        sink.append_line("hello").unwrap();
        sink.finish().unwrap();

        let mut text = String::new();
        flate2::read::GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn test_memory_sink_shared() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        sink.append_line("x").unwrap();
        assert_eq!(handle.lines(), vec!["x"]);
    }
}
