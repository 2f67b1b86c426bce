//! Output sinks
//!
//! Two kinds of sinks are used by a run:
//! - `RecordSink` receives every crawled record for the raw audit file
//! - `LineSink` receives the final sorted domain and IP lists
//!
//! `FileSink` implements both on top of a buffered file. Files are truncated on
//! creation; nothing is persisted beyond these newline-delimited lists.

use crate::config::OutputConfig;
use crate::{BlockedError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination of raw `(value, percent)` records
pub trait RecordSink: Send {
    /// Writes one record as `value | percent`
    fn write_record(&mut self, value: &str, percent: u32) -> Result<()>;

    /// Flushes buffered output
    fn finish(&mut self) -> Result<()>;
}

/// Destination of newline-delimited values
pub trait LineSink: Send {
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Flushes buffered output
    fn finish(&mut self) -> Result<()>;
}

/// Formats a raw record the way it appears in the audit file
pub fn format_record(value: &str, percent: u32) -> String {
    format!("{} | {}", value, percent)
}

/// Buffered file sink
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    lines: usize,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| BlockedError::Sink {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines written so far
    pub fn lines(&self) -> usize {
        self.lines
    }

    fn write_str(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line).map_err(|source| self.sink_error(source))?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| self.sink_error(source))
    }

    fn sink_error(&self, source: std::io::Error) -> BlockedError {
        BlockedError::Sink {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for FileSink {
    fn write_record(&mut self, value: &str, percent: u32) -> Result<()> {
        self.write_str(&format_record(value, percent))
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }
}

impl LineSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_str(line)
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }
}

/// In-memory record sink
impl RecordSink for Vec<String> {
    fn write_record(&mut self, value: &str, percent: u32) -> Result<()> {
        self.push(format_record(value, percent));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory line sink
impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes every line and flushes; returns the number of lines written
pub fn write_lines<S, I>(sink: &mut S, lines: I) -> Result<usize>
where
    S: LineSink + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut count = 0;
    for line in lines {
        sink.write_line(line.as_ref())?;
        count += 1;
    }
    sink.finish()?;
    Ok(count)
}

/// The three output files of a run, opened up front
#[derive(Debug)]
pub struct OutputFiles {
    pub raw: FileSink,
    pub domains: FileSink,
    pub ips: FileSink,
}

impl OutputFiles {
    /// Creates the output directory if needed and truncates all three files
    pub fn create(config: &OutputConfig) -> Result<Self> {
        let dir = Path::new(&config.dir);
        fs::create_dir_all(dir).map_err(|source| BlockedError::Sink {
            path: dir.to_path_buf(),
            source,
        })?;

        tracing::debug!("Writing output to {}", dir.display());

        Ok(Self {
            raw: FileSink::create(dir.join(&config.raw_file))?,
            domains: FileSink::create(dir.join(&config.domain_file))?,
            ips: FileSink::create(dir.join(&config.ip_file))?,
        })
    }
}
