//! Log sources feeding the stream.
//!
//! A source yields raw rows (timestamp plus named cell values) in file order.
//! Change detection and ordering checks happen one layer up in
//! [`super::LogStream`], so sources only deal with decoding.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::io::BufRead;

use crate::config::AnalyserConfig;
use crate::error::SourceError;
use crate::time::Timestamp;

/// One decoded row before change detection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub timestamp: Timestamp,
    pub values: BTreeMap<String, String>,
}

impl RawRow {
    /// Convenience constructor used by in-memory sources.
    #[must_use]
    pub fn new<I, K, V>(timestamp: f64, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            timestamp: Timestamp::new(timestamp),
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered producer of raw rows.
///
/// `Ok(None)` marks end-of-stream and is not an error.
pub trait LogSource {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError>;
}

/// Replays rows held in memory.
#[derive(Debug, Default)]
pub struct VecLogSource {
    rows: VecDeque<RawRow>,
}

impl VecLogSource {
    #[must_use]
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows: rows.into() }
    }
}

impl LogSource for VecLogSource {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError> {
        Ok(self.rows.pop_front())
    }
}

/// Reads comma-separated rows with a header line.
///
/// The configured timestamp column is parsed as a number and multiplied by
/// the configured scale; every other column becomes a signal value.
///
/// Fields are split on every `,` and trimmed. Quoting is not supported: a
/// quoted cell containing a comma is read as two fields and the row fails
/// with [`SourceError::FieldCount`].
#[derive(Debug)]
pub struct CsvLogSource<R> {
    reader: R,
    columns: Vec<String>,
    timestamp_index: usize,
    scale: f64,
    line: usize,
    buf: String,
}

impl<R: BufRead> CsvLogSource<R> {
    /// Reads the header and locates the timestamp column.
    pub fn new(mut reader: R, cfg: &AnalyserConfig) -> Result<Self, SourceError> {
        let mut buf = String::new();
        let mut line = 0;

        let header = loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                return Err(SourceError::MissingHeader);
            }
            line += 1;
            if !buf.trim().is_empty() {
                break split_fields(&buf);
            }
        };

        let timestamp_index = header
            .iter()
            .position(|c| c == &cfg.timestamp_column)
            .ok_or_else(|| SourceError::MissingColumn {
                column: cfg.timestamp_column.clone(),
            })?;

        Ok(Self {
            reader,
            columns: header,
            timestamp_index,
            scale: cfg.timestamp_scale,
            line,
            buf,
        })
    }

    /// Signal columns (header order, timestamp column excluded).
    pub fn signals(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.timestamp_index)
            .map(|(_, c)| c.as_str())
    }
}

impl<R: BufRead> LogSource for CsvLogSource<R> {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if self.buf.trim().is_empty() {
                continue;
            }

            let fields = split_fields(&self.buf);
            if fields.len() != self.columns.len() {
                return Err(SourceError::FieldCount {
                    line: self.line,
                    expected: self.columns.len(),
                    actual: fields.len(),
                });
            }

            let raw_ts = &fields[self.timestamp_index];
            let parsed: f64 = raw_ts
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| SourceError::InvalidTimestamp {
                    line: self.line,
                    raw: raw_ts.clone(),
                })?;

            let values = self
                .columns
                .iter()
                .zip(fields.iter())
                .enumerate()
                .filter(|(i, _)| *i != self.timestamp_index)
                .map(|(_, (name, value))| (name.clone(), value.clone()))
                .collect();

            return Ok(Some(RawRow {
                timestamp: Timestamp::new(parsed * self.scale),
                values,
            }));
        }
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.trim_end_matches(['\n', '\r'])
        .split(',')
        .map(|f| f.trim().to_string())
        .collect()
}
