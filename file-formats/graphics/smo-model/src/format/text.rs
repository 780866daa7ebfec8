//! Line-oriented record reading and writing shared by the SMx formats
//!
//! Every field sits on its own line. Lines whose first non-blank characters
//! are `//` are comments, surrounding whitespace (including `\r`) is trimmed,
//! and one trailing empty line is ignored.

use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;

use crate::error::{ModelError, Result};

/// Read a whole file, mapping failure to [`ModelError::Open`]
pub(crate) fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ModelError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Cursor over the field lines of one file
pub(crate) struct RecordReader<'a> {
    file: String,
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(file: impl Into<String>, content: &'a str) -> Self {
        let mut lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.starts_with("//"))
            .collect();

        if lines.last().is_some_and(|(_, line)| line.is_empty()) {
            lines.pop();
        }

        Self {
            file: file.into(),
            lines,
            pos: 0,
        }
    }

    /// Number of field lines not yet consumed
    pub(crate) fn remaining(&self) -> usize {
        self.lines.len() - self.pos
    }

    /// Capacity for `count` records of `lines` fields each, capped by what is left
    ///
    /// Counts come from the file, so they are never trusted for allocation.
    pub(crate) fn capacity_for(&self, count: usize, lines: usize) -> usize {
        count.min(self.remaining() / lines.max(1))
    }

    /// Line number of the most recently consumed field, or 0 before the first
    pub(crate) fn line_number(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map_or(0, |(n, _)| *n)
    }

    pub(crate) fn next_line(&mut self, expected: &str) -> Result<&'a str> {
        let (_, line) = self
            .lines
            .get(self.pos)
            .copied()
            .ok_or_else(|| ModelError::UnexpectedEof {
                file: self.file.clone(),
                expected: expected.to_string(),
            })?;
        self.pos += 1;
        Ok(line)
    }

    pub(crate) fn next_value<T>(&mut self, expected: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let line = self.next_line(expected)?;
        line.parse::<T>()
            .map_err(|e| self.parse_error(format!("invalid {expected} '{line}': {e}")))
    }

    pub(crate) fn next_f32(&mut self, expected: &str) -> Result<f32> {
        self.next_value(expected)
    }

    pub(crate) fn next_usize(&mut self, expected: &str) -> Result<usize> {
        self.next_value(expected)
    }

    pub(crate) fn next_i64(&mut self, expected: &str) -> Result<i64> {
        self.next_value(expected)
    }

    pub(crate) fn next_vec3(&mut self, expected: &str) -> Result<Vec3> {
        Ok(Vec3::new(
            self.next_f32(expected)?,
            self.next_f32(expected)?,
            self.next_f32(expected)?,
        ))
    }

    /// A parse error pointing at the most recently consumed line
    pub(crate) fn parse_error(&self, message: impl Into<String>) -> ModelError {
        ModelError::Parse {
            file: self.file.clone(),
            line: self.line_number(),
            message: message.into(),
        }
    }
}

/// Writes one field per line
pub(crate) struct RecordWriter<W: Write> {
    out: W,
}

impl<W: Write> RecordWriter<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    pub(crate) fn comment(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "// {text}")?;
        Ok(())
    }

    pub(crate) fn field(&mut self, value: impl Display) -> Result<()> {
        writeln!(self.out, "{value}")?;
        Ok(())
    }

    /// `f32`'s `Display` output parses back to the same bits, so float
    /// fields survive a write/read cycle unchanged
    pub(crate) fn vec3(&mut self, v: Vec3) -> Result<()> {
        self.field(v.x)?;
        self.field(v.y)?;
        self.field(v.z)
    }

    pub(crate) fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
