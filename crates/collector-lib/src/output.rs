//! Delimited text output
//!
//! Fields are joined as-is, without quoting. The header goes out exactly once,
//! when the writer is created.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Tab => "\t",
        }
    }
}

/// Row writer over any byte sink
pub struct DelimitedWriter<W: Write> {
    inner: W,
    delimiter: Delimiter,
    rows_written: usize,
}

impl<W: Write> DelimitedWriter<W> {
    /// Create the writer and emit the header line
    pub fn new<S: AsRef<str>>(mut inner: W, delimiter: Delimiter, header: &[S]) -> io::Result<Self> {
        let line = join_fields(header, delimiter);
        inner.write_all(line.as_bytes())?;
        Ok(Self {
            inner,
            delimiter,
            rows_written: 0,
        })
    }

    /// Render a row as a newline-terminated line without writing it
    pub fn format_row<S: AsRef<str>>(&self, fields: &[S]) -> String {
        join_fields(fields, self.delimiter)
    }

    /// Write one row immediately
    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        let line = self.format_row(fields);
        self.inner.write_all(line.as_bytes())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write pre-rendered lines in a single call
    pub fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        self.inner.write_all(lines.concat().as_bytes())?;
        self.rows_written += lines.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn join_fields<S: AsRef<str>>(fields: &[S], delimiter: Delimiter) -> String {
    let mut line = fields
        .iter()
        .map(|field| field.as_ref())
        .collect::<Vec<&str>>()
        .join(delimiter.as_str());
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{METRICS_HEADER, PROFILE_HEADER};

    #[test]
    fn test_header_written_once_first() {
        let mut writer = DelimitedWriter::new(Vec::new(), Delimiter::Comma, &METRICS_HEADER).unwrap();
        writer.write_row(&["a", "b"]).unwrap();
        writer.write_row(&["c", "d"]).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            out,
            "subscription,resource_group_name,provider,resource_name,metric_name,unit,aggregation,timestamp,metric_value\na,b\nc,d\n"
        );
    }

    #[test]
    fn test_tab_header() {
        let writer = DelimitedWriter::new(Vec::new(), Delimiter::Tab, &PROFILE_HEADER).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            out,
            "subscription\tresource_group_name\tprovider\tresource_name\ttype\tname\tvalue\tdescription\n"
        );
    }

    #[test]
    fn test_bulk_lines_and_count() {
        let mut writer = DelimitedWriter::new(Vec::new(), Delimiter::Comma, &["h"]).unwrap();
        let lines = vec![writer.format_row(&["x", "1"]), writer.format_row(&["y", "2"])];
        writer.write_lines(&lines).unwrap();

        assert_eq!(writer.rows_written(), 2);
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "h\nx,1\ny,2\n");
    }

    #[test]
    fn test_header_only_when_no_rows() {
        let writer = DelimitedWriter::new(Vec::new(), Delimiter::Comma, &["a", "b"]).unwrap();
        assert_eq!(writer.rows_written(), 0);
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "a,b\n");
    }
}
