//! Parsing for LCOV text into a [`CoverageReport`].
//!
//! Recognized directives:
//!
//! - `SF:<path>` starts a new record (an earlier record with the same path is
//!   replaced)
//! - `DA:<line>,<hits>` appends a line hit
//! - `FN:<...>` and `FNDA:<...>` are kept as raw text
//! - `FNF:`, `FNH:`, `LH:`, `LF:` set the summary counts
//!
//! Anything else, `end_of_record` and `TN:` included, is ignored. A new `SF:`
//! closes the previous record.
//!
//! # Examples
//!
//! ```
//! use git_lcov_filter::parse::parse_report;
//!
//! let report = parse_report("SF:src/lib.rs\nDA:1,5\nDA:2,0\nLH:1\nLF:2\nend_of_record\n").unwrap();
//! let record = report.get("src/lib.rs").unwrap();
//! assert_eq!(record.line_hits, vec![(1, 5), (2, 0)]);
//! assert_eq!(record.lines_found, 2);
//! ```

use crate::MalformedReport;
use crate::report::{CoverageRecord, CoverageReport};
use std::str::FromStr;

/// Incremental LCOV parser fed one line at a time
#[derive(Debug, Default)]
pub struct ReportParser {
    report: CoverageReport,
    current: Option<CoverageRecord>,
    line: usize,
}

impl ReportParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line of LCOV input (with or without its line terminator)
    ///
    /// # Errors
    ///
    /// Returns [`MalformedReport`] if:
    /// - A numeric field does not parse
    /// - A `DA` payload has no `,<hits>` part
    /// - A data directive appears before the first `SF:`
    pub fn push_line(&mut self, raw: &str) -> Result<(), MalformedReport> {
        self.line += 1;
        let text = raw.trim();

        if let Some(path) = text.strip_prefix("SF:") {
            self.close_record();
            self.current = Some(CoverageRecord::new(path));
            return Ok(());
        }

        let Some((directive, payload)) = text.split_once(':') else {
            return Ok(());
        };
        if !matches!(directive, "DA" | "FN" | "FNDA" | "FNF" | "FNH" | "LH" | "LF") {
            return Ok(());
        }

        let line = self.line;
        let Some(record) = self.current.as_mut() else {
            return Err(MalformedReport::OutsideRecord {
                line,
                directive: directive.to_string(),
            });
        };

        match directive {
            "DA" => record.line_hits.push(parse_line_data(line, text, payload)?),
            "FN" => record.function_defs.push(payload.to_string()),
            "FNDA" => record.function_hits.push(payload.to_string()),
            "FNF" => record.functions_found = parse_number(line, directive, payload)?,
            "FNH" => record.functions_hit = parse_number(line, directive, payload)?,
            "LH" => record.lines_hit = parse_number(line, directive, payload)?,
            "LF" => record.lines_found = parse_number(line, directive, payload)?,
            _ => {}
        }

        Ok(())
    }

    /// Close the last record and return the report
    pub fn finish(mut self) -> CoverageReport {
        self.close_record();
        self.report
    }

    fn close_record(&mut self) {
        if let Some(record) = self.current.take() {
            self.report.insert(record);
        }
    }
}

/// Parse a complete LCOV document.
///
/// # Errors
///
/// Returns the first [`MalformedReport`] encountered.
pub fn parse_report(text: &str) -> Result<CoverageReport, MalformedReport> {
    let mut parser = ReportParser::new();
    for line in text.lines() {
        parser.push_line(line)?;
    }
    Ok(parser.finish())
}

/// Parse a `DA` payload: `<line>,<hits>[,<checksum>]`
fn parse_line_data(line: usize, text: &str, payload: &str) -> Result<(u32, i64), MalformedReport> {
    let mut fields = payload.split(',');
    let (Some(line_number), Some(hits)) = (fields.next(), fields.next()) else {
        return Err(MalformedReport::InvalidLineData {
            line,
            text: text.to_string(),
        });
    };

    Ok((
        parse_number(line, "DA", line_number)?,
        parse_number(line, "DA", hits)?,
    ))
}

fn parse_number<T: FromStr>(line: usize, directive: &str, value: &str) -> Result<T, MalformedReport> {
    value
        .trim()
        .parse()
        .map_err(|_| MalformedReport::InvalidNumber {
            line,
            directive: directive.to_string(),
            value: value.to_string(),
        })
}
