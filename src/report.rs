//! In-memory LCOV coverage data and its text rendering.
//!
//! [`CoverageReport`] renders through [`std::fmt::Display`] in the directive
//! order `SF`, `FN*`, `FNDA*`, `FNF`, `FNH`, `DA*`, `LH`, `LF`,
//! `end_of_record`.

use std::collections::BTreeSet;
use std::fmt;

/// Coverage data for one source file (one `SF:` record)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageRecord {
    /// Path exactly as written after `SF:`
    pub source_file: String,
    /// `DA:` entries as `(line, hits)`, in file order
    pub line_hits: Vec<(u32, i64)>,
    /// Raw `FN:` payloads
    pub function_defs: Vec<String>,
    /// Raw `FNDA:` payloads
    pub function_hits: Vec<String>,
    pub functions_found: i64,
    pub functions_hit: i64,
    pub lines_hit: i64,
    pub lines_found: i64,
}

impl CoverageRecord {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Self::default()
        }
    }

    /// Keep only the `DA` entries whose line satisfies `keep`.
    ///
    /// `lines_hit` becomes the number of kept entries and `lines_found` the
    /// number of distinct kept lines. Function data is copied unchanged.
    ///
    /// Returns `None` if no entry is kept.
    #[must_use]
    pub fn retain_lines<F>(&self, mut keep: F) -> Option<Self>
    where
        F: FnMut(u32) -> bool,
    {
        let line_hits: Vec<(u32, i64)> = self
            .line_hits
            .iter()
            .copied()
            .filter(|(line, _)| keep(*line))
            .collect();

        if line_hits.is_empty() {
            return None;
        }

        let distinct: BTreeSet<u32> = line_hits.iter().map(|(line, _)| *line).collect();

        Some(Self {
            source_file: self.source_file.clone(),
            lines_hit: line_hits.len() as i64,
            lines_found: distinct.len() as i64,
            line_hits,
            function_defs: self.function_defs.clone(),
            function_hits: self.function_hits.clone(),
            functions_found: self.functions_found,
            functions_hit: self.functions_hit,
        })
    }
}

impl fmt::Display for CoverageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SF:{}", self.source_file)?;
        for def in &self.function_defs {
            writeln!(f, "FN:{def}")?;
        }
        for hit in &self.function_hits {
            writeln!(f, "FNDA:{hit}")?;
        }
        writeln!(f, "FNF:{}", self.functions_found)?;
        writeln!(f, "FNH:{}", self.functions_hit)?;
        for (line, hits) in &self.line_hits {
            writeln!(f, "DA:{line},{hits}")?;
        }
        writeln!(f, "LH:{}", self.lines_hit)?;
        writeln!(f, "LF:{}", self.lines_found)?;
        writeln!(f, "end_of_record")
    }
}

/// Coverage records keyed by their `SF:` path, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    records: Vec<CoverageRecord>,
}

impl CoverageReport {
    /// Add a record. A record with the same `source_file` is replaced in
    /// place and keeps its position.
    pub fn insert(&mut self, record: CoverageRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.source_file == record.source_file)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, source_file: &str) -> Option<&CoverageRecord> {
        self.records.iter().find(|r| r.source_file == source_file)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoverageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<CoverageRecord> for CoverageReport {
    fn from_iter<T: IntoIterator<Item = CoverageRecord>>(iter: T) -> Self {
        let mut report = Self::default();
        for record in iter {
            report.insert(record);
        }
        report
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            write!(f, "{record}")?;
        }
        Ok(())
    }
}
