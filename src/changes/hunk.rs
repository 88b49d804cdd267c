use super::ChangeSet;
use crate::DiffParseError;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as line_number},
    combinator::opt,
    sequence::preceded,
};
use std::ops::Range;
use tracing::debug;

/// One side of a hunk header: `start[,count]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u32,
    /// Number of lines, 1 when the header omits it
    pub count: u32,
}

impl HunkRange {
    /// Line numbers covered by this range
    pub fn lines(self) -> Range<u32> {
        self.start..self.start.saturating_add(self.count)
    }
}

fn hunk_range(input: &str) -> IResult<&str, HunkRange> {
    (line_number, opt(preceded(char(','), line_number)))
        .map(|(start, count)| HunkRange {
            start,
            count: count.unwrap_or(1),
        })
        .parse(input)
}

/// Parse hunk header to extract the old and new ranges
/// Format: @@ -old_start[,old_count] +new_start[,new_count] @@ optional context
pub fn parse_hunk_header(header: &str) -> Result<(HunkRange, HunkRange), DiffParseError> {
    (
        preceded(tag("@@ -"), hunk_range),
        preceded(tag(" +"), hunk_range),
        tag(" @@"),
    )
        .parse(header)
        .map(|(_, (old, new, _))| (old, new))
        .map_err(|_| DiffParseError::InvalidHunkHeader {
            header: header.to_string(),
        })
}

/// Path named by a `+++` header with git's C-style quoting removed.
///
/// Returns `None` for `/dev/null` or a path without the `b/` prefix.
fn new_side_path(header_path: &str) -> Option<String> {
    let path = match header_path
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(quoted) => unquote(quoted),
        None => header_path.to_string(),
    };
    path.strip_prefix("b/").map(str::to_string)
}

/// Undo git's quoting of unusual paths: backslash escapes and octal bytes
fn unquote(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut iter = quoted.bytes().peekable();

    while let Some(byte) = iter.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match iter.next() {
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b't') => bytes.push(b'\t'),
            Some(b'n') => bytes.push(b'\n'),
            Some(b'v') => bytes.push(0x0b),
            Some(b'f') => bytes.push(0x0c),
            Some(b'r') => bytes.push(b'\r'),
            Some(digit @ b'0'..=b'7') => {
                let mut value = digit - b'0';
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&next @ b'0'..=b'7') => {
                            value = value.wrapping_mul(8).wrapping_add(next - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse `git diff -U0` output into the new-side line numbers of every hunk.
///
/// Files whose new side is `/dev/null` (deletions) are skipped.
pub fn parse_unified(diff_output: &str) -> Result<ChangeSet, DiffParseError> {
    let mut changes = ChangeSet::default();
    let mut current_file: Option<String> = None;
    let mut in_header = false;

    for line in diff_output.lines() {
        if line.starts_with("diff --git ") {
            current_file = None;
            in_header = true;
        } else if let Some(path) = line.strip_prefix("+++ ").filter(|_| in_header) {
            current_file = new_side_path(path);
            if current_file.is_none() {
                debug!(header = line, "no new-side path, skipping file");
            }
        } else if line.starts_with("@@ ") {
            in_header = false;
            let (_, new) = parse_hunk_header(line)?;
            if let Some(file) = &current_file {
                changes.lines_mut(file).extend(new.lines());
            }
        }
        // Content lines and index/mode headers carry no line numbers
    }

    Ok(changes)
}
