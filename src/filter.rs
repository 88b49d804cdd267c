use crate::changes::ChangeSet;
use crate::report::{CoverageRecord, CoverageReport};
use tracing::debug;

/// Keep only the coverage of changed lines.
///
/// A report record belongs to a changed file when its `SF:` path is a
/// substring of the changed path, so `src/Foo.java` matches
/// `module/src/Foo.java`. Every changed file is compared against every
/// record. Records are visited in change order, then report order; a record
/// with no surviving `DA` entries is dropped.
///
/// # Examples
///
/// ```
/// use git_lcov_filter::{changes::parse_numstat, filter_report, parse_report};
///
/// let changes = parse_numstat("3\t0\tsrc/Foo.java\n");
/// let report = parse_report("SF:src/Foo.java\nDA:1,5\nDA:2,0\nDA:5,3\n").unwrap();
///
/// let filtered = filter_report(&changes, &report);
/// let record = filtered.get("src/Foo.java").unwrap();
/// assert_eq!(record.line_hits, vec![(1, 5), (2, 0)]);
/// assert_eq!((record.lines_hit, record.lines_found), (2, 2));
/// ```
pub fn filter_report(changes: &ChangeSet, report: &CoverageReport) -> CoverageReport {
    let mut filtered = CoverageReport::default();

    for file in changes.iter() {
        debug!(path = %file.path, lines = file.lines.len(), "changed file");

        for record in report.iter().filter(|r| matches_path(r, &file.path)) {
            match record.retain_lines(|line| file.lines.contains(&line)) {
                Some(kept) => {
                    debug!(
                        source_file = %kept.source_file,
                        kept = kept.line_hits.len(),
                        total = record.line_hits.len(),
                        "kept changed lines"
                    );
                    filtered.insert(kept);
                }
                None => {
                    debug!(source_file = %record.source_file, "no changed lines covered");
                }
            }
        }
    }

    filtered
}

fn matches_path(record: &CoverageRecord, changed_path: &str) -> bool {
    changed_path.contains(record.source_file.as_str())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeMap, BTreeSet};

    /// Generate a record for `src/file{id}.rs` with arbitrary line data
    fn arb_record(id: u32) -> impl Strategy<Value = CoverageRecord> {
        (
            prop::collection::vec((1..60u32, -3..10i64), 0..25),
            prop::collection::vec("[0-9]{1,2},fn_[a-z]{1,6}", 0..4),
            prop::collection::vec("[0-9]{1,2},fn_[a-z]{1,6}", 0..4),
            0..10i64,
            0..10i64,
        )
            .prop_map(move |(line_hits, defs, hits, found, hit)| CoverageRecord {
                source_file: format!("src/file{id}.rs"),
                lines_hit: line_hits.len() as i64,
                lines_found: 0,
                line_hits,
                function_defs: defs,
                function_hits: hits,
                functions_found: found,
                functions_hit: hit,
            })
    }

    /// Generate a report with records for a subset of file ids 0..6
    fn arb_report() -> impl Strategy<Value = CoverageReport> {
        prop::collection::btree_set(0..6u32, 0..6)
            .prop_flat_map(|ids| ids.into_iter().map(arb_record).collect::<Vec<_>>())
            .prop_map(|records: Vec<CoverageRecord>| records.into_iter().collect::<CoverageReport>())
    }

    /// Generate changed line sets for a subset of file ids 0..8, rooted
    /// under a directory so report paths match by substring
    fn arb_changes() -> impl Strategy<Value = ChangeSet> {
        prop::collection::btree_map(0..8u32, prop::collection::btree_set(1..60u32, 0..30), 0..8)
            .prop_map(|files: BTreeMap<u32, BTreeSet<u32>>| {
                let mut changes = ChangeSet::default();
                for (id, lines) in files.into_iter().rev() {
                    changes.insert(&format!("module/src/file{id}.rs"), lines);
                }
                changes
            })
    }

    fn changed_lines<'a>(changes: &'a ChangeSet, source_file: &str) -> Option<&'a BTreeSet<u32>> {
        changes
            .iter()
            .find(|f| f.path.contains(source_file))
            .map(|f| &f.lines)
    }

    proptest! {
        /// Every kept line is changed and was present in the original record
        #[test]
        fn kept_lines_are_changed_and_original(
            changes in arb_changes(),
            report in arb_report()
        ) {
            let filtered = filter_report(&changes, &report);
            for record in filtered.iter() {
                let changed = changed_lines(&changes, &record.source_file);
                let original = report.get(&record.source_file);
                prop_assert!(changed.is_some() && original.is_some());
                if let (Some(changed), Some(original)) = (changed, original) {
                    for entry in &record.line_hits {
                        prop_assert!(changed.contains(&entry.0));
                        prop_assert!(original.line_hits.contains(entry));
                    }
                }
            }
        }

        /// Filtering twice gives the same result as filtering once
        #[test]
        fn filtering_is_idempotent(
            changes in arb_changes(),
            report in arb_report()
        ) {
            let once = filter_report(&changes, &report);
            let twice = filter_report(&changes, &once);
            prop_assert_eq!(once, twice);
        }

        /// LH counts kept entries and LF counts distinct kept lines
        #[test]
        fn summary_counts_match_kept_lines(
            changes in arb_changes(),
            report in arb_report()
        ) {
            for record in filter_report(&changes, &report).iter() {
                let distinct: BTreeSet<u32> = record.line_hits.iter().map(|(l, _)| *l).collect();
                prop_assert!(!record.line_hits.is_empty());
                prop_assert_eq!(record.lines_hit, record.line_hits.len() as i64);
                prop_assert_eq!(record.lines_found, distinct.len() as i64);
            }
        }

        /// A file whose changed and covered lines do not intersect is absent
        #[test]
        fn empty_intersections_are_dropped(
            changes in arb_changes(),
            report in arb_report()
        ) {
            let filtered = filter_report(&changes, &report);
            for record in report.iter() {
                let intersects = changes.iter().any(|f| {
                    f.path.contains(record.source_file.as_str())
                        && record.line_hits.iter().any(|(l, _)| f.lines.contains(l))
                });
                prop_assert_eq!(filtered.get(&record.source_file).is_some(), intersects);
            }
        }

        /// Function data is copied unchanged
        #[test]
        fn function_data_passes_through(
            changes in arb_changes(),
            report in arb_report()
        ) {
            for record in filter_report(&changes, &report).iter() {
                let original = report.get(&record.source_file);
                prop_assert!(original.is_some());
                if let Some(original) = original {
                    prop_assert_eq!(&record.function_defs, &original.function_defs);
                    prop_assert_eq!(&record.function_hits, &original.function_hits);
                    prop_assert_eq!(record.functions_found, original.functions_found);
                    prop_assert_eq!(record.functions_hit, original.functions_hit);
                }
            }
        }
    }
}
