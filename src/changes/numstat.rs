use super::ChangeSet;

/// Parse `git diff --numstat` output into a [`ChangeSet`].
///
/// Each line is `<added> <removed> <path>`. A file with `n` added lines gets
/// lines `1..=n`. Lines that do not split into exactly three fields, and
/// files whose added count is not a number (binary files report `-`), are
/// skipped.
///
/// # Examples
///
/// ```
/// use git_lcov_filter::changes::parse_numstat;
/// use std::collections::BTreeSet;
///
/// let changes = parse_numstat("3\t0\tsrc/Foo.java\n-\t-\tlogo.png\n");
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes.get("src/Foo.java"), Some(&BTreeSet::from([1, 2, 3])));
/// ```
pub fn parse_numstat(output: &str) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for line in output.lines() {
        if line.starts_with("diff --git") {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [added, _removed, path] = fields.as_slice() else {
            continue;
        };

        if let Some(count) = parse_count(added) {
            changes.insert(path, (1..=count).collect());
        }
    }

    changes
}

/// Parse a numstat count; only plain ASCII digits are accepted
fn parse_count(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn parse_single_file() {
        let changes = parse_numstat("3\t0\tsrc/Foo.java\n");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.files[0].path, "src/Foo.java");
        assert_eq!(changes.files[0].lines, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn parse_keeps_git_order() {
        let output = "1\t1\tb/Second.java\n2\t0\ta/First.java\n";
        let changes = parse_numstat(output);
        let paths: Vec<&str> = changes.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b/Second.java", "a/First.java"]);
    }

    #[test]
    fn parse_skips_binary_files() {
        let changes = parse_numstat("-\t-\timg/logo.png\n4\t1\tsrc/App.java\n");
        assert_eq!(changes.len(), 1);
        assert!(changes.get("img/logo.png").is_none());
    }

    #[test]
    fn parse_zero_added_keeps_empty_entry() {
        let changes = parse_numstat("0\t12\tsrc/Removed.java\n");
        assert_eq!(changes.get("src/Removed.java"), Some(&BTreeSet::new()));
    }

    #[test]
    fn parse_skips_lines_without_three_fields() {
        let output = "diff --git a/x b/x\n\n5\t0\tsrc/with space.java\n2 0\n";
        assert!(parse_numstat(output).is_empty());
    }

    #[test]
    fn parse_space_separated_fields() {
        let changes = parse_numstat("2 0 src/Foo.java");
        assert_eq!(changes.get("src/Foo.java"), Some(&BTreeSet::from([1, 2])));
    }

    #[test]
    fn parse_rejects_signed_counts() {
        assert!(parse_numstat("+3\t0\tsrc/Foo.java\n").is_empty());
    }

    #[test]
    fn parse_empty_output() {
        assert!(parse_numstat("").is_empty());
    }
}
