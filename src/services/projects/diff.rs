//! Version Diff
//!
//! Per-file unified diffs between two project snapshots.

use std::collections::BTreeSet;

use similar::{ChangeTag, TextDiff};

use crate::models::project::{CodeSnapshot, DiffStatus, FileDiff};

/// Lines of context around each hunk
const CONTEXT_LINES: usize = 3;

/// Diff every path present in either snapshot. Paths come out sorted.
pub fn diff_snapshots(old: &CodeSnapshot, new: &CodeSnapshot) -> Vec<FileDiff> {
    let old_files = old.as_file_map();
    let new_files = new.as_file_map();
    let paths: BTreeSet<&String> = old_files.keys().chain(new_files.keys()).collect();

    paths
        .into_iter()
        .map(|path| {
            let before = old_files.get(path);
            let after = new_files.get(path);
            let status = match (before, after) {
                (None, Some(_)) => DiffStatus::Added,
                (Some(_), None) => DiffStatus::Removed,
                (Some(a), Some(b)) if a == b => DiffStatus::Unchanged,
                _ => DiffStatus::Modified,
            };
            let unified = if status == DiffStatus::Unchanged {
                String::new()
            } else {
                unified_diff(
                    before.map(String::as_str).unwrap_or(""),
                    after.map(String::as_str).unwrap_or(""),
                    path,
                )
            };

            FileDiff {
                path: path.clone(),
                status,
                unified,
            }
        })
        .collect()
}

/// Generate unified diff format between two strings
fn unified_diff(old_content: &str, new_content: &str, path: &str) -> String {
    let diff = TextDiff::from_lines(old_content, new_content);

    let mut output = format!("--- a/{}\n+++ b/{}\n", path, path);

    for group in diff.grouped_ops(CONTEXT_LINES) {
        let (old_start, old_count, new_start, new_count) = group.iter().fold(
            (usize::MAX, 0usize, usize::MAX, 0usize),
            |(os, oc, ns, nc), op| {
                let old_range = op.old_range();
                let new_range = op.new_range();
                (
                    os.min(old_range.start),
                    oc + old_range.len(),
                    ns.min(new_range.start),
                    nc + new_range.len(),
                )
            },
        );

        output.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start + 1,
            old_count,
            new_start + 1,
            new_count
        ));

        for op in &group {
            for change in diff.iter_changes(op) {
                let prefix = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                output.push(prefix);
                output.push_str(change.value());
                if change.missing_newline() {
                    output.push('\n');
                }
            }
        }
    }

    output
}
