//! Unified diff generation for line insertions and deletions.
//!
//! The driver only ever inserts or removes whole blocks of lines, so the
//! diff can be produced directly from the edit points instead of a generic
//! sequence diff. Edits whose three-line context windows touch are merged
//! into a single hunk; `patch` and `git apply` reject a diff whose hunks
//! overlap.

/// Number of context lines around each hunk.
const CONTEXT: usize = 3;

/// Generate a unified diff for a set of line insertions into one file.
///
/// `insertions` are `(index, lines)` pairs where `index` is the 0-based
/// position in `original` the block is inserted before. They must be sorted
/// by index; output is deterministic for identical inputs.
pub fn unified_diff_insertions(
    file: &str,
    original: &[String],
    insertions: &[(usize, Vec<String>)],
) -> String {
    if insertions.is_empty() {
        return String::new();
    }

    let mut diff = String::new();
    diff.push_str(&format!("--- a/{file}\n"));
    diff.push_str(&format!("+++ b/{file}\n"));

    // Group insertions whose context windows touch into one hunk.
    let clamped: Vec<(usize, &Vec<String>)> = insertions
        .iter()
        .map(|(at, lines)| ((*at).min(original.len()), lines))
        .collect();
    let mut clusters: Vec<&[(usize, &Vec<String>)]> = Vec::new();
    let mut start = 0;
    for i in 1..clamped.len() {
        if clamped[i].0.saturating_sub(CONTEXT) > clamped[i - 1].0 + CONTEXT {
            clusters.push(&clamped[start..i]);
            start = i;
        }
    }
    clusters.push(&clamped[start..]);

    // Lines added by earlier hunks shift the +side start of later ones.
    let mut offset = 0usize;
    for cluster in clusters {
        let first_at = cluster[0].0;
        let last_at = cluster[cluster.len() - 1].0;
        let before_start = first_at.saturating_sub(CONTEXT);
        let after_end = (last_at + CONTEXT).min(original.len());
        let old_count = after_end - before_start;
        let added: usize = cluster.iter().map(|(_, lines)| lines.len()).sum();
        // Unified diff convention: a zero-length range starts at the line
        // before the insertion point.
        let old_start = if old_count == 0 {
            first_at
        } else {
            before_start + 1
        };
        let new_count = old_count + added;
        let new_start = if new_count == 0 {
            old_start + offset
        } else {
            before_start + offset + 1
        };

        diff.push_str(&format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@\n"
        ));
        let mut pos = before_start;
        for (at, lines) in cluster {
            for line in &original[pos..*at] {
                diff.push_str(&format!(" {line}\n"));
            }
            for line in lines.iter() {
                diff.push_str(&format!("+{line}\n"));
            }
            pos = *at;
        }
        for line in &original[pos..after_end] {
            diff.push_str(&format!(" {line}\n"));
        }
        offset += added;
    }

    diff
}

/// Generate a unified diff for a set of line deletions from one file.
///
/// `deletions` are inclusive `(start, end)` index ranges into `original`,
/// sorted and non-overlapping.
pub fn unified_diff_deletions(
    file: &str,
    original: &[String],
    deletions: &[(usize, usize)],
) -> String {
    if deletions.is_empty() {
        return String::new();
    }

    let mut diff = String::new();
    diff.push_str(&format!("--- a/{file}\n"));
    diff.push_str(&format!("+++ b/{file}\n"));

    let mut clusters: Vec<&[(usize, usize)]> = Vec::new();
    let mut start = 0;
    for i in 1..deletions.len() {
        if deletions[i].0.saturating_sub(CONTEXT) > deletions[i - 1].1 + CONTEXT {
            clusters.push(&deletions[start..i]);
            start = i;
        }
    }
    clusters.push(&deletions[start..]);

    // Lines removed by earlier hunks shift the +side start of later ones.
    let mut offset = 0isize;
    for cluster in clusters {
        let before_start = cluster[0].0.saturating_sub(CONTEXT);
        let after_end = (cluster[cluster.len() - 1].1 + 1 + CONTEXT).min(original.len());
        let old_count = after_end - before_start;
        let removed: usize = cluster.iter().map(|(s, e)| e - s + 1).sum();
        let old_start = before_start + 1;
        let new_count = old_count - removed;
        let new_start = if new_count == 0 {
            before_start as isize + offset
        } else {
            before_start as isize + offset + 1
        };

        diff.push_str(&format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@\n"
        ));
        let mut pos = before_start;
        for (s, e) in cluster {
            for line in &original[pos..*s] {
                diff.push_str(&format!(" {line}\n"));
            }
            for line in &original[*s..=*e] {
                diff.push_str(&format!("-{line}\n"));
            }
            pos = e + 1;
        }
        for line in &original[pos..after_end] {
            diff.push_str(&format!(" {line}\n"));
        }
        offset -= removed as isize;
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================
