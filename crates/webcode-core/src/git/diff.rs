//! Line-level diff on top of the Myers algorithm from `similar`.

use similar::{Algorithm, DiffOp, capture_diff_slices};

use super::model::{DiffLine, DiffLineType, GitDiffResult};

/// Diffs two texts line by line.
///
/// Within a change hunk of `d` deletions and `i` insertions, the first
/// `min(d, i)` pairs are reported as `Modified`, followed by the remaining
/// deletions and then the remaining insertions. A modified line counts as one
/// added and one deleted line.
pub fn diff_lines(old_content: &str, new_content: &str) -> GitDiffResult {
    let old: Vec<&str> = old_content.lines().collect();
    let new: Vec<&str> = new_content.lines().collect();

    let mut result = GitDiffResult {
        old_content: old_content.to_string(),
        new_content: new_content.to_string(),
        ..Default::default()
    };

    let mut deleted: Vec<usize> = Vec::new();
    let mut inserted: Vec<usize> = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        match op {
            DiffOp::Delete {
                old_index, old_len, ..
            } => deleted.extend(old_index..old_index + old_len),
            DiffOp::Insert {
                new_index, new_len, ..
            } => inserted.extend(new_index..new_index + new_len),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                deleted.extend(old_index..old_index + old_len);
                inserted.extend(new_index..new_index + new_len);
            }
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => {
                flush_hunk(&mut result, &old, &new, &mut deleted, &mut inserted);
                for offset in 0..len {
                    let (i, j) = (old_index + offset, new_index + offset);
                    result.lines.push(DiffLine {
                        line_type: DiffLineType::Unchanged,
                        content: new[j].to_string(),
                        old_content: None,
                        old_line_number: Some(i + 1),
                        new_line_number: Some(j + 1),
                    });
                }
            }
        }
    }
    flush_hunk(&mut result, &old, &new, &mut deleted, &mut inserted);

    result
}

fn flush_hunk(
    result: &mut GitDiffResult,
    old: &[&str],
    new: &[&str],
    deleted: &mut Vec<usize>,
    inserted: &mut Vec<usize>,
) {
    let paired = deleted.len().min(inserted.len());

    for (&i, &j) in deleted.iter().zip(inserted.iter()) {
        result.lines.push(DiffLine {
            line_type: DiffLineType::Modified,
            content: new[j].to_string(),
            old_content: Some(old[i].to_string()),
            old_line_number: Some(i + 1),
            new_line_number: Some(j + 1),
        });
        result.added_lines += 1;
        result.deleted_lines += 1;
    }
    for &i in &deleted[paired..] {
        result.lines.push(DiffLine {
            line_type: DiffLineType::Deleted,
            content: old[i].to_string(),
            old_content: None,
            old_line_number: Some(i + 1),
            new_line_number: None,
        });
        result.deleted_lines += 1;
    }
    for &j in &inserted[paired..] {
        result.lines.push(DiffLine {
            line_type: DiffLineType::Added,
            content: new[j].to_string(),
            old_content: None,
            old_line_number: None,
            new_line_number: Some(j + 1),
        });
        result.added_lines += 1;
    }

    deleted.clear();
    inserted.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(result: &GitDiffResult) -> Vec<DiffLineType> {
        result.lines.iter().map(|l| l.line_type).collect()
    }

    #[test]
    fn test_identical_inputs_are_unchanged() {
        let result = diff_lines("a\nb\n", "a\nb\n");
        assert_eq!(types(&result), vec![DiffLineType::Unchanged; 2]);
        assert_eq!(result.added_lines, 0);
        assert_eq!(result.deleted_lines, 0);
    }

    #[test]
    fn test_replaced_line_is_modified() {
        let result = diff_lines("a\nb\nc", "a\nB\nc");
        assert_eq!(
            types(&result),
            vec![
                DiffLineType::Unchanged,
                DiffLineType::Modified,
                DiffLineType::Unchanged
            ]
        );
        let modified = &result.lines[1];
        assert_eq!(modified.content, "B");
        assert_eq!(modified.old_content.as_deref(), Some("b"));
        assert_eq!(modified.old_line_number, Some(2));
        assert_eq!(modified.new_line_number, Some(2));
        assert_eq!(result.added_lines, 1);
        assert_eq!(result.deleted_lines, 1);
    }

    #[test]
    fn test_uneven_hunk_pairs_then_adds() {
        let result = diff_lines("keep\nold", "keep\nnew1\nnew2");
        assert_eq!(
            types(&result),
            vec![
                DiffLineType::Unchanged,
                DiffLineType::Modified,
                DiffLineType::Added
            ]
        );
        assert_eq!(result.lines[2].new_line_number, Some(3));
        assert_eq!(result.lines[2].old_line_number, None);
        assert_eq!(result.added_lines, 2);
        assert_eq!(result.deleted_lines, 1);
    }

    #[test]
    fn test_pure_deletion_advances_old_counter_only() {
        let result = diff_lines("a\nb\nc", "a\nc");
        assert_eq!(
            types(&result),
            vec![
                DiffLineType::Unchanged,
                DiffLineType::Deleted,
                DiffLineType::Unchanged
            ]
        );
        assert_eq!(result.lines[1].old_line_number, Some(2));
        assert_eq!(result.lines[2].old_line_number, Some(3));
        assert_eq!(result.lines[2].new_line_number, Some(2));
    }

    #[test]
    fn test_empty_old_content_is_all_added() {
        let result = diff_lines("", "x\ny");
        assert_eq!(types(&result), vec![DiffLineType::Added; 2]);
        assert_eq!(result.added_lines, 2);
    }

    #[test]
    fn test_large_inputs_diff_in_linear_space() {
        let old: String = (0..20_000).map(|i| format!("line {i}\n")).collect();
        let new: String = (0..20_000)
            .map(|i| {
                if i % 1000 == 0 {
                    format!("changed {i}\n")
                } else {
                    format!("line {i}\n")
                }
            })
            .collect();

        let result = diff_lines(&old, &new);

        assert_eq!(result.lines.len(), 20_000);
        assert_eq!(result.added_lines, 20);
        assert_eq!(result.deleted_lines, 20);
        assert_eq!(
            result
                .lines
                .iter()
                .filter(|l| l.line_type == DiffLineType::Modified)
                .count(),
            20
        );
    }
}
