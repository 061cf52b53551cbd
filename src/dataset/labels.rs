// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLO label files: one object per line,
// `class_id x_center y_center width height`, coordinates normalized.

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    EmptyFile,
    FieldCount(usize),
    BadClassId,
    BadCoordinate,
    CoordinateOutOfRange,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::EmptyFile => write!(f, "empty label file"),
            IssueKind::FieldCount(n) => write!(f, "expected 5 fields, found {n}"),
            IssueKind::BadClassId => write!(f, "class id is not a non-negative integer"),
            IssueKind::BadCoordinate => write!(f, "coordinate is not a number"),
            IssueKind::CoordinateOutOfRange => write!(f, "coordinate outside [0, 1]"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelIssue {
    pub file: PathBuf,
    /// 1-based; `None` for whole-file issues.
    pub line: Option<usize>,
    pub content: String,
    pub kind: IssueKind,
}

impl fmt::Display for LabelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}:{}: {} ({:?})",
                self.file.display(),
                line,
                self.kind,
                self.content
            ),
            None => write!(f, "{}: {}", self.file.display(), self.kind),
        }
    }
}

/// Validate a single label line.
pub fn check_label_line(line: &str) -> Result<(), IssueKind> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(IssueKind::FieldCount(fields.len()));
    }
    if fields[0].parse::<u32>().is_err() {
        return Err(IssueKind::BadClassId);
    }
    for field in &fields[1..] {
        let value: f64 = field.parse().map_err(|_| IssueKind::BadCoordinate)?;
        if !(0.0..=1.0).contains(&value) {
            return Err(IssueKind::CoordinateOutOfRange);
        }
    }
    Ok(())
}

fn check_label_file(path: &Path, issues: &mut Vec<LabelIssue>) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read {}: {e}", path.display()))?;

    let mut lines = 0usize;
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        lines += 1;
        if let Err(kind) = check_label_line(line) {
            issues.push(LabelIssue {
                file: path.to_path_buf(),
                line: Some(idx + 1),
                content: line.to_string(),
                kind,
            });
        }
    }

    if lines == 0 {
        issues.push(LabelIssue {
            file: path.to_path_buf(),
            line: None,
            content: String::new(),
            kind: IssueKind::EmptyFile,
        });
    }
    Ok(())
}

/// Check every `.txt` file in `dir` and return the issues found.
pub fn check_labels_dir(dir: &Path) -> Result<Vec<LabelIssue>> {
    let files = super::list_files(dir, &["txt"])?;
    let mut issues = Vec::new();
    for name in &files {
        check_label_file(&dir.join(name), &mut issues)?;
    }
    log::info!("checked {} label files in {}", files.len(), dir.display());
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_line() {
        assert!(check_label_line("0 0.5 0.5 0.25 0.1").is_ok());
        assert!(check_label_line("  3   1.0 0.0 0.5 0.5 ").is_ok());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            check_label_line("0 0.5 0.5 0.25"),
            Err(IssueKind::FieldCount(4))
        );
        assert_eq!(
            check_label_line("0 0.5 0.5 0.25 0.1 0.9"),
            Err(IssueKind::FieldCount(6))
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(check_label_line("-1 0.5 0.5 0.2 0.2"), Err(IssueKind::BadClassId));
        assert_eq!(check_label_line("a 0.5 0.5 0.2 0.2"), Err(IssueKind::BadClassId));
        assert_eq!(
            check_label_line("0 0.5 x 0.2 0.2"),
            Err(IssueKind::BadCoordinate)
        );
        assert_eq!(
            check_label_line("0 1.5 0.5 0.2 0.2"),
            Err(IssueKind::CoordinateOutOfRange)
        );
    }

    #[test]
    fn reports_empty_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "0 0.5 0.5 0.1 0.1\n").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "\n\n").unwrap();
        std::fs::write(
            dir.path().join("bad.txt"),
            "0 0.5 0.5 0.1 0.1\n1 0.5 0.5\n",
        )
        .unwrap();

        let issues = check_labels_dir(dir.path()).unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::EmptyFile && i.file.ends_with("empty.txt")));
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::FieldCount(3) && i.line == Some(2)));
    }
}
