//! Conventional names for produced documents

use serde::{Deserialize, Serialize};

/// The operation that produced a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Merge,
    Split,
    Rotate,
    Overlay,
    Annotate,
}

impl Operation {
    fn prefix(self) -> &'static str {
        match self {
            Operation::Merge => "merged-",
            Operation::Split => "split-",
            Operation::Rotate => "rotated-",
            Operation::Overlay => "edited-",
            Operation::Annotate => "edited-text-",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Operation::Merge => "merged-document.pdf",
            Operation::Split => "split-document.pdf",
            Operation::Rotate => "rotated-document.pdf",
            Operation::Overlay => "edited.pdf",
            Operation::Annotate => "edited-text.pdf",
        }
    }
}

/// File name for the output of `operation` applied to `original`
///
/// Only the final path component of `original` is used. Merges always
/// produce `merged-document.pdf`.
pub fn output_file_name(operation: Operation, original: Option<&str>) -> String {
    if operation == Operation::Merge {
        return operation.fallback().to_string();
    }

    let base = original
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match base {
        Some(name) => format!("{}{name}", operation.prefix()),
        None => operation.fallback().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_name_is_fixed() {
        assert_eq!(
            output_file_name(Operation::Merge, Some("a.pdf")),
            "merged-document.pdf"
        );
        assert_eq!(output_file_name(Operation::Merge, None), "merged-document.pdf");
    }

    #[test]
    fn test_prefixed_names() {
        assert_eq!(output_file_name(Operation::Split, Some("report.pdf")), "split-report.pdf");
        assert_eq!(
            output_file_name(Operation::Rotate, Some("/tmp/in/scan.pdf")),
            "rotated-scan.pdf"
        );
        assert_eq!(
            output_file_name(Operation::Overlay, Some("C:\\docs\\form.pdf")),
            "edited-form.pdf"
        );
        assert_eq!(
            output_file_name(Operation::Annotate, Some("notes.pdf")),
            "edited-text-notes.pdf"
        );
    }

    #[test]
    fn test_fallback_names() {
        assert_eq!(output_file_name(Operation::Overlay, None), "edited.pdf");
        assert_eq!(output_file_name(Operation::Annotate, Some("")), "edited-text.pdf");
        assert_eq!(output_file_name(Operation::Split, Some("dir/")), "split-document.pdf");
    }
}
