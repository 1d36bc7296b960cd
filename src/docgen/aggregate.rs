//! Aggregated source text
//!
//! Units are flattened into one text for direct prompts and for `scan`
//! output. Each unit becomes `// FILE: <path>\n<content>\n` and units are
//! joined with a blank line. [`split_aggregated`] is the inverse.

use crate::types::FileUnit;

/// Header that opens every unit in aggregated text
pub const FILE_MARKER: &str = "// FILE: ";

const SECTION_BREAK: &str = "\n// FILE: ";

/// Flatten units into aggregated text
pub fn to_aggregated(units: &[FileUnit]) -> String {
    units
        .iter()
        .map(|u| format!("{}{}\n{}\n", FILE_MARKER, u.path, u.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recover units from aggregated text.
///
/// Text before the first marker is ignored, as is a marker line with no
/// newline after it. Content containing a line that starts with the marker
/// cannot be told apart from a new unit.
pub fn split_aggregated(text: &str) -> Vec<FileUnit> {
    let mut sections: Vec<&str> = Vec::new();
    let mut rest = text;

    if let Some(body) = rest.strip_prefix(FILE_MARKER) {
        rest = body;
    } else {
        match rest.find(SECTION_BREAK) {
            Some(idx) => rest = &rest[idx + SECTION_BREAK.len()..],
            None => return Vec::new(),
        }
    }

    loop {
        match rest.find(SECTION_BREAK) {
            Some(idx) => {
                sections.push(&rest[..idx]);
                rest = &rest[idx + SECTION_BREAK.len()..];
            }
            None => {
                sections.push(rest);
                break;
            }
        }
    }

    sections
        .into_iter()
        .filter_map(|section| {
            let (header, content) = section.split_once('\n')?;
            let path = header.trim();
            if path.is_empty() {
                return None;
            }
            let content = content.strip_suffix('\n').unwrap_or(content);
            Some(FileUnit::new(path, content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_format() {
        let units = vec![FileUnit::new("a.rs", "A"), FileUnit::new("b/c.rs", "B\nC")];
        assert_eq!(
            to_aggregated(&units),
            "// FILE: a.rs\nA\n\n// FILE: b/c.rs\nB\nC\n"
        );
    }

    #[test]
    fn test_split_recovers_units() {
        let units = vec![
            FileUnit::new("a.rs", "fn a() {}\n"),
            FileUnit::new("empty.txt", ""),
            FileUnit::new("b.rs", "fn b() {}"),
        ];
        assert_eq!(split_aggregated(&to_aggregated(&units)), units);
    }

    #[test]
    fn test_split_ignores_preamble() {
        let text = "Some notes pasted first\n// FILE: x.py\nprint(1)\n";
        let units = split_aggregated(text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].path, "x.py");
        assert_eq!(units[0].content, "print(1)");
    }

    #[test]
    fn test_split_without_markers() {
        assert!(split_aggregated("fn main() {}\n").is_empty());
        assert!(split_aggregated("").is_empty());
    }

    #[test]
    fn test_split_trims_header_and_skips_bare_marker() {
        let units = split_aggregated("// FILE:  spaced.rs \nbody\n\n// FILE: dangling");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].path, "spaced.rs");
        assert_eq!(units[0].content, "body");
    }
}
