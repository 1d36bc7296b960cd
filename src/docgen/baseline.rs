//! Baseline handover document
//!
//! Deterministic markdown built without any AI call. It is passed into the
//! prompts as reference material and can be emitted on its own.

use chrono::NaiveDate;
use std::fmt::Write;

use crate::types::{DocumentContext, FileUnit};

/// Largest inventory rendered in full
const MAX_INVENTORY_ROWS: usize = 200;

/// Render the baseline for today's date
pub fn build_baseline(ctx: &DocumentContext, units: &[FileUnit]) -> String {
    render_baseline(ctx, units, chrono::Local::now().date_naive())
}

/// Render the baseline for a fixed date
pub fn render_baseline(ctx: &DocumentContext, units: &[FileUnit], date: NaiveDate) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "### {} — Handover Documentation\n", ctx.title);
    let _ = writeln!(doc, "- **Last updated**: {}", date.format("%Y-%m-%d"));
    let _ = writeln!(doc, "- **Primary owner**: {}", ctx.owner_or_default());
    let _ = writeln!(doc, "- **Repository**: {}", ctx.repository_or_default());
    let _ = writeln!(doc);

    let overview = ctx
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("No additional context provided.");
    let _ = writeln!(doc, "### 1) Overview\n{}\n", overview);

    let _ = writeln!(doc, "### 2) File inventory");
    doc.push_str(&render_inventory(units));
    doc.push('\n');

    doc.push_str(STANDARD_SECTIONS);
    doc.trim_end().to_string()
}

fn render_inventory(units: &[FileUnit]) -> String {
    if units.is_empty() {
        return "- None detected\n".to_string();
    }

    let mut out = String::new();
    let total_bytes: usize = units.iter().map(|u| u.byte_size).sum();
    let truncated = units.iter().filter(|u| u.truncated).count();
    let _ = writeln!(
        out,
        "- **Files**: {} ({} total{})",
        units.len(),
        format_bytes(total_bytes),
        if truncated > 0 {
            format!(", {} truncated", truncated)
        } else {
            String::new()
        }
    );

    for unit in units.iter().take(MAX_INVENTORY_ROWS) {
        let _ = writeln!(
            out,
            "  - `{}` ({}{})",
            unit.path,
            format_bytes(unit.byte_size),
            if unit.truncated { ", truncated" } else { "" }
        );
    }
    if units.len() > MAX_INVENTORY_ROWS {
        let _ = writeln!(out, "  - ... and {} more", units.len() - MAX_INVENTORY_ROWS);
    }
    out
}

fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

const STANDARD_SECTIONS: &str = "\
### 3) Local development
- **Prerequisites**: Appropriate runtime and package manager for the project
- **Setup**: Ensure environment variables are configured (.env or shell) and dependencies installed
- **Run**: Refer to project README or entry point; common commands vary by language

### 4) Deployment & operations
- **Build**: Language/runtime-specific build steps
- **Deploy**: CI/CD pipeline or manual process (document provider, environment, approvals)
- **Observability**: Logging, metrics, and tracing destinations (add specifics if known)
- **SLA/Backups**: Define expectations and data retention policies

### 5) Risks, gotchas, and follow-ups
- Note risky areas, coupling, and places lacking tests
- Add migration notes or tech debt items

### 6) Handover checklist
- [ ] Update owners in CODEOWNERS/README
- [ ] Ensure on-call runbook exists
- [ ] Validate feature flags and config defaults
- [ ] Confirm secrets rotation schedule
- [ ] Verify CI is green and release is reproducible
";

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_header_and_defaults() {
        let doc = render_baseline(&DocumentContext::new("Mini API"), &[], date());

        assert!(doc.starts_with("### Mini API — Handover Documentation"));
        assert!(doc.contains("- **Last updated**: 2026-03-14"));
        assert!(doc.contains("- **Primary owner**: Unassigned"));
        assert!(doc.contains("- **Repository**: N/A"));
        assert!(doc.contains("No additional context provided."));
        assert!(doc.contains("- None detected"));
        assert!(doc.ends_with("- [ ] Verify CI is green and release is reproducible"));
    }

    #[test]
    fn test_inventory_lists_files() {
        let mut big = FileUnit::new("src/big.rs", "x");
        big.truncated = true;
        big.byte_size = 300_000;
        let units = vec![FileUnit::new("src/main.rs", "fn main() {}"), big];

        let ctx = DocumentContext {
            title: "Demo".into(),
            owner: Some("ops".into()),
            repository: Some("https://github.com/o/r".into()),
            context: Some("  Billing service  ".into()),
        };
        let doc = render_baseline(&ctx, &units, date());

        assert!(doc.contains("### 1) Overview\nBilling service\n"));
        assert!(doc.contains("- **Files**: 2 (293.0 KB total, 1 truncated)"));
        assert!(doc.contains("  - `src/main.rs` (12 B)"));
        assert!(doc.contains("  - `src/big.rs` (293.0 KB, truncated)"));
    }

    #[test]
    fn test_deterministic_for_fixed_date() {
        let units = vec![FileUnit::new("a.rs", "a")];
        let ctx = DocumentContext::new("X");
        assert_eq!(
            render_baseline(&ctx, &units, date()),
            render_baseline(&ctx, &units, date())
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
