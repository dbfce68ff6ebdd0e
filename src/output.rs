//! CLI output formatting.
//!
//! Renderers return lines so they can be tested without capturing stdout.

use std::path::Path;

use pubsync_core::{IngestReport, MigrateReport, Publication, PublicationStats, RetagReport};

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending an ellipsis if cut.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    match width {
        0 => String::new(),
        1 => "…".to_string(),
        _ => {
            let mut output: String = text.chars().take(width - 1).collect();
            output.push('…');
            output
        }
    }
}

pub fn ingest_report_lines(report: &IngestReport, output: &Path) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Processed {} of {} works ({} skipped)",
            report.succeeded, report.total, report.skipped
        ),
        format!(
            "Wrote {} publications to {}",
            report.written,
            output.display()
        ),
    ];
    if let Some(backup) = &report.backup {
        lines.push(format!("Previous artifact backed up to {}", backup.display()));
    }
    if let Some(database) = report.database {
        lines.push(format!(
            "Database: {} upserted, {} failed",
            database.upserted, database.failed
        ));
    }
    lines
}

pub fn retag_report_lines(report: &RetagReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Re-tagged {} publications ({} distinct tags)",
        report.updated,
        report.distinct_tags.len()
    )];
    if let Some(backup) = &report.backup {
        lines.push(format!("Previous artifact backed up to {}", backup.display()));
    }
    lines
}

pub fn migrate_report_lines(report: &MigrateReport) -> Vec<String> {
    let mut lines = vec![
        format!("Found {} publications", report.found),
        format!(
            "Upserted {}, failed {}",
            report.upserts.upserted, report.upserts.failed
        ),
        format!("Database now holds {}", report.stats),
    ];
    if let Some(backup) = &report.backup {
        lines.push(format!("Artifact backed up to {}", backup.display()));
    }
    lines
}

pub fn stats_lines(stats: &PublicationStats, tags: &[String]) -> Vec<String> {
    let mut lines = vec![stats.to_string()];
    if !tags.is_empty() {
        lines.push(format!("Tags: {}", tags.join(", ")));
    }
    lines
}

/// One line per publication: `year  title  [tags]`, fitted to `width`.
pub fn publication_row(publication: &Publication, width: usize) -> String {
    let mut row = format!("{:<4}  {}", publication.year, publication.title);
    if !publication.tags.is_empty() {
        let tags: Vec<&str> = publication.tags.iter().map(String::as_str).collect();
        row.push_str(&format!("  [{}]", tags.join(", ")));
    }
    truncate_to_width(&row, width)
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubsync_core::UpsertSummary;
    use std::path::PathBuf;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abcdef", 1), "…");
        assert_eq!(truncate_to_width("abcdef", 0), "");
    }

    #[test]
    fn test_ingest_report_lines_mentions_skips_backup_and_database() {
        let report = IngestReport {
            total: 3,
            succeeded: 2,
            skipped: 1,
            written: 2,
            backup: Some(PathBuf::from("data/publications.backup.1.json")),
            database: Some(UpsertSummary {
                upserted: 2,
                failed: 0,
            }),
        };
        let lines = ingest_report_lines(&report, Path::new("data/publications.json"));
        assert_eq!(lines[0], "Processed 2 of 3 works (1 skipped)");
        assert_eq!(lines[1], "Wrote 2 publications to data/publications.json");
        assert!(lines[2].contains("publications.backup.1.json"));
        assert_eq!(lines[3], "Database: 2 upserted, 0 failed");
    }

    #[test]
    fn test_ingest_report_lines_first_run() {
        let report = IngestReport::default();
        let lines = ingest_report_lines(&report, Path::new("p.json"));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_stats_lines_lists_tags() {
        let stats = PublicationStats {
            publications: 2,
            authors: 3,
            tags: 2,
            earliest_year: Some(2019),
            latest_year: Some(2024),
        };
        let lines = stats_lines(&stats, &["Sleep".to_string(), "fMRI".to_string()]);
        assert_eq!(
            lines,
            vec![
                "2 publications, 3 authors, 2 tags, years 2019-2024",
                "Tags: Sleep, fMRI"
            ]
        );
    }

    #[test]
    fn test_publication_row_includes_year_title_and_tags() {
        let mut publication = Publication::titled("Sleep and memory");
        publication.year = "2023".to_string();
        publication.tags.insert("Sleep".to_string());
        assert_eq!(
            publication_row(&publication, 80),
            "2023  Sleep and memory  [Sleep]"
        );
        assert_eq!(publication_row(&publication, 10).chars().count(), 10);
    }
}
