//! Output formatting for analysis results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured, versioned output for programmatic consumption
//! - Markdown: a report suitable for pull requests and wikis

use std::collections::BTreeMap;
use std::io::{self, Write};

use colored::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::{DirectoryAnalysisResult, FileFailure};
use crate::detect::{AnalysisResult, ArchitecturalDefect, Severity, SuppressionType};
use crate::score::{self, HealthStatus};
use crate::thresholds::Profile;

/// Bumped whenever the JSON layout changes incompatibly.
pub const JSON_SCHEMA_VERSION: u32 = 1;

const TOOL_NAME: &str = "archsmell";

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub schema_version: u32,
    pub tool: String,
    pub version: String,
    pub root: String,
    pub profile: String,
    pub timestamp: String,
    pub duration_ms: u128,
    pub summary: JsonSummary,
    pub files: Vec<JsonFile>,
    pub failed_files: Vec<FileFailure>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonSummary {
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub total_defects: usize,
    pub average_maintainability_score: f64,
    pub grade: String,
    pub health: HealthStatus,
    pub requires_refactoring: bool,
    pub by_severity: BTreeMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonFile {
    pub path: String,
    pub maintainability_score: u32,
    pub defects: Vec<ArchitecturalDefect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_detectors: Vec<String>,
    pub suppressed_count: usize,
}

/// Render results as a pretty-printed JSON document.
pub fn render_json(result: &DirectoryAnalysisResult, profile: Profile) -> anyhow::Result<String> {
    let by_severity = Severity::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), result.count_by_severity(*s)))
        .collect();
    let average = result.average_maintainability_score();

    let report = JsonReport {
        schema_version: JSON_SCHEMA_VERSION,
        tool: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        root: result.root.display().to_string(),
        profile: profile.to_string(),
        timestamp: result.timestamp.to_rfc3339(),
        duration_ms: result.duration.as_millis(),
        summary: JsonSummary {
            files_analyzed: result.total_files(),
            files_failed: result.failed_files.len(),
            total_defects: result.total_defects(),
            average_maintainability_score: (average * 10.0).round() / 10.0,
            grade: score::grade(average).to_string(),
            health: result.health_status(),
            requires_refactoring: result.requires_refactoring(),
            by_severity,
        },
        files: result.results.iter().map(file_to_json).collect(),
        failed_files: result.failed_files.clone(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

fn file_to_json(r: &AnalysisResult) -> JsonFile {
    JsonFile {
        path: r.file_path.clone(),
        maintainability_score: r.maintainability_score,
        defects: r.defects.clone(),
        skipped_detectors: r
            .skipped_detectors
            .iter()
            .map(|s| format!("{}: {}", s.detector, s.reason))
            .collect(),
        suppressed_count: r.suppressed.len(),
    }
}

// =============================================================================
// Markdown Format
// =============================================================================

/// Render results as a Markdown report.
pub fn render_markdown(result: &DirectoryAnalysisResult, profile: Profile) -> String {
    let average = result.average_maintainability_score();
    let mut md = String::new();

    md.push_str("# Architectural Smell Report\n\n");
    md.push_str(&format!(
        "Analyzed `{}` with the `{}` profile on {}.\n\n",
        result.root.display(),
        profile,
        result.timestamp.format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n|---|---|\n");
    md.push_str(&format!("| Files analyzed | {} |\n", result.total_files()));
    md.push_str(&format!("| Files failed | {} |\n", result.failed_files.len()));
    md.push_str(&format!("| Total defects | {} |\n", result.total_defects()));
    md.push_str(&format!(
        "| Average maintainability | {:.1} ({}) |\n",
        average,
        score::grade(average)
    ));
    md.push_str(&format!("| Health | {} |\n\n", result.health_status()));

    md.push_str("## Defects by Severity\n\n");
    md.push_str("| Severity | Count |\n|---|---|\n");
    for severity in Severity::ALL {
        md.push_str(&format!(
            "| {} | {} |\n",
            severity.as_str(),
            result.count_by_severity(severity)
        ));
    }
    md.push('\n');

    let with_defects: Vec<&AnalysisResult> = result
        .results
        .iter()
        .filter(|r| !r.defects.is_empty())
        .collect();
    if !with_defects.is_empty() {
        md.push_str("## Files\n");
        for file in with_defects {
            md.push_str(&format!(
                "\n### `{}` (score {})\n\n",
                file.file_path, file.maintainability_score
            ));
            md.push_str("| Severity | Defect | Lines | Message |\n|---|---|---|---|\n");
            for defect in &file.defects {
                md.push_str(&format!(
                    "| {} | {} | {}-{} | {} |\n",
                    defect.severity.as_str(),
                    defect.defect_type.display_name(),
                    defect.location.start_line,
                    defect.location.end_line,
                    escape_cell(&defect.message)
                ));
            }
        }
        md.push('\n');
    }

    if !result.failed_files.is_empty() {
        md.push_str("## Failed Files\n\n");
        for failure in &result.failed_files {
            md.push_str(&format!("- `{}`: {}\n", failure.path, failure.error));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty<W: Write>(
    out: &mut W,
    result: &DirectoryAnalysisResult,
    profile: Profile,
    show_suppressed: bool,
) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        TOOL_NAME.cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning: ".dimmed(), result.root.display())?;
    writeln!(out, "  {}{}", "Profile:  ".dimmed(), profile)?;
    writeln!(out)?;

    for file in &result.results {
        if file.defects.is_empty() && file.skipped_detectors.is_empty() {
            continue;
        }
        write_file(out, file)?;
    }

    let suppressed: Vec<_> = result.results.iter().flat_map(|r| &r.suppressed).collect();
    if !suppressed.is_empty() {
        writeln!(out, "  {} ({}):", "Suppressed".dimmed(), suppressed.len())?;
        if show_suppressed {
            for sd in suppressed {
                let location = if sd.suppression.suppression_type == SuppressionType::File {
                    format!("{}:* (file)", sd.defect.location.file)
                } else {
                    sd.defect.location.to_string()
                };
                writeln!(
                    out,
                    "    {:<28}{}",
                    sd.defect.defect_type.as_str().dimmed(),
                    location.blue()
                )?;
                if !sd.suppression.reason.is_empty() {
                    writeln!(
                        out,
                        "            {}",
                        format!("reason: {:?}", sd.suppression.reason).dimmed()
                    )?;
                }
            }
        } else {
            writeln!(out, "    {}", "(use --show-suppressed to see details)".dimmed())?;
        }
        writeln!(out)?;
    }

    if !result.failed_files.is_empty() {
        writeln!(
            out,
            "  {} ({}):",
            "Failed files".red().bold(),
            result.failed_files.len()
        )?;
        for failure in &result.failed_files {
            writeln!(out, "    {}  {}", failure.path.blue(), failure.error.dimmed())?;
        }
        writeln!(out)?;
    }

    write_summary(out, result)
}

fn write_file<W: Write>(out: &mut W, file: &AnalysisResult) -> io::Result<()> {
    write!(out, "  {}  ", file.file_path.blue().bold())?;
    write!(out, "score ")?;
    write_colored_score(out, f64::from(file.maintainability_score))?;
    writeln!(out)?;
    writeln!(out)?;

    for defect in &file.defects {
        write_severity_tag(out, defect.severity)?;
        writeln!(
            out,
            "{:<28}{}",
            defect.defect_type.as_str().dimmed(),
            format!("lines {}-{}", defect.location.start_line, defect.location.end_line).dimmed()
        )?;
        // Message and suggestion on the next lines, indented
        writeln!(out, "             {}", defect.message)?;
        if !defect.suggestion.is_empty() {
            writeln!(out, "             {}", format!("→ {}", defect.suggestion).green())?;
        }
        writeln!(out)?;
    }

    for skipped in &file.skipped_detectors {
        writeln!(
            out,
            "    {} {} skipped: {}",
            "WARN".yellow(),
            skipped.detector,
            skipped.reason.dimmed()
        )?;
    }
    if !file.skipped_detectors.is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

fn write_severity_tag<W: Write>(out: &mut W, severity: Severity) -> io::Result<()> {
    match severity {
        Severity::Critical => write!(out, "    {} ", "CRIT".red().bold()),
        Severity::High => write!(out, "    {} ", "HIGH".red()),
        Severity::Medium => write!(out, "    {} ", "MED ".yellow()),
        Severity::Low => write!(out, "    {} ", "LOW ".blue()),
    }
}

fn write_colored_score<W: Write>(out: &mut W, s: f64) -> io::Result<()> {
    let text = format!("{:.0}", s);
    match s {
        s if s >= score::grades::A_MIN => write!(out, "{}", text.green().bold()),
        s if s >= score::grades::B_MIN => write!(out, "{}", text.green()),
        s if s >= score::grades::C_MIN => write!(out, "{}", text.yellow()),
        s if s >= score::grades::D_MIN => write!(out, "{}", text.yellow().bold()),
        _ => write!(out, "{}", text.red()),
    }
}

fn write_colored_grade<W: Write>(out: &mut W, grade: &str) -> io::Result<()> {
    match grade {
        "A" => write!(out, "{}", grade.green().bold()),
        "B" => write!(out, "{}", grade.green()),
        "C" => write!(out, "{}", grade.yellow()),
        "D" => write!(out, "{}", grade.yellow().bold()),
        _ => write!(out, "{}", grade.red()),
    }
}

fn write_summary<W: Write>(out: &mut W, result: &DirectoryAnalysisResult) -> io::Result<()> {
    let average = result.average_maintainability_score();

    writeln!(out, "  {}", "Summary:".bold())?;
    writeln!(
        out,
        "    {} files analyzed, {} failed, {} defects in {:.2?}",
        result.total_files(),
        result.failed_files.len(),
        result.total_defects(),
        result.duration
    )?;
    let counts: Vec<String> = Severity::ALL
        .iter()
        .map(|s| format!("{} {}", result.count_by_severity(*s), s.as_str()))
        .collect();
    writeln!(out, "    {}", counts.join(", ").dimmed())?;

    write!(out, "    Maintainability: ")?;
    write_colored_score(out, average)?;
    write!(out, "  Grade: ")?;
    write_colored_grade(out, score::grade(average))?;
    write!(out, "  ")?;
    let status = result.health_status();
    match status {
        HealthStatus::Healthy => write!(out, "{}", status.as_str().to_uppercase().green())?,
        HealthStatus::NeedsAttention => write!(out, "{}", status.as_str().to_uppercase().yellow())?,
        HealthStatus::RequiresRefactoring => {
            write!(out, "{}", status.as_str().to_uppercase().red())?
        }
    }
    writeln!(out)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::detect::{DefectType, Location};
    use std::time::Duration;

    fn sample() -> DirectoryAnalysisResult {
        let defect = ArchitecturalDefect::new(
            DefectType::GodClass,
            Severity::High,
            "class 'Everything' has 25 methods | too many",
            Location {
                file: "Sources/Everything.swift".to_string(),
                start_line: 3,
                end_line: 120,
            },
        );
        let results = vec![
            AnalysisResult {
                file_path: "Sources/Everything.swift".to_string(),
                maintainability_score: score::maintainability_score(std::slice::from_ref(&defect)),
                defects: vec![defect],
                skipped_detectors: Vec::new(),
                suppressed: Vec::new(),
            },
            AnalysisResult {
                file_path: "Sources/Clean.swift".to_string(),
                maintainability_score: 100,
                defects: Vec::new(),
                skipped_detectors: Vec::new(),
                suppressed: Vec::new(),
            },
        ];
        let failures = vec![FileFailure {
            path: "Sources/Broken.swift".to_string(),
            error: "parse error in Sources/Broken.swift:4: missing `}`".to_string(),
        }];
        aggregate("Sources", results, failures, Duration::from_millis(42))
    }

    #[test]
    fn test_json_report() {
        let json = render_json(&sample(), Profile::Default).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["schema_version"], JSON_SCHEMA_VERSION);
        assert_eq!(value["tool"], "archsmell");
        assert_eq!(value["profile"], "default");
        assert_eq!(value["duration_ms"], 42);
        assert_eq!(value["summary"]["files_analyzed"], 2);
        assert_eq!(value["summary"]["files_failed"], 1);
        assert_eq!(value["summary"]["total_defects"], 1);
        assert_eq!(value["summary"]["by_severity"]["high"], 1);
        assert_eq!(value["summary"]["health"], "needs_attention");
        // files are sorted by path
        assert_eq!(value["files"][0]["path"], "Sources/Clean.swift");
        assert_eq!(value["files"][1]["defects"][0]["defect_type"], "god_class");
        assert_eq!(value["failed_files"][0]["path"], "Sources/Broken.swift");
    }

    #[test]
    fn test_markdown_report() {
        let md = render_markdown(&sample(), Profile::Academic);

        assert!(md.starts_with("# Architectural Smell Report"));
        assert!(md.contains("`academic` profile"));
        assert!(md.contains("| Files analyzed | 2 |"));
        assert!(md.contains("| high | 1 |"));
        assert!(md.contains("### `Sources/Everything.swift` (score 90)"));
        assert!(md.contains("| 3-120 |"));
        // pipes inside messages do not break the table
        assert!(md.contains("25 methods \\| too many"));
        assert!(!md.contains("### `Sources/Clean.swift`"));
        assert!(md.contains("## Failed Files"));
        assert!(md.contains("- `Sources/Broken.swift`: parse error"));
    }

    #[test]
    fn test_pretty_report() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write_pretty(&mut out, &sample(), Profile::Default, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Sources/Everything.swift"));
        assert!(text.contains("HIGH"));
        assert!(text.contains("god_class"));
        assert!(text.contains("Failed files (1)"));
        assert!(text.contains("2 files analyzed, 1 failed, 1 defects"));
        assert!(!text.contains("Sources/Clean.swift  score"));
    }
}
