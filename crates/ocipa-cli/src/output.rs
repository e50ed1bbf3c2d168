use std::fmt::Write as _;

use anyhow::Result;
use colored::Colorize;
use ocipa_core::{AnalysisOutcome, AnalysisReport};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

const RULE_WIDTH: usize = 80;
const SECTION_RULE_WIDTH: usize = 40;

pub fn print_report(report: &AnalysisReport, format: OutputFormat) -> Result<()> {
    println!("{}", render(report, format)?);
    Ok(())
}

pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => render_json(report),
    }
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_interrupted() {
    println!("\n{}", "Analysis interrupted by user.".yellow());
}

fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}\n",
        format!("=== OCI Policy Analysis for User: {} ===", report.user_id).bold()
    );
    let _ = writeln!(out, "{} {}", "Tenancy:".cyan(), report.tenancy_id);

    match report.outcome() {
        AnalysisOutcome::NoGroups => {
            let _ = writeln!(out, "No groups found for user or error occurred.");
        }
        outcome => {
            let _ = writeln!(
                out,
                "User belongs to {} groups: {}",
                report.group_names.len(),
                report.group_names.join(", ")
            );
            let _ = writeln!(
                out,
                "Scanned policies in {} compartments\n",
                report.compartments_scanned
            );

            if let AnalysisOutcome::Relevant { statements } = outcome {
                let _ = writeln!(
                    out,
                    "Found {statements} policy statements that apply to this user:\n"
                );
                let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
                for section in &report.sections {
                    let _ = writeln!(out, "\n{} {}", "Policy:".cyan(), section.policy_name.bold());
                    let _ = writeln!(out, "{} {}", "Compartment:".cyan(), section.compartment_name);
                    let _ = writeln!(out, "{}", "-".repeat(SECTION_RULE_WIDTH));
                    for statement in &section.statements {
                        let _ = writeln!(out, "  {statement}");
                    }
                }
                let _ = writeln!(out, "\n{}", "=".repeat(RULE_WIDTH));
                let _ = writeln!(
                    out,
                    "{} Analysis complete. Total statements: {statements}",
                    "✓".green()
                );
            } else {
                let _ = writeln!(
                    out,
                    "No policy statements found that apply to this user's groups."
                );
            }
        }
    }

    write_warnings(&mut out, report);
    out.trim_end().to_string()
}

fn write_warnings(out: &mut String, report: &AnalysisReport) {
    if report.warnings.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "\n{} {} warnings during scan:",
        "⚠".yellow(),
        report.warnings.len()
    );
    for warning in &report.warnings {
        let _ = writeln!(out, "  - {}", warning.to_string().yellow());
    }
}

fn render_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    if report.sections.is_empty() {
        let message = match report.outcome() {
            AnalysisOutcome::NoGroups => "No groups found for user or error occurred.",
            _ => "No policy statements found that apply to this user's groups.",
        };
        let _ = writeln!(out, "{message}");
    } else {
        let mut builder = Builder::default();
        builder.push_record(["Policy", "Compartment", "Statement"]);
        for section in &report.sections {
            for statement in &section.statements {
                builder.push_record([
                    section.policy_name.as_str(),
                    section.compartment_name.as_str(),
                    statement.as_str(),
                ]);
            }
        }
        let table = builder.build().with(Style::rounded()).to_string();
        let _ = writeln!(out, "{table}");
        let _ = writeln!(out, "Total: {}", report.total_statements());
    }

    write_warnings(&mut out, report);
    out.trim_end().to_string()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    outcome: AnalysisOutcome,
    total_statements: usize,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

fn render_json(report: &AnalysisReport) -> Result<String> {
    let body = JsonReport {
        outcome: report.outcome(),
        total_statements: report.total_statements(),
        report,
    };
    Ok(serde_json::to_string_pretty(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocipa_core::{GatewayError, PolicySection, ScanStage, ScanWarning};

    fn plain() {
        colored::control::set_override(false);
    }

    fn report() -> AnalysisReport {
        AnalysisReport {
            user_id: "ocid1.user.oc1..me".to_string(),
            tenancy_id: "ocid1.tenancy.oc1..t".to_string(),
            group_names: vec!["Admins".to_string(), "Finance-Readers".to_string()],
            compartments_scanned: 3,
            sections: vec![PolicySection {
                policy_name: "FinPolicy".to_string(),
                compartment_name: "Finance".to_string(),
                statements: vec![
                    "allow group Admins to manage buckets in compartment Finance".to_string(),
                    "allow group Admins to read logs in tenancy".to_string(),
                ],
            }],
            warnings: vec![ScanWarning::new(
                ScanStage::PolicyFetch,
                "ocid1.compartment.oc1..ops",
                &GatewayError::access_denied("HTTP 403"),
            )],
        }
    }

    #[test]
    fn test_text_report_sections() {
        plain();
        let text = render(&report(), OutputFormat::Text).unwrap();

        assert!(text.starts_with("=== OCI Policy Analysis for User: ocid1.user.oc1..me ==="));
        assert!(text.contains("User belongs to 2 groups: Admins, Finance-Readers"));
        assert!(text.contains("Found 2 policy statements that apply to this user:"));
        assert!(text.contains("Policy: FinPolicy\nCompartment: Finance\n----------------------------------------\n  allow group Admins to manage buckets in compartment Finance\n  allow group Admins to read logs in tenancy"));
        assert!(text.contains("Analysis complete. Total statements: 2"));
        assert!(text.contains("1 warnings during scan:"));
        assert!(text.contains("policy fetch failed for ocid1.compartment.oc1..ops"));
    }

    #[test]
    fn test_text_empty_outcomes() {
        plain();
        let mut none = report();
        none.sections.clear();
        none.warnings.clear();
        let text = render(&none, OutputFormat::Text).unwrap();
        assert!(text.ends_with("No policy statements found that apply to this user's groups."));

        let no_groups = AnalysisReport::no_groups("ocid1.user.oc1..me", "ocid1.tenancy.oc1..t", Vec::new());
        let text = render(&no_groups, OutputFormat::Text).unwrap();
        assert!(text.ends_with("No groups found for user or error occurred."));
        assert!(!text.contains("Scanned"));
    }

    #[test]
    fn test_table_rows() {
        plain();
        let table = render(&report(), OutputFormat::Table).unwrap();
        assert!(table.contains("Policy"));
        assert!(table.contains("FinPolicy"));
        assert!(table.contains("allow group Admins to read logs in tenancy"));
        assert!(table.contains("Total: 2"));
    }

    #[test]
    fn test_json_includes_outcome() {
        let json = render(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["outcome"]["kind"], "relevant");
        assert_eq!(value["outcome"]["statements"], 2);
        assert_eq!(value["total_statements"], 2);
        assert_eq!(value["sections"][0]["policy_name"], "FinPolicy");
        assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
        assert_eq!(value["warnings"][0]["kind"], "access_denied");
    }
}
