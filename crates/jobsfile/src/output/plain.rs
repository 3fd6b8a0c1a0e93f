//! Plain-text rendering of a compile plan and a reconciliation report.

use owo_colors::OwoColorize;

use jobsfile::jenkins_client::ReconcileReport;
use jobsfile::pipeline::CompiledJobSet;

/// Renders the dry-run plan: every job a jobs-file would compile to,
/// without contacting a Jenkins server.
pub fn render_plan(compiled: &CompiledJobSet) -> String {
    let mut out = format!(
        "{} {} ({} job{})\n",
        "plan:".bold(),
        compiled.group,
        compiled.jobs.len(),
        if compiled.jobs.len() == 1 { "" } else { "s" }
    );
    for (name, _) in &compiled.jobs {
        out.push_str(&format!("  {} {name}\n", "~".yellow()));
    }
    out.push_str(&format!(
        "\n{} no changes applied; pass --apply to reconcile against Jenkins",
        "note:".dimmed()
    ));
    out
}

/// Renders a completed reconciliation report.
pub fn render_report(report: &ReconcileReport) -> String {
    let mut out = String::new();
    for name in &report.created {
        out.push_str(&format!("  {} {name}\n", "+".green().bold()));
    }
    for name in &report.updated {
        out.push_str(&format!("  {} {name}\n", "~".yellow().bold()));
    }
    for name in &report.deleted {
        out.push_str(&format!("  {} {name}\n", "-".red().bold()));
    }
    if report.created.is_empty() && report.updated.is_empty() && report.deleted.is_empty() {
        out.push_str(&format!("{}\n", "no changes".dimmed()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmltree::Document;

    #[test]
    fn plan_lists_every_job() {
        let compiled = CompiledJobSet {
            group: "my-repo-master".to_string(),
            jobs: vec![
                ("my-repo-master-linux".to_string(), Document::new("project")),
                ("my-repo-master-windows".to_string(), Document::new("project")),
            ],
        };
        let rendered = render_plan(&compiled);
        assert!(rendered.contains("my-repo-master-linux"));
        assert!(rendered.contains("my-repo-master-windows"));
        assert!(rendered.contains("2 jobs"));
    }

    #[test]
    fn report_marks_created_updated_deleted_distinctly() {
        let report = ReconcileReport {
            created: vec!["new-job".to_string()],
            updated: vec!["changed-job".to_string()],
            deleted: vec!["old-job".to_string()],
        };
        let rendered = render_report(&report);
        assert!(rendered.contains("new-job"));
        assert!(rendered.contains("changed-job"));
        assert!(rendered.contains("old-job"));
    }

    #[test]
    fn empty_report_says_no_changes() {
        let rendered = render_report(&ReconcileReport::default());
        assert!(rendered.contains("no changes"));
    }
}
