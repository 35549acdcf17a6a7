//! Action execution and report rendering

use crate::cli::Action;
use anyhow::Result;
use moodcheck_core::{report, QuestionSummary, ReportSnapshot};
use moodcheck_gateway::PersistenceGateway;
use std::io::Write;

/// Run one action against the gateway, writing user-facing output to `out`
///
/// # Errors
/// Fails only when `out` cannot be written; gateway calls never fail.
pub async fn execute<W: Write>(
    action: Action,
    gateway: &PersistenceGateway,
    out: &mut W,
) -> Result<()> {
    match action {
        Action::Profile(draft) => {
            let profile = gateway.create_profile(draft).await;
            writeln!(out, "{}", serde_json::to_string_pretty(&profile)?)?;
        }
        Action::Answer {
            user_id,
            question_id,
            score,
        } => {
            let ack = gateway.submit_response(user_id, question_id, score).await;
            writeln!(out, "{}", serde_json::to_string(&ack)?)?;
        }
        Action::Report { json, summary } => {
            let snapshot = gateway.fetch_all_responses().await;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
            } else {
                render_report(&snapshot, out)?;
            }
            if summary {
                render_summary(&report::summarize(&snapshot.data), out)?;
            }
        }
        Action::Clear => {
            gateway.clear_local_data();
            writeln!(out, "Local survey data cleared")?;
        }
    }
    Ok(())
}

/// Render the snapshot as a plain-text table
///
/// # Errors
/// Propagates write failures.
pub fn render_report<W: Write>(snapshot: &ReportSnapshot, out: &mut W) -> std::io::Result<()> {
    if snapshot.source.is_degraded() {
        writeln!(out, "Source: {} (offline mode)", snapshot.source)?;
    } else {
        writeln!(out, "Source: {}", snapshot.source)?;
    }

    if snapshot.data.is_empty() {
        return writeln!(out, "No responses recorded");
    }

    writeln!(
        out,
        "{:<26} {:<20} {:>6} {:<8} {:>8} {:>5}",
        "TIMESTAMP", "NAME", "GRADE", "GENDER", "QUESTION", "SCORE"
    )?;
    for row in &snapshot.data {
        writeln!(
            out,
            "{:<26} {:<20} {:>6} {:<8} {:>8} {:>5}",
            row.timestamp,
            format!("{} {}", row.user_avatar, row.user_name),
            row.user_grade,
            row.user_gender,
            row.question_id,
            row.score
        )?;
    }
    Ok(())
}

/// Render per-question aggregates
///
/// # Errors
/// Propagates write failures.
pub fn render_summary<W: Write>(
    summaries: &[QuestionSummary],
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Summary by question")?;
    for summary in summaries {
        let mean = summary
            .mean_score
            .map_or_else(|| "-".to_string(), |m| format!("{m:.2}"));
        writeln!(
            out,
            "  Q{:<4} n={:<4} mean={:<5} [{}]",
            summary.question_id,
            summary.responses,
            mean,
            summary
                .distribution
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_core::{DataSource, JoinedReportRow};

    fn row(name: &str, question_id: i64, score: i64) -> JoinedReportRow {
        JoinedReportRow {
            user_id: 1,
            user_name: name.to_string(),
            user_avatar: "🐱".to_string(),
            user_grade: "3".to_string(),
            user_gender: "girl".to_string(),
            question_id,
            score,
            timestamp: "2024-05-01T09:00:00Z".to_string(),
        }
    }

    fn rendered(snapshot: &ReportSnapshot) -> String {
        let mut out = Vec::new();
        render_report(snapshot, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn local_report_is_flagged_offline() {
        let text = rendered(&ReportSnapshot::local(vec![row("Mia", 1, 4)]));
        assert!(text.starts_with("Source: LOCAL (offline mode)"));
        assert!(text.contains("Mia"));
    }

    #[test]
    fn remote_report_is_not_flagged() {
        let text = rendered(&ReportSnapshot::remote(Vec::new()));
        assert_eq!(text, "Source: DB\nNo responses recorded\n");
        assert_eq!(DataSource::Remote.as_str(), "DB");
    }

    #[test]
    fn summary_lists_each_question() {
        let rows = vec![row("A", 2, 5), row("B", 1, 3), row("C", 2, 1)];
        let mut out = Vec::new();
        render_summary(&report::summarize(&rows), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let q1 = text.find("Q1 ").unwrap();
        let q2 = text.find("Q2 ").unwrap();
        assert!(q1 < q2);
        assert!(text.contains("mean=3.00"));
        assert!(text.contains("[1 0 0 0 1]"));
    }
}
