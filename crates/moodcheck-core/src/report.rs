//! Report assembly
//!
//! Rebuilds the admin report from the two flat local collections when the
//! server's SQL join is unavailable:
//! - Join each response to its profile by `user_id`
//! - Substitute placeholder fields for dangling references
//! - Order rows newest first
//!
//! Also provides the per-question summary shown alongside the report.

use crate::types::{JoinedReportRow, ResponseRecord, Score, UserProfile};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

/// Naive layouts accepted after RFC 3339 fails; read as UTC
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Join responses to profiles and sort newest first
///
/// Never fails: a response whose profile is missing gets placeholder
/// display fields (see [`JoinedReportRow::project`]). When several profiles
/// share an id, the first one in `users` wins.
#[must_use]
pub fn assemble(users: &[UserProfile], responses: &[ResponseRecord]) -> Vec<JoinedReportRow> {
    let mut index: HashMap<i64, &UserProfile> = HashMap::with_capacity(users.len());
    for user in users {
        index.entry(user.id).or_insert(user);
    }

    let mut rows: Vec<JoinedReportRow> = responses
        .iter()
        .map(|record| JoinedReportRow::project(record, index.get(&record.user_id).copied()))
        .collect();

    let orphans = rows.iter().filter(|row| row.is_orphan()).count();
    if orphans > 0 {
        tracing::debug!(orphans, "Report rows reference missing profiles");
    }

    sort_newest_first(&mut rows);
    rows
}

/// Sort rows by timestamp descending
///
/// Unparseable timestamps sort after every parseable one. Relative order of
/// equal timestamps is unspecified.
pub fn sort_newest_first(rows: &mut [JoinedReportRow]) {
    rows.sort_by_cached_key(|row| Reverse(parse_timestamp(&row.timestamp)));
}

/// Parse a stored timestamp as a point in time
///
/// Accepts RFC 3339 (what local writes produce) and the SQL
/// `YYYY-MM-DD HH:MM:SS` form the server emits.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
}

/// Aggregate answers for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    /// Question id
    pub question_id: i64,
    /// Number of rows for this question
    pub responses: usize,
    /// Mean of the in-range scores, if any
    pub mean_score: Option<f64>,
    /// Count per score, index 0 is score 1
    pub distribution: [usize; 5],
}

/// Per-question summary, ordered by question id
///
/// Out-of-range scores count towards `responses` only.
#[must_use]
pub fn summarize(rows: &[JoinedReportRow]) -> Vec<QuestionSummary> {
    let mut by_question: BTreeMap<i64, (usize, [usize; 5])> = BTreeMap::new();

    for row in rows {
        let (total, distribution) = by_question.entry(row.question_id).or_default();
        *total += 1;
        if let Ok(score) = Score::new(row.score) {
            distribution[usize::from(score.value() - Score::MIN)] += 1;
        }
    }

    by_question
        .into_iter()
        .map(|(question_id, (responses, distribution))| {
            let counted: usize = distribution.iter().sum();
            let weighted: usize = distribution
                .iter()
                .enumerate()
                .map(|(i, n)| (i + 1) * n)
                .sum();
            #[allow(clippy::cast_precision_loss)]
            let mean_score = (counted > 0).then(|| weighted as f64 / counted as f64);
            QuestionSummary {
                question_id,
                responses,
                mean_score,
                distribution,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UNKNOWN_USER_ID, UNKNOWN_USER_NAME};
    use pretty_assertions::assert_eq;

    fn user(id: i64, name: &str) -> UserProfile {
        UserProfile {
            id,
            name: name.to_string(),
            avatar: "🐶".to_string(),
            grade: "2".to_string(),
            gender: "boy".to_string(),
        }
    }

    fn record(id: i64, user_id: i64, question_id: i64, score: i64, timestamp: &str) -> ResponseRecord {
        ResponseRecord {
            id,
            user_id,
            question_id,
            score,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn join_uses_profile_fields() {
        let users = vec![user(1, "A")];
        let responses = vec![record(10, 1, 5, 3, "2024-05-01T09:00:00Z")];

        let rows = assemble(&users, &responses);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 1);
        assert_eq!(rows[0].user_name, "A");
        assert_eq!(rows[0].user_avatar, "🐶");
        assert_eq!(rows[0].question_id, 5);
        assert_eq!(rows[0].score, 3);
    }

    #[test]
    fn join_tolerates_dangling_reference() {
        let users = vec![user(1, "A")];
        let responses = vec![record(10, 999, 5, 3, "2024-05-01T09:00:00Z")];

        let rows = assemble(&users, &responses);

        assert_eq!(rows[0].user_id, UNKNOWN_USER_ID);
        assert_eq!(rows[0].user_name, UNKNOWN_USER_NAME);
        assert_eq!(rows[0].question_id, 5);
    }

    #[test]
    fn first_duplicate_profile_wins() {
        let users = vec![user(1, "First"), user(1, "Second")];
        let responses = vec![record(10, 1, 1, 4, "2024-05-01T09:00:00Z")];

        assert_eq!(assemble(&users, &responses)[0].user_name, "First");
    }

    #[test]
    fn rows_sorted_newest_first() {
        let users = vec![user(1, "A")];
        let responses = vec![
            record(1, 1, 1, 3, "2024-05-01T09:00:00Z"),
            record(2, 1, 2, 4, "2024-05-03T09:00:00Z"),
            record(3, 1, 3, 5, "2024-05-02T09:00:00Z"),
        ];

        let order: Vec<i64> = assemble(&users, &responses)
            .iter()
            .map(|r| r.question_id)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn sort_compares_instants_not_strings() {
        let users = vec![user(1, "A")];
        // 09:30+02:00 is 07:30Z, earlier than 08:00Z despite sorting later as text
        let responses = vec![
            record(1, 1, 1, 3, "2024-05-01T09:30:00+02:00"),
            record(2, 1, 2, 3, "2024-05-01T08:00:00Z"),
        ];

        let rows = assemble(&users, &responses);
        assert_eq!(rows[0].question_id, 2);
    }

    #[test]
    fn unparseable_timestamps_sort_last() {
        let users = vec![user(1, "A")];
        let responses = vec![
            record(1, 1, 1, 3, "not a time"),
            record(2, 1, 2, 3, "2020-01-01 00:00:00"),
        ];

        let rows = assemble(&users, &responses);
        assert_eq!(rows[0].question_id, 2);
        assert_eq!(rows[1].question_id, 1);
    }

    #[test]
    fn parse_accepted_layouts() {
        let expected = parse_timestamp("2024-05-01T09:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2024-05-01 09:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T09:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T09:00:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn empty_inputs() {
        assert!(assemble(&[], &[]).is_empty());
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn summary_per_question() {
        let users = vec![user(1, "A"), user(2, "B")];
        let responses = vec![
            record(1, 1, 1, 5, "2024-05-01T09:00:00Z"),
            record(2, 2, 1, 3, "2024-05-01T09:01:00Z"),
            record(3, 1, 2, 1, "2024-05-01T09:02:00Z"),
            record(4, 2, 2, 42, "2024-05-01T09:03:00Z"),
        ];

        let summary = summarize(&assemble(&users, &responses));

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].question_id, 1);
        assert_eq!(summary[0].responses, 2);
        assert_eq!(summary[0].mean_score, Some(4.0));
        assert_eq!(summary[0].distribution, [0, 0, 1, 0, 1]);

        assert_eq!(summary[1].responses, 2);
        assert_eq!(summary[1].mean_score, Some(1.0));
        assert_eq!(summary[1].distribution, [1, 0, 0, 0, 0]);
    }
}
