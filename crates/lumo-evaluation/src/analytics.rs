// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-level analytics, recomputed from full history.
//!
//! Every function here is pure over the report and score rows of one user,
//! so the rollup is always consistent with what is stored.

use std::collections::BTreeMap;

use lumo_core::{CompetencyScore, FeedbackReport, PerformanceLevel, UserAnalytics};
use serde::Serialize;

use crate::scoring::{parse_timestamp, performance_level};

/// Number of reports shown in the progress trend.
pub const PROGRESS_WINDOW: usize = 10;

/// Number of points kept per competency evolution series.
pub const EVOLUTION_WINDOW: usize = 10;

/// Mean score at or above which a competency counts as a strength.
pub const STRENGTH_THRESHOLD: f64 = 7.0;

/// Mean score below which a competency counts as an improvement area.
pub const IMPROVEMENT_THRESHOLD: f64 = 6.0;

const TREND_MARGIN: f64 = 0.5;

/// Aggregate statistics for one competency across a user's sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyStat {
    pub competency_name: String,
    pub average_score: f64,
    pub max_score: i64,
    pub min_score: i64,
    pub evaluations: usize,
}

/// Direction of a user's recent scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    Insufficient,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::Insufficient => "insufficient",
        }
    }
}

/// One point of the progress chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub session_id: String,
    pub score: f64,
    /// `dd/mm` of the report's generation date.
    pub date: String,
    pub performance_level: PerformanceLevel,
}

/// One point of a competency's score history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionPoint {
    pub session_id: String,
    pub score: i64,
    pub date: String,
}

/// The progress view returned alongside the stored rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProgress {
    pub analytics: UserAnalytics,
    pub total_time_hours: f64,
    /// Newest first.
    pub progress_trend: Vec<ProgressPoint>,
    pub competency_strengths: Vec<CompetencyStat>,
    pub improvement_areas: Vec<CompetencyStat>,
    pub trend: Trend,
    pub summary: String,
}

/// Per-competency breakdown and evolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyAnalysis {
    pub competencies: Vec<CompetencyStat>,
    pub evolution: BTreeMap<String, Vec<EvolutionPoint>>,
    pub total_evaluations: usize,
}

/// Rebuilds the rollup for `user_id` from every report and score row.
pub fn compute_user_analytics(
    user_id: &str,
    reports: &[FeedbackReport],
    scores: &[CompetencyScore],
    now: &str,
) -> UserAnalytics {
    let total = reports.len();
    let average_overall_score = if total == 0 {
        0.0
    } else {
        reports.iter().map(|r| r.average_score).sum::<f64>() / total as f64
    };

    let time_scores: Vec<f64> = reports
        .iter()
        .filter_map(|r| r.time_management_score)
        .collect();
    let time_score_sum: f64 = time_scores.iter().sum();
    let average_time_management_score =
        (!time_scores.is_empty()).then(|| time_score_sum / time_scores.len() as f64);

    let (strongest_competency, weakest_competency) = strongest_and_weakest(scores);

    UserAnalytics {
        user_id: user_id.to_string(),
        total_sessions_evaluated: total as i64,
        average_overall_score,
        total_questions_answered: reports.iter().map(|r| r.questions_analyzed).sum(),
        total_session_time_minutes: reports.iter().map(|r| r.session_duration_minutes).sum(),
        time_scored_sessions: time_scores.len() as i64,
        time_score_sum,
        average_time_management_score,
        strongest_competency,
        weakest_competency,
        last_updated: now.to_string(),
    }
}

/// Per-competency statistics, ordered by mean descending, then name.
pub fn competency_stats(scores: &[CompetencyScore]) -> Vec<CompetencyStat> {
    let mut grouped: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for score in scores {
        grouped
            .entry(score.competency_name.as_str())
            .or_default()
            .push(score.score);
    }

    let mut stats: Vec<CompetencyStat> = grouped
        .into_iter()
        .map(|(name, values)| CompetencyStat {
            competency_name: name.to_string(),
            average_score: values.iter().sum::<i64>() as f64 / values.len() as f64,
            max_score: values.iter().copied().max().unwrap_or_default(),
            min_score: values.iter().copied().min().unwrap_or_default(),
            evaluations: values.len(),
        })
        .collect();

    stats.sort_by(|a, b| {
        b.average_score
            .total_cmp(&a.average_score)
            .then_with(|| a.competency_name.cmp(&b.competency_name))
    });
    stats
}

/// Highest and lowest mean competency. Ties go to the alphabetically first name.
pub fn strongest_and_weakest(scores: &[CompetencyScore]) -> (Option<String>, Option<String>) {
    let stats = competency_stats(scores);
    let strongest = stats.first().map(|s| s.competency_name.clone());
    let weakest = stats
        .iter()
        .min_by(|a, b| {
            a.average_score
                .total_cmp(&b.average_score)
                .then_with(|| a.competency_name.cmp(&b.competency_name))
        })
        .map(|s| s.competency_name.clone());
    (strongest, weakest)
}

/// Compares the mean of the two newest reports with the mean of the older
/// ones in the progress window. Fewer than three reports is `Insufficient`.
///
/// `newest_first` must be ordered newest first.
pub fn trend(newest_first: &[f64]) -> Trend {
    if newest_first.len() < 3 {
        return Trend::Insufficient;
    }
    let (recent, older) = newest_first.split_at(2);
    let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;
    let older_avg = older.iter().sum::<f64>() / older.len() as f64;

    if recent_avg > older_avg + TREND_MARGIN {
        Trend::Improving
    } else if recent_avg < older_avg - TREND_MARGIN {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Builds the progress view. `reports` are oldest first, as stored.
pub fn user_progress(
    analytics: UserAnalytics,
    reports: &[FeedbackReport],
    scores: &[CompetencyScore],
) -> UserProgress {
    let progress_trend: Vec<ProgressPoint> = reports
        .iter()
        .rev()
        .take(PROGRESS_WINDOW)
        .map(|r| ProgressPoint {
            session_id: r.session_id.clone(),
            score: r.average_score,
            date: short_date(&r.generated_at),
            performance_level: r.performance_level,
        })
        .collect();

    let recent: Vec<f64> = progress_trend.iter().map(|p| p.score).collect();
    let trend = trend(&recent);

    let stats = competency_stats(scores);
    let competency_strengths: Vec<CompetencyStat> = stats
        .iter()
        .filter(|s| s.average_score >= STRENGTH_THRESHOLD)
        .cloned()
        .collect();
    let improvement_areas: Vec<CompetencyStat> = stats
        .into_iter()
        .filter(|s| s.average_score < IMPROVEMENT_THRESHOLD)
        .collect();

    let summary = narrative_summary(&analytics, trend);
    let total_time_hours =
        (analytics.total_session_time_minutes as f64 / 60.0 * 10.0).round() / 10.0;

    UserProgress {
        analytics,
        total_time_hours,
        progress_trend,
        competency_strengths,
        improvement_areas,
        trend,
        summary,
    }
}

/// One-paragraph plain-language summary of a user's rollup.
pub fn narrative_summary(analytics: &UserAnalytics, trend: Trend) -> String {
    if analytics.total_sessions_evaluated == 0 {
        return "No evaluated interviews yet. Complete a session to receive your first evaluation."
            .to_string();
    }

    let level = performance_level(analytics.average_overall_score);
    let sessions = match analytics.total_sessions_evaluated {
        1 => "1 evaluated interview".to_string(),
        n => format!("{n} evaluated interviews"),
    };
    let mut summary = format!(
        "You have completed {sessions} with an average score of {:.1}/10 ({level}).",
        analytics.average_overall_score
    );

    match (&analytics.strongest_competency, &analytics.weakest_competency) {
        (Some(strong), Some(weak)) if strong != weak => summary.push_str(&format!(
            " Your strongest competency is {strong}; focus next on {weak}."
        )),
        (Some(strong), _) => summary.push_str(&format!(" Your strongest competency is {strong}.")),
        _ => {}
    }

    if let Some(time) = analytics.average_time_management_score {
        summary.push_str(&format!(" Your average time-management score is {time:.1}/10."));
    }

    summary.push_str(match trend {
        Trend::Improving => " Your recent results are improving.",
        Trend::Declining => " Your recent results have dipped; review your latest feedback.",
        Trend::Stable => " Your recent results are steady.",
        Trend::Insufficient => " Complete more interviews to see a trend.",
    });
    summary
}

/// Per-competency statistics plus chronological score series.
///
/// `scores` are oldest first, as stored.
pub fn competency_analysis(scores: &[CompetencyScore]) -> CompetencyAnalysis {
    let competencies = competency_stats(scores);
    let mut evolution: BTreeMap<String, Vec<EvolutionPoint>> = BTreeMap::new();
    for score in scores {
        let series = evolution.entry(score.competency_name.clone()).or_default();
        if series.len() < EVOLUTION_WINDOW {
            series.push(EvolutionPoint {
                session_id: score.session_id.clone(),
                score: score.score,
                date: short_date(&score.created_at),
            });
        }
    }
    CompetencyAnalysis {
        competencies,
        evolution,
        total_evaluations: scores.len(),
    }
}

fn short_date(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|dt| dt.format("%d/%m").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(
        session_id: &str,
        average: f64,
        time: Option<f64>,
        generated_at: &str,
    ) -> FeedbackReport {
        FeedbackReport {
            id: format!("r-{session_id}"),
            session_id: session_id.into(),
            overall_feedback: "ok".into(),
            average_score: average,
            performance_level: performance_level(average),
            questions_analyzed: 7,
            session_duration_minutes: 15,
            time_management_score: time,
            feedback_time: None,
            time_evaluation_enabled: time.is_some(),
            generated_at: generated_at.into(),
        }
    }

    fn score(session_id: &str, name: &str, value: i64) -> CompetencyScore {
        CompetencyScore {
            id: format!("{session_id}-{name}"),
            session_id: session_id.into(),
            competency_name: name.into(),
            score: value,
            feedback: String::new(),
            example: String::new(),
            improvement_area: String::new(),
            created_at: "2026-03-02T09:00:00.000Z".into(),
        }
    }

    #[test]
    fn rollup_totals_and_time_aggregates() {
        let reports = [
            report("a", 6.0, Some(10.0), "2026-03-01T10:00:00.000Z"),
            report("b", 8.0, None, "2026-03-02T10:00:00.000Z"),
            report("c", 7.0, Some(5.0), "2026-03-03T10:00:00.000Z"),
        ];
        let analytics = compute_user_analytics("u", &reports, &[], "now");
        assert_eq!(analytics.total_sessions_evaluated, 3);
        assert!((analytics.average_overall_score - 7.0).abs() < 1e-9);
        assert_eq!(analytics.total_questions_answered, 21);
        assert_eq!(analytics.total_session_time_minutes, 45);
        assert_eq!(analytics.time_scored_sessions, 2);
        assert_eq!(analytics.time_score_sum, 15.0);
        assert_eq!(analytics.average_time_management_score, Some(7.5));
        assert_eq!(analytics.strongest_competency, None);
    }

    #[test]
    fn empty_history_is_zeroed() {
        let analytics = compute_user_analytics("u", &[], &[], "now");
        assert_eq!(analytics.total_sessions_evaluated, 0);
        assert_eq!(analytics.average_overall_score, 0.0);
        assert_eq!(analytics.average_time_management_score, None);
    }

    #[test]
    fn strongest_and_weakest_by_mean() {
        let scores = [
            score("a", "Communication", 9),
            score("b", "Communication", 7),
            score("a", "Teamwork", 4),
            score("b", "Teamwork", 6),
            score("a", "Adaptability", 6),
        ];
        let (strong, weak) = strongest_and_weakest(&scores);
        assert_eq!(strong.as_deref(), Some("Communication"));
        assert_eq!(weak.as_deref(), Some("Teamwork"));
    }

    #[test]
    fn ties_break_alphabetically() {
        let scores = [
            score("a", "Teamwork", 8),
            score("a", "Adaptability", 8),
            score("a", "Communication", 3),
            score("a", "Critical thinking", 3),
        ];
        let (strong, weak) = strongest_and_weakest(&scores);
        assert_eq!(strong.as_deref(), Some("Adaptability"));
        assert_eq!(weak.as_deref(), Some("Communication"));
    }

    #[test]
    fn stats_order_by_mean_then_name() {
        let scores = [
            score("a", "Teamwork", 5),
            score("a", "Adaptability", 5),
            score("a", "Communication", 9),
        ];
        let names: Vec<_> = competency_stats(&scores)
            .into_iter()
            .map(|s| s.competency_name)
            .collect();
        assert_eq!(names, ["Communication", "Adaptability", "Teamwork"]);
    }

    #[test]
    fn trend_labels() {
        assert_eq!(trend(&[]), Trend::Insufficient);
        assert_eq!(trend(&[9.0, 5.0]), Trend::Insufficient);
        assert_eq!(trend(&[8.0, 8.0, 6.0, 6.0]), Trend::Improving);
        assert_eq!(trend(&[5.0, 5.0, 7.0]), Trend::Declining);
        assert_eq!(trend(&[7.0, 7.4, 7.0]), Trend::Stable);
        assert_eq!(trend(&[7.5, 7.5, 7.0]), Trend::Stable);
    }

    #[test]
    fn progress_is_newest_first_and_filters_competencies() {
        let reports = [
            report("a", 5.0, None, "2026-03-01T10:00:00.000Z"),
            report("b", 8.0, None, "2026-03-02T10:00:00.000Z"),
            report("c", 9.0, None, "2026-03-05T10:00:00.000Z"),
        ];
        let scores = [
            score("a", "Communication", 8),
            score("a", "Teamwork", 4),
            score("a", "Adaptability", 6),
        ];
        let analytics = compute_user_analytics("u", &reports, &scores, "now");
        let progress = user_progress(analytics, &reports, &scores);

        assert_eq!(progress.progress_trend[0].session_id, "c");
        assert_eq!(progress.progress_trend[0].date, "05/03");
        assert_eq!(progress.trend, Trend::Improving);
        assert_eq!(progress.competency_strengths.len(), 1);
        assert_eq!(progress.competency_strengths[0].competency_name, "Communication");
        assert_eq!(progress.improvement_areas.len(), 1);
        assert_eq!(progress.improvement_areas[0].competency_name, "Teamwork");
        assert_eq!(progress.total_time_hours, 0.8);
    }

    #[test]
    fn progress_window_is_bounded() {
        let reports: Vec<_> = (0..15)
            .map(|i| report(&format!("s{i}"), 7.0, None, "2026-03-01T10:00:00.000Z"))
            .collect();
        let analytics = compute_user_analytics("u", &reports, &[], "now");
        let progress = user_progress(analytics, &reports, &[]);
        assert_eq!(progress.progress_trend.len(), PROGRESS_WINDOW);
        assert_eq!(progress.progress_trend[0].session_id, "s14");
    }

    #[test]
    fn summary_mentions_key_facts() {
        let reports = [report("a", 8.2, Some(9.0), "2026-03-01T10:00:00.000Z")];
        let scores = [score("a", "Communication", 9), score("a", "Teamwork", 5)];
        let analytics = compute_user_analytics("u", &reports, &scores, "now");
        let summary = narrative_summary(&analytics, Trend::Insufficient);
        assert!(summary.contains("1 evaluated interview "), "{summary}");
        assert!(summary.contains("8.2/10 (Excellent)"), "{summary}");
        assert!(summary.contains("Communication"), "{summary}");
        assert!(summary.contains("Teamwork"), "{summary}");
        assert!(summary.contains("9.0/10"), "{summary}");
    }

    #[test]
    fn summary_without_history() {
        let analytics = compute_user_analytics("u", &[], &[], "now");
        assert!(narrative_summary(&analytics, Trend::Insufficient).starts_with("No evaluated"));
    }

    #[test]
    fn evolution_keeps_first_points_in_order() {
        let scores: Vec<_> = (0..12)
            .map(|i| score(&format!("s{i}"), "Teamwork", (i % 10) + 1))
            .collect();
        let analysis = competency_analysis(&scores);
        let series = &analysis.evolution["Teamwork"];
        assert_eq!(series.len(), EVOLUTION_WINDOW);
        assert_eq!(series[0].score, 1);
        assert_eq!(series[9].score, 10);
        assert_eq!(analysis.total_evaluations, 12);
        assert_eq!(analysis.competencies[0].max_score, 10);
        assert_eq!(analysis.competencies[0].min_score, 1);
    }
}
