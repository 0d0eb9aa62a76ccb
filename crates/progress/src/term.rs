//! Term lifecycle - which goals and actions belong to a planning period.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tenweek_core::{Action, Contribution, CoreError, Goal, Term, TermId, TermStatus};

use crate::aggregation::{aggregate_all_goals, get_progress_summary, GoalProgress, ProgressSummary};
use crate::matching::infer_matches;

/// A goal longer than this multiple of the term length gets a warning.
const LONG_GOAL_FACTOR: f64 = 1.5;

/// The term active on `date`, if any.
pub fn active_term(terms: &[Term], date: NaiveDate) -> Option<&Term> {
    terms.iter().find(|t| t.is_active(date))
}

/// Terms with the given status on `date`.
pub fn terms_by_status(terms: &[Term], status: TermStatus, date: NaiveDate) -> Vec<&Term> {
    terms.iter().filter(|t| t.status(date) == status).collect()
}

/// Goals explicitly committed to the term.
pub fn committed_goals<'a>(term: &Term, goals: &'a [Goal]) -> Vec<&'a Goal> {
    goals.iter().filter(|g| term.is_committed(g.id)).collect()
}

/// Time-bound goals whose window overlaps the term but were not committed.
pub fn overlapping_goals<'a>(term: &Term, goals: &'a [Goal]) -> Vec<&'a Goal> {
    goals
        .iter()
        .filter(|g| !term.is_committed(g.id))
        .filter(|g| match (g.start_date, g.end_date) {
            (Some(start), Some(end)) => term.overlaps(start, end),
            _ => false,
        })
        .collect()
}

/// Goals not committed to any term.
pub fn unassigned_goals<'a>(goals: &'a [Goal], terms: &[Term]) -> Vec<&'a Goal> {
    goals
        .iter()
        .filter(|g| !terms.iter().any(|t| t.is_committed(g.id)))
        .collect()
}

/// Check that committing `goal` to `term` makes sense.
///
/// A time-bound goal whose window misses the term is an error. One much
/// longer than the term is allowed, with a warning. Goals without a full
/// window always pass.
pub fn validate_goal_term_assignment(
    goal: &Goal,
    term: &Term,
) -> tenweek_core::Result<Option<String>> {
    let (Some(start), Some(end)) = (goal.start_date, goal.end_date) else {
        return Ok(None);
    };

    if !term.overlaps(start, end) {
        return Err(CoreError::Validation(format!(
            "goal dates ({start} to {end}) don't overlap term {} ({} to {})",
            term.number, term.start_date, term.end_date
        )));
    }

    let goal_days = (end - start).num_days();
    let term_days = term.length_days();
    if goal_days as f64 > term_days as f64 * LONG_GOAL_FACTOR {
        return Ok(Some(format!(
            "goal runs {goal_days} days, well past the {term_days}-day term; \
             consider splitting it or committing it to several terms"
        )));
    }
    Ok(None)
}

/// Actions that happened during the term.
pub fn actions_in_term<'a>(term: &Term, actions: &'a [Action]) -> Vec<&'a Action> {
    actions
        .iter()
        .filter(|a| term.is_active(a.occurred_at().date_naive()))
        .collect()
}

/// Progress of a term's committed goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermProgress {
    /// The term
    pub term_id: TermId,
    /// Term number
    pub number: u32,
    /// Status on the reporting date
    pub status: TermStatus,
    /// Progress per committed goal
    pub goals: Vec<GoalProgress>,
    /// Rollup over `goals`
    pub summary: ProgressSummary,
    /// Days since the term started
    pub days_elapsed: i64,
    /// Days until the term ends
    pub days_remaining: i64,
    /// Share of the term already elapsed (0..=1)
    pub elapsed_fraction: f64,
}

/// Progress of the goals committed to `term`.
///
/// Inferred matches only come from actions inside the term. Explicit links
/// to committed goals count wherever their action falls.
pub fn term_progress(
    term: &Term,
    goals: &[Goal],
    actions: &[Action],
    contributions: &[Contribution],
    require_period_match: bool,
    as_of: NaiveDate,
) -> TermProgress {
    let committed: Vec<Goal> = committed_goals(term, goals).into_iter().cloned().collect();
    let in_term: HashSet<_> = actions_in_term(term, actions).iter().map(|a| a.id).collect();

    let mut matches = infer_matches(actions, &committed, contributions, require_period_match);
    matches.retain(|m| m.is_explicit() || in_term.contains(&m.action_id));

    let progress = aggregate_all_goals(&committed, &matches);
    let summary = get_progress_summary(&progress);

    TermProgress {
        term_id: term.id,
        number: term.number,
        status: term.status(as_of),
        goals: progress,
        summary,
        days_elapsed: term.days_elapsed(as_of),
        days_remaining: term.days_remaining(as_of),
        elapsed_fraction: term.elapsed_fraction(as_of),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn action_on(title: &str, y: i32, m: u32, d: u32) -> Action {
        Action::new(title).logged_at(Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap())
    }

    fn spring_term(goals: &[&Goal]) -> Term {
        let mut term = Term::new(1, date(2025, 4, 12), None).unwrap();
        term.goal_ids = goals.iter().map(|g| g.id).collect();
        term
    }

    #[test]
    fn test_active_term() {
        let spring = Term::new(1, date(2025, 4, 12), None).unwrap();
        let summer = Term::new(2, date(2025, 6, 22), None).unwrap();
        let terms = vec![spring.clone(), summer.clone()];

        assert_eq!(active_term(&terms, date(2025, 5, 1)).map(|t| t.id), Some(spring.id));
        assert_eq!(active_term(&terms, date(2025, 7, 1)).map(|t| t.id), Some(summer.id));
        assert!(active_term(&terms, date(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_terms_by_status() {
        let spring = Term::new(1, date(2025, 4, 12), None).unwrap();
        let summer = Term::new(2, date(2025, 6, 22), None).unwrap();
        let terms = vec![spring.clone(), summer.clone()];
        let today = date(2025, 7, 1);

        let done: Vec<_> = terms_by_status(&terms, TermStatus::Complete, today)
            .iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(done, vec![1]);
        assert!(terms_by_status(&terms, TermStatus::Upcoming, today).is_empty());
    }

    #[test]
    fn test_committed_and_overlapping() {
        let committed = Goal::new("Run").with_target(120.0, "km");
        let overlapping = Goal::new("Read")
            .with_target(10.0, "books")
            .with_window(Some(date(2025, 1, 1)), Some(date(2025, 4, 30)));
        let later = Goal::new("Swim")
            .with_target(20.0, "km")
            .with_window(Some(date(2025, 9, 1)), Some(date(2025, 10, 1)));
        let loose = Goal::new("Loose");
        let goals = vec![committed.clone(), overlapping.clone(), later, loose];
        let term = spring_term(&[&committed]);

        let c: Vec<_> = committed_goals(&term, &goals).iter().map(|g| g.id).collect();
        assert_eq!(c, vec![committed.id]);

        let o: Vec<_> = overlapping_goals(&term, &goals).iter().map(|g| g.id).collect();
        assert_eq!(o, vec![overlapping.id]);
    }

    #[test]
    fn test_unassigned_goals() {
        let run = Goal::new("Run");
        let read = Goal::new("Read");
        let swim = Goal::new("Swim");
        let goals = vec![run.clone(), read.clone(), swim.clone()];

        let mut summer = Term::new(2, date(2025, 6, 22), None).unwrap();
        summer.goal_ids.push(swim.id);
        let terms = vec![spring_term(&[&run]), summer];

        let ids: Vec<_> = unassigned_goals(&goals, &terms).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![read.id]);
        assert_eq!(unassigned_goals(&goals, &[]).len(), 3);
    }

    #[test]
    fn test_validate_goal_term_assignment() {
        let term = spring_term(&[]);

        let loose = Goal::new("Loose");
        assert_eq!(validate_goal_term_assignment(&loose, &term).unwrap(), None);

        let fits = Goal::new("Spring")
            .with_window(Some(date(2025, 4, 1)), Some(date(2025, 6, 1)));
        assert_eq!(validate_goal_term_assignment(&fits, &term).unwrap(), None);

        let elsewhere = Goal::new("Autumn")
            .with_window(Some(date(2025, 9, 1)), Some(date(2025, 11, 1)));
        assert!(matches!(
            validate_goal_term_assignment(&elsewhere, &term),
            Err(CoreError::Validation(_))
        ));

        let year = Goal::new("Year")
            .with_window(Some(date(2025, 1, 1)), Some(date(2025, 12, 31)));
        let warning = validate_goal_term_assignment(&year, &term).unwrap();
        assert!(warning.unwrap().contains("70-day term"));
    }

    #[test]
    fn test_term_progress_counts_only_term_actions() {
        let goal = Goal::new("Run").with_target(100.0, "km");
        let other = Goal::new("Uncommitted").with_target(100.0, "km");
        let term = spring_term(&[&goal]);
        let actions = vec![
            action_on("Run", 2025, 4, 20).with_measurement("km", 10.0),
            action_on("Run", 2025, 3, 1).with_measurement("km", 50.0),
        ];

        let tp = term_progress(
            &term,
            &[goal.clone(), other],
            &actions,
            &[],
            true,
            date(2025, 5, 17),
        );
        assert_eq!(tp.number, 1);
        assert_eq!(tp.status, TermStatus::Active);
        assert_eq!(tp.goals.len(), 1);
        assert_eq!(tp.goals[0].goal_id, goal.id);
        assert_eq!(tp.goals[0].total_progress, 10.0);
        assert_eq!(tp.summary.total_goals, 1);
        assert_eq!(tp.days_elapsed, 35);
        assert_eq!(tp.days_remaining, 35);
        assert_eq!(tp.elapsed_fraction, 0.5);
    }

    #[test]
    fn test_term_progress_keeps_explicit_links_outside_term() {
        let goal = Goal::new("Run").with_target(100.0, "km");
        let term = spring_term(&[&goal]);
        let warmup = action_on("Run", 2025, 4, 10).with_measurement("km", 8.0);
        let unlinked = action_on("Run", 2025, 4, 11).with_measurement("km", 50.0);
        let link = Contribution::manual(warmup.id, goal.id, None);

        let tp = term_progress(
            &term,
            std::slice::from_ref(&goal),
            &[warmup, unlinked],
            &[link],
            true,
            date(2025, 4, 1),
        );
        assert_eq!(tp.goals[0].total_progress, 8.0);
        assert_eq!(tp.goals[0].matching_actions_count, 1);
        assert_eq!(tp.status, TermStatus::Upcoming);
        assert_eq!(tp.days_elapsed, 0);
    }
}
