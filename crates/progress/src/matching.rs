//! Action-to-goal matching.
//!
//! Decides which actions count toward which goals. Pure functions: no
//! storage, no logging, no failure modes.

use std::collections::HashMap;

use tenweek_core::{Action, ActionId, Contribution, Goal, GoalId, Match, MatchMethod};

pub use tenweek_core::normalize_unit;

/// Confidence of an inferred match on an exact unit.
pub const INFERRED_CONFIDENCE: f32 = 0.9;

/// Confidence of an inferred match where the goal unit is only one word of
/// the measurement key, e.g. `distance_km` for a `km` goal.
///
/// Such matches are suggestions; they count toward progress once confirmed.
pub const FUZZY_CONFIDENCE: f32 = 0.6;

/// Confidence of a match the user made or accepted.
pub const EXPLICIT_CONFIDENCE: f32 = 1.0;

/// Matches below this confidence need review by default.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// A measurement an action offers toward a goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitMatch<'a> {
    /// Measurement key on the action
    pub key: &'a str,
    /// Amount recorded under that key
    pub amount: f64,
    /// Whether the key named the goal unit exactly
    pub exact: bool,
}

/// Whether the action happened inside the goal's window.
pub fn matches_on_period(action: &Action, goal: &Goal) -> bool {
    goal.contains_date(action.occurred_at().date_naive())
}

/// Find the action's measurement for the goal's unit.
///
/// An exact key wins; otherwise the first key that has the goal unit as
/// whole `_`-separated words. Malformed amounts are never offered.
pub fn matches_on_unit<'a>(action: &'a Action, goal: &Goal) -> Option<UnitMatch<'a>> {
    let goal_unit = normalize_unit(goal.measurement_unit.as_deref()?);
    if goal_unit.is_empty() {
        return None;
    }

    let mut fuzzy = None;
    for (key, amount) in action.valid_measurements() {
        let normalized = normalize_unit(key);
        if normalized == goal_unit {
            return Some(UnitMatch { key, amount, exact: true });
        }
        if fuzzy.is_none() && names_unit(&normalized, &goal_unit) {
            fuzzy = Some(UnitMatch { key, amount, exact: false });
        }
    }
    fuzzy
}

/// Unit match narrowed by the goal's actionability hints.
///
/// With usable hints the action needs a measurement in one of the hinted
/// units and a hinted keyword in its title. Without them this is
/// [`matches_on_unit`].
pub fn matches_with_actionability<'a>(action: &'a Action, goal: &Goal) -> Option<UnitMatch<'a>> {
    let Some(hints) = goal.actionability.as_ref().filter(|h| h.is_usable()) else {
        return matches_on_unit(action, goal);
    };

    let (key, amount) = action.valid_measurements().find(|(key, _)| hints.accepts_unit(key))?;
    if !hints.mentions_keyword(&action.title) {
        return None;
    }
    Some(UnitMatch { key, amount, exact: true })
}

/// Whether `key` has `unit` as one or more whole words, e.g. `bike_km` and `km`.
fn names_unit(key: &str, unit: &str) -> bool {
    key.split('_')
        .collect::<Vec<_>>()
        .windows(unit.split('_').count())
        .any(|words| words.join("_") == unit)
}

/// Whether an inferred amount recorded in `unit` counts toward the goal's
/// target: the goal unit itself, or a unit its hints accept.
///
/// Explicit matches always count; see [`aggregate_goal_progress`].
///
/// [`aggregate_goal_progress`]: crate::aggregation::aggregate_goal_progress
pub fn credits_goal(unit: &str, goal: &Goal) -> bool {
    let Some(goal_unit) = goal.measurement_unit.as_deref().map(normalize_unit) else {
        return false;
    };
    let unit = normalize_unit(unit);
    if unit == goal_unit {
        return true;
    }
    goal.actionability
        .as_ref()
        .is_some_and(|h| h.is_usable() && h.accepts_unit(&unit))
}

/// Infer every action-goal match.
///
/// For each action and goal, the first applicable rule wins:
/// 1. an explicit contribution naming the pair is used as recorded,
///    regardless of unit or date;
/// 2. for goals with a unit, a measurement in that unit matches when
///    `require_period_match` is false or the action is inside the window;
/// 3. otherwise no match.
///
/// Goals without a unit only receive explicit matches.
pub fn infer_matches(
    actions: &[Action],
    goals: &[Goal],
    contributions: &[Contribution],
    require_period_match: bool,
) -> Vec<Match> {
    let mut explicit: HashMap<(ActionId, GoalId), &Contribution> = HashMap::new();
    for c in contributions {
        explicit.entry((c.action_id, c.goal_id)).or_insert(c);
    }

    let mut matches = Vec::new();
    for action in actions {
        for goal in goals {
            if let Some(c) = explicit.get(&(action.id, goal.id)) {
                matches.push(explicit_match(action, goal, c.amount, c.method));
                continue;
            }

            if goal.measurement_unit.is_none() {
                continue;
            }
            if require_period_match && !matches_on_period(action, goal) {
                continue;
            }
            let Some(found) = matches_with_actionability(action, goal) else {
                continue;
            };

            matches.push(Match {
                action_id: action.id,
                goal_id: goal.id,
                unit: Some(found.key.to_string()),
                amount: found.amount,
                method: MatchMethod::AutoInferred,
                confidence: if found.exact { INFERRED_CONFIDENCE } else { FUZZY_CONFIDENCE },
            });
        }
    }
    matches
}

/// Split matches into those at or above `threshold` and those needing review.
pub fn filter_ambiguous(matches: Vec<Match>, threshold: f32) -> (Vec<Match>, Vec<Match>) {
    matches.into_iter().partition(|m| m.confidence >= threshold)
}

/// A match the user made by hand.
///
/// Without an `amount`, the action's measurement in the goal's unit is used,
/// else 0.
pub fn create_manual_match(action: &Action, goal: &Goal, amount: Option<f64>) -> Match {
    explicit_match(action, goal, amount, MatchMethod::Manual)
}

/// Accept an inferred match.
pub fn confirm_match(m: &Match) -> Match {
    let method = match m.method {
        MatchMethod::Manual => MatchMethod::Manual,
        MatchMethod::AutoInferred | MatchMethod::UserConfirmed => MatchMethod::UserConfirmed,
    };
    Match {
        method,
        confidence: EXPLICIT_CONFIDENCE,
        ..m.clone()
    }
}

fn explicit_match(action: &Action, goal: &Goal, amount: Option<f64>, method: MatchMethod) -> Match {
    let amount = amount
        .filter(|a| a.is_finite() && *a >= 0.0)
        .or_else(|| matches_on_unit(action, goal).map(|u| u.amount))
        .unwrap_or(0.0);

    Match {
        action_id: action.id,
        goal_id: goal.id,
        unit: goal.measurement_unit.clone(),
        amount,
        method,
        confidence: EXPLICIT_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tenweek_core::Actionability;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn action_on(title: &str, y: i32, m: u32, d: u32) -> Action {
        Action::new(title).logged_at(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    fn run_goal() -> Goal {
        Goal::new("Run 120km")
            .with_target(120.0, "km")
            .with_window(Some(date(2025, 4, 12)), Some(date(2025, 6, 21)))
    }

    #[test]
    fn test_action_inside_window_matches() {
        let goal = run_goal();
        let action = action_on("Run", 2025, 5, 1).with_measurement("km", 5.0);

        let matches = infer_matches(&[action.clone()], &[goal.clone()], &[], true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].amount, 5.0);
        assert_eq!(matches[0].unit.as_deref(), Some("km"));
        assert_eq!(matches[0].method, MatchMethod::AutoInferred);
        assert_eq!(matches[0].confidence, INFERRED_CONFIDENCE);
    }

    #[test]
    fn test_action_after_window() {
        let goal = run_goal();
        let action = action_on("Run", 2025, 7, 1).with_measurement("km", 5.0);

        assert!(infer_matches(&[action.clone()], &[goal.clone()], &[], true).is_empty());
        assert_eq!(infer_matches(&[action], &[goal], &[], false).len(), 1);
    }

    #[test]
    fn test_window_edges_inclusive() {
        let goal = run_goal();
        let first = action_on("Run", 2025, 4, 12).with_measurement("km", 1.0);
        let last = action_on("Run", 2025, 6, 21).with_measurement("km", 1.0);
        let before = action_on("Run", 2025, 4, 11).with_measurement("km", 1.0);

        let matches = infer_matches(&[first, last, before], &[goal], &[], true);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_open_ended_window() {
        let goal = Goal::new("Read")
            .with_target(40.0, "hours")
            .with_window(None, Some(date(2025, 1, 31)));
        let old = action_on("Reading", 2019, 3, 3).with_measurement("hours", 2.0);
        let late = action_on("Reading", 2025, 2, 1).with_measurement("hours", 2.0);

        let matches = infer_matches(&[old.clone(), late], &[goal], &[], true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].action_id, old.id);
    }

    #[test]
    fn test_start_time_used_for_window() {
        let goal = run_goal();
        let mut action = action_on("Run", 2025, 6, 23).with_measurement("km", 5.0);
        action.start_time = Some(Utc.with_ymd_and_hms(2025, 6, 21, 22, 0, 0).unwrap());
        action.duration_minutes = Some(40.0);

        assert_eq!(infer_matches(&[action], &[goal], &[], true).len(), 1);
    }

    #[test]
    fn test_fan_out_across_units() {
        let km_goal = Goal::new("Distance").with_target(100.0, "km");
        let minutes_goal = Goal::new("Time").with_target(600.0, "minutes");
        let action = action_on("Run", 2025, 5, 1)
            .with_measurement("km", 5.0)
            .with_measurement("minutes", 30.0);

        let matches = infer_matches(&[action], &[km_goal.clone(), minutes_goal.clone()], &[], true);
        assert_eq!(matches.len(), 2);

        let km = matches.iter().find(|m| m.goal_id == km_goal.id).unwrap();
        assert_eq!((km.unit.as_deref(), km.amount), (Some("km"), 5.0));
        let min = matches.iter().find(|m| m.goal_id == minutes_goal.id).unwrap();
        assert_eq!((min.unit.as_deref(), min.amount), (Some("minutes"), 30.0));
    }

    #[test]
    fn test_overlapping_goals_each_get_full_credit() {
        let a = Goal::new("Spring km").with_target(100.0, "km");
        let b = Goal::new("Year km").with_target(1000.0, "km");
        let action = action_on("Run", 2025, 5, 1).with_measurement("km", 5.0);

        let matches = infer_matches(&[action], &[a, b], &[], true);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.amount == 5.0));
    }

    #[test]
    fn test_malformed_amounts_excluded() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        let zero = action_on("Run", 2025, 5, 1).with_measurement("km", 0.0);
        let negative = action_on("Run", 2025, 5, 2).with_measurement("km", -4.0);
        let nan = action_on("Run", 2025, 5, 3).with_measurement("km", f64::NAN);

        assert!(infer_matches(&[zero, negative, nan], &[goal], &[], false).is_empty());
    }

    #[test]
    fn test_unit_normalisation_and_fuzzy_key() {
        let goal = Goal::new("Distance").with_target(100.0, "KM");
        let exact = action_on("Run", 2025, 5, 1).with_measurement("km", 5.0);
        let fuzzy = action_on("Run", 2025, 5, 1).with_measurement("Distance km", 3.0);

        let m = matches_on_unit(&exact, &goal).unwrap();
        assert!(m.exact);

        let m = matches_on_unit(&fuzzy, &goal).unwrap();
        assert!(!m.exact);
        assert_eq!(m.amount, 3.0);

        let matches = infer_matches(&[fuzzy], &[goal], &[], false);
        assert_eq!(matches[0].confidence, FUZZY_CONFIDENCE);
    }

    #[test]
    fn test_short_unit_not_found_inside_other_words() {
        let goal = Goal::new("Swim 5000m").with_target(5000.0, "m");
        let action = action_on("Swim", 2025, 5, 1)
            .with_measurement("minutes", 30.0)
            .with_measurement("km", 1.0);

        assert!(matches_on_unit(&action, &goal).is_none());
        assert!(infer_matches(&[action], &[goal], &[], false).is_empty());
    }

    #[test]
    fn test_fuzzy_key_needs_whole_words() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        let kms = action_on("Run", 2025, 5, 1).with_measurement("kms", 4.0);
        let bike = action_on("Ride", 2025, 5, 1).with_measurement("bike_km", 20.0);
        assert!(matches_on_unit(&kms, &goal).is_none());
        assert!(matches_on_unit(&bike, &goal).is_some());

        let multi = Goal::new("Ride").with_target(100.0, "bike km");
        let key = action_on("Ride", 2025, 5, 1).with_measurement("road_bike_km", 20.0);
        assert!(!matches_on_unit(&key, &multi).unwrap().exact);
    }

    #[test]
    fn test_credits_goal_exact_or_hinted() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        assert!(credits_goal("KM", &goal));
        assert!(!credits_goal("bike_km", &goal));
        assert!(!credits_goal("m", &Goal::new("Swim").with_target(10.0, "minutes")));

        let hinted = goal.with_actionability(Actionability::new(["km", "Distance km"], ["run"]));
        assert!(credits_goal("distance_km", &hinted));
    }

    #[test]
    fn test_hinted_unit_normalized_on_both_sides() {
        let goal = Goal::new("Run")
            .with_target(100.0, "km")
            .with_actionability(Actionability::new(["distance_km"], ["run"]));
        let action = action_on("Morning run", 2025, 5, 1).with_measurement("Distance km", 6.0);

        let m = matches_with_actionability(&action, &goal).unwrap();
        assert_eq!(m.amount, 6.0);
        assert!(m.exact);
    }

    #[test]
    fn test_exact_key_preferred_over_fuzzy() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        let action = action_on("Run", 2025, 5, 1)
            .with_measurement("bike_km", 20.0)
            .with_measurement("km", 5.0);

        let m = matches_on_unit(&action, &goal).unwrap();
        assert_eq!((m.key, m.amount), ("km", 5.0));
    }

    #[test]
    fn test_qualitative_goal_gets_no_inferred_matches() {
        let goal = Goal::new("Be kinder");
        let action = action_on("Helped a neighbour", 2025, 5, 1).with_measurement("minutes", 30.0);
        assert!(infer_matches(&[action], &[goal], &[], false).is_empty());
    }

    #[test]
    fn test_explicit_link_overrides_window_and_unit() {
        let goal = run_goal();
        let outside = action_on("Trail race", 2025, 9, 1).with_measurement("miles", 13.1);
        let link = Contribution::manual(outside.id, goal.id, Some(21.1));

        let matches = infer_matches(&[outside], &[goal.clone()], &[link], true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].amount, 21.1);
        assert_eq!(matches[0].method, MatchMethod::Manual);
        assert_eq!(matches[0].unit.as_deref(), Some("km"));
        assert_eq!(matches[0].confidence, EXPLICIT_CONFIDENCE);
    }

    #[test]
    fn test_explicit_link_replaces_inferred_match() {
        let goal = run_goal();
        let action = action_on("Run", 2025, 5, 1).with_measurement("km", 5.0);
        let link = Contribution::manual(action.id, goal.id, None);

        let matches = infer_matches(&[action], &[goal], &[link.clone(), link], true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].method, MatchMethod::Manual);
        assert_eq!(matches[0].amount, 5.0);
    }

    #[test]
    fn test_explicit_link_to_qualitative_goal() {
        let goal = Goal::new("Be kinder");
        let action = action_on("Helped a neighbour", 2025, 5, 1);
        let link = Contribution::manual(action.id, goal.id, None);

        let matches = infer_matches(&[action], &[goal], &[link], true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].unit, None);
        assert_eq!(matches[0].amount, 0.0);
    }

    #[test]
    fn test_links_to_unknown_records_ignored() {
        let goal = run_goal();
        let link = Contribution::manual(ActionId::new(), goal.id, Some(10.0));
        assert!(infer_matches(&[], &[goal], &[link], true).is_empty());
    }

    #[test]
    fn test_actionability_prevents_cross_matching() {
        let hints_yoga = Actionability::new(["minutes"], ["yoga", "pilates", "core"]);
        let hints_write = Actionability::new(["minutes"], ["write", "revise", "edit"]);
        let yoga_goal = Goal::new("Yoga")
            .with_target(900.0, "minutes")
            .with_actionability(hints_yoga);
        let writing_goal = Goal::new("Writing")
            .with_target(900.0, "minutes")
            .with_actionability(hints_write);

        let yoga = action_on("Yoga with Jessica", 2025, 7, 15).with_measurement("minutes", 30.0);
        let writing = action_on("Write about my goals and revise drafts", 2025, 7, 16)
            .with_measurement("minutes", 30.0);

        let matches = infer_matches(
            &[yoga.clone(), writing.clone()],
            &[yoga_goal.clone(), writing_goal.clone()],
            &[],
            true,
        );
        assert_eq!(matches.len(), 2);
        let yoga_match = matches.iter().find(|m| m.action_id == yoga.id).unwrap();
        assert_eq!(yoga_match.goal_id, yoga_goal.id);
        let writing_match = matches.iter().find(|m| m.action_id == writing.id).unwrap();
        assert_eq!(writing_match.goal_id, writing_goal.id);
    }

    #[test]
    fn test_actionability_alternate_unit() {
        let goal = Goal::new("Run 120km")
            .with_target(120.0, "km")
            .with_actionability(Actionability::new(["km", "miles"], ["run", "jog"]));
        let run = action_on("Morning run", 2025, 4, 15).with_measurement("miles", 3.1);
        let walk = action_on("Walked to the store", 2025, 4, 16).with_measurement("km", 3.0);

        let matches = infer_matches(&[run.clone(), walk], &[goal.clone()], &[], false);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].action_id, run.id);
        assert_eq!(matches[0].amount, 3.1);
        assert!(credits_goal("miles", &goal));
        assert!(!credits_goal("minutes", &goal));
    }

    #[test]
    fn test_unusable_hints_fall_back_to_unit() {
        let goal = Goal::new("Study")
            .with_target(10.0, "hours")
            .with_actionability(Actionability::new(["hours"], Vec::<String>::new()));
        let action = action_on("Some activity", 2025, 7, 15).with_measurement("hours", 2.0);

        let m = matches_with_actionability(&action, &goal).unwrap();
        assert_eq!(m.amount, 2.0);
    }

    #[test]
    fn test_filter_ambiguous() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        let exact = action_on("Run", 2025, 5, 1).with_measurement("km", 5.0);
        let fuzzy = action_on("Ride", 2025, 5, 2).with_measurement("bike_km", 20.0);

        let matches = infer_matches(&[exact.clone(), fuzzy.clone()], &[goal], &[], false);
        let (confident, ambiguous) = filter_ambiguous(matches, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(confident.len(), 1);
        assert_eq!(confident[0].action_id, exact.id);
        assert_eq!(ambiguous.len(), 1);
        assert_eq!(ambiguous[0].action_id, fuzzy.id);
    }

    #[test]
    fn test_manual_match_amounts() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        let action = action_on("Run", 2025, 5, 1).with_measurement("km", 5.0);

        assert_eq!(create_manual_match(&action, &goal, None).amount, 5.0);
        assert_eq!(create_manual_match(&action, &goal, Some(7.5)).amount, 7.5);
        assert_eq!(create_manual_match(&action, &goal, Some(-1.0)).amount, 5.0);

        let unmeasured = action_on("Stretch", 2025, 5, 1);
        let m = create_manual_match(&unmeasured, &goal, None);
        assert_eq!(m.amount, 0.0);
        assert_eq!(m.method, MatchMethod::Manual);
    }

    #[test]
    fn test_confirm_match() {
        let goal = Goal::new("Distance").with_target(100.0, "km");
        let action = action_on("Ride", 2025, 5, 2).with_measurement("bike_km", 20.0);
        let inferred = infer_matches(&[action], &[goal], &[], false).remove(0);

        let confirmed = confirm_match(&inferred);
        assert_eq!(confirmed.method, MatchMethod::UserConfirmed);
        assert_eq!(confirmed.confidence, EXPLICIT_CONFIDENCE);
        assert_eq!(confirmed.amount, inferred.amount);
    }

    #[test]
    fn test_matching_is_repeatable() {
        let goals = vec![run_goal(), Goal::new("Time").with_target(600.0, "minutes")];
        let actions = vec![
            action_on("Run", 2025, 5, 1).with_measurement("km", 5.0),
            action_on("Run", 2025, 5, 3)
                .with_measurement("km", 8.0)
                .with_measurement("minutes", 50.0),
        ];

        let first = infer_matches(&actions, &goals, &[], true);
        let second = infer_matches(&actions, &goals, &[], true);
        assert_eq!(first, second);
    }
}
