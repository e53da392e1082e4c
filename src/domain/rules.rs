//! Write-time rules for habits.
//!
//! Each rule is a pure function over a [`HabitDraft`]. [`validate`] runs them
//! in the order of [`RULES`] and reports the first violation.

use thiserror::Error;

use super::HabitDraft;

/// Longest allowed execution time, in seconds.
pub const MAX_LENGTH_SECONDS: i32 = 120;

pub const MIN_PERIOD_DAYS: i32 = 1;
pub const MAX_PERIOD_DAYS: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("cannot choose a linked habit and a reward at the same time.")]
    RewardAndLinked,

    #[error("execution time must not exceed 120 seconds.")]
    LengthTooLong,

    #[error("only a pleasant habit may be selected as a linked habit.")]
    LinkedNotPleasant,

    #[error("a pleasant habit may not have a reward or a linked habit.")]
    PleasantWithReward,

    #[error("cannot perform a habit less often than once every 7 days")]
    PeriodTooLong,

    #[error("frequency cannot be less than 1")]
    PeriodTooShort,
}

pub type Rule = fn(&HabitDraft) -> Option<RuleViolation>;

/// Evaluation order.
pub const RULES: [Rule; 5] = [
    reward_or_linked,
    execution_duration,
    linked_must_be_pleasant,
    pleasant_exclusivity,
    period_bounds,
];

#[must_use]
pub fn reward_or_linked(draft: &HabitDraft) -> Option<RuleViolation> {
    (draft.has_reward() && draft.has_linked()).then_some(RuleViolation::RewardAndLinked)
}

#[must_use]
pub const fn execution_duration(draft: &HabitDraft) -> Option<RuleViolation> {
    if draft.length > MAX_LENGTH_SECONDS {
        Some(RuleViolation::LengthTooLong)
    } else {
        None
    }
}

#[must_use]
pub fn linked_must_be_pleasant(draft: &HabitDraft) -> Option<RuleViolation> {
    draft
        .linked
        .filter(|linked| !linked.is_pleasant)
        .map(|_| RuleViolation::LinkedNotPleasant)
}

#[must_use]
pub fn pleasant_exclusivity(draft: &HabitDraft) -> Option<RuleViolation> {
    (draft.is_pleasant && (draft.has_reward() || draft.has_linked()))
        .then_some(RuleViolation::PleasantWithReward)
}

#[must_use]
pub const fn period_bounds(draft: &HabitDraft) -> Option<RuleViolation> {
    if draft.period > MAX_PERIOD_DAYS {
        Some(RuleViolation::PeriodTooLong)
    } else if draft.period < MIN_PERIOD_DAYS {
        Some(RuleViolation::PeriodTooShort)
    } else {
        None
    }
}

/// Runs every rule and returns the first violation.
pub fn validate(draft: &HabitDraft) -> Result<(), RuleViolation> {
    RULES
        .iter()
        .find_map(|rule| rule(draft))
        .map_or(Ok(()), Err)
}

/// All violations of `draft`, in evaluation order.
#[must_use]
pub fn violations(draft: &HabitDraft) -> Vec<RuleViolation> {
    RULES.iter().filter_map(|rule| rule(draft)).collect()
}
