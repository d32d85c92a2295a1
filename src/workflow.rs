//! Approval workflow for fund requests.
//!
//! Every mutation path that can affect a request's step or status goes
//! through [`advance`], [`reject`] or [`auto_validate`]; nothing else writes
//! those fields. Steps are ordinal and advance one at a time; rejection is
//! one-way and freezes the step it happened at. The single sanctioned bypass
//! of the one-step rule is auto-validation, which fires when the last
//! expense under a request is validated.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub const FINAL_STEP: i16 = 8;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStep {
    Submitted,
    Reviewed,
    Checked,
    Approved,
    Disbursed,
    Received,
    Receipted,
    Validated,
}

impl ApprovalStep {
    pub fn ordinal(self) -> i16 {
        match self {
            Self::Submitted => 1,
            Self::Reviewed => 2,
            Self::Checked => 3,
            Self::Approved => 4,
            Self::Disbursed => 5,
            Self::Received => 6,
            Self::Receipted => 7,
            Self::Validated => 8,
        }
    }

    pub fn from_ordinal(ordinal: i16) -> Option<Self> {
        match ordinal {
            1 => Some(Self::Submitted),
            2 => Some(Self::Reviewed),
            3 => Some(Self::Checked),
            4 => Some(Self::Approved),
            5 => Some(Self::Disbursed),
            6 => Some(Self::Received),
            7 => Some(Self::Receipted),
            8 => Some(Self::Validated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot move from step {from} to step {to}; steps advance one at a time")]
    InvalidTransition { from: i16, to: i16 },

    #[error("step {0} is not a valid workflow step")]
    UnknownStep(i16),

    #[error("request was rejected at step {0} and cannot re-enter the workflow")]
    Rejected(i16),

    #[error("request is already validated")]
    AlreadyValidated,

    #[error("a rejection reason is required")]
    MissingReason,
}

/// Workflow position of a fund request, as stored on the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    pub step: ApprovalStep,
    pub is_rejected: bool,
    pub rejection_step: Option<i16>,
    pub rejection_reason: Option<String>,
}

impl WorkflowState {
    pub fn initial() -> Self {
        Self {
            step: ApprovalStep::Submitted,
            is_rejected: false,
            rejection_step: None,
            rejection_reason: None,
        }
    }

    pub fn from_row(current_step: i16, is_rejected: bool, rejection_step: Option<i16>, rejection_reason: Option<String>) -> Result<Self, WorkflowError> {
        let step = ApprovalStep::from_ordinal(current_step)
            .ok_or(WorkflowError::UnknownStep(current_step))?;
        Ok(Self {
            step,
            is_rejected,
            rejection_step,
            rejection_reason,
        })
    }

    /// Status string persisted on the request row.
    pub fn status(&self) -> String {
        if self.is_rejected {
            "rejected".to_string()
        } else {
            self.step.to_string()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.is_rejected || self.step == ApprovalStep::Validated
    }
}

/// Advances the workflow by exactly one step.
pub fn advance(state: &WorkflowState, to_step: i16) -> Result<WorkflowState, WorkflowError> {
    if state.is_rejected {
        return Err(WorkflowError::Rejected(
            state.rejection_step.unwrap_or(state.step.ordinal()),
        ));
    }
    if state.step == ApprovalStep::Validated {
        return Err(WorkflowError::AlreadyValidated);
    }
    let target = ApprovalStep::from_ordinal(to_step).ok_or(WorkflowError::UnknownStep(to_step))?;
    if target.ordinal() != state.step.ordinal() + 1 {
        return Err(WorkflowError::InvalidTransition {
            from: state.step.ordinal(),
            to: to_step,
        });
    }
    Ok(WorkflowState {
        step: target,
        ..state.clone()
    })
}

/// Marks the request rejected at its current step. One-way: a rejected
/// request never re-enters the forward flow, and the recorded rejection
/// step never changes.
pub fn reject(state: &WorkflowState, reason: &str) -> Result<WorkflowState, WorkflowError> {
    if reason.trim().is_empty() {
        return Err(WorkflowError::MissingReason);
    }
    if state.is_rejected {
        return Err(WorkflowError::Rejected(
            state.rejection_step.unwrap_or(state.step.ordinal()),
        ));
    }
    if state.step == ApprovalStep::Validated {
        return Err(WorkflowError::AlreadyValidated);
    }
    Ok(WorkflowState {
        step: state.step,
        is_rejected: true,
        rejection_step: Some(state.step.ordinal()),
        rejection_reason: Some(reason.trim().to_string()),
    })
}

/// Force-validates the request when its last expense reaches `validated`.
/// Skips the one-step rule; does nothing for already-terminal requests.
pub fn auto_validate(state: &WorkflowState) -> WorkflowState {
    if state.is_terminal() {
        return state.clone();
    }
    WorkflowState {
        step: ApprovalStep::Validated,
        ..state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_step_at_a_time() {
        let mut state = WorkflowState::initial();
        for step in 2..=FINAL_STEP {
            state = advance(&state, step).unwrap();
            assert_eq!(state.step.ordinal(), step);
            assert_eq!(state.status(), state.step.to_string());
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn skipping_steps_is_rejected_exhaustively() {
        for from in 1..FINAL_STEP {
            let state = WorkflowState::from_row(from, false, None, None).unwrap();
            for to in 1..=FINAL_STEP {
                let result = advance(&state, to);
                if to == from + 1 {
                    assert!(result.is_ok(), "step {from} -> {to} should be allowed");
                } else {
                    assert!(result.is_err(), "step {from} -> {to} should be refused");
                }
            }
        }
    }

    #[test]
    fn validated_is_terminal() {
        let state = WorkflowState::from_row(FINAL_STEP, false, None, None).unwrap();
        assert_eq!(advance(&state, 9), Err(WorkflowError::AlreadyValidated));
        assert_eq!(
            reject(&state, "too late"),
            Err(WorkflowError::AlreadyValidated)
        );
    }

    #[test]
    fn rejection_freezes_step_and_records_reason() {
        let state = WorkflowState::from_row(3, false, None, None).unwrap();
        let rejected = reject(&state, "  missing receipts  ").unwrap();
        assert_eq!(rejected.step.ordinal(), 3);
        assert_eq!(rejected.rejection_step, Some(3));
        assert_eq!(rejected.rejection_reason.as_deref(), Some("missing receipts"));
        assert_eq!(rejected.status(), "rejected");

        assert_eq!(advance(&rejected, 4), Err(WorkflowError::Rejected(3)));
        // A second rejection would overwrite rejection_step; refuse it.
        assert_eq!(
            reject(&rejected, "again"),
            Err(WorkflowError::Rejected(3))
        );
    }

    #[test]
    fn empty_reason_is_refused() {
        let state = WorkflowState::initial();
        assert_eq!(reject(&state, "   "), Err(WorkflowError::MissingReason));
    }

    #[test]
    fn auto_validate_bypasses_step_rule() {
        let state = WorkflowState::from_row(2, false, None, None).unwrap();
        let validated = auto_validate(&state);
        assert_eq!(validated.step, ApprovalStep::Validated);
        assert_eq!(validated.status(), "validated");
    }

    #[test]
    fn auto_validate_skips_rejected_requests() {
        let state = WorkflowState::from_row(2, false, None, None).unwrap();
        let rejected = reject(&state, "no quorum").unwrap();
        let unchanged = auto_validate(&rejected);
        assert_eq!(unchanged, rejected);
    }

    #[test]
    fn unknown_steps_are_refused() {
        let state = WorkflowState::initial();
        assert_eq!(advance(&state, 0), Err(WorkflowError::UnknownStep(0)));
        assert_eq!(advance(&state, 9), Err(WorkflowError::UnknownStep(9)));
        assert!(WorkflowState::from_row(11, false, None, None).is_err());
    }
}
