use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("clock went backwards: now ({now}) precedes session start ({started_at})")]
    ClockWentBackwards {
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error("invalid study plan: {0}")]
    InvalidPlan(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Studying,
    OnBreak,
    Finished,
}

/// Phase of a study session plus whole minutes spent in it.
///
/// For `Finished` the minute count is the total session length so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStatus {
    pub phase: Phase,
    pub elapsed_in_phase: u64,
}

impl PhaseStatus {
    pub fn not_started() -> Self {
        Self {
            phase: Phase::NotStarted,
            elapsed_in_phase: 0,
        }
    }

    /// Minutes left in the current study or break block.
    pub fn remaining_minutes(&self, plan: &StudyPlan) -> Option<u64> {
        match self.phase {
            Phase::Studying => Some(
                u64::from(plan.study_minutes).saturating_sub(self.elapsed_in_phase),
            ),
            Phase::OnBreak => Some(
                u64::from(plan.break_minutes).saturating_sub(self.elapsed_in_phase),
            ),
            Phase::NotStarted | Phase::Finished => None,
        }
    }

    /// Fraction of the study block already spent, for a progress gauge.
    pub fn progress(&self, plan: &StudyPlan) -> Option<f64> {
        match self.phase {
            Phase::Studying if plan.study_minutes > 0 => {
                Some((self.elapsed_in_phase as f64 / plan.study_minutes as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Study cycle layout: `study_minutes` of work followed by `break_minutes`
/// of rest, repeated until `session_minutes` have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyPlan {
    pub study_minutes: u32,
    pub break_minutes: u32,
    pub session_minutes: u32,
}

impl Default for StudyPlan {
    fn default() -> Self {
        Self {
            study_minutes: 30,
            break_minutes: 5,
            session_minutes: 180,
        }
    }
}

impl StudyPlan {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.study_minutes == 0 {
            return Err(ScheduleError::InvalidPlan("study block must be at least one minute"));
        }
        if self.session_minutes == 0 {
            return Err(ScheduleError::InvalidPlan("session must be at least one minute"));
        }
        Ok(())
    }

    pub fn cycle_minutes(&self) -> u64 {
        u64::from(self.study_minutes) + u64::from(self.break_minutes)
    }

    pub fn phase_at(
        &self,
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<PhaseStatus, ScheduleError> {
        let Some(started_at) = started_at else {
            return Ok(PhaseStatus::not_started());
        };

        self.validate()?;
        if now < started_at {
            return Err(ScheduleError::ClockWentBackwards { started_at, now });
        }

        // num_minutes truncates toward zero
        let total = (now - started_at).num_minutes().unsigned_abs();
        if total >= u64::from(self.session_minutes) {
            return Ok(PhaseStatus {
                phase: Phase::Finished,
                elapsed_in_phase: total,
            });
        }

        let cycle = total % self.cycle_minutes();
        let study = u64::from(self.study_minutes);
        Ok(if cycle < study {
            PhaseStatus {
                phase: Phase::Studying,
                elapsed_in_phase: cycle,
            }
        } else {
            PhaseStatus {
                phase: Phase::OnBreak,
                elapsed_in_phase: cycle - study,
            }
        })
    }

    /// Sidebar summary, e.g. "Goal: 3 Hours (30m Study / 5m Break)".
    pub fn goal_summary(&self) -> String {
        let total = if self.session_minutes % 60 == 0 {
            match self.session_minutes / 60 {
                1 => "1 Hour".to_string(),
                hours => format!("{} Hours", hours),
            }
        } else {
            format!("{} Minutes", self.session_minutes)
        };
        format!(
            "Goal: {} ({}m Study / {}m Break)",
            total, self.study_minutes, self.break_minutes
        )
    }

    /// Session length as used in conversation, e.g. "3-hour".
    pub fn length_label(&self) -> String {
        if self.session_minutes % 60 == 0 {
            format!("{}-hour", self.session_minutes / 60)
        } else {
            format!("{}-minute", self.session_minutes)
        }
    }
}

/// Derive the phase of the standard 30/5 plan capped at 180 minutes.
pub fn compute_phase(
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<PhaseStatus, ScheduleError> {
    StudyPlan::default().phase_at(started_at, now)
}

/// Start instant of the running study session, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionClock {
    started_at: Option<DateTime<Utc>>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Returns false when a session is already running; the start instant
    /// is never moved while active.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    pub fn clear(&mut self) {
        self.started_at = None;
    }

    pub fn status(
        &self,
        plan: &StudyPlan,
        now: DateTime<Utc>,
    ) -> Result<PhaseStatus, ScheduleError> {
        plan.phase_at(self.started_at, now)
    }
}
