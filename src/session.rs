use chrono::{DateTime, Utc};

use crate::schedule::{Phase, PhaseStatus, ScheduleError, SessionClock, StudyPlan};
use crate::tutor::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub fn greeting(plan: &StudyPlan) -> String {
    format!(
        "Hello! I am your Commerce Coach. Ready to start your {} study session?",
        plan.length_label()
    )
}

/// State owned by one interactive session: chat history, the study clock
/// and the subject last picked. Lives as long as the process.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub messages: Vec<ChatMessage>,
    pub clock: SessionClock,
    pub subject: Subject,
    pub plan: StudyPlan,
}

impl SessionContext {
    pub fn new(plan: StudyPlan, subject: Subject) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting(&plan))],
            clock: SessionClock::new(),
            subject,
            plan,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn clear_chat(&mut self) {
        self.messages.clear();
    }

    pub fn is_studying(&self) -> bool {
        self.clock.is_running()
    }

    pub fn start_study(&mut self, now: DateTime<Utc>) -> bool {
        let started = self.clock.start(now);
        if started {
            log::info!("study session started at {}", now);
        }
        started
    }

    pub fn stop_study(&mut self) {
        if self.clock.is_running() {
            log::info!("study session stopped");
        }
        self.clock.clear();
    }

    /// Clears a finished session. Returns false while the session is still
    /// in progress; use `stop_study` to abandon it.
    pub fn reset_study(&mut self, now: DateTime<Utc>) -> Result<bool, ScheduleError> {
        if self.status(now)?.phase != Phase::Finished {
            return Ok(false);
        }
        log::info!("finished study session reset");
        self.clock.clear();
        Ok(true)
    }

    pub fn status(&self, now: DateTime<Utc>) -> Result<PhaseStatus, ScheduleError> {
        self.clock.status(&self.plan, now)
    }
}
