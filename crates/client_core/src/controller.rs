//! Submission state machine for one form session.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use shared::{
    domain::{ProfileInput, ValidatedProfile},
    error::FieldErrors,
    protocol::{AddProfileRequest, ApiResult},
    validation::validate_at,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    notifications::{Notification, NotificationSink},
    ProfileService,
};

const TRANSITION_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded { name: String },
    Failed { reason: String },
}

impl SubmissionState {
    /// Inputs are locked while a request is in flight and after success.
    pub fn inputs_enabled(&self) -> bool {
        matches!(self, SubmissionState::Idle | SubmissionState::Failed { .. })
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionState::Idle => f.write_str("idle"),
            SubmissionState::Submitting => f.write_str("submitting"),
            SubmissionState::Succeeded { .. } => f.write_str("succeeded"),
            SubmissionState::Failed { .. } => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors),
    Succeeded { name: String },
    Failed { reason: String },
    /// The controller was not in a state that accepts a submit.
    Ignored(SubmissionState),
}

pub struct SubmissionController {
    service: Arc<dyn ProfileService>,
    notifications: Arc<dyn NotificationSink>,
    state: SubmissionState,
    transitions: broadcast::Sender<SubmissionState>,
    session_id: Uuid,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn ProfileService>, notifications: Arc<dyn NotificationSink>) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            service,
            notifications,
            state: SubmissionState::Idle,
            transitions,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Every state entered after this call is delivered to the receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionState> {
        self.transitions.subscribe()
    }

    pub async fn submit(&mut self, input: &ProfileInput) -> SubmitOutcome {
        self.submit_at(input, Utc::now()).await
    }

    pub async fn submit_at(&mut self, input: &ProfileInput, now: DateTime<Utc>) -> SubmitOutcome {
        if !self.state.inputs_enabled() {
            return self.ignore();
        }
        match validate_at(input, now) {
            Ok(profile) => self.submit_validated(profile).await,
            Err(errors) => {
                debug!(
                    session_id = %self.session_id,
                    invalid_fields = errors.len(),
                    "profile input rejected by validation"
                );
                SubmitOutcome::Invalid(errors)
            }
        }
    }

    /// Sends one request for `profile`. A pending failure is acknowledged first.
    pub async fn submit_validated(&mut self, profile: ValidatedProfile) -> SubmitOutcome {
        match self.state {
            SubmissionState::Idle => {}
            SubmissionState::Failed { .. } => {
                self.acknowledge();
            }
            SubmissionState::Submitting | SubmissionState::Succeeded { .. } => {
                return self.ignore();
            }
        }

        let request = AddProfileRequest::from(&profile);
        self.transition(SubmissionState::Submitting);

        let result = match self.service.create_profile(&request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    session_id = %self.session_id,
                    error = ?err,
                    "profile submission did not reach the service"
                );
                ApiResult::network_failure()
            }
        };

        if result.is_success {
            let name = profile.name().to_string();
            info!(session_id = %self.session_id, "profile created");
            self.transition(SubmissionState::Succeeded { name: name.clone() });
            self.notifications.notify(Notification::profile_created(&name));
            SubmitOutcome::Succeeded { name }
        } else {
            let reason = result.failure_message().to_string();
            warn!(
                session_id = %self.session_id,
                time_generated = %result.time_generated,
                reason = %reason,
                "profile service rejected submission"
            );
            self.transition(SubmissionState::Failed {
                reason: reason.clone(),
            });
            self.notifications
                .notify(Notification::submission_failed(&reason));
            SubmitOutcome::Failed { reason }
        }
    }

    /// Dismisses a failure and returns to idle. No-op in any other state.
    pub fn acknowledge(&mut self) -> bool {
        if matches!(self.state, SubmissionState::Failed { .. }) {
            self.transition(SubmissionState::Idle);
            true
        } else {
            false
        }
    }

    fn ignore(&self) -> SubmitOutcome {
        debug!(
            session_id = %self.session_id,
            state = %self.state,
            "submit ignored"
        );
        SubmitOutcome::Ignored(self.state.clone())
    }

    fn transition(&mut self, next: SubmissionState) {
        debug!(
            session_id = %self.session_id,
            from = %self.state,
            to = %next,
            "submission state transition"
        );
        self.state = next.clone();
        let _ = self.transitions.send(next);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
