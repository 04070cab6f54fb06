use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, Utc};
use shared::{
    domain::{Field, ProfileInput},
    error::FieldErrors,
    validation::{check_field, sanitize_phone},
};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    controller::{SubmissionController, SubmissionState, SubmitOutcome},
    notifications::NotificationSink,
    ProfileService,
};

/// Earliest year the birth date picker offers.
pub const EARLIEST_BIRTH_YEAR: i32 = 1900;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormInputError {
    #[error("form inputs are disabled while the submission is {0}")]
    InputsDisabled(SubmissionState),
    #[error("{0} cannot be picked as a date of birth")]
    DateNotSelectable(NaiveDate),
}

/// One registration form session: the raw input, its inline errors and the
/// submission controller that owns the lifecycle.
///
/// Field errors appear after the first submit attempt. From then on every
/// edit re-checks the edited field.
pub struct ProfileForm {
    input: ProfileInput,
    field_errors: FieldErrors,
    submit_attempted: bool,
    controller: SubmissionController,
}

impl ProfileForm {
    pub fn new(service: Arc<dyn ProfileService>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            input: ProfileInput::default(),
            field_errors: FieldErrors::new(),
            submit_attempted: false,
            controller: SubmissionController::new(service, notifications),
        }
    }

    pub fn input(&self) -> &ProfileInput {
        &self.input
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.field_errors.get(field)
    }

    pub fn state(&self) -> &SubmissionState {
        self.controller.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionState> {
        self.controller.subscribe()
    }

    pub fn session_id(&self) -> Uuid {
        self.controller.session_id()
    }

    pub fn inputs_enabled(&self) -> bool {
        self.controller.state().inputs_enabled()
    }

    pub fn set_name(&mut self, value: impl Into<String>) -> Result<(), FormInputError> {
        let value = value.into();
        self.edit(Field::Name, |input| input.name = value)
    }

    /// Keeps only the digits of `raw`, the way the phone field filters keystrokes.
    pub fn set_phone(&mut self, raw: &str) -> Result<(), FormInputError> {
        let value = sanitize_phone(raw);
        self.edit(Field::Phone, |input| input.phone = value)
    }

    /// Picks a birth date bounded by the local calendar day. Validation still
    /// compares against the UTC instant.
    pub fn select_date_of_birth(&mut self, date: NaiveDate) -> Result<(), FormInputError> {
        self.select_date_of_birth_on(date, Local::now().date_naive())
    }

    /// Picks a birth date, accepting only days the picker shows as enabled:
    /// 1900-01-01 up to and including `today`.
    pub fn select_date_of_birth_on(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<(), FormInputError> {
        self.ensure_enabled()?;
        if date > today || date.year() < EARLIEST_BIRTH_YEAR {
            return Err(FormInputError::DateNotSelectable(date));
        }
        self.edit(Field::DateOfBirth, |input| input.date_of_birth = Some(date))
    }

    pub fn clear_date_of_birth(&mut self) -> Result<(), FormInputError> {
        self.edit(Field::DateOfBirth, |input| input.date_of_birth = None)
    }

    pub fn set_email(&mut self, value: impl Into<String>) -> Result<(), FormInputError> {
        let value = value.into();
        self.edit(Field::Email, |input| input.email = value)
    }

    pub fn set_gender(&mut self, value: impl Into<String>) -> Result<(), FormInputError> {
        let value = value.into();
        self.edit(Field::Gender, |input| input.gender = value)
    }

    pub fn set_card_number(&mut self, value: impl Into<String>) -> Result<(), FormInputError> {
        let value = value.into();
        self.edit(Field::CardNumber, |input| input.card_number = value)
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        self.submit_attempted = true;
        let outcome = self.controller.submit(&self.input).await;
        match &outcome {
            SubmitOutcome::Invalid(errors) => self.field_errors = errors.clone(),
            SubmitOutcome::Ignored(_) => {}
            SubmitOutcome::Succeeded { .. } | SubmitOutcome::Failed { .. } => {
                self.field_errors = FieldErrors::new();
            }
        }
        outcome
    }

    /// Closes the error notification and hands the form back to the user.
    pub fn dismiss_error(&mut self) -> bool {
        self.controller.acknowledge()
    }

    fn ensure_enabled(&self) -> Result<(), FormInputError> {
        if self.inputs_enabled() {
            Ok(())
        } else {
            Err(FormInputError::InputsDisabled(self.state().clone()))
        }
    }

    fn edit(
        &mut self,
        field: Field,
        apply: impl FnOnce(&mut ProfileInput),
    ) -> Result<(), FormInputError> {
        self.ensure_enabled()?;
        apply(&mut self.input);
        if self.submit_attempted {
            match check_field(field, &self.input, Utc::now()) {
                Some(message) => self.field_errors.set(field, message),
                None => {
                    self.field_errors.remove(field);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
