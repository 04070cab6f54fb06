//! Registration form rules.
//!
//! Each field is checked against its rows of [`RULES`] independently of every
//! other field, so a single pass reports all invalid fields at once. Within a
//! field the first failing row wins.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use validator::ValidateEmail;

use crate::{
    domain::{Field, Gender, ProfileInput, ValidatedProfile},
    error::FieldErrors,
};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const CARD_NUMBER_MAX_CHARS: usize = 20;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,15}$").expect("phone pattern compiles"));

/// Address shape accepted by the form: plain local part, hostname labels and an
/// alphabetic top-level domain. The leading-dot and double-dot checks live in
/// [`email_well_formed`] since `regex` has no lookahead.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+-]@([A-Za-z0-9][A-Za-z0-9-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

struct Rule {
    field: Field,
    holds: fn(&ProfileInput, DateTime<Utc>) -> bool,
    message: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        field: Field::Name,
        holds: name_long_enough,
        message: "Name must be at least 2 characters",
    },
    Rule {
        field: Field::Name,
        holds: name_short_enough,
        message: "Name must be less than 50 characters",
    },
    Rule {
        field: Field::Phone,
        holds: phone_is_digits,
        message: "Phone number must be 10-15 digits only",
    },
    Rule {
        field: Field::DateOfBirth,
        holds: date_of_birth_present,
        message: "Date of birth is required",
    },
    Rule {
        field: Field::DateOfBirth,
        holds: date_of_birth_in_past,
        message: "Date of birth must be in the past",
    },
    Rule {
        field: Field::Email,
        holds: email_well_formed,
        message: "Please enter a valid email address",
    },
    Rule {
        field: Field::Gender,
        holds: gender_known,
        message: "Please select a gender",
    },
    Rule {
        field: Field::CardNumber,
        holds: card_number_present,
        message: "Card number is required",
    },
    Rule {
        field: Field::CardNumber,
        holds: card_number_short_enough,
        message: "Card number must be 20 characters or less",
    },
];

fn name_long_enough(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    input.name.chars().count() >= NAME_MIN_CHARS
}

fn name_short_enough(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    input.name.chars().count() <= NAME_MAX_CHARS
}

fn phone_is_digits(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    PHONE_PATTERN.is_match(&input.phone)
}

fn date_of_birth_present(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    input.date_of_birth.is_some()
}

// A missing date is the presence rule's concern.
fn date_of_birth_in_past(input: &ProfileInput, now: DateTime<Utc>) -> bool {
    input
        .date_of_birth
        .map_or(true, |date| is_before(date, now))
}

fn email_well_formed(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    let email = input.email.as_str();
    email.validate_email()
        && !email.starts_with('.')
        && !email.contains("..")
        && EMAIL_PATTERN.is_match(email)
}

fn gender_known(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    input.gender.parse::<Gender>().is_ok()
}

fn card_number_present(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    !input.card_number.is_empty()
}

fn card_number_short_enough(input: &ProfileInput, _now: DateTime<Utc>) -> bool {
    input.card_number.chars().count() <= CARD_NUMBER_MAX_CHARS
}

/// Whether midnight UTC of `date` is strictly earlier than `now`.
pub fn is_before(date: NaiveDate, now: DateTime<Utc>) -> bool {
    date.and_time(NaiveTime::MIN).and_utc() < now
}

/// Drops every character that is not an ASCII digit.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// First violated rule for one field, if any.
pub fn check_field(field: Field, input: &ProfileInput, now: DateTime<Utc>) -> Option<&'static str> {
    RULES
        .iter()
        .filter(|rule| rule.field == field)
        .find(|rule| !(rule.holds)(input, now))
        .map(|rule| rule.message)
}

pub fn validate(input: &ProfileInput) -> Result<ValidatedProfile, FieldErrors> {
    validate_at(input, Utc::now())
}

pub fn validate_at(
    input: &ProfileInput,
    now: DateTime<Utc>,
) -> Result<ValidatedProfile, FieldErrors> {
    let mut errors = FieldErrors::new();
    for rule in RULES {
        if !(rule.holds)(input, now) {
            errors.insert(rule.field, rule.message);
        }
    }

    match (
        errors.is_empty(),
        input.date_of_birth,
        input.gender.parse::<Gender>(),
    ) {
        (true, Some(date_of_birth), Ok(gender)) => Ok(ValidatedProfile::new(
            input.name.clone(),
            input.phone.clone(),
            date_of_birth,
            input.email.clone(),
            gender,
            input.card_number.clone(),
        )),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
