use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Others];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gender '{0}'")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|gender| gender.as_str() == value)
            .ok_or_else(|| UnknownGender(value.to_string()))
    }
}

/// Form fields in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Phone,
    DateOfBirth,
    Email,
    Gender,
    CardNumber,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Phone,
        Field::DateOfBirth,
        Field::Email,
        Field::Gender,
        Field::CardNumber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone => "phone",
            Field::DateOfBirth => "dateOfBirth",
            Field::Email => "email",
            Field::Gender => "gender",
            Field::CardNumber => "cardNumber",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Full Name",
            Field::Phone => "Phone Number",
            Field::DateOfBirth => "Date of Birth",
            Field::Email => "Email Address",
            Field::Gender => "Gender",
            Field::CardNumber => "Card Number",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw form values exactly as entered. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInput {
    pub name: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub gender: String,
    pub card_number: String,
}

/// A profile whose every field passed validation.
///
/// Only [`crate::validation`] can build one, so holding a value is proof that
/// the whole input was valid at the time it was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProfile {
    name: String,
    phone: String,
    date_of_birth: NaiveDate,
    email: String,
    gender: Gender,
    card_number: String,
}

impl ValidatedProfile {
    pub(crate) fn new(
        name: String,
        phone: String,
        date_of_birth: NaiveDate,
        email: String,
        gender: Gender,
        card_number: String,
    ) -> Self {
        Self {
            name,
            phone,
            date_of_birth,
            email,
            gender,
            card_number,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }
}

/// Midnight UTC of a calendar date, as `YYYY-MM-DDT00:00:00.000Z`.
pub fn utc_midnight_timestamp(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
