//! Registration record and its enumerations.
//!
//! Records are created from a validated [`NewRegistration`], mutated only
//! through [`RegistrationPatch`], and removed permanently on delete.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name a known enum variant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

/// Self-reported Model UN experience.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    /// First conference
    Beginner,
    /// A few conferences
    Intermediate,
    /// Seasoned delegate
    Advanced,
}

impl Experience {
    /// All levels, in form order.
    pub const ALL: [Experience; 3] = [
        Experience::Beginner,
        Experience::Intermediate,
        Experience::Advanced,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::Beginner => "beginner",
            Experience::Intermediate => "intermediate",
            Experience::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Experience {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Experience::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "experience level",
                value: s.to_string(),
            })
    }
}

/// Review state of a registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Awaiting review (assigned at creation)
    #[default]
    Pending,
    /// Accepted by the organisers
    Confirmed,
    /// Declined by the organisers
    Rejected,
}

impl RegistrationStatus {
    /// All states.
    pub const ALL: [RegistrationStatus; 3] = [
        RegistrationStatus::Pending,
        RegistrationStatus::Confirmed,
        RegistrationStatus::Rejected,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegistrationStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// A delegate's submitted conference application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Unique identifier (assigned by the store, never reused)
    pub id: u64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Empty when the schema allows omitting it
    pub email: String,
    /// Contact number
    pub phone: Option<String>,
    /// School or institution
    pub school: String,
    /// Grade or year of study
    pub grade: String,
    /// Self-reported experience level
    pub experience: Option<Experience>,
    /// Preferred position, e.g. `delegate`
    pub position: String,
    /// Committee codes; never empty
    pub committees: Vec<String>,
    /// Dietary requirements
    pub dietary: Option<String>,
    /// Accommodation needs
    pub accommodation: Option<String>,
    /// Free-text suggestions for the organisers
    pub suggestions: Option<String>,
    /// Accepted the terms and conditions
    pub terms: bool,
    /// Opted in to the newsletter
    pub newsletter: bool,
    /// Review state
    pub status: RegistrationStatus,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Full display name, as used in exports.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns true if the registration lists this committee code.
    pub fn has_committee(&self, code: &str) -> bool {
        self.committees.iter().any(|c| c == code)
    }

    /// Case-insensitive substring match against name, email, and school.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.school,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    /// Overwrites every field the patch supplies. `id` and `created_at`
    /// are not patchable.
    pub fn apply(&mut self, patch: RegistrationPatch) {
        let RegistrationPatch {
            first_name,
            last_name,
            email,
            phone,
            school,
            grade,
            experience,
            position,
            committees,
            dietary,
            accommodation,
            suggestions,
            terms,
            newsletter,
            status,
        } = patch;

        if let Some(v) = first_name {
            self.first_name = v;
        }
        if let Some(v) = last_name {
            self.last_name = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = school {
            self.school = v;
        }
        if let Some(v) = grade {
            self.grade = v;
        }
        if let Some(v) = experience {
            self.experience = Some(v);
        }
        if let Some(v) = position {
            self.position = v;
        }
        if let Some(v) = committees {
            self.committees = v;
        }
        if let Some(v) = dietary {
            self.dietary = v;
        }
        if let Some(v) = accommodation {
            self.accommodation = v;
        }
        if let Some(v) = suggestions {
            self.suggestions = v;
        }
        if let Some(v) = terms {
            self.terms = v;
        }
        if let Some(v) = newsletter {
            self.newsletter = v;
        }
        if let Some(v) = status {
            self.status = v;
        }
    }
}

/// Sorts newest first by creation time; equal timestamps put the higher id first.
pub fn sort_newest_first(registrations: &mut [Registration]) {
    registrations.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// A registration that passed the schema and is ready to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRegistration {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email, empty when omitted
    pub email: String,
    /// Contact number
    pub phone: Option<String>,
    /// School or institution
    pub school: String,
    /// Grade or year of study
    pub grade: String,
    /// Experience level
    pub experience: Option<Experience>,
    /// Preferred position
    pub position: String,
    /// Trimmed, deduplicated committee codes
    pub committees: Vec<String>,
    /// Dietary requirements
    pub dietary: Option<String>,
    /// Accommodation needs
    pub accommodation: Option<String>,
    /// Suggestions
    pub suggestions: Option<String>,
    /// Terms accepted
    pub terms: bool,
    /// Newsletter opt-in
    pub newsletter: bool,
}

impl NewRegistration {
    /// Builds the stored record: `pending` status and the given id and timestamp.
    pub fn into_registration(self, id: u64, created_at: DateTime<Utc>) -> Registration {
        Registration {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            school: self.school,
            grade: self.grade,
            experience: self.experience,
            position: self.position,
            committees: self.committees,
            dietary: self.dietary,
            accommodation: self.accommodation,
            suggestions: self.suggestions,
            terms: self.terms,
            newsletter: self.newsletter,
            status: RegistrationStatus::Pending,
            created_at,
        }
    }
}

/// Partial update. `None` leaves the stored field untouched.
///
/// The optional text fields are doubly wrapped: `Some(None)` clears the
/// stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistrationPatch {
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New email (may be empty)
    pub email: Option<String>,
    /// New or cleared contact number
    pub phone: Option<Option<String>>,
    /// New school
    pub school: Option<String>,
    /// New grade
    pub grade: Option<String>,
    /// New experience level
    pub experience: Option<Experience>,
    /// New position
    pub position: Option<String>,
    /// Replacement committee list
    pub committees: Option<Vec<String>>,
    /// New or cleared dietary requirements
    pub dietary: Option<Option<String>>,
    /// New or cleared accommodation needs
    pub accommodation: Option<Option<String>>,
    /// New or cleared suggestions
    pub suggestions: Option<Option<String>>,
    /// New terms flag
    pub terms: Option<bool>,
    /// New newsletter flag
    pub newsletter: Option<bool>,
    /// New review state
    pub status: Option<RegistrationStatus>,
}

impl RegistrationPatch {
    /// Patch that only changes the status.
    pub fn status(status: RegistrationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
