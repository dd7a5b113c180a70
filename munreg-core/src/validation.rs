//! Registration schema.
//!
//! Raw request bodies deserialize into [`RegistrationInput`] / [`PatchInput`],
//! where every field is optional so that a single pass can collect every
//! violation. Validation then produces the typed [`NewRegistration`] or
//! [`RegistrationPatch`] handed to the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MunregError;
use crate::types::{Experience, NewRegistration, RegistrationPatch, RegistrationStatus};

const MSG_FIRST_NAME: &str = "First name is required";
const MSG_LAST_NAME: &str = "Last name is required";
const MSG_EMAIL: &str = "Please enter a valid email address";
const MSG_SCHOOL: &str = "School/Institution is required";
const MSG_GRADE: &str = "Grade/Year is required";
const MSG_EXPERIENCE_REQUIRED: &str = "Experience level is required";
const MSG_EXPERIENCE_UNKNOWN: &str =
    "Experience level must be one of beginner, intermediate, advanced";
const MSG_POSITION: &str = "Preferred position is required";
const MSG_COMMITTEES: &str = "Please select at least one committee";
const MSG_COMMITTEE_BLANK: &str = "Committee codes cannot be empty";
const MSG_TERMS: &str = "You must agree to the terms and conditions";
const MSG_STATUS: &str = "Status must be one of pending, confirmed, rejected";

// ═══════════════════════════════════════════════════════════════════════════════
// VIOLATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// A single failed rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// JSON field name (camelCase)
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every violation found in one payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    /// The collected violations, in field order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Consumes the wrapper.
    pub fn into_inner(self) -> Vec<FieldViolation> {
        self.0
    }

    /// Returns true if nothing was violated.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if some violation concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldViolation::new(field, message));
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldViolation>> for ValidationErrors {
    fn from(violations: Vec<FieldViolation>) -> Self {
        Self(violations)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ═══════════════════════════════════════════════════════════════════════════════
// POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// Which optional parts of the schema a deployment enforces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Email must be present and well-formed (otherwise empty is accepted)
    pub require_email: bool,
    /// `terms` must be present (it must be `true` whenever present)
    pub require_terms: bool,
    /// School must be supplied (otherwise `default_school` is used)
    pub require_school: bool,
    /// Experience level must be supplied
    pub require_experience: bool,
    /// School stored when the payload leaves it blank
    pub default_school: String,
}

impl ValidationPolicy {
    /// Public form schema: email, terms, school and experience optional.
    pub fn lenient() -> Self {
        Self {
            require_email: false,
            require_terms: false,
            require_school: false,
            require_experience: false,
            default_school: String::new(),
        }
    }

    /// Full schema: every institutional and consent field required.
    pub fn strict() -> Self {
        Self {
            require_email: true,
            require_terms: true,
            require_school: true,
            require_experience: true,
            default_school: String::new(),
        }
    }

    /// Sets the school stored for blank submissions.
    pub fn with_default_school(mut self, school: impl Into<String>) -> Self {
        self.default_school = school.into();
        self
    }

    /// Short name of the mode, for logs.
    pub fn mode(&self) -> &'static str {
        if *self == Self::strict().with_default_school(self.default_school.clone()) {
            "strict"
        } else {
            "lenient"
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::lenient()
    }
}

impl FromStr for ValidationPolicy {
    type Err = MunregError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "" => Ok(Self::lenient()),
            "strict" => Ok(Self::strict()),
            other => Err(MunregError::Config(format!(
                "unknown schema mode '{}', expected 'strict' or 'lenient'",
                other
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// Basic email shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(
    errors: &mut ValidationErrors,
    field: &str,
    message: &str,
    value: Option<String>,
) -> String {
    match non_blank(value) {
        Some(v) => v,
        None => {
            errors.push(field, message);
            String::new()
        }
    }
}

/// Trims codes and drops repeats, keeping first-seen order.
fn clean_committees(errors: &mut ValidationErrors, codes: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(codes.len());
    let mut blank = false;
    for code in codes {
        let code = code.trim();
        if code.is_empty() {
            blank = true;
        } else if !cleaned.iter().any(|c| c == code) {
            cleaned.push(code.to_string());
        }
    }
    if blank {
        errors.push("committees", MSG_COMMITTEE_BLANK);
    } else if cleaned.is_empty() {
        errors.push("committees", MSG_COMMITTEES);
    }
    cleaned
}

fn check_email(errors: &mut ValidationErrors, policy: &ValidationPolicy, email: &str) {
    if email.is_empty() {
        if policy.require_email {
            errors.push("email", MSG_EMAIL);
        }
    } else if !is_valid_email(email) {
        errors.push("email", MSG_EMAIL);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CREATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw creation payload as posted by the registration form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Contact number
    pub phone: Option<String>,
    /// School or institution
    pub school: Option<String>,
    /// Grade or year of study
    pub grade: Option<String>,
    /// `beginner`, `intermediate` or `advanced`
    pub experience: Option<String>,
    /// Preferred position
    pub position: Option<String>,
    /// Committee codes
    pub committees: Option<Vec<String>>,
    /// Dietary requirements
    pub dietary: Option<String>,
    /// Accommodation needs
    pub accommodation: Option<String>,
    /// Suggestions
    pub suggestions: Option<String>,
    /// Terms accepted
    pub terms: Option<bool>,
    /// Newsletter opt-in
    pub newsletter: Option<bool>,
}

impl RegistrationInput {
    /// Applies the schema, returning every violation on failure.
    pub fn validate(self, policy: &ValidationPolicy) -> Result<NewRegistration, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = required(&mut errors, "firstName", MSG_FIRST_NAME, self.first_name);
        let last_name = required(&mut errors, "lastName", MSG_LAST_NAME, self.last_name);

        let email = non_blank(self.email).unwrap_or_default();
        check_email(&mut errors, policy, &email);

        let school = match non_blank(self.school) {
            Some(s) => s,
            None if policy.require_school => {
                errors.push("school", MSG_SCHOOL);
                String::new()
            }
            None => policy.default_school.clone(),
        };

        let grade = required(&mut errors, "grade", MSG_GRADE, self.grade);

        let experience = match non_blank(self.experience) {
            Some(raw) => match raw.parse::<Experience>() {
                Ok(e) => Some(e),
                Err(_) => {
                    errors.push("experience", MSG_EXPERIENCE_UNKNOWN);
                    None
                }
            },
            None => {
                if policy.require_experience {
                    errors.push("experience", MSG_EXPERIENCE_REQUIRED);
                }
                None
            }
        };

        let position = required(&mut errors, "position", MSG_POSITION, self.position);
        let committees = clean_committees(&mut errors, self.committees.unwrap_or_default());

        match self.terms {
            Some(true) => {}
            Some(false) => errors.push("terms", MSG_TERMS),
            None if policy.require_terms => errors.push("terms", MSG_TERMS),
            None => {}
        }

        errors.into_result(NewRegistration {
            first_name,
            last_name,
            email,
            phone: non_blank(self.phone),
            school,
            grade,
            experience,
            position,
            committees,
            dietary: non_blank(self.dietary),
            accommodation: non_blank(self.accommodation),
            suggestions: non_blank(self.suggestions),
            terms: self.terms.unwrap_or(false),
            newsletter: self.newsletter.unwrap_or(false),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARTIAL UPDATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw partial update. Absent and `null` fields are left untouched; `id`
/// and `createdAt` are ignored if sent.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchInput {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Contact number
    pub phone: Option<String>,
    /// School or institution
    pub school: Option<String>,
    /// Grade or year of study
    pub grade: Option<String>,
    /// `beginner`, `intermediate` or `advanced`
    pub experience: Option<String>,
    /// Preferred position
    pub position: Option<String>,
    /// Committee codes
    pub committees: Option<Vec<String>>,
    /// Dietary requirements
    pub dietary: Option<String>,
    /// Accommodation needs
    pub accommodation: Option<String>,
    /// Suggestions
    pub suggestions: Option<String>,
    /// Terms accepted
    pub terms: Option<bool>,
    /// Newsletter opt-in
    pub newsletter: Option<bool>,
    /// `pending`, `confirmed` or `rejected`
    pub status: Option<String>,
}

impl PatchInput {
    /// Checks each supplied field against the creation rules.
    pub fn validate(self, policy: &ValidationPolicy) -> Result<RegistrationPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut patch = RegistrationPatch::default();

        if self.first_name.is_some() {
            patch.first_name = Some(required(&mut errors, "firstName", MSG_FIRST_NAME, self.first_name));
        }
        if self.last_name.is_some() {
            patch.last_name = Some(required(&mut errors, "lastName", MSG_LAST_NAME, self.last_name));
        }
        if let Some(email) = self.email {
            let email = email.trim().to_string();
            check_email(&mut errors, policy, &email);
            patch.email = Some(email);
        }
        if self.school.is_some() {
            patch.school = match non_blank(self.school) {
                Some(s) => Some(s),
                None if policy.require_school => {
                    errors.push("school", MSG_SCHOOL);
                    None
                }
                None => Some(policy.default_school.clone()),
            };
        }
        if self.grade.is_some() {
            patch.grade = Some(required(&mut errors, "grade", MSG_GRADE, self.grade));
        }
        if self.experience.is_some() {
            match non_blank(self.experience) {
                Some(raw) => match raw.parse::<Experience>() {
                    Ok(e) => patch.experience = Some(e),
                    Err(_) => errors.push("experience", MSG_EXPERIENCE_UNKNOWN),
                },
                None if policy.require_experience => {
                    errors.push("experience", MSG_EXPERIENCE_REQUIRED)
                }
                None => {}
            }
        }
        if self.position.is_some() {
            patch.position = Some(required(&mut errors, "position", MSG_POSITION, self.position));
        }
        if let Some(codes) = self.committees {
            patch.committees = Some(clean_committees(&mut errors, codes));
        }
        if let Some(terms) = self.terms {
            if !terms {
                errors.push("terms", MSG_TERMS);
            }
            patch.terms = Some(terms);
        }
        if let Some(raw) = self.status {
            match raw.trim().parse::<RegistrationStatus>() {
                Ok(status) => patch.status = Some(status),
                Err(_) => errors.push("status", MSG_STATUS),
            }
        }

        // Present but blank clears the stored value
        patch.phone = self.phone.map(|v| non_blank(Some(v)));
        patch.dietary = self.dietary.map(|v| non_blank(Some(v)));
        patch.accommodation = self.accommodation.map(|v| non_blank(Some(v)));
        patch.suggestions = self.suggestions.map(|v| non_blank(Some(v)));
        patch.newsletter = self.newsletter;

        errors.into_result(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn ana() -> RegistrationInput {
        serde_json::from_value(serde_json::json!({
            "firstName": "Ana",
            "lastName": "Lee",
            "grade": "11",
            "position": "delegate",
            "committees": ["UNSC"],
        }))
        .unwrap()
    }

    #[test]
    fn test_minimal_lenient_payload_accepted() {
        let new = ana().validate(&ValidationPolicy::lenient()).unwrap();
        assert_eq!(new.first_name, "Ana");
        assert_eq!(new.email, "");
        assert_eq!(new.school, "");
        assert_eq!(new.experience, None);
        assert_eq!(new.committees, vec!["UNSC".to_string()]);
        assert!(!new.terms);
        assert!(!new.newsletter);
    }

    #[test]
    fn test_default_school_applied() {
        let policy = ValidationPolicy::lenient().with_default_school("Independent");
        let new = ana().validate(&policy).unwrap();
        assert_eq!(new.school, "Independent");
    }

    #[test]
    fn test_strict_reports_every_missing_field() {
        let errors = ana().validate(&ValidationPolicy::strict()).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("school"));
        assert!(errors.has_field("experience"));
        assert!(errors.has_field("terms"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_empty_payload_collects_all_violations() {
        let errors = RegistrationInput::default()
            .validate(&ValidationPolicy::lenient())
            .unwrap_err();
        let fields: Vec<&str> = errors.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["firstName", "lastName", "grade", "position", "committees"]
        );
        assert_eq!(errors.violations()[0].message, "First name is required");
    }

    #[test_case("firstName", serde_json::json!("  ") ; "blank first name")]
    #[test_case("lastName", serde_json::json!("") ; "empty last name")]
    #[test_case("grade", serde_json::json!("") ; "empty grade")]
    #[test_case("position", serde_json::json!(" ") ; "blank position")]
    #[test_case("committees", serde_json::json!([]) ; "no committees")]
    #[test_case("committees", serde_json::json!(["UNSC", " "]) ; "blank committee code")]
    #[test_case("email", serde_json::json!("not-an-email") ; "malformed email")]
    #[test_case("experience", serde_json::json!("expert") ; "unknown experience")]
    #[test_case("terms", serde_json::json!(false) ; "terms declined")]
    fn test_single_violation(field: &str, value: serde_json::Value) {
        let mut body = serde_json::to_value(serde_json::json!({
            "firstName": "Ana",
            "lastName": "Lee",
            "grade": "11",
            "position": "delegate",
            "committees": ["UNSC"],
        }))
        .unwrap();
        body[field] = value;

        let input: RegistrationInput = serde_json::from_value(body).unwrap();
        let errors = input.validate(&ValidationPolicy::lenient()).unwrap_err();
        assert_eq!(errors.len(), 1, "{}", errors);
        assert!(errors.has_field(field));
    }

    #[test]
    fn test_committees_deduplicated() {
        let mut input = ana();
        input.committees = Some(vec!["UNSC".into(), " WHO ".into(), "UNSC".into()]);
        let new = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert_eq!(new.committees, vec!["UNSC".to_string(), "WHO".to_string()]);
    }

    #[test]
    fn test_optional_text_blank_becomes_none() {
        let mut input = ana();
        input.phone = Some("   ".into());
        input.dietary = Some("vegan".into());
        let new = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert_eq!(new.phone, None);
        assert_eq!(new.dietary.as_deref(), Some("vegan"));
    }

    #[test_case("ana@example.org", true)]
    #[test_case("a.b+c@mail.example.co", true)]
    #[test_case("ana@localhost", false)]
    #[test_case("@example.org", false)]
    #[test_case("ana@@example.org", false)]
    #[test_case("ana@example..org", false)]
    #[test_case("ana lee@example.org", false)]
    #[test_case("", false)]
    fn test_email_shape(email: &str, valid: bool) {
        assert_eq!(is_valid_email(email), valid);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::strict());
        assert_eq!("Lenient".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::lenient());
        assert!("loose".parse::<ValidationPolicy>().is_err());
        assert_eq!(ValidationPolicy::strict().mode(), "strict");
        assert_eq!(ValidationPolicy::default().mode(), "lenient");
    }

    #[test]
    fn test_patch_status_only() {
        let input: PatchInput = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        let patch = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert_eq!(patch, RegistrationPatch::status(RegistrationStatus::Confirmed));
    }

    #[test]
    fn test_patch_ignores_identity_fields() {
        let input: PatchInput =
            serde_json::from_str(r#"{"id":99,"createdAt":"2020-01-01T00:00:00Z"}"#).unwrap();
        let patch = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_null_is_untouched() {
        let input: PatchInput = serde_json::from_str(r#"{"firstName":null,"phone":null}"#).unwrap();
        let patch = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_blank_optional_text_clears() {
        let input: PatchInput =
            serde_json::from_str(r#"{"dietary":"","phone":"  ","suggestions":" more breaks "}"#)
                .unwrap();
        let patch = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert_eq!(patch.dietary, Some(None));
        assert_eq!(patch.phone, Some(None));
        assert_eq!(patch.suggestions, Some(Some("more breaks".into())));
        assert_eq!(patch.accommodation, None);
    }

    #[test]
    fn test_patch_violations() {
        let input: PatchInput = serde_json::from_value(serde_json::json!({
            "firstName": "",
            "committees": [],
            "status": "archived",
            "email": "nope",
            "terms": false,
        }))
        .unwrap();
        let errors = input.validate(&ValidationPolicy::lenient()).unwrap_err();
        for field in ["firstName", "committees", "status", "email", "terms"] {
            assert!(errors.has_field(field), "missing {}", field);
        }
    }

    #[test]
    fn test_patch_email_may_be_cleared_when_optional() {
        let input: PatchInput = serde_json::from_str(r#"{"email":""}"#).unwrap();
        let patch = input.validate(&ValidationPolicy::lenient()).unwrap();
        assert_eq!(patch.email.as_deref(), Some(""));

        let input: PatchInput = serde_json::from_str(r#"{"email":""}"#).unwrap();
        assert!(input.validate(&ValidationPolicy::strict()).is_err());
    }

    #[test]
    fn test_display_lists_fields() {
        let errors = RegistrationInput::default()
            .validate(&ValidationPolicy::lenient())
            .unwrap_err();
        let text = errors.to_string();
        assert!(text.starts_with("firstName: First name is required"));
        assert!(text.contains("; committees: "));
    }

    proptest! {
        #[test]
        fn prop_email_without_at_is_invalid(s in "[^@]*") {
            prop_assert!(!is_valid_email(&s));
        }

        #[test]
        fn prop_simple_addresses_are_valid(
            local in "[a-z0-9]{1,12}",
            domain in "[a-z]{1,12}",
            tld in "[a-z]{2,6}",
        ) {
            let email = format!("{}@{}.{}", local, domain, tld);
            prop_assert!(is_valid_email(&email));
        }
    }
}
