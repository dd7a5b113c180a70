//! CSV export of registrations.
//!
//! Produces the spreadsheet organisers download from the admin dashboard.

use crate::constants::EXPORT_HEADER;
use crate::types::Registration;

/// Quotes a field when it contains a delimiter, quote, or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One CSV row, without the trailing newline.
pub fn csv_row(registration: &Registration) -> String {
    let experience = registration
        .experience
        .map(|e| e.as_str())
        .unwrap_or_default();
    let committees = registration.committees.join(", ");
    let date = registration.created_at.format("%Y-%m-%d").to_string();

    [
        registration.full_name().as_str(),
        registration.email.as_str(),
        registration.school.as_str(),
        registration.grade.as_str(),
        experience,
        registration.position.as_str(),
        committees.as_str(),
        registration.status.as_str(),
        date.as_str(),
    ]
    .iter()
    .map(|field| csv_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Header plus one row per registration, in the given order.
pub fn registrations_to_csv(registrations: &[Registration]) -> String {
    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');
    for reg in registrations {
        out.push_str(&csv_row(reg));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Experience, NewRegistration, RegistrationStatus};
    use chrono::{TimeZone, Utc};

    fn registration() -> Registration {
        let mut reg = NewRegistration {
            first_name: "Ana".into(),
            last_name: "Lee".into(),
            email: "ana@example.org".into(),
            phone: None,
            school: "St. Mary's, Downtown".into(),
            grade: "11".into(),
            experience: Some(Experience::Advanced),
            position: "delegate".into(),
            committees: vec!["UNSC".into(), "WHO".into()],
            dietary: None,
            accommodation: None,
            suggestions: None,
            terms: true,
            newsletter: false,
        }
        .into_registration(1, Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap());
        reg.status = RegistrationStatus::Confirmed;
        reg
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_row() {
        assert_eq!(
            csv_row(&registration()),
            "Ana Lee,ana@example.org,\"St. Mary's, Downtown\",11,advanced,delegate,\"UNSC, WHO\",confirmed,2025-03-14"
        );
    }

    #[test]
    fn test_missing_experience_is_empty_column() {
        let mut reg = registration();
        reg.experience = None;
        reg.committees = vec!["UNSC".into()];
        assert!(csv_row(&reg).contains(",11,,delegate,UNSC,"));
    }

    #[test]
    fn test_registrations_to_csv() {
        let csv = registrations_to_csv(&[registration(), registration()]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], EXPORT_HEADER);
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_empty_export_has_header() {
        assert_eq!(registrations_to_csv(&[]), format!("{}\n", EXPORT_HEADER));
    }
}
