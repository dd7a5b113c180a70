//! Service constants for MUNREG.
//!
//! Defaults shared by the API server and the CLI, plus the committee
//! catalog offered on the public registration form.

// ═══════════════════════════════════════════════════════════════════════════════
// SERVER DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Port the API server listens on when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5000;

/// Bind address used when `HOST` is not set.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Maximum accepted request body size (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Request log lines longer than this are truncated.
pub const LOG_LINE_LIMIT: usize = 80;

/// Largest response body the request log reads back; bigger bodies are
/// logged without their content.
pub const LOG_BODY_BUFFER_LIMIT: usize = 64 * 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRATION DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// First identifier handed out by a fresh store.
pub const FIRST_ID: u64 = 1;

/// File name suggested for CSV exports.
pub const EXPORT_FILE_NAME: &str = "mun-registrations.csv";

/// Header row of the CSV export.
pub const EXPORT_HEADER: &str =
    "Name,Email,School,Grade,Experience,Position,Committees,Status,Registration Date";

// ═══════════════════════════════════════════════════════════════════════════════
// COMMITTEE CATALOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Committees offered on the registration form as `(code, label)` pairs.
///
/// Registrations are not restricted to these codes; the catalog only drives
/// the form and the `/api/committees` endpoint.
pub const COMMITTEES: &[(&str, &str)] = &[
    ("AIPPM", "All India Political Parties Meet (AIPPM)"),
    ("LSabha", "Lok Sabha (House of the People)"),
    ("RSabha", "Rajya Sabha (Council of States)"),
    ("NITI", "NITI Aayog (National Institution for Transforming India)"),
    ("UNSC", "United Nations Security Council (UNSC)"),
    ("UNGA", "United Nations General Assembly (UNGA)"),
    ("ECOSOC", "Economic and Social Council (ECOSOC)"),
    ("WHO", "World Health Organization (WHO)"),
    ("UNICEF", "United Nations Children's Fund (UNICEF)"),
    (
        "UNESCO",
        "United Nations Educational, Scientific and Cultural Organization (UNESCO)",
    ),
    ("UNHRC", "United Nations Human Rights Council (UNHRC)"),
    ("DISEC", "Disarmament and International Security Committee (DISEC)"),
];

/// Returns the label for a committee code, if it is in the catalog.
pub fn committee_label(code: &str) -> Option<&'static str> {
    COMMITTEES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}
