//! Dashboard queries: list parameters, filters, and statistics.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::registration::{Experience, Registration, RegistrationStatus};
use crate::error::Result;
use crate::traits::RegistrationStore;

/// List parameters as sent by the admin dashboard.
///
/// A search term wins over the filters; otherwise experience and committee
/// are combined; with neither, every registration is listed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RegistrationQuery {
    /// Free-text search over name, email, and school
    pub search: Option<String>,
    /// Experience level (`beginner`, `intermediate`, `advanced`)
    pub experience: Option<String>,
    /// Committee code
    pub committee: Option<String>,
}

/// What a [`RegistrationQuery`] resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryPlan {
    /// Every registration
    All,
    /// Search only; filters are ignored
    Search(String),
    /// Combined filter
    Filter(RegistrationFilter),
    /// A criterion no registration can satisfy (unknown experience level)
    NoMatch,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RegistrationQuery {
    /// Query with only a search term.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// Resolves precedence. Blank values count as absent.
    pub fn plan(&self) -> QueryPlan {
        if let Some(term) = present(&self.search) {
            return QueryPlan::Search(term.to_string());
        }

        let committee = present(&self.committee).map(str::to_string);
        let experience = match present(&self.experience) {
            Some(raw) => match raw.parse::<Experience>() {
                Ok(e) => Some(e),
                Err(_) => return QueryPlan::NoMatch,
            },
            None => None,
        };

        let filter = RegistrationFilter {
            experience,
            committee,
        };
        if filter.is_empty() {
            QueryPlan::All
        } else {
            QueryPlan::Filter(filter)
        }
    }

    /// Runs the query against a store, newest first.
    pub async fn execute(&self, store: &dyn RegistrationStore) -> Result<Vec<Registration>> {
        match self.plan() {
            QueryPlan::All => store.get_registrations().await,
            QueryPlan::Search(term) => store.search_registrations(&term).await,
            QueryPlan::Filter(filter) => store.filter_registrations(&filter).await,
            QueryPlan::NoMatch => Ok(Vec::new()),
        }
    }
}

/// Admin dashboard filter. Every supplied criterion must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationFilter {
    /// Exact experience level
    pub experience: Option<Experience>,
    /// Committee code that must appear in the registration's committees
    pub committee: Option<String>,
}

impl RegistrationFilter {
    /// Filter on experience only.
    pub fn experience(experience: Experience) -> Self {
        Self {
            experience: Some(experience),
            committee: None,
        }
    }

    /// Filter on committee only.
    pub fn committee(code: impl Into<String>) -> Self {
        Self {
            experience: None,
            committee: Some(code.into()),
        }
    }

    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.experience.is_none() && self.committee.is_none()
    }

    /// Returns true if the registration satisfies every criterion.
    pub fn matches(&self, registration: &Registration) -> bool {
        if let Some(experience) = self.experience {
            if registration.experience != Some(experience) {
                return false;
            }
        }
        if let Some(code) = &self.committee {
            if !registration.has_committee(code) {
                return false;
            }
        }
        true
    }
}

/// Counters shown on the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStats {
    /// Number of stored registrations
    pub total: u64,
    /// Registrations with status `confirmed`
    pub confirmed: u64,
    /// Registrations with status `pending`
    pub pending: u64,
    /// Registrations with status `rejected`
    pub rejected: u64,
    /// Distinct committee codes across all registrations
    pub committees: u64,
}

impl RegistrationStats {
    /// Computes the counters over a set of registrations.
    pub fn from_registrations(registrations: &[Registration]) -> Self {
        let mut stats = Self::default();
        let mut committees: HashSet<&str> = HashSet::new();

        for reg in registrations {
            stats.total += 1;
            match reg.status {
                RegistrationStatus::Pending => stats.pending += 1,
                RegistrationStatus::Confirmed => stats.confirmed += 1,
                RegistrationStatus::Rejected => stats.rejected += 1,
            }
            committees.extend(reg.committees.iter().map(String::as_str));
        }

        stats.committees = committees.len() as u64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::registration::tests::sample;

    fn query(search: &str, experience: &str, committee: &str) -> RegistrationQuery {
        let opt = |s: &str| Some(s.to_string());
        RegistrationQuery {
            search: opt(search),
            experience: opt(experience),
            committee: opt(committee),
        }
    }

    #[test]
    fn test_plan_search_takes_precedence() {
        assert_eq!(
            query("lee", "advanced", "UNSC").plan(),
            QueryPlan::Search("lee".into())
        );
    }

    #[test]
    fn test_plan_combines_filters() {
        assert_eq!(
            query("", "advanced", "UNSC").plan(),
            QueryPlan::Filter(RegistrationFilter {
                experience: Some(Experience::Advanced),
                committee: Some("UNSC".into()),
            })
        );
        assert_eq!(
            query(" ", "", "WHO").plan(),
            QueryPlan::Filter(RegistrationFilter::committee("WHO"))
        );
    }

    #[test]
    fn test_plan_blank_is_all() {
        assert_eq!(RegistrationQuery::default().plan(), QueryPlan::All);
        assert_eq!(query("", " ", "").plan(), QueryPlan::All);
    }

    #[test]
    fn test_plan_unknown_experience_matches_nothing() {
        assert_eq!(query("", "expert", "").plan(), QueryPlan::NoMatch);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = RegistrationFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&sample(1)));
    }

    #[test]
    fn test_filters_are_anded() {
        let mut reg = sample(1);
        reg.experience = Some(Experience::Advanced);
        reg.committees = vec!["UNSC".into(), "WHO".into()];

        assert!(RegistrationFilter::experience(Experience::Advanced).matches(&reg));
        assert!(RegistrationFilter::committee("WHO").matches(&reg));

        let both = RegistrationFilter {
            experience: Some(Experience::Advanced),
            committee: Some("UNGA".into()),
        };
        assert!(!both.matches(&reg));

        let both = RegistrationFilter {
            experience: Some(Experience::Advanced),
            committee: Some("UNSC".into()),
        };
        assert!(both.matches(&reg));
    }

    #[test]
    fn test_missing_experience_never_matches() {
        let mut reg = sample(1);
        reg.experience = None;
        assert!(!RegistrationFilter::experience(Experience::Beginner).matches(&reg));
    }

    #[test]
    fn test_committee_match_is_exact() {
        let reg = sample(1);
        assert!(!RegistrationFilter::committee("unsc").matches(&reg));
        assert!(!RegistrationFilter::committee("UNS").matches(&reg));
    }

    #[test]
    fn test_stats() {
        let mut a = sample(1);
        a.status = RegistrationStatus::Confirmed;
        a.committees = vec!["UNSC".into(), "WHO".into()];
        let mut b = sample(2);
        b.committees = vec!["WHO".into()];
        let mut c = sample(3);
        c.status = RegistrationStatus::Rejected;

        let stats = RegistrationStats::from_registrations(&[a, b, c]);
        assert_eq!(
            stats,
            RegistrationStats {
                total: 3,
                confirmed: 1,
                pending: 1,
                rejected: 1,
                committees: 2,
            }
        );
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(
            RegistrationStats::from_registrations(&[]),
            RegistrationStats::default()
        );
    }
}
