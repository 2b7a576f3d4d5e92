//! Stored reports and the persistence seam.
//!
//! Rendering never talks to a database. It asks a [`ReportStore`] for the
//! record and for whoever is making the request, and nothing else.
//! [`InMemoryReportStore`] backs the CLI and the tests.

use crate::error::ReportError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// The person a report is rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub id: u64,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl PatientIdentity {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            age: None,
            gender: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// `"<age> / <gender>"`, with `N/A` for unknown parts.
    pub fn age_sex(&self) -> String {
        format!(
            "{} / {}",
            self.age.map_or_else(|| "N/A".to_string(), |a| a.to_string()),
            self.gender.as_deref().unwrap_or("N/A")
        )
    }
}

/// One stored analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: u64,
    pub owner_id: u64,
    /// Display label of the checkup, e.g. `Dengue Fever`.
    pub checkup_type: String,
    pub timestamp: NaiveDateTime,
    /// Cleaned model output in the report tag vocabulary. May be empty.
    pub ai_content: Option<String>,
}

/// Read access to stored reports and the requesting user.
pub trait ReportStore {
    fn fetch_report_by_id(&self, id: u64) -> Result<Option<ReportRecord>, ReportError>;

    fn current_user_identity(&self) -> Result<PatientIdentity, ReportError>;
}

/// Map-backed store with a fixed current user.
#[derive(Debug)]
pub struct InMemoryReportStore {
    current: PatientIdentity,
    reports: RwLock<BTreeMap<u64, ReportRecord>>,
}

fn poisoned() -> ReportError {
    ReportError::Internal("report store lock poisoned".into())
}

impl InMemoryReportStore {
    pub fn new(current: PatientIdentity) -> Self {
        Self {
            current,
            reports: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store a new report owned by `owner_id` and return it with its id.
    /// Ids start at 1 and increase.
    pub fn insert(
        &self,
        owner_id: u64,
        checkup_type: impl Into<String>,
        ai_content: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Result<ReportRecord, ReportError> {
        let mut reports = self.reports.write().map_err(|_| poisoned())?;
        let id = reports.keys().next_back().map_or(1, |last| last + 1);
        let record = ReportRecord {
            id,
            owner_id,
            checkup_type: checkup_type.into(),
            timestamp,
            ai_content: Some(ai_content.into()),
        };
        reports.insert(id, record.clone());
        Ok(record)
    }

    /// Store `record` under its own id, replacing any previous one.
    pub fn put(&self, record: ReportRecord) -> Result<(), ReportError> {
        self.reports
            .write()
            .map_err(|_| poisoned())?
            .insert(record.id, record);
        Ok(())
    }
}

impl ReportStore for InMemoryReportStore {
    fn fetch_report_by_id(&self, id: u64) -> Result<Option<ReportRecord>, ReportError> {
        Ok(self.reports.read().map_err(|_| poisoned())?.get(&id).cloned())
    }

    fn current_user_identity(&self) -> Result<PatientIdentity, ReportError> {
        Ok(self.current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn age_sex_formatting() {
        let p = PatientIdentity::new(1, "Asha").with_age(34).with_gender("Female");
        assert_eq!(p.age_sex(), "34 / Female");
        assert_eq!(PatientIdentity::new(2, "X").age_sex(), "N/A / N/A");
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = InMemoryReportStore::new(PatientIdentity::new(1, "A"));
        let a = store.insert(1, "Malaria", "<h3>x</h3>", ts()).unwrap();
        let b = store.insert(1, "Typhoid", "", ts()).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.fetch_report_by_id(2).unwrap(), Some(b));
        assert_eq!(store.fetch_report_by_id(9).unwrap(), None);
    }

    #[test]
    fn put_keeps_explicit_id() {
        let store = InMemoryReportStore::new(PatientIdentity::new(1, "A"));
        store
            .put(ReportRecord {
                id: 42,
                owner_id: 7,
                checkup_type: "Other".into(),
                timestamp: ts(),
                ai_content: None,
            })
            .unwrap();
        assert_eq!(store.fetch_report_by_id(42).unwrap().unwrap().owner_id, 7);
        assert_eq!(store.insert(1, "x", "y", ts()).unwrap().id, 43);
    }

    #[test]
    fn record_round_trips_json() {
        let r = ReportRecord {
            id: 3,
            owner_id: 1,
            checkup_type: "General Checkup".into(),
            timestamp: ts(),
            ai_content: Some("<p>ok</p>".into()),
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("2024-03-05T10:30:00"));
        let back: ReportRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
