use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::academic_year::{self, AcademicYear};
use crate::dimension::Dimension;
use crate::models::{FieldValue, SurveyRecord};
use crate::{Error, Result};

pub const ALL_UNIVERSITIES: &str = "All";

/// Year and university the dashboard is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub year: AcademicYear,
    pub university: String,
}

impl Scope {
    pub fn new(year: AcademicYear, university: impl Into<String>) -> Self {
        Self {
            year,
            university: university.into(),
        }
    }

    pub fn all_universities(&self) -> bool {
        self.university == ALL_UNIVERSITIES
    }

    pub fn contains(&self, record: &SurveyRecord) -> bool {
        let in_year = academic_year::resolve(&record.captured_at) == Some(self.year);
        in_year && (self.all_universities() || record.source == self.university)
    }
}

/// Selected values per dimension; a missing or empty selection means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    selections: BTreeMap<Dimension, Vec<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self, dimension: Dimension) -> &[String] {
        self.selections
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_unrestricted(&self) -> bool {
        self.selections.values().all(Vec::is_empty)
    }

    pub fn set<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }

        if deduped.is_empty() {
            self.selections.remove(&dimension);
        } else {
            self.selections.insert(dimension, deduped);
        }
    }

    pub fn add(&mut self, dimension: Dimension, value: impl Into<String>) {
        let value = value.into();
        let values = self.selections.entry(dimension).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn clear(&mut self, dimension: Dimension) {
        self.selections.remove(&dimension);
    }

    /// "Select all" control: clears when every candidate is already selected.
    pub fn toggle_all(&mut self, dimension: Dimension, candidates: &[String]) {
        let selected = self.selected(dimension);
        if !selected.is_empty() && candidates.iter().all(|c| selected.contains(c)) {
            self.clear(dimension);
        } else {
            self.set(dimension, candidates.iter().cloned());
        }
    }

    pub fn with_only(&self, dimension: Dimension, value: &str) -> Self {
        let mut hypothetical = self.clone();
        hypothetical.set(dimension, [value]);
        hypothetical
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &[String])> {
        self.selections
            .iter()
            .map(|(dimension, values)| (*dimension, values.as_slice()))
    }

    /// Parses a `dimension=value` CLI expression into this state.
    pub fn apply_expression(&mut self, expression: &str) -> Result<()> {
        let (key, value) = expression
            .split_once('=')
            .ok_or_else(|| Error::InvalidFilter(expression.to_string()))?;
        let dimension: Dimension = key.trim().parse()?;
        if value.is_empty() {
            return Err(Error::InvalidFilter(expression.to_string()));
        }
        self.add(dimension, value);
        Ok(())
    }

    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Course names compare without case, like the department lookup.
pub fn same_course(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Inclusion test: record is in scope and passes every per-dimension selection.
pub fn matches(record: &SurveyRecord, filters: &FilterState, scope: &Scope) -> bool {
    scope.contains(record)
        && filters.iter().all(|(dimension, allowed)| {
            allowed.is_empty() || {
                let value = record.field(dimension);
                allowed.iter().any(|selected| match (dimension, value) {
                    (Dimension::CourseOfStudy, FieldValue::Text(course)) => {
                        same_course(course, selected)
                    }
                    _ => value.matches(selected),
                })
            }
        })
}

pub fn filter_records<'a>(
    records: &'a [SurveyRecord],
    filters: &FilterState,
    scope: &Scope,
) -> Vec<&'a SurveyRecord> {
    records
        .iter()
        .filter(|record| matches(record, filters, scope))
        .collect()
}
