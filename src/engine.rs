//! Dashboard state: the record set, the active selections and memoized aggregations.
//!
//! Every event handler is synchronous; the engine never performs I/O. Upstream data is
//! handed in through [`Dashboard::load`] and [`Dashboard::set_department_index`].

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::academic_year::{self, AcademicYear};
use crate::aggregate;
use crate::departments::{self, DepartmentIndex};
use crate::dimension::Dimension;
use crate::enumerate::{self, EnumerationScope};
use crate::filter::{self, FilterState, Scope};
use crate::models::{Bucket, OptionCount, OutcomeTotals, SurveyRecord, WordFrequency};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    Error(String),
    /// Data loaded but nothing matches the current selection.
    Empty,
    Ready,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Loading => f.write_str("loading"),
            Status::Error(message) => write!(f, "error: {message}"),
            Status::Empty => f.write_str("no data for this selection"),
            Status::Ready => f.write_str("ready"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    version: u64,
    selection: u64,
}

/// Per-dimension aggregations for one (record set version, selection) pair.
#[derive(Debug, Default)]
struct AggregationCache {
    key: Option<CacheKey>,
    buckets: HashMap<Dimension, Vec<Bucket>>,
}

impl AggregationCache {
    fn get_or_insert_with<F>(&mut self, key: CacheKey, dimension: Dimension, compute: F) -> &[Bucket]
    where
        F: FnOnce() -> Vec<Bucket>,
    {
        if self.key != Some(key) {
            self.buckets.clear();
            self.key = Some(key);
        }

        if self.buckets.contains_key(&dimension) {
            debug!(%dimension, "Aggregation cache hit");
        }
        self.buckets.entry(dimension).or_insert_with(compute)
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }
}

#[derive(Debug)]
pub struct Dashboard {
    raw: Vec<SurveyRecord>,
    records: Vec<SurveyRecord>,
    version: u64,
    scope: Scope,
    filters: FilterState,
    departments: Vec<String>,
    index: DepartmentIndex,
    loading: bool,
    error: Option<String>,
    today: NaiveDate,
    cache: AggregationCache,
}

impl Dashboard {
    /// Starts in the loading state, looking at the academic year containing `today`.
    pub fn new(today: NaiveDate, university: impl Into<String>) -> Self {
        let university = university.into();
        Self {
            raw: Vec::new(),
            records: Vec::new(),
            version: 0,
            scope: Scope::new(AcademicYear::of_date(today), university.clone()),
            filters: FilterState::new(),
            departments: Vec::new(),
            index: DepartmentIndex::build(&university, &Default::default()),
            loading: true,
            error: None,
            today,
            cache: AggregationCache::default(),
        }
    }

    /// Marks a fetch in flight; the old records stay visible until [`Dashboard::load`].
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Replaces the record set with a fetch result. A failed fetch leaves an empty, consistent set.
    pub fn load<E: fmt::Display>(&mut self, result: Result<Vec<SurveyRecord>, E>) {
        self.loading = false;
        match result {
            Ok(records) => {
                let unparseable = records
                    .iter()
                    .filter(|r| academic_year::resolve(&r.captured_at).is_none())
                    .count();
                if unparseable > 0 {
                    warn!(
                        unparseable,
                        "Records with unreadable capture dates are hidden from year views"
                    );
                }
                info!(records = records.len(), "Loaded survey records");

                self.raw = records;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load survey records");
                self.raw.clear();
                self.error = Some(e.to_string());
            }
        }
        self.reannotate();
    }

    pub fn set_department_index(&mut self, index: DepartmentIndex) {
        self.index = index;
        self.departments
            .retain(|dept| self.index.department_names().any(|name| name == dept));
        self.reannotate();
    }

    fn reannotate(&mut self) {
        self.records = departments::annotate(&self.raw, &self.index);
        self.version += 1;
        debug!(version = self.version, "Record set re-derived");
    }

    pub fn on_filter_change<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.set(dimension, values);
        debug!(%dimension, selected = self.filters.selected(dimension).len(), "Filter changed");
    }

    pub fn on_year_change(&mut self, year: AcademicYear) {
        debug!(%year, "Year changed");
        self.scope.year = year;
    }

    /// Switches university: department and course selections are cleared, other filters stay.
    pub fn on_university_change(&mut self, university: impl Into<String>) {
        let university = university.into();
        if university == self.scope.university {
            return;
        }

        debug!(from = %self.scope.university, to = %university, "University changed");
        self.scope.university = university;
        self.departments.clear();
        self.filters.clear(Dimension::CourseOfStudy);

        if self.index.university() != self.scope.university {
            self.index = DepartmentIndex::build(&self.scope.university, &Default::default());
            self.reannotate();
        }
    }

    /// Selecting departments replaces the course filter with all of their courses.
    /// Names missing from the index are dropped.
    pub fn on_department_change<I, S>(&mut self, departments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (known, unknown): (Vec<String>, Vec<String>) = departments
            .into_iter()
            .map(Into::into)
            .partition(|dept| self.index.department_names().any(|name| name == dept));
        if !unknown.is_empty() {
            warn!(?unknown, university = %self.index.university(), "Ignoring unknown departments");
        }

        self.departments = known;
        let courses = self.index.courses_for(&self.departments);
        self.filters.set(Dimension::CourseOfStudy, courses);
    }

    /// "Select all" on a filter control: toggles between every candidate and none.
    pub fn toggle_all(&mut self, dimension: Dimension) {
        let candidates =
            enumerate::candidate_values(&self.records, dimension, &self.enumeration_scope());
        self.filters.toggle_all(dimension, &candidates);
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn selected_departments(&self) -> &[String] {
        &self.departments
    }

    pub fn department_index(&self) -> &DepartmentIndex {
        &self.index
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    pub fn filtered_records(&self) -> Vec<&SurveyRecord> {
        filter::filter_records(&self.records, &self.filters, &self.scope)
    }

    pub fn status(&self) -> Status {
        if self.loading {
            Status::Loading
        } else if let Some(message) = &self.error {
            Status::Error(message.clone())
        } else if self.filtered_records().is_empty() {
            Status::Empty
        } else {
            Status::Ready
        }
    }

    fn cache_key(&self) -> CacheKey {
        let mut hasher = DefaultHasher::new();
        self.scope.hash(&mut hasher);
        self.filters.hash(&mut hasher);
        CacheKey {
            version: self.version,
            selection: hasher.finish(),
        }
    }

    pub fn aggregate(&mut self, dimension: Dimension) -> &[Bucket] {
        let key = self.cache_key();
        let (records, filters, scope) = (&self.records, &self.filters, &self.scope);
        self.cache.get_or_insert_with(key, dimension, || {
            aggregate::aggregate(&filter::filter_records(records, filters, scope), dimension)
        })
    }

    pub fn cached_dimensions(&self) -> usize {
        self.cache.len()
    }

    pub fn word_cloud(&self, dimension: Dimension) -> Vec<WordFrequency> {
        aggregate::word_cloud(&self.filtered_records(), dimension)
    }

    pub fn outcome_totals(&self) -> OutcomeTotals {
        aggregate::outcome_totals(&self.filtered_records())
    }

    fn enumeration_scope(&self) -> EnumerationScope<'_> {
        EnumerationScope {
            scope: &self.scope,
            filters: &self.filters,
            departments: &self.departments,
            index: &self.index,
        }
    }

    pub fn enumerate(&self, dimension: Dimension) -> Vec<OptionCount> {
        enumerate::enumerate(&self.records, dimension, &self.enumeration_scope())
    }

    pub fn department_counts(&self) -> BTreeMap<String, usize> {
        departments::department_counts(&self.records, &self.scope.university)
    }

    pub fn academic_years(&self) -> Vec<AcademicYear> {
        academic_year::list_academic_years(&self.raw, self.today)
    }
}
