//! Candidate values for filter controls, with live "would match" counts.

use std::collections::HashSet;

use crate::aggregate::AGE_BANDS;
use crate::departments::DepartmentIndex;
use crate::dimension::{Dimension, Kind};
use crate::filter::{self, FilterState, Scope};
use crate::models::{FieldValue, OptionCount, SurveyRecord};

/// Narrower scope than full filtering: only year, university and course/department selection.
#[derive(Debug, Clone, Copy)]
pub struct EnumerationScope<'a> {
    pub scope: &'a Scope,
    pub filters: &'a FilterState,
    pub departments: &'a [String],
    pub index: &'a DepartmentIndex,
}

impl EnumerationScope<'_> {
    fn admits(&self, record: &SurveyRecord, dimension: Dimension) -> bool {
        if !self.scope.contains(record) {
            return false;
        }

        // the course control lists alternatives to the current course selection
        let courses = self.filters.selected(Dimension::CourseOfStudy);
        if dimension != Dimension::CourseOfStudy
            && !courses.is_empty()
            && !courses
                .iter()
                .any(|course| filter::same_course(course, &record.course_of_study))
        {
            return false;
        }

        self.departments.is_empty()
            || self
                .departments
                .iter()
                .any(|dept| self.index.contains_course(dept, &record.course_of_study))
    }
}

/// Distinct usable values of one dimension within the enumeration scope.
pub fn candidate_values(
    records: &[SurveyRecord],
    dimension: Dimension,
    scope: &EnumerationScope<'_>,
) -> Vec<String> {
    if dimension == Dimension::CourseOfStudy && !scope.departments.is_empty() {
        return scope.index.courses_for(scope.departments);
    }

    let descriptor = dimension.descriptor();
    let max_age = AGE_BANDS[AGE_BANDS.len() - 1].2;
    let mut seen = HashSet::new();
    let mut texts: Vec<String> = Vec::new();
    let mut numbers: Vec<i64> = Vec::new();

    for record in records.iter().filter(|r| scope.admits(r, dimension)) {
        match record.field(dimension) {
            FieldValue::Number(n) => {
                let out_of_range = dimension == Dimension::Age && !(0..=max_age).contains(&n);
                if !descriptor.is_excluded_number(n) && !out_of_range && seen.insert(n.to_string()) {
                    numbers.push(n);
                }
            }
            FieldValue::Text(text) => {
                if !descriptor.is_excluded_text(text) && seen.insert(text.to_string()) {
                    texts.push(text.to_string());
                }
            }
        }
    }

    if descriptor.kind == Kind::Numeric {
        numbers.sort_unstable();
        numbers.into_iter().map(|n| n.to_string()).collect()
    } else {
        texts
    }
}

/// Options for one filter control; each count is the filtered size if only that value were picked.
pub fn enumerate(
    records: &[SurveyRecord],
    dimension: Dimension,
    scope: &EnumerationScope<'_>,
) -> Vec<OptionCount> {
    candidate_values(records, dimension, scope)
        .into_iter()
        .map(|value| {
            let hypothetical = scope.filters.with_only(dimension, &value);
            let count = records
                .iter()
                .filter(|record| filter::matches(record, &hypothetical, scope.scope))
                .count();
            OptionCount { value, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::academic_year::AcademicYear;
    use crate::departments::DepartmentsPayload;
    use crate::models::NOT_PROVIDED;

    fn record(course: &str, gender: &str, hours: i64) -> SurveyRecord {
        SurveyRecord {
            source: "UAL".to_string(),
            captured_at: "02.10.2023 09:00".to_string(),
            course_of_study: course.to_string(),
            gender: gender.to_string(),
            hours_socialising: hours,
            ..SurveyRecord::default()
        }
    }

    fn index() -> DepartmentIndex {
        let mut payload = DepartmentsPayload::default();
        payload.departments.insert(
            "Art".to_string(),
            vec!["Fine Art".to_string(), "Sculpture".to_string(), "Painting".to_string()],
        );
        payload
            .departments
            .insert("Media".to_string(), vec!["Film".to_string()]);
        DepartmentIndex::build("UAL", &payload)
    }

    fn dataset() -> Vec<SurveyRecord> {
        vec![
            record("Film", "Male", 5),
            record("Fine Art", "Female", 0),
            record("Film", "Female", 2),
            record("Fine Art", NOT_PROVIDED, 9),
            SurveyRecord {
                captured_at: "02.10.2021".to_string(),
                ..record("Film", "Other", 1)
            },
        ]
    }

    #[test]
    fn department_selection_lists_registered_courses() {
        let records = dataset();
        let index = index();
        let scope = Scope::new(AcademicYear::starting(2023), "UAL");
        let filters = FilterState::new();
        let departments = vec!["Art".to_string()];
        let enumeration = EnumerationScope {
            scope: &scope,
            filters: &filters,
            departments: &departments,
            index: &index,
        };

        let courses = candidate_values(&records, Dimension::CourseOfStudy, &enumeration);
        assert_eq!(courses, vec!["Fine Art", "Sculpture", "Painting"]);
    }

    #[test]
    fn other_dimension_filters_do_not_collapse_options() {
        let records = dataset();
        let index = index();
        let scope = Scope::new(AcademicYear::starting(2023), "All");
        let mut filters = FilterState::new();
        filters.set(Dimension::Gender, ["Male"]);
        let enumeration = EnumerationScope {
            scope: &scope,
            filters: &filters,
            departments: &[],
            index: &index,
        };

        let options = enumerate(&records, Dimension::Gender, &enumeration);
        assert_eq!(
            options,
            vec![
                OptionCount { value: "Male".to_string(), count: 1 },
                OptionCount { value: "Female".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn live_counts_hold_other_filters_fixed() {
        let records = dataset();
        let index = index();
        let scope = Scope::new(AcademicYear::starting(2023), "All");
        let mut filters = FilterState::new();
        filters.set(Dimension::CourseOfStudy, ["Film"]);
        let enumeration = EnumerationScope {
            scope: &scope,
            filters: &filters,
            departments: &[],
            index: &index,
        };

        let options = enumerate(&records, Dimension::Gender, &enumeration);
        assert_eq!(
            options,
            vec![
                OptionCount { value: "Male".to_string(), count: 1 },
                OptionCount { value: "Female".to_string(), count: 1 },
            ]
        );

        let courses = enumerate(&records, Dimension::CourseOfStudy, &enumeration);
        let names: Vec<&str> = courses.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(names, vec!["Film", "Fine Art"]);
    }

    #[test]
    fn numeric_options_sorted_without_zero() {
        let records = dataset();
        let index = index();
        let scope = Scope::new(AcademicYear::starting(2023), "All");
        let filters = FilterState::new();
        let enumeration = EnumerationScope {
            scope: &scope,
            filters: &filters,
            departments: &[],
            index: &index,
        };

        let hours = candidate_values(&records, Dimension::HoursSocialising, &enumeration);
        assert_eq!(hours, vec!["2", "5", "9"]);
    }

    #[test]
    fn department_scope_restricts_other_dimensions() {
        let records = dataset();
        let index = index();
        let scope = Scope::new(AcademicYear::starting(2023), "UAL");
        let filters = FilterState::new();
        let departments = vec!["Media".to_string()];
        let enumeration = EnumerationScope {
            scope: &scope,
            filters: &filters,
            departments: &departments,
            index: &index,
        };

        let genders = candidate_values(&records, Dimension::Gender, &enumeration);
        assert_eq!(genders, vec!["Male", "Female"]);
    }
}
