use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{SurveyRecord, UNKNOWN_DEPARTMENT};

/// `GET /departments/<university>` body: department name -> course names.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DepartmentsPayload {
    #[serde(default)]
    pub departments: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepartmentIndex {
    university: String,
    departments: BTreeMap<String, Vec<String>>,
    by_course: HashMap<String, String>,
}

impl DepartmentIndex {
    pub fn build(university: &str, payload: &DepartmentsPayload) -> Self {
        let mut by_course = HashMap::new();
        for (department, courses) in &payload.departments {
            for course in courses {
                // later departments overwrite earlier ones for shared course names
                by_course.insert(course.to_lowercase(), department.clone());
            }
        }

        debug!(
            university,
            departments = payload.departments.len(),
            courses = by_course.len(),
            "Built department index"
        );

        Self {
            university: university.to_string(),
            departments: payload.departments.clone(),
            by_course,
        }
    }

    pub fn university(&self) -> &str {
        &self.university
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn department_names(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }

    pub fn courses(&self, department: &str) -> &[String] {
        self.departments
            .get(department)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Courses of every listed department, in selection order, without duplicates.
    pub fn courses_for<S: AsRef<str>>(&self, departments: &[S]) -> Vec<String> {
        let mut courses: Vec<String> = Vec::new();
        for department in departments {
            for course in self.courses(department.as_ref()) {
                if !courses.contains(course) {
                    courses.push(course.clone());
                }
            }
        }
        courses
    }

    pub fn department_of(&self, course: &str) -> &str {
        if course.is_empty() {
            return UNKNOWN_DEPARTMENT;
        }
        self.by_course
            .get(&course.to_lowercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DEPARTMENT)
    }

    /// Same rule as annotation: the course's owning department, ignoring case.
    pub fn contains_course(&self, department: &str, course: &str) -> bool {
        !course.is_empty()
            && self
                .by_course
                .get(&course.to_lowercase())
                .is_some_and(|owner| owner == department)
    }
}

pub fn annotate_record(record: &SurveyRecord, index: &DepartmentIndex) -> SurveyRecord {
    let mut annotated = record.clone();
    annotated.department = Some(index.department_of(&record.course_of_study).to_string());
    annotated
}

pub fn annotate(records: &[SurveyRecord], index: &DepartmentIndex) -> Vec<SurveyRecord> {
    records
        .iter()
        .map(|record| annotate_record(record, index))
        .collect()
}

/// Annotated records per department for one university, in department-name order.
pub fn department_counts(records: &[SurveyRecord], university: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records.iter().filter(|r| r.source == university) {
        if let Some(department) = &record.department {
            *counts.entry(department.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(entries: &[(&str, &[&str])]) -> DepartmentsPayload {
        DepartmentsPayload {
            departments: entries
                .iter()
                .map(|(dept, courses)| {
                    (
                        dept.to_string(),
                        courses.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    fn record(source: &str, course: &str) -> SurveyRecord {
        SurveyRecord {
            source: source.to_string(),
            course_of_study: course.to_string(),
            ..SurveyRecord::default()
        }
    }

    #[test]
    fn annotates_fine_art_with_art_department() {
        let index = DepartmentIndex::build("UAL", &payload(&[("Art", &["Fine Art"])]));
        let record: SurveyRecord =
            serde_json::from_str(r#"{"course_of_study": "Fine Art", "predictions": "1"}"#)
                .unwrap();

        let annotated = annotate_record(&record, &index);
        assert_eq!(annotated.department.as_deref(), Some("Art"));
        assert_eq!(annotated.predictions, 1);
    }

    #[test]
    fn course_match_ignores_case() {
        let index = DepartmentIndex::build("UAL", &payload(&[("Art", &["Fine Art"])]));
        assert_eq!(index.department_of("FINE ART"), "Art");
        assert_eq!(index.department_of("fine art"), "Art");
    }

    #[test]
    fn membership_agrees_with_annotation() {
        let index = DepartmentIndex::build(
            "UAL",
            &payload(&[("Art", &["Fine Art", "Film"]), ("Media", &["film"])]),
        );
        assert!(index.contains_course("Art", "Fine Art"));
        assert!(index.contains_course("Art", "fine ART"));
        assert!(!index.contains_course("Art", "Film"));
        assert!(index.contains_course("Media", "Film"));
        assert!(!index.contains_course("Art", ""));
        assert!(!index.is_empty());
        assert!(DepartmentIndex::build("UAL", &DepartmentsPayload::default()).is_empty());
    }

    #[test]
    fn unmatched_or_empty_course_is_unknown() {
        let index = DepartmentIndex::build("UAL", &payload(&[("Art", &["Fine Art"])]));
        let records = vec![record("UAL", "Physics"), record("UAL", "")];

        let annotated = annotate(&records, &index);
        assert!(annotated
            .iter()
            .all(|r| r.department.as_deref() == Some(UNKNOWN_DEPARTMENT)));
        assert!(records.iter().all(|r| r.department.is_none()));
    }

    #[test]
    fn later_department_wins_for_shared_course() {
        let index = DepartmentIndex::build(
            "UAL",
            &payload(&[("Art", &["Design History"]), ("Design", &["design history"])]),
        );
        assert_eq!(index.department_of("Design History"), "Design");
    }

    #[test]
    fn courses_for_unions_selected_departments() {
        let index = DepartmentIndex::build(
            "UAL",
            &payload(&[("Art", &["Fine Art", "Sculpture"]), ("Media", &["Film", "Fine Art"])]),
        );
        assert_eq!(
            index.courses_for(&["Media", "Art"]),
            vec!["Film", "Fine Art", "Sculpture"]
        );
        assert!(index.courses_for(&["Music"]).is_empty());
    }

    #[test]
    fn counts_departments_for_selected_university_only() {
        let index = DepartmentIndex::build("UAL", &payload(&[("Art", &["Fine Art"])]));
        let records = annotate(
            &[
                record("UAL", "Fine Art"),
                record("UAL", "Fine Art"),
                record("UAL", "Law"),
                record("SOL", "Fine Art"),
            ],
            &index,
        );

        let counts = department_counts(&records, "UAL");
        assert_eq!(counts.get("Art"), Some(&2));
        assert_eq!(counts.get(UNKNOWN_DEPARTMENT), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 3);
    }
}
