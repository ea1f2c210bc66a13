//! End-to-end behaviour of the dashboard engine through its public API.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use wellbeing_dashboard::academic_year;
use wellbeing_dashboard::departments::{DepartmentIndex, DepartmentsPayload};
use wellbeing_dashboard::models::{Bucket, BucketValue};
use wellbeing_dashboard::{AcademicYear, Dashboard, Dimension, Status, SurveyRecord};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 1).unwrap()
}

fn respondent(source: &str, course: &str, gender: &str, predictions: u8) -> SurveyRecord {
    SurveyRecord {
        source: source.to_string(),
        captured_at: "10.10.2023 11:30".to_string(),
        course_of_study: course.to_string(),
        gender: gender.to_string(),
        predictions,
        ..SurveyRecord::default()
    }
}

fn ual_index() -> DepartmentIndex {
    let mut departments = BTreeMap::new();
    departments.insert(
        "Art".to_string(),
        vec!["Fine Art".to_string(), "Sculpture".to_string()],
    );
    departments.insert("Law".to_string(), vec!["Law".to_string()]);
    DepartmentIndex::build("UAL", &DepartmentsPayload { departments })
}

fn loaded(university: &str, records: Vec<SurveyRecord>) -> Dashboard {
    let mut dashboard = Dashboard::new(today(), university);
    dashboard.load::<String>(Ok(records));
    dashboard
}

#[test]
fn capture_dates_resolve_to_academic_years() {
    let labels: Vec<String> = ["15.09.2023", "01.03.2023", "20.12.2022"]
        .iter()
        .map(|date| academic_year::resolve(date).unwrap().to_string())
        .collect();
    assert_eq!(labels, ["2023-2024", "2022-2023", "2022-2023"]);
}

#[test]
fn year_list_runs_from_earliest_capture_to_current() {
    let mut old = respondent("UAL", "Law", "Male", 0);
    old.captured_at = "20.12.2021".to_string();
    let dashboard = loaded("All", vec![old, respondent("UAL", "Law", "Male", 0)]);

    let years: Vec<String> = dashboard
        .academic_years()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(years, ["2021-2022", "2022-2023", "2023-2024"]);
}

#[test]
fn gender_filter_aggregates_only_selected_values() {
    let mut dashboard = loaded(
        "All",
        vec![
            respondent("UAL", "Law", "Male", 0),
            respondent("UAL", "Law", "Male", 0),
            respondent("UAL", "Law", "Male", 0),
            respondent("UAL", "Law", "Male", 1),
            respondent("UAL", "Law", "Female", 0),
        ],
    );
    dashboard.on_filter_change(Dimension::Gender, ["Male"]);

    assert_eq!(
        dashboard.aggregate(Dimension::Gender),
        [Bucket {
            value: BucketValue::Text("Male".to_string()),
            count_0: 3,
            count_1: 1,
        }]
    );
}

#[test]
fn not_provided_reasons_skip_the_word_cloud_only() {
    let mut record = respondent("UAL", "Law", "Female", 1);
    record.timetable_reasons = "Not Provided".to_string();
    let mut dashboard = loaded("All", vec![record]);

    assert!(dashboard.word_cloud(Dimension::TimetableReasons).is_empty());
    let gender = dashboard.aggregate(Dimension::Gender);
    assert_eq!(gender.len(), 1);
    assert_eq!(gender[0].count_1, 1);
}

#[test]
fn department_is_inferred_from_course() {
    let record: SurveyRecord = serde_json::from_str(
        r#"{"source": "UAL", "captured_at": "10.10.2023", "course_of_study": "Fine Art", "predictions": "1"}"#,
    )
    .unwrap();
    let mut dashboard = loaded("UAL", vec![record]);
    dashboard.set_department_index(ual_index());

    let annotated = &dashboard.records()[0];
    assert_eq!(annotated.department.as_deref(), Some("Art"));
    assert_eq!(annotated.predictions, 1);
}

#[test]
fn department_selection_lists_registered_courses() {
    let mut dashboard = loaded(
        "UAL",
        vec![
            respondent("UAL", "Fine Art", "Male", 0),
            respondent("UAL", "Law", "Female", 1),
        ],
    );
    dashboard.set_department_index(ual_index());
    dashboard.on_department_change(["Art"]);

    let courses: Vec<String> = dashboard
        .enumerate(Dimension::CourseOfStudy)
        .into_iter()
        .map(|option| option.value)
        .collect();
    assert_eq!(courses, ["Fine Art", "Sculpture"]);
    assert_eq!(dashboard.filtered_records().len(), 1);
}

#[test]
fn department_selection_agrees_with_department_counts() {
    let mut dashboard = loaded(
        "UAL",
        vec![
            respondent("UAL", "Fine Art", "Male", 0),
            respondent("UAL", "fine art", "Female", 1),
            respondent("UAL", "Law", "Female", 0),
        ],
    );
    dashboard.set_department_index(ual_index());
    assert_eq!(dashboard.department_counts().get("Art"), Some(&2));

    dashboard.on_department_change(["Art"]);
    assert_eq!(dashboard.filtered_records().len(), 2);

    let genders: Vec<String> = dashboard
        .enumerate(Dimension::Gender)
        .into_iter()
        .map(|option| option.value)
        .collect();
    assert_eq!(genders, ["Male", "Female"]);
}

#[test]
fn option_counts_reflect_other_active_filters() {
    let mut dashboard = loaded(
        "UAL",
        vec![
            respondent("UAL", "Fine Art", "Male", 0),
            respondent("UAL", "Fine Art", "Female", 0),
            respondent("UAL", "Law", "Female", 1),
        ],
    );
    dashboard.on_filter_change(Dimension::CourseOfStudy, ["Fine Art"]);

    let options = dashboard.enumerate(Dimension::Gender);
    let counts: Vec<(&str, usize)> = options
        .iter()
        .map(|option| (option.value.as_str(), option.count))
        .collect();
    assert_eq!(counts, [("Male", 1), ("Female", 1)]);
}

#[test]
fn university_change_clears_course_and_department_selections() {
    let mut dashboard = loaded(
        "UAL",
        vec![
            respondent("UAL", "Fine Art", "Male", 0),
            respondent("SOL", "Nursing", "Male", 1),
        ],
    );
    dashboard.set_department_index(ual_index());
    dashboard.on_department_change(["Art"]);
    dashboard.on_filter_change(Dimension::Gender, ["Male"]);

    dashboard.on_university_change("SOL");

    assert!(dashboard.selected_departments().is_empty());
    assert!(dashboard.filters().selected(Dimension::CourseOfStudy).is_empty());
    assert_eq!(dashboard.filters().selected(Dimension::Gender), ["Male".to_string()]);
    assert_eq!(dashboard.department_index().university(), "SOL");
    assert_eq!(dashboard.filtered_records().len(), 1);
    assert_eq!(dashboard.filtered_records()[0].source, "SOL");
}

#[test]
fn repeated_aggregation_is_identical() {
    let records = vec![
        respondent("UAL", "Law", "Female", 1),
        respondent("SOL", "Nursing", "Male", 0),
        respondent("UAL", "Fine Art", "Other", 0),
    ];
    let mut first = loaded("All", records.clone());
    let mut second = loaded("All", records);

    let a = first.aggregate(Dimension::CourseOfStudy).to_vec();
    let b = first.aggregate(Dimension::CourseOfStudy).to_vec();
    let c = second.aggregate(Dimension::CourseOfStudy).to_vec();
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn bucket_totals_account_for_every_answered_record() {
    let mut unanswered = respondent("UAL", "Law", "Male", 0);
    unanswered.diet = "Not Provided".to_string();
    let mut records = vec![unanswered];
    for (diet, flagged) in [("Vegan", 1), ("Omnivore", 0), ("Vegan", 0)] {
        let mut record = respondent("UAL", "Law", "Female", flagged);
        record.diet = diet.to_string();
        records.push(record);
    }
    let mut dashboard = loaded("All", records);

    let total: usize = dashboard
        .aggregate(Dimension::Diet)
        .iter()
        .map(Bucket::total)
        .sum();
    assert_eq!(total, 3);
}

#[test]
fn other_years_yield_an_empty_status() {
    let mut dashboard = loaded("All", vec![respondent("UAL", "Law", "Male", 0)]);
    assert_eq!(dashboard.status(), Status::Ready);

    dashboard.on_year_change(AcademicYear::starting(2021));
    assert_eq!(dashboard.status(), Status::Empty);
    assert!(dashboard.aggregate(Dimension::Gender).is_empty());
}
