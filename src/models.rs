use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::Result;

pub const NOT_PROVIDED: &str = "Not Provided";
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

fn not_provided() -> String {
    NOT_PROVIDED.to_string()
}

/// One respondent's completed questionnaire as served by the dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SurveyRecord {
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub captured_at: String,
    #[serde(default, deserialize_with = "lenient::prediction")]
    pub predictions: u8,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub actual: String,
    /// Derived from `course_of_study`; never submitted.
    #[serde(default, skip_deserializing)]
    pub department: Option<String>,

    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub ethnic_group: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub home_country: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub age: i64,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub gender: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub student_type_location: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub student_type_time: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub course_of_study: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hours_between_lectures: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hours_per_week_lectures: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hours_per_week_university_work: i64,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub level_of_study: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub timetable_preference: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub timetable_reasons: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub timetable_impact: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub financial_support: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub financial_problems: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub family_earning_class: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub form_of_employment: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub work_hours_per_week: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cost_of_study: i64,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub diet: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub well_hydrated: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub exercise_per_week: i64,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub alcohol_consumption: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub personality_type: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub physical_activities: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub mental_health_activities: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hours_socialmedia: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_device_hours: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub hours_socialising: i64,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub quality_of_life: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub feel_afraid: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub stress_in_general: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub stress_before_exams: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub known_disabilities: String,
    #[serde(default = "not_provided", deserialize_with = "lenient::text")]
    pub sense_of_belonging: String,
}

impl Default for SurveyRecord {
    fn default() -> Self {
        Self {
            source: not_provided(),
            captured_at: String::new(),
            predictions: 0,
            actual: not_provided(),
            department: None,
            ethnic_group: not_provided(),
            home_country: not_provided(),
            age: 0,
            gender: not_provided(),
            student_type_location: not_provided(),
            student_type_time: not_provided(),
            course_of_study: not_provided(),
            hours_between_lectures: 0,
            hours_per_week_lectures: 0,
            hours_per_week_university_work: 0,
            level_of_study: not_provided(),
            timetable_preference: not_provided(),
            timetable_reasons: not_provided(),
            timetable_impact: not_provided(),
            financial_support: not_provided(),
            financial_problems: not_provided(),
            family_earning_class: not_provided(),
            form_of_employment: not_provided(),
            work_hours_per_week: 0,
            cost_of_study: 0,
            diet: not_provided(),
            well_hydrated: not_provided(),
            exercise_per_week: 0,
            alcohol_consumption: not_provided(),
            personality_type: not_provided(),
            physical_activities: not_provided(),
            mental_health_activities: not_provided(),
            hours_socialmedia: 0,
            total_device_hours: 0,
            hours_socialising: 0,
            quality_of_life: not_provided(),
            feel_afraid: not_provided(),
            stress_in_general: not_provided(),
            stress_before_exams: not_provided(),
            known_disabilities: not_provided(),
            sense_of_belonging: not_provided(),
        }
    }
}

/// Borrowed view of one record's value for a single dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl FieldValue<'_> {
    /// Text used for filter identity: numbers compare by their integer form.
    pub fn raw_text(&self) -> String {
        match self {
            FieldValue::Text(text) => (*text).to_string(),
            FieldValue::Number(n) => n.to_string(),
        }
    }

    pub fn matches(&self, selected: &str) -> bool {
        match self {
            FieldValue::Text(text) => *text == selected,
            FieldValue::Number(n) => selected.trim().parse::<i64>() == Ok(*n),
        }
    }
}

impl SurveyRecord {
    pub fn field(&self, dimension: Dimension) -> FieldValue<'_> {
        use Dimension::*;
        use FieldValue::{Number, Text};

        match dimension {
            EthnicGroup => Text(&self.ethnic_group),
            HomeCountry => Text(&self.home_country),
            Age => Number(self.age),
            Gender => Text(&self.gender),
            StudentTypeLocation => Text(&self.student_type_location),
            StudentTypeTime => Text(&self.student_type_time),
            CourseOfStudy => Text(&self.course_of_study),
            HoursBetweenLectures => Number(self.hours_between_lectures),
            HoursPerWeekLectures => Number(self.hours_per_week_lectures),
            HoursPerWeekUniversityWork => Number(self.hours_per_week_university_work),
            LevelOfStudy => Text(&self.level_of_study),
            TimetablePreference => Text(&self.timetable_preference),
            TimetableReasons => Text(&self.timetable_reasons),
            TimetableImpact => Text(&self.timetable_impact),
            FinancialSupport => Text(&self.financial_support),
            FinancialProblems => Text(&self.financial_problems),
            FamilyEarningClass => Text(&self.family_earning_class),
            FormOfEmployment => Text(&self.form_of_employment),
            WorkHoursPerWeek => Number(self.work_hours_per_week),
            CostOfStudy => Number(self.cost_of_study),
            Diet => Text(&self.diet),
            WellHydrated => Text(&self.well_hydrated),
            ExercisePerWeek => Number(self.exercise_per_week),
            AlcoholConsumption => Text(&self.alcohol_consumption),
            PersonalityType => Text(&self.personality_type),
            PhysicalActivities => Text(&self.physical_activities),
            MentalHealthActivities => Text(&self.mental_health_activities),
            HoursSocialmedia => Number(self.hours_socialmedia),
            TotalDeviceHours => Number(self.total_device_hours),
            HoursSocialising => Number(self.hours_socialising),
            QualityOfLife => Text(&self.quality_of_life),
            FeelAfraid => Text(&self.feel_afraid),
            StressInGeneral => Text(&self.stress_in_general),
            StressBeforeExams => Text(&self.stress_before_exams),
            KnownDisabilities => Text(&self.known_disabilities),
            SenseOfBelonging => Text(&self.sense_of_belonging),
        }
    }

    pub fn flagged(&self) -> bool {
        self.predictions == 1
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub data: Vec<SurveyRecord>,
}

/// Bucket key: numeric dimensions keep their number so they sort numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum BucketValue {
    Text(String),
    Number(i64),
}

impl std::fmt::Display for BucketValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketValue::Text(text) => f.write_str(text),
            BucketValue::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub value: BucketValue,
    pub count_0: usize,
    pub count_1: usize,
}

impl Bucket {
    pub fn total(&self) -> usize {
        self.count_0 + self.count_1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordFrequency {
    pub text: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStat {
    pub country: String,
    pub flagged: usize,
    pub not_flagged: usize,
    pub total: usize,
    pub flagged_percentage: f64,
    pub not_flagged_percentage: f64,
    pub dominant_flagged: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTotals {
    pub records: usize,
    pub flagged: usize,
    pub not_flagged: usize,
}

/// One selectable option in a filter control, with its live match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionCount {
    pub value: String,
    pub count: usize,
}

pub fn load_json(path: &Path) -> Result<Vec<SurveyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let response: DashboardResponse = serde_json::from_str(&content)?;
    Ok(response.data)
}

pub fn load_csv(path: &Path) -> Result<Vec<SurveyRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for result in reader.deserialize::<SurveyRecord>() {
        records.push(result?);
    }

    Ok(records)
}

/// Coercing deserializers: malformed fields degrade to safe defaults instead of failing the row.
mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    use super::NOT_PROVIDED;

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or numeric string")
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(0))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(round_finite(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let v = v.trim();
            Ok(v.parse::<i64>()
                .unwrap_or_else(|_| v.parse::<f64>().map(round_finite).unwrap_or(0)))
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<i64, D::Error> {
            d.deserialize_any(self)
        }
    }

    fn round_finite(v: f64) -> i64 {
        if v.is_finite() {
            v.round() as i64
        } else {
            0
        }
    }

    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            if v.fract() == 0.0 && v.is_finite() {
                Ok(format!("{}", v as i64))
            } else {
                Ok(v.to_string())
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(NOT_PROVIDED.to_string())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(NOT_PROVIDED.to_string())
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<String, D::Error> {
            d.deserialize_any(self)
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        d.deserialize_any(NumberVisitor)
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        d.deserialize_any(TextVisitor)
    }

    /// Anything other than a value equal to 1 is recoded to 0.
    pub fn prediction<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let value = d.deserialize_any(NumberVisitor)?;
        Ok(u8::from(value == 1))
    }
}
