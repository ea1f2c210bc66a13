//! Survey dimensions and the descriptor table that drives aggregation and enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::NOT_PROVIDED;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Categorical,
    Numeric,
    /// Comma-separated list; each `", "` token is its own bucket.
    MultiValue,
}

/// Bucket rewrite applied only when aggregating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recode {
    /// "Yes" when the answer mentions yes anywhere, else "No".
    ContainsYes,
    /// Fixed age bands instead of exact values.
    AgeBands,
}

#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub key: &'static str,
    pub kind: Kind,
    pub sentinel: Option<&'static str>,
    pub zero_excluded: bool,
    pub recode: Option<Recode>,
}

const fn categorical(key: &'static str) -> Descriptor {
    Descriptor {
        key,
        kind: Kind::Categorical,
        sentinel: Some(NOT_PROVIDED),
        zero_excluded: false,
        recode: None,
    }
}

const fn numeric(key: &'static str) -> Descriptor {
    Descriptor {
        key,
        kind: Kind::Numeric,
        sentinel: None,
        zero_excluded: true,
        recode: None,
    }
}

const fn multi_value(key: &'static str) -> Descriptor {
    Descriptor {
        key,
        kind: Kind::MultiValue,
        sentinel: Some(NOT_PROVIDED),
        zero_excluded: false,
        recode: None,
    }
}

const fn recoded(descriptor: Descriptor, recode: Recode) -> Descriptor {
    Descriptor {
        recode: Some(recode),
        ..descriptor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    EthnicGroup,
    HomeCountry,
    Age,
    Gender,
    StudentTypeLocation,
    StudentTypeTime,
    CourseOfStudy,
    HoursBetweenLectures,
    HoursPerWeekLectures,
    HoursPerWeekUniversityWork,
    LevelOfStudy,
    TimetablePreference,
    TimetableReasons,
    TimetableImpact,
    FinancialSupport,
    FinancialProblems,
    FamilyEarningClass,
    FormOfEmployment,
    WorkHoursPerWeek,
    CostOfStudy,
    Diet,
    WellHydrated,
    ExercisePerWeek,
    AlcoholConsumption,
    PersonalityType,
    PhysicalActivities,
    MentalHealthActivities,
    HoursSocialmedia,
    TotalDeviceHours,
    HoursSocialising,
    QualityOfLife,
    FeelAfraid,
    StressInGeneral,
    StressBeforeExams,
    KnownDisabilities,
    SenseOfBelonging,
}

impl Dimension {
    pub const ALL: [Dimension; 36] = [
        Dimension::EthnicGroup,
        Dimension::HomeCountry,
        Dimension::Age,
        Dimension::Gender,
        Dimension::StudentTypeLocation,
        Dimension::StudentTypeTime,
        Dimension::CourseOfStudy,
        Dimension::HoursBetweenLectures,
        Dimension::HoursPerWeekLectures,
        Dimension::HoursPerWeekUniversityWork,
        Dimension::LevelOfStudy,
        Dimension::TimetablePreference,
        Dimension::TimetableReasons,
        Dimension::TimetableImpact,
        Dimension::FinancialSupport,
        Dimension::FinancialProblems,
        Dimension::FamilyEarningClass,
        Dimension::FormOfEmployment,
        Dimension::WorkHoursPerWeek,
        Dimension::CostOfStudy,
        Dimension::Diet,
        Dimension::WellHydrated,
        Dimension::ExercisePerWeek,
        Dimension::AlcoholConsumption,
        Dimension::PersonalityType,
        Dimension::PhysicalActivities,
        Dimension::MentalHealthActivities,
        Dimension::HoursSocialmedia,
        Dimension::TotalDeviceHours,
        Dimension::HoursSocialising,
        Dimension::QualityOfLife,
        Dimension::FeelAfraid,
        Dimension::StressInGeneral,
        Dimension::StressBeforeExams,
        Dimension::KnownDisabilities,
        Dimension::SenseOfBelonging,
    ];

    pub fn descriptor(self) -> Descriptor {
        use Dimension::*;

        match self {
            EthnicGroup => categorical("ethnic_group"),
            HomeCountry => categorical("home_country"),
            Age => recoded(numeric("age"), Recode::AgeBands),
            Gender => categorical("gender"),
            StudentTypeLocation => categorical("student_type_location"),
            StudentTypeTime => categorical("student_type_time"),
            CourseOfStudy => categorical("course_of_study"),
            HoursBetweenLectures => numeric("hours_between_lectures"),
            HoursPerWeekLectures => numeric("hours_per_week_lectures"),
            HoursPerWeekUniversityWork => numeric("hours_per_week_university_work"),
            LevelOfStudy => categorical("level_of_study"),
            TimetablePreference => categorical("timetable_preference"),
            TimetableReasons => multi_value("timetable_reasons"),
            TimetableImpact => categorical("timetable_impact"),
            FinancialSupport => categorical("financial_support"),
            FinancialProblems => categorical("financial_problems"),
            FamilyEarningClass => categorical("family_earning_class"),
            FormOfEmployment => categorical("form_of_employment"),
            WorkHoursPerWeek => numeric("work_hours_per_week"),
            CostOfStudy => numeric("cost_of_study"),
            Diet => categorical("diet"),
            WellHydrated => categorical("well_hydrated"),
            ExercisePerWeek => numeric("exercise_per_week"),
            AlcoholConsumption => categorical("alcohol_consumption"),
            PersonalityType => categorical("personality_type"),
            PhysicalActivities => categorical("physical_activities"),
            MentalHealthActivities => multi_value("mental_health_activities"),
            HoursSocialmedia => numeric("hours_socialmedia"),
            TotalDeviceHours => numeric("total_device_hours"),
            HoursSocialising => numeric("hours_socialising"),
            QualityOfLife => categorical("quality_of_life"),
            FeelAfraid => categorical("feel_afraid"),
            StressInGeneral => recoded(categorical("stress_in_general"), Recode::ContainsYes),
            StressBeforeExams => recoded(categorical("stress_before_exams"), Recode::ContainsYes),
            KnownDisabilities => categorical("known_disabilities"),
            SenseOfBelonging => categorical("sense_of_belonging"),
        }
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    pub fn kind(self) -> Kind {
        self.descriptor().kind
    }

    /// Human label, e.g. `hours_socialmedia` -> "Hours Socialmedia".
    pub fn label(self) -> String {
        self.key()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Descriptor {
    /// Whether a raw text answer counts as a non-answer for this dimension.
    pub fn is_excluded_text(&self, text: &str) -> bool {
        text.is_empty() || self.sentinel == Some(text)
    }

    pub fn is_excluded_number(&self, n: i64) -> bool {
        self.zero_excluded && n == 0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .iter()
            .copied()
            .find(|dimension| dimension.key() == s)
            .ok_or_else(|| Error::UnknownDimension(s.to_string()))
    }
}
