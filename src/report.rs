use std::fmt::Write;

use crate::aggregate;
use crate::dimension::{Dimension, Kind};
use crate::filter::{FilterState, Scope};
use crate::models::{Bucket, BucketValue, SurveyRecord};

/// Report sections and the dimensions summarised in each.
pub const SECTIONS: [(&str, &[Dimension]); 5] = [
    (
        "Demographics",
        &[
            Dimension::HomeCountry,
            Dimension::EthnicGroup,
            Dimension::Age,
            Dimension::Gender,
            Dimension::FamilyEarningClass,
            Dimension::StudentTypeLocation,
        ],
    ),
    (
        "Academic Factors",
        &[
            Dimension::CourseOfStudy,
            Dimension::LevelOfStudy,
            Dimension::CostOfStudy,
            Dimension::HoursPerWeekLectures,
            Dimension::HoursBetweenLectures,
        ],
    ),
    (
        "Financial Factors",
        &[Dimension::FinancialSupport, Dimension::FinancialProblems],
    ),
    (
        "Lifestyle",
        &[
            Dimension::StressBeforeExams,
            Dimension::StressInGeneral,
            Dimension::WorkHoursPerWeek,
            Dimension::HoursSocialising,
            Dimension::HoursSocialmedia,
            Dimension::TotalDeviceHours,
            Dimension::Diet,
            Dimension::WellHydrated,
            Dimension::AlcoholConsumption,
            Dimension::QualityOfLife,
        ],
    ),
    (
        "Psychological and Social Factors",
        &[
            Dimension::PersonalityType,
            Dimension::ExercisePerWeek,
            Dimension::FeelAfraid,
            Dimension::KnownDisabilities,
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Mean, median and sample standard deviation over the non-zero answers.
pub fn numeric_summary(records: &[&SurveyRecord], dimension: Dimension) -> Option<NumericSummary> {
    let mut values: Vec<f64> = records
        .iter()
        .flat_map(|record| aggregate::bucket_keys(record, dimension))
        .filter_map(|key| match key {
            BucketValue::Number(n) => Some(n as f64),
            BucketValue::Text(_) => None,
        })
        .collect();

    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 0 {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    } else {
        values[count / 2]
    };
    let std_dev = if count > 1 {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    Some(NumericSummary {
        count,
        mean,
        median,
        std_dev,
    })
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn describe_filters(filters: &FilterState) -> Vec<String> {
    filters
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(dimension, values)| format!("{}: {}", dimension.label(), values.join(" | ")))
        .collect()
}

pub fn build_report(scope: &Scope, filters: &FilterState, records: &[&SurveyRecord]) -> String {
    let totals = aggregate::outcome_totals(records);
    let mut output = String::new();

    let university_label = if scope.all_universities() {
        "all universities"
    } else {
        scope.university.as_str()
    };

    let _ = writeln!(output, "# Student Mental Health Report");
    let _ = writeln!(
        output,
        "Generated for {} (academic year {})",
        university_label, scope.year
    );

    if !filters.is_unrestricted() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Active filters:");
        for line in describe_filters(filters) {
            let _ = writeln!(output, "- {line}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary Metrics");

    if records.is_empty() {
        let _ = writeln!(output, "No responses match this selection.");
        return output;
    }

    let _ = writeln!(output, "- Total responses: {}", totals.records);
    let _ = writeln!(
        output,
        "- Flagged for mental health issues: {} ({:.1}%)",
        totals.flagged,
        percentage(totals.flagged, totals.records)
    );
    let _ = writeln!(
        output,
        "- Not flagged: {} ({:.1}%)",
        totals.not_flagged,
        percentage(totals.not_flagged, totals.records)
    );

    for (title, dimensions) in SECTIONS.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {title}");

        for dimension in dimensions.iter().copied() {
            let _ = writeln!(output);
            let _ = writeln!(output, "### {}", dimension.label());

            // age is reported by band, like the chart
            if dimension.kind() == Kind::Numeric && dimension != Dimension::Age {
                match numeric_summary(records, dimension) {
                    Some(summary) => {
                        let _ = writeln!(
                            output,
                            "- {} answers: mean {:.1}, median {:.1}, std dev {:.1}",
                            summary.count, summary.mean, summary.median, summary.std_dev
                        );
                    }
                    None => {
                        let _ = writeln!(output, "No answers recorded.");
                    }
                }
                continue;
            }

            let mut buckets: Vec<Bucket> = aggregate::aggregate(records, dimension)
                .into_iter()
                .filter(|bucket| bucket.total() > 0)
                .collect();
            buckets.sort_by(|a, b| b.total().cmp(&a.total()));

            if buckets.is_empty() {
                let _ = writeln!(output, "No answers recorded.");
                continue;
            }

            for bucket in buckets.iter().take(10) {
                let _ = writeln!(
                    output,
                    "- {}: {} responses, {} flagged ({:.1}%)",
                    bucket.value,
                    bucket.total(),
                    bucket.count_1,
                    percentage(bucket.count_1, bucket.total())
                );
            }
        }
    }

    let reasons = aggregate::word_cloud(records, Dimension::TimetableReasons);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Top {} Timetable Reasons", aggregate::TIMETABLE_REASONS_LIMIT);

    if reasons.is_empty() {
        let _ = writeln!(output, "No reasons recorded.");
    } else {
        for word in reasons.iter() {
            let _ = writeln!(output, "- {} ({})", word.text, word.frequency);
        }
    }

    output
}
