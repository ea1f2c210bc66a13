//! Grouped counts over a filtered record set, split by predicted outcome.

use std::borrow::Borrow;
use std::collections::HashMap;

use crate::dimension::{Descriptor, Dimension, Kind, Recode};
use crate::models::{
    Bucket, BucketValue, CountryStat, FieldValue, OutcomeTotals, SurveyRecord, WordFrequency,
};

pub const TIMETABLE_REASONS_LIMIT: usize = 20;

const MULTI_VALUE_SEPARATOR: &str = ", ";

pub const AGE_BANDS: [(&str, i64, i64); 4] = [
    ("18-24", 18, 24),
    ("25-34", 25, 34),
    ("35-44", 35, 44),
    ("45+", 45, 100),
];

fn each<R: Borrow<SurveyRecord>>(records: &[R]) -> impl Iterator<Item = &SurveyRecord> {
    records.iter().map(<R as Borrow<SurveyRecord>>::borrow)
}

/// Bucket keys one record contributes for a dimension; empty when it has no usable answer.
pub fn bucket_keys(record: &SurveyRecord, dimension: Dimension) -> Vec<BucketValue> {
    let descriptor = dimension.descriptor();

    match record.field(dimension) {
        FieldValue::Number(n) => {
            if descriptor.is_excluded_number(n) {
                Vec::new()
            } else {
                vec![BucketValue::Number(n)]
            }
        }
        FieldValue::Text(text) => text_keys(text, &descriptor),
    }
}

fn text_keys(text: &str, descriptor: &Descriptor) -> Vec<BucketValue> {
    if descriptor.is_excluded_text(text) {
        return Vec::new();
    }

    match (descriptor.kind, descriptor.recode) {
        (Kind::MultiValue, _) => text
            .split(MULTI_VALUE_SEPARATOR)
            .map(str::trim)
            .filter(|token| !descriptor.is_excluded_text(token))
            .map(|token| BucketValue::Text(token.to_string()))
            .collect(),
        (_, Some(Recode::ContainsYes)) => {
            let label = if text.to_lowercase().contains("yes") {
                "Yes"
            } else {
                "No"
            };
            vec![BucketValue::Text(label.to_string())]
        }
        _ => vec![BucketValue::Text(text.to_string())],
    }
}

pub fn aggregate<R: Borrow<SurveyRecord>>(records: &[R], dimension: Dimension) -> Vec<Bucket> {
    let descriptor = dimension.descriptor();
    if descriptor.recode == Some(Recode::AgeBands) {
        return age_bands(records);
    }

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut positions: HashMap<BucketValue, usize> = HashMap::new();

    for record in each(records) {
        for key in bucket_keys(record, dimension) {
            let position = *positions.entry(key.clone()).or_insert_with(|| {
                buckets.push(Bucket {
                    value: key,
                    count_0: 0,
                    count_1: 0,
                });
                buckets.len() - 1
            });

            let bucket = &mut buckets[position];
            if record.flagged() {
                bucket.count_1 += 1;
            } else {
                bucket.count_0 += 1;
            }
        }
    }

    if descriptor.kind == Kind::Numeric {
        buckets.sort_by_key(|bucket| match bucket.value {
            BucketValue::Number(n) => n,
            BucketValue::Text(_) => i64::MAX,
        });
    }

    buckets
}

/// Fixed age bands, always all four, counted by range membership.
pub fn age_bands<R: Borrow<SurveyRecord>>(records: &[R]) -> Vec<Bucket> {
    AGE_BANDS
        .iter()
        .map(|(label, min, max)| {
            let in_band = each(records).filter(|record| record.age >= *min && record.age <= *max);
            let (count_1, count_0) = in_band.fold((0, 0), |(flagged, clear), record| {
                if record.flagged() {
                    (flagged + 1, clear)
                } else {
                    (flagged, clear + 1)
                }
            });

            Bucket {
                value: BucketValue::Text((*label).to_string()),
                count_0,
                count_1,
            }
        })
        .collect()
}

/// Token frequencies sorted by descending frequency; ties keep first-seen order.
pub fn word_frequencies<R: Borrow<SurveyRecord>>(
    records: &[R],
    dimension: Dimension,
    limit: Option<usize>,
) -> Vec<WordFrequency> {
    let mut words: Vec<WordFrequency> = aggregate(records, dimension)
        .into_iter()
        .map(|bucket| WordFrequency {
            text: bucket.value.to_string(),
            frequency: bucket.total(),
        })
        .collect();

    words.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    if let Some(limit) = limit {
        words.truncate(limit);
    }
    words
}

/// Word cloud for a dimension, with the timetable-reasons cloud cut to its top entries.
pub fn word_cloud<R: Borrow<SurveyRecord>>(
    records: &[R],
    dimension: Dimension,
) -> Vec<WordFrequency> {
    let limit = match dimension {
        Dimension::TimetableReasons => Some(TIMETABLE_REASONS_LIMIT),
        _ => None,
    };
    word_frequencies(records, dimension, limit)
}

pub fn outcome_totals<R: Borrow<SurveyRecord>>(records: &[R]) -> OutcomeTotals {
    let flagged = each(records).filter(|r| r.flagged()).count();
    OutcomeTotals {
        records: records.len(),
        flagged,
        not_flagged: records.len() - flagged,
    }
}

/// Per home country share of flagged respondents, in first-seen order.
pub fn country_breakdown<R: Borrow<SurveyRecord>>(records: &[R]) -> Vec<CountryStat> {
    aggregate(records, Dimension::HomeCountry)
        .into_iter()
        .map(|bucket| {
            let total = bucket.total();
            let share = |count: usize| count as f64 / total as f64 * 100.0;
            CountryStat {
                country: bucket.value.to_string(),
                flagged: bucket.count_1,
                not_flagged: bucket.count_0,
                total,
                flagged_percentage: share(bucket.count_1),
                not_flagged_percentage: share(bucket.count_0),
                dominant_flagged: bucket.count_1 > bucket.count_0,
            }
        })
        .collect()
}
