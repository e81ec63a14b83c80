use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::EvRecord;

/// Registrations for a single model year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// Registrations per model year, unique years in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyCounts {
    entries: Vec<YearCount>,
}

impl YearlyCounts {
    /// Build from arbitrary `(year, count)` pairs. Duplicate years are summed.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, u64)>) -> Self {
        let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
        for (year, count) in pairs {
            *by_year.entry(year).or_insert(0) += count;
        }
        Self {
            entries: by_year
                .into_iter()
                .map(|(year, count)| YearCount { year, count })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[YearCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.entries.first().map(|e| e.year)
    }

    pub fn last_year(&self) -> Option<i32> {
        self.entries.last().map(|e| e.year)
    }

    /// Keep only years up to and including `cutoff`.
    pub fn up_to(&self, cutoff: i32) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .copied()
                .filter(|e| e.year <= cutoff)
                .collect(),
        }
    }
}

/// Count for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

/// Count for a label nested inside a group (e.g. a city within a county).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedCount {
    pub group: String,
    pub label: String,
    pub count: u64,
}

/// Mean of a numeric column for a label nested inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedMean {
    pub group: String,
    pub label: String,
    pub mean: f64,
    pub count: u64,
}

/// Mean of a numeric column for one model year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyMean {
    pub year: i32,
    pub mean: f64,
    pub count: u64,
}

/// Registrations per model year.
pub fn counts_by_year(records: &[EvRecord]) -> YearlyCounts {
    YearlyCounts::from_pairs(records.iter().map(|r| (r.model_year, 1)))
}

/// Count records per label, most frequent first (ties broken by label).
pub fn value_counts<F>(records: &[EvRecord], key: F) -> Vec<CategoryCount>
where
    F: Fn(&EvRecord) -> String,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in records {
        *counts.entry(key(record)).or_insert(0) += 1;
    }

    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    result
}

pub fn county_counts(records: &[EvRecord]) -> Vec<CategoryCount> {
    value_counts(records, |r| r.county.clone())
}

pub fn make_counts(records: &[EvRecord]) -> Vec<CategoryCount> {
    value_counts(records, |r| r.make.clone())
}

pub fn vehicle_type_counts(records: &[EvRecord]) -> Vec<CategoryCount> {
    value_counts(records, |r| r.vehicle_type.to_string())
}

/// Labels of the first `n` entries of an already ranked count list.
pub fn top_labels(counts: &[CategoryCount], n: usize) -> Vec<String> {
    counts.iter().take(n).map(|c| c.label.clone()).collect()
}

/// Count records per `(group, label)` pair, most frequent first.
pub fn grouped_counts<G, L>(records: &[EvRecord], group_key: G, label_key: L) -> Vec<GroupedCount>
where
    G: Fn(&EvRecord) -> String,
    L: Fn(&EvRecord) -> String,
{
    let mut counts: HashMap<(String, String), u64> = HashMap::new();
    for record in records {
        *counts
            .entry((group_key(record), label_key(record)))
            .or_insert(0) += 1;
    }

    let mut result: Vec<GroupedCount> = counts
        .into_iter()
        .map(|((group, label), count)| GroupedCount {
            group,
            label,
            count,
        })
        .collect();
    result.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.label.cmp(&b.label))
    });
    result
}

/// Mean of `value` per `(group, label)` pair, highest mean first.
pub fn grouped_means<G, L, V>(
    records: &[EvRecord],
    group_key: G,
    label_key: L,
    value: V,
) -> Vec<GroupedMean>
where
    G: Fn(&EvRecord) -> String,
    L: Fn(&EvRecord) -> String,
    V: Fn(&EvRecord) -> f64,
{
    let mut sums: HashMap<(String, String), (f64, u64)> = HashMap::new();
    for record in records {
        let entry = sums
            .entry((group_key(record), label_key(record)))
            .or_insert((0.0, 0));
        entry.0 += value(record);
        entry.1 += 1;
    }

    let mut result: Vec<GroupedMean> = sums
        .into_iter()
        .map(|((group, label), (sum, count))| GroupedMean {
            group,
            label,
            mean: sum / count as f64,
            count,
        })
        .collect();
    result.sort_by(|a, b| {
        b.mean
            .total_cmp(&a.mean)
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.label.cmp(&b.label))
    });
    result
}

fn records_in<'a, F>(records: &'a [EvRecord], allowed: &[String], key: F) -> Vec<&'a EvRecord>
where
    F: Fn(&EvRecord) -> &str,
{
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    records.iter().filter(|r| allowed.contains(key(*r))).collect()
}

fn owned(records: Vec<&EvRecord>) -> Vec<EvRecord> {
    records.into_iter().cloned().collect()
}

/// Records registered in the `n` most frequent counties.
pub fn records_in_top_counties(records: &[EvRecord], n: usize) -> Vec<EvRecord> {
    let top = top_labels(&county_counts(records), n);
    owned(records_in(records, &top, |r| r.county.as_str()))
}

/// Records built by the `n` most frequent makes.
pub fn records_in_top_makes(records: &[EvRecord], n: usize) -> Vec<EvRecord> {
    let top = top_labels(&make_counts(records), n);
    owned(records_in(records, &top, |r| r.make.as_str()))
}

/// The most registered cities across the most registered counties.
pub fn top_cities_in_top_counties(
    records: &[EvRecord],
    n_counties: usize,
    n_cities: usize,
) -> Vec<GroupedCount> {
    let subset = records_in_top_counties(records, n_counties);
    let mut counts = grouped_counts(&subset, |r| r.county.clone(), |r| r.city.clone());
    counts.truncate(n_cities);
    counts
}

/// The most registered models across the most registered makes.
pub fn top_models_in_top_makes(
    records: &[EvRecord],
    n_makes: usize,
    n_models: usize,
) -> Vec<GroupedCount> {
    let subset = records_in_top_makes(records, n_makes);
    let mut counts = grouped_counts(&subset, |r| r.make.clone(), |r| r.model.clone());
    counts.truncate(n_models);
    counts
}

/// Models with the longest mean electric range within the most registered makes.
pub fn top_models_by_mean_range(
    records: &[EvRecord],
    n_makes: usize,
    n_models: usize,
) -> Vec<GroupedMean> {
    let subset = records_in_top_makes(records, n_makes);
    let mut means = grouped_means(
        &subset,
        |r| r.make.clone(),
        |r| r.model.clone(),
        |r| r.electric_range,
    );
    means.truncate(n_models);
    means
}

/// Mean electric range per model year, ascending by year.
pub fn mean_range_by_year(records: &[EvRecord]) -> Vec<YearlyMean> {
    let mut sums: BTreeMap<i32, (f64, u64)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(record.model_year).or_insert((0.0, 0));
        entry.0 += record.electric_range;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(year, (sum, count))| YearlyMean {
            year,
            mean: sum / count as f64,
            count,
        })
        .collect()
}
