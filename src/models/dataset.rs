use serde::{Deserialize, Serialize};

use super::EvRecord;

/// A cleaned registration table: every record has all of its fields present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvDataset {
    /// Name or identifier for this dataset (usually the file stem)
    pub name: String,
    /// Complete rows, in file order
    pub records: Vec<EvRecord>,
    /// Data rows present in the source, before cleaning
    pub rows_read: usize,
    /// Rows excluded because a field was missing
    pub rows_dropped: usize,
}

impl EvDataset {
    /// Create a new empty dataset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            rows_read: 0,
            rows_dropped: 0,
        }
    }

    /// Build a dataset from records that are already complete.
    ///
    /// # Examples
    ///
    /// ```
    /// use ev_market_analyzer::{EvDataset, EvRecord, VehicleType};
    ///
    /// let ds = EvDataset::from_records("Example", vec![EvRecord {
    ///     model_year: 2021, county: "King".into(), city: "Seattle".into(),
    ///     make: "NISSAN".into(), model: "LEAF".into(),
    ///     vehicle_type: VehicleType::BatteryElectric, electric_range: 149.0,
    /// }]);
    /// assert_eq!(ds.len(), 1);
    /// assert_eq!(ds.rows_dropped, 0);
    /// ```
    pub fn from_records(name: impl Into<String>, records: Vec<EvRecord>) -> Self {
        let rows_read = records.len();
        Self {
            name: name.into(),
            records,
            rows_read,
            rows_dropped: 0,
        }
    }

    /// Number of kept records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest model year, if any records exist.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.model_year).min()?;
        let max = self.records.iter().map(|r| r.model_year).max()?;
        Some((min, max))
    }

    /// Distinct manufacturers, sorted.
    pub fn makes(&self) -> Vec<String> {
        let mut makes: Vec<String> = self.records.iter().map(|r| r.make.clone()).collect();
        makes.sort();
        makes.dedup();
        makes
    }

    /// Mean electric range across all records (0.0 when empty).
    pub fn mean_electric_range(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.records.iter().map(|r| r.electric_range).sum();
        sum / self.records.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleType;

    fn record(year: i32, make: &str, range: f64) -> EvRecord {
        EvRecord {
            model_year: year,
            county: "King".to_string(),
            city: "Seattle".to_string(),
            make: make.to_string(),
            model: "X".to_string(),
            vehicle_type: VehicleType::BatteryElectric,
            electric_range: range,
        }
    }

    #[test]
    fn test_empty_dataset() {
        let ds = EvDataset::new("Empty");
        assert!(ds.is_empty());
        assert_eq!(ds.year_span(), None);
        assert_eq!(ds.mean_electric_range(), 0.0);
        assert!(ds.makes().is_empty());
    }

    #[test]
    fn test_year_span() {
        let ds = EvDataset::from_records(
            "Span",
            vec![record(2019, "A", 0.0), record(2012, "B", 0.0), record(2023, "A", 0.0)],
        );
        assert_eq!(ds.year_span(), Some((2012, 2023)));
    }

    #[test]
    fn test_makes_deduplicated_and_sorted() {
        let ds = EvDataset::from_records(
            "Makes",
            vec![record(2020, "TESLA", 0.0), record(2020, "BMW", 0.0), record(2021, "TESLA", 0.0)],
        );
        assert_eq!(ds.makes(), vec!["BMW".to_string(), "TESLA".to_string()]);
    }

    #[test]
    fn test_mean_electric_range() {
        let ds = EvDataset::from_records(
            "Range",
            vec![record(2020, "A", 100.0), record(2020, "A", 200.0), record(2020, "A", 0.0)],
        );
        assert!((ds.mean_electric_range() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_records_counts() {
        let ds = EvDataset::from_records("Counts", vec![record(2020, "A", 1.0); 4]);
        assert_eq!(ds.rows_read, 4);
        assert_eq!(ds.rows_dropped, 0);
        assert_eq!(ds.len(), 4);
    }
}
