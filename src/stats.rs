//! Summary statistics over dataset columns

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::types::{ColumnValue, Statistic};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Statistic name → (column name → value)
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsResult(BTreeMap<Statistic, BTreeMap<String, f64>>);

impl StatsResult {
    /// Value of `statistic` for `column`, if it was computed
    pub fn get(&self, statistic: Statistic, column: &str) -> Option<f64> {
        self.0.get(&statistic)?.get(column).copied()
    }

    /// All values of one statistic, keyed by column
    pub fn statistic(&self, statistic: Statistic) -> Option<&BTreeMap<String, f64>> {
        self.0.get(&statistic)
    }

    /// Statistics present in this result
    pub fn statistics(&self) -> impl Iterator<Item = Statistic> + '_ {
        self.0.keys().copied()
    }
}

/// Computes min, max, mean and median over numeric columns
#[derive(Clone, Debug)]
pub struct StatsEngine {
    statistics: Vec<Statistic>,
}

impl Default for StatsEngine {
    fn default() -> Self {
        Self {
            statistics: Statistic::ALL.to_vec(),
        }
    }
}

impl StatsEngine {
    /// Engine computing all four statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine restricted to a subset of statistics
    pub fn with_statistics(statistics: impl IntoIterator<Item = Statistic>) -> Self {
        let mut statistics: Vec<_> = statistics.into_iter().collect();
        statistics.sort();
        statistics.dedup();
        Self { statistics }
    }

    /// Compute the configured statistics for every column in `columns`
    ///
    /// Null cells are skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`] if the dataset has no rows
    /// - [`Error::MissingColumn`] if a column is not in the schema
    /// - [`Error::NonNumericColumn`] if a column holds text
    /// - [`Error::EmptyColumn`] if every cell of a column is null
    pub fn compute<S: AsRef<str>>(&self, dataset: &Dataset, columns: &[S]) -> Result<StatsResult> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut result: BTreeMap<Statistic, BTreeMap<String, f64>> = BTreeMap::new();
        for column in columns {
            let column: &str = column.as_ref();
            let mut values = numeric_values(dataset, column)?;
            values.sort_by(f64::total_cmp);

            for &statistic in &self.statistics {
                let value = match statistic {
                    Statistic::Min => values[0],
                    Statistic::Max => values[values.len() - 1],
                    Statistic::Mean => mean(&values),
                    Statistic::Median => median_of_sorted(&values),
                };
                result
                    .entry(statistic)
                    .or_default()
                    .insert(column.to_string(), value);
            }
            debug!(column, count = values.len(), "column statistics computed");
        }

        Ok(StatsResult(result))
    }
}

/// Non-null numeric values of a column; never empty on success
fn numeric_values(dataset: &Dataset, column: &str) -> Result<Vec<f64>> {
    let cells = dataset.column(column).ok_or_else(|| Error::MissingColumn {
        column: column.to_string(),
    })?;

    let mut values = Vec::with_capacity(cells.len());
    for cell in cells {
        match cell {
            ColumnValue::Number(n) => values.push(n),
            ColumnValue::Null => {}
            ColumnValue::Text(_) => {
                return Err(Error::NonNumericColumn {
                    column: column.to_string(),
                });
            }
        }
    }

    if values.is_empty() {
        return Err(Error::EmptyColumn {
            column: column.to_string(),
        });
    }
    Ok(values)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_of_sorted(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    fn row(id: u32, base_experience: Option<u32>, height: u32, weight: u32) -> Record {
        Record {
            base_experience,
            height,
            id,
            species: format!("s{id}"),
            primary: "normal".into(),
            secondary: None,
            weight,
        }
    }

    fn dataset(base_experience: &[u32]) -> Dataset {
        Dataset::from_records(
            base_experience
                .iter()
                .enumerate()
                .map(|(i, &b)| row(i as u32 + 1, Some(b), 10, 60))
                .collect(),
        )
    }

    #[test]
    fn computes_all_statistics_for_odd_count() {
        let result = StatsEngine::new()
            .compute(&dataset(&[10, 15, 20]), &["base_experience"])
            .unwrap();

        assert_eq!(result.get(Statistic::Min, "base_experience"), Some(10.0));
        assert_eq!(result.get(Statistic::Max, "base_experience"), Some(20.0));
        assert_eq!(result.get(Statistic::Mean, "base_experience"), Some(15.0));
        assert_eq!(result.get(Statistic::Median, "base_experience"), Some(15.0));
    }

    #[test]
    fn median_averages_central_pair_for_even_count() {
        let result = StatsEngine::new()
            .compute(&dataset(&[40, 10, 30, 20]), &["base_experience"])
            .unwrap();

        assert_eq!(result.get(Statistic::Median, "base_experience"), Some(25.0));
        assert_eq!(result.get(Statistic::Mean, "base_experience"), Some(25.0));
    }

    #[test]
    fn median_and_mean_lie_between_min_and_max() {
        let samples: [&[u32]; 4] = [&[1], &[5, 5, 5], &[1, 100, 2, 3, 7], &[9, 3, 3, 800, 12, 1]];
        for sample in samples {
            let result = StatsEngine::new()
                .compute(&dataset(sample), &["base_experience"])
                .unwrap();
            let min = result.get(Statistic::Min, "base_experience").unwrap();
            let max = result.get(Statistic::Max, "base_experience").unwrap();
            let mean = result.get(Statistic::Mean, "base_experience").unwrap();
            let median = result.get(Statistic::Median, "base_experience").unwrap();

            assert!(min <= median && median <= max, "{sample:?}");
            assert!(min <= mean && mean <= max, "{sample:?}");
        }
    }

    #[test]
    fn several_columns_are_keyed_by_name() {
        let data = Dataset::from_records(vec![
            row(1, Some(64), 7, 69),
            row(2, Some(142), 10, 130),
            row(3, Some(263), 20, 1000),
        ]);

        let result = StatsEngine::new()
            .compute(&data, &["base_experience", "height", "weight"])
            .unwrap();

        assert_eq!(result.get(Statistic::Median, "weight"), Some(130.0));
        assert_eq!(result.get(Statistic::Min, "base_experience"), Some(64.0));
        assert_eq!(result.get(Statistic::Max, "base_experience"), Some(263.0));
        let mean_height = result.get(Statistic::Mean, "height").unwrap();
        assert!((mean_height - 12.3333).abs() < 1e-4);
        assert_eq!(result.statistic(Statistic::Mean).unwrap().len(), 3);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let err = StatsEngine::new()
            .compute(&Dataset::default(), &["height"])
            .unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = StatsEngine::new()
            .compute(&dataset(&[1, 2]), &["speed"])
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column } if column == "speed"));
    }

    #[test]
    fn absent_secondary_column_is_missing() {
        let err = StatsEngine::new()
            .compute(&dataset(&[1, 2]), &["secondary"])
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }

    #[test]
    fn text_column_is_rejected() {
        let err = StatsEngine::new()
            .compute(&dataset(&[1, 2]), &["species"])
            .unwrap_err();
        assert!(matches!(err, Error::NonNumericColumn { ref column } if column == "species"));
    }

    #[test]
    fn null_cells_are_skipped() {
        let data = Dataset::from_records(vec![
            row(1, Some(10), 1, 1),
            row(2, None, 1, 1),
            row(3, Some(30), 1, 1),
        ]);

        let result = StatsEngine::new().compute(&data, &["base_experience"]).unwrap();

        assert_eq!(result.get(Statistic::Mean, "base_experience"), Some(20.0));
        assert_eq!(result.get(Statistic::Median, "base_experience"), Some(20.0));
    }

    #[test]
    fn all_null_column_is_an_error() {
        let data = Dataset::from_records(vec![row(1, None, 1, 1)]);

        let err = StatsEngine::new().compute(&data, &["base_experience"]).unwrap_err();
        assert!(matches!(err, Error::EmptyColumn { .. }));
    }

    #[test]
    fn restricted_engine_only_reports_requested_statistics() {
        let engine =
            StatsEngine::with_statistics([Statistic::Median, Statistic::Mean, Statistic::Mean]);

        let result = engine.compute(&dataset(&[1, 2, 3]), &["height"]).unwrap();

        let present: Vec<_> = result.statistics().collect();
        assert_eq!(present, vec![Statistic::Mean, Statistic::Median]);
        assert_eq!(result.get(Statistic::Min, "height"), None);
    }

    #[test]
    fn serializes_as_nested_map() {
        let result = StatsEngine::new().compute(&dataset(&[10, 20]), &["base_experience"]).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["mean"]["base_experience"], 15.0);
        assert_eq!(json["max"]["base_experience"], 20.0);
    }
}
