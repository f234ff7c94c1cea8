use serde::Deserialize;
use std::{collections::BTreeSet, fs::File, io, path::Path};

use crate::{
    config::RowPolicy,
    error::{Error, Result},
    types::HistoricalRecord,
};

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "driver",
    "track",
    "weather",
    "grid_position",
    "finishing_position",
];

// Every field optional so a bad cell becomes a row-level decision instead of a
// hard csv error.
#[derive(Deserialize, Debug)]
struct RawRecord {
    #[serde(default)]
    driver: Option<String>,
    #[serde(default)]
    track: Option<String>,
    #[serde(default)]
    weather: Option<String>,
    #[serde(default)]
    grid_position: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    finishing_position: Option<f64>,
}

impl RawRecord {
    fn validate(self) -> std::result::Result<HistoricalRecord, String> {
        fn text(v: Option<String>, name: &str) -> std::result::Result<String, String> {
            match v {
                Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                _ => Err(format!("{name} is empty")),
            }
        }

        let driver = text(self.driver, "driver")?;
        let track = text(self.track, "track")?;
        let weather = text(self.weather, "weather")?;

        let grid_position = self
            .grid_position
            .as_deref()
            .and_then(parse_grid)
            .ok_or_else(|| "grid_position is missing or not an integer".to_string())?;
        let finishing_position = match self.finishing_position {
            Some(f) if f.is_finite() => f,
            _ => return Err("finishing_position is missing or not a number".into()),
        };

        Ok(HistoricalRecord {
            driver,
            track,
            weather,
            grid_position,
            finishing_position,
        })
    }
}

// Integers, or whole floats like "3.0" that fit in i64.
fn parse_grid(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(g) = s.parse::<i64>() {
        return Some(g);
    }
    let g = s.parse::<f64>().ok()?;
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    let in_range = g >= i64::MIN as f64 && g < i64::MAX as f64;
    (g.fract() == 0.0 && in_range).then_some(g as i64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub skipped: usize,
}

/// Read-only table of past race results.
#[derive(Debug, Clone)]
pub struct RaceHistory {
    records: Vec<HistoricalRecord>,
}

impl RaceHistory {
    pub fn from_records(records: Vec<HistoricalRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }
        Ok(Self { records })
    }

    pub fn load(path: impl AsRef<Path>, policy: RowPolicy) -> Result<(Self, LoadReport)> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let (history, report) = Self::from_reader(file, policy)?;
        tracing::info!(
            "loaded {} history rows from {} ({} skipped)",
            history.len(),
            path.display(),
            report.skipped
        );
        Ok((history, report))
    }

    pub fn from_reader<R: io::Read>(reader: R, policy: RowPolicy) -> Result<(Self, LoadReport)> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        // byte records so a bad utf-8 cell is a row problem, not a load failure
        let headers = rdr.byte_headers()?.clone();
        for col in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == col.as_bytes()) {
                return Err(Error::MissingColumn(col));
            }
        }

        let mut records = Vec::new();
        let mut report = LoadReport::default();
        for row in rdr.byte_records() {
            let row = row?;
            report.rows_read += 1;
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            let parsed = row
                .deserialize::<RawRecord>(Some(&headers))
                .map_err(|e| e.to_string())
                .and_then(RawRecord::validate);

            match (parsed, policy) {
                (Ok(rec), _) => records.push(rec),
                (Err(reason), RowPolicy::Skip) => {
                    tracing::warn!("skipping history row at line {}: {}", line, reason);
                    report.skipped += 1;
                }
                (Err(reason), RowPolicy::Fail) => {
                    return Err(Error::InvalidRow { line, reason });
                }
            }
        }

        Ok((Self::from_records(records)?, report))
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn drivers(&self) -> Vec<String> {
        self.distinct(|r| &r.driver)
    }

    pub fn tracks(&self) -> Vec<String> {
        self.distinct(|r| &r.track)
    }

    pub fn weathers(&self) -> Vec<String> {
        self.distinct(|r| &r.weather)
    }

    fn distinct<'a>(&'a self, field: impl Fn(&'a HistoricalRecord) -> &'a String) -> Vec<String> {
        self.records
            .iter()
            .map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Mean finishing position of `driver`, or `None` if the driver never raced.
    pub fn historical_average(&self, driver: &str) -> Option<f64> {
        let (sum, n) = self
            .records
            .iter()
            .filter(|r| r.driver == driver)
            .fold((0.0, 0usize), |(s, n), r| (s + r.finishing_position, n + 1));
        (n > 0).then(|| sum / n as f64)
    }
}
