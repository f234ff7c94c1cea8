use serde::{Deserialize, Serialize};

/// One past race result as read from the history CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub driver: String,
    pub track: String,
    pub weather: String,
    pub grid_position: i64,
    pub finishing_position: f64,
}

impl HistoricalRecord {
    pub fn features(&self) -> RaceFeatures {
        RaceFeatures {
            driver: self.driver.clone(),
            track: self.track.clone(),
            weather: self.weather.clone(),
            grid_position: self.grid_position,
        }
    }
}

/// Model inputs: a record without its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceFeatures {
    pub driver: String,
    pub track: String,
    pub weather: String,
    pub grid_position: i64,
}

/// Raw form fields, exactly as posted by the front end.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictForm {
    pub driver: String,
    pub track: String,
    pub weather: String,
    pub grid_position: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: &'static str,
    pub category: &'static str,
    pub value: f64,
    pub color: &'static str,
}

/// Bar chart description; drawing it is left to the client.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub x_axis_title: &'static str,
    pub y_axis_title: &'static str,
    pub legend_title: &'static str,
    pub bar_mode: &'static str,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PredictionOut {
    pub driver: String,
    /// Rounded to 2 decimals for display.
    pub prediction: f64,
    pub raw_prediction: f64,
    pub historical_average: Option<f64>,
    pub historical_available: bool,
    pub chart: ChartData,
}

/// Dropdown choices for the prediction form.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FormOptions {
    pub drivers: Vec<String>,
    pub tracks: Vec<String>,
    pub weathers: Vec<String>,
}
