use crate::{
    config::Config,
    dataset::{LoadReport, RaceHistory},
    encoding::{align, encode_row, unknown_columns},
    error::{Error, Result},
    model::ModelArtifact,
    types::{ChartData, ChartSeries, FormOptions, PredictForm, PredictionOut, RaceFeatures},
};

pub const PREDICTED_LABEL: &str = "Predicted Position";
pub const HISTORICAL_LABEL: &str = "Historical Average";

/// Validated prediction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest(pub RaceFeatures);

impl PredictRequest {
    /// Only `grid_position` is checked; names are free-form and may be
    /// unknown to the model.
    pub fn parse(form: &PredictForm) -> Result<Self> {
        let grid_position = form
            .grid_position
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidGridPosition(form.grid_position.clone()))?;
        Ok(Self(RaceFeatures {
            driver: form.driver.clone(),
            track: form.track.clone(),
            weather: form.weather.clone(),
            grid_position,
        }))
    }
}

/// Round to 2 decimals for display only. Goes through the exact decimal
/// expansion so ties land on even digits and no scaling error creeps in.
pub fn round2(x: f64) -> f64 {
    format!("{x:.2}").parse().unwrap_or(x)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted: f64,
    pub historical_average: Option<f64>,
}

impl Prediction {
    pub fn into_response(self, driver: &str) -> PredictionOut {
        let mut series = vec![ChartSeries {
            name: PREDICTED_LABEL,
            category: "Position",
            value: self.predicted,
            color: "blue",
        }];
        if let Some(avg) = self.historical_average {
            series.push(ChartSeries {
                name: HISTORICAL_LABEL,
                category: "Position",
                value: avg,
                color: "orange",
            });
        }

        PredictionOut {
            driver: driver.to_string(),
            prediction: round2(self.predicted),
            raw_prediction: self.predicted,
            historical_average: self.historical_average,
            historical_available: self.historical_average.is_some(),
            chart: ChartData {
                title: format!("{driver}: Predicted vs Historical Average"),
                x_axis_title: "Metric",
                y_axis_title: "Finishing Position",
                legend_title: "Result",
                bar_mode: "group",
                series,
            },
        }
    }
}

/// Everything a request needs, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct PredictorContext {
    artifact: ModelArtifact,
    history: RaceHistory,
}

impl PredictorContext {
    pub fn new(artifact: ModelArtifact, history: RaceHistory) -> Self {
        Self { artifact, history }
    }

    pub fn load(cfg: &Config) -> Result<(Self, LoadReport)> {
        let artifact = ModelArtifact::load(&cfg.model_path)?;
        let (history, report) = RaceHistory::load(&cfg.data_path, cfg.row_policy)?;
        Ok((Self::new(artifact, history), report))
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn history(&self) -> &RaceHistory {
        &self.history
    }

    pub fn options(&self) -> FormOptions {
        FormOptions {
            drivers: self.history.drivers(),
            tracks: self.history.tracks(),
            weathers: self.history.weathers(),
        }
    }

    pub fn predict(&self, req: &PredictRequest) -> Result<Prediction> {
        let row = encode_row(&req.0);
        let unknown = unknown_columns(&row, &self.artifact.feature_names);
        if !unknown.is_empty() {
            tracing::debug!("columns unseen in training, encoded as baseline: {:?}", unknown);
        }

        let aligned = align(&row, &self.artifact.feature_names);
        tracing::debug!(
            "driver={} in_dim={} nonzero={}",
            req.0.driver,
            aligned.values.len(),
            aligned.nonzero()
        );

        let predicted = self.artifact.predict(&aligned)?;
        let historical_average = self.history.historical_average(&req.0.driver);
        Ok(Prediction {
            predicted,
            historical_average,
        })
    }

    /// Parse, predict and shape the response in one go.
    pub fn handle(&self, form: &PredictForm) -> Result<PredictionOut> {
        let req = PredictRequest::parse(form)?;
        let prediction = self.predict(&req)?;
        Ok(prediction.into_response(&req.0.driver))
    }
}
