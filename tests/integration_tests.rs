/// End-to-end tests: CSV -> train -> artifact on disk -> predictor.
///
/// Run with: cargo test --test integration_tests -- --nocapture
use race_predictor::{
    config::{Config, RowPolicy},
    dataset::RaceHistory,
    encoding::{align, encode_row},
    model::ModelArtifact,
    predictor::{round2, PredictRequest, PredictorContext},
    trainer,
    types::{PredictForm, RaceFeatures},
    Error,
};
use std::fs;

const HISTORY: &str = "\
season,driver,track,weather,grid_position,finishing_position
2019,Hamilton,Silverstone,Dry,1,1
2019,Hamilton,Monza,Wet,4,3
2020,Hamilton,Spa,Dry,2,2
2020,Verstappen,Silverstone,Dry,3,2
2020,Verstappen,Monza,Dry,1,1
2021,Verstappen,Spa,Wet,5,4
2021,Leclerc,Monza,Dry,2,4
2021,Leclerc,Spa,Wet,7,6
2022,Leclerc,Silverstone,Wet,6,5
2022,Norris,Spa,Dry,9,7
2022,Norris,Monza,Wet,8,10
";

struct Fixture {
    _dir: tempfile::TempDir,
    cfg: Config,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        data_path: dir.path().join("race_results.csv"),
        model_path: dir.path().join("model.json"),
        ..Config::default()
    };
    fs::write(&cfg.data_path, HISTORY).unwrap();

    let (history, _) = RaceHistory::load(&cfg.data_path, RowPolicy::Fail).unwrap();
    let (artifact, _) = trainer::train(&history).unwrap();
    artifact.save(&cfg.model_path).unwrap();

    Fixture { _dir: dir, cfg }
}

fn form(driver: &str, track: &str, weather: &str, grid: &str) -> PredictForm {
    PredictForm {
        driver: driver.into(),
        track: track.into(),
        weather: weather.into(),
        grid_position: grid.into(),
    }
}

#[test]
fn test_train_save_load_predict() {
    println!("\n=== Test: Train, Persist, Serve ===");
    let fx = fixture();
    let (ctx, report) = PredictorContext::load(&fx.cfg).unwrap();
    assert_eq!(report.skipped, 0);

    let out = ctx
        .handle(&form("Hamilton", "Monza", "Wet", "4"))
        .unwrap();
    println!("✓ Hamilton @ Monza (Wet) from P4 -> {}", out.prediction);

    assert!(out.raw_prediction.is_finite());
    assert_eq!(out.prediction, round2(out.raw_prediction));
    assert_eq!(out.historical_average, Some(2.0));
    assert_eq!(out.chart.series.len(), 2);
}

#[test]
fn test_aligned_rows_match_artifact_columns() {
    println!("\n=== Test: Alignment Over All Training Combinations ===");
    let fx = fixture();
    let (ctx, _) = PredictorContext::load(&fx.cfg).unwrap();
    let expected = &ctx.artifact().feature_names;

    let h = ctx.history();
    for driver in h.drivers() {
        for track in h.tracks() {
            for weather in h.weathers() {
                let f = RaceFeatures {
                    driver: driver.clone(),
                    track: track.clone(),
                    weather: weather.clone(),
                    grid_position: 5,
                };
                let aligned = align(&encode_row(&f), expected);
                assert_eq!(aligned.columns, expected.as_slice());
                assert_eq!(aligned.values.len(), expected.len());
                assert_eq!(aligned.nonzero(), 4);
            }
        }
    }
    println!("✓ {} columns checked", expected.len());
}

#[test]
fn test_retraining_is_reproducible() {
    let fx = fixture();
    let (history, _) = RaceHistory::load(&fx.cfg.data_path, RowPolicy::Skip).unwrap();
    let (retrained, _) = trainer::train(&history).unwrap();
    let persisted = ModelArtifact::load(&fx.cfg.model_path).unwrap();

    assert_eq!(retrained.feature_names, persisted.feature_names);
    for (a, b) in retrained.coefficients.iter().zip(&persisted.coefficients) {
        assert!((a - b).abs() < 1e-12, "{a} vs {b}");
    }
    assert!((retrained.intercept - persisted.intercept).abs() < 1e-12);
}

#[test]
fn test_in_sample_rows_reproduce_fit() {
    let fx = fixture();
    let (ctx, _) = PredictorContext::load(&fx.cfg).unwrap();
    let x = trainer::design_matrix(ctx.history(), &ctx.artifact().feature_names);

    for (i, r) in ctx.history().records().iter().enumerate() {
        let p = ctx.predict(&PredictRequest(r.features())).unwrap();
        let manual: f64 = ctx.artifact().intercept
            + x.row(i)
                .iter()
                .zip(&ctx.artifact().coefficients)
                .map(|(x, c)| x * c)
                .sum::<f64>();
        assert!((p.predicted - manual).abs() < 1e-9);
    }
}

#[test]
fn test_unknown_driver_is_baseline() {
    println!("\n=== Test: Unknown Driver ===");
    let fx = fixture();
    let (ctx, _) = PredictorContext::load(&fx.cfg).unwrap();

    let f = RaceFeatures {
        driver: "Unknown Driver".into(),
        track: "Spa".into(),
        weather: "Dry".into(),
        grid_position: 3,
    };
    let aligned = align(&encode_row(&f), &ctx.artifact().feature_names);
    for (col, v) in aligned.columns.iter().zip(&aligned.values) {
        if col.starts_with("driver_") {
            assert_eq!(*v, 0.0, "{col}");
        }
    }

    let out = ctx.handle(&form("Unknown Driver", "Spa", "Dry", "3")).unwrap();
    assert!(!out.historical_available);
    assert_eq!(out.historical_average, None);
    assert_eq!(out.chart.series.len(), 1);
    println!("✓ predicted {} with no history", out.prediction);
}

#[test]
fn test_non_numeric_grid_is_client_error() {
    let fx = fixture();
    let (ctx, _) = PredictorContext::load(&fx.cfg).unwrap();
    let err = ctx.handle(&form("Hamilton", "Spa", "Dry", "abc")).unwrap_err();
    assert!(err.is_client_error());
    assert!(matches!(err, Error::InvalidGridPosition(ref s) if s == "abc"));
}

#[test]
fn test_missing_model_fails_startup() {
    let fx = fixture();
    let cfg = Config {
        model_path: fx.cfg.model_path.with_file_name("missing.json"),
        ..fx.cfg.clone()
    };
    assert!(PredictorContext::load(&cfg).is_err());
}

#[test]
fn test_dirty_history_policies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dirty.csv");
    fs::write(
        &path,
        "driver,track,weather,grid_position,finishing_position\n\
         Hamilton,Spa,Dry,1,1\n\
         Hamilton,Spa,,2,3\n",
    )
    .unwrap();

    let (h, report) = RaceHistory::load(&path, RowPolicy::Skip).unwrap();
    assert_eq!((h.len(), report.skipped), (1, 1));
    assert!(matches!(
        RaceHistory::load(&path, RowPolicy::Fail),
        Err(Error::InvalidRow { line: 3, .. })
    ));
}
