use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use demand_forecast::{
    DemandForecaster, DemandSeries, ForecastConfig, ForecastError, ForestConfig, SeriesSource,
    ZScorePolicy,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn config(n_trees: usize) -> ForecastConfig {
    ForecastConfig {
        forest: ForestConfig {
            n_trees,
            ..ForestConfig::default()
        },
        ..ForecastConfig::default()
    }
}

fn weekly_series(days: usize) -> DemandSeries {
    let values = (0..days)
        .map(|i| {
            let weekday = [90.0, 95.0, 100.0, 105.0, 110.0, 140.0, 150.0][i % 7];
            weekday + (i as f64 * 0.7).sin() * 4.0
        })
        .collect();
    DemandSeries::from_values(start(), values).unwrap()
}

fn trained(series: DemandSeries, n_trees: usize) -> DemandForecaster {
    let mut forecaster = DemandForecaster::from_series(config(n_trees), series).unwrap();
    forecaster.train_forecast_model().unwrap();
    forecaster
}

#[test]
fn test_constant_demand_end_to_end() {
    let series = DemandSeries::from_values(start(), vec![100.0; 60]).unwrap();
    let forecaster = trained(series, 100);

    let forecast = forecaster.forecast_future(7).unwrap();
    assert_eq!(forecast.len(), 7);
    for value in forecast.values() {
        assert_relative_eq!(value, 100.0, epsilon = 1e-9);
    }

    let plan = forecaster.optimize_inventory().unwrap();
    assert_relative_eq!(plan.avg_daily_demand, 100.0, epsilon = 1e-9);
    assert_relative_eq!(plan.safety_stock, 0.0, epsilon = 1e-9);
    assert_relative_eq!(plan.reorder_point, 700.0, epsilon = 1e-9);
    assert_eq!(plan.z_score, 1.96);
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(45)]
fn test_forecast_dates_follow_history(#[case] horizon: usize) {
    let series = weekly_series(120);
    let last = series.last_date().unwrap();
    let forecaster = trained(series, 10);

    let forecast = forecaster.forecast_future(horizon).unwrap();
    let expected: Vec<NaiveDate> = (1..=horizon as i64)
        .map(|i| last + Duration::days(i))
        .collect();

    assert_eq!(forecast.dates(), expected);
    assert!(forecast.values().iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn test_training_and_forecasting_are_deterministic() {
    let a = trained(weekly_series(150), 20);
    let b = trained(weekly_series(150), 20);

    let fa = a.forecast_future(30).unwrap();
    let fb = b.forecast_future(30).unwrap();
    let bits = |v: Vec<f64>| v.into_iter().map(f64::to_bits).collect::<Vec<_>>();
    assert_eq!(bits(fa.values()), bits(fb.values()));

    // Repeated calls on one model agree as well
    assert_eq!(a.forecast_future(30).unwrap(), fa);
    assert_eq!(
        a.model().unwrap().estimator().feature_importances(),
        b.model().unwrap().estimator().feature_importances()
    );
}

#[test]
fn test_forecast_learns_weekly_pattern() {
    let forecaster = trained(weekly_series(210), 50);
    let forecast = forecaster.forecast_future(14).unwrap();

    // Weekend days (positions 5 and 6 of each week from a Monday start) stay above weekdays
    let values = forecast.values();
    let first_date = forecast.dates()[0];
    let offset = (first_date - start()).num_days() as usize;
    let weekend: Vec<f64> = values
        .iter()
        .enumerate()
        .filter(|(i, _)| (offset + i) % 7 >= 5)
        .map(|(_, v)| *v)
        .collect();
    let weekday: Vec<f64> = values
        .iter()
        .enumerate()
        .filter(|(i, _)| (offset + i) % 7 < 5)
        .map(|(_, v)| *v)
        .collect();

    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    assert!(mean(&weekend) > mean(&weekday));
}

#[test]
fn test_untrained_forecaster_reports_state_error() {
    let forecaster = DemandForecaster::from_series(config(5), weekly_series(30)).unwrap();

    let err = forecaster.forecast_future(3).unwrap_err();
    assert!(matches!(err, ForecastError::NotTrained));
    assert!(err.to_string().contains("not been trained"));
    assert!(matches!(
        forecaster.optimize_inventory(),
        Err(ForecastError::NotTrained)
    ));
}

#[test]
fn test_zero_horizon_is_invalid() {
    let forecaster = trained(weekly_series(60), 5);
    assert!(matches!(
        forecaster.forecast_future(0),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_too_little_history_to_train() {
    let mut forecaster =
        DemandForecaster::from_series(config(5), weekly_series(8)).unwrap();
    let err = forecaster.train_forecast_model().unwrap_err();
    assert!(err.is_data_error());
    assert!(!forecaster.is_trained());
}

#[test]
fn test_service_level_policies() {
    let series = weekly_series(90);

    let mut unsupported = ForecastConfig {
        service_level: 0.97,
        ..config(5)
    };
    assert!(matches!(
        DemandForecaster::from_series(unsupported.clone(), series.clone()),
        Err(ForecastError::UnsupportedServiceLevel { .. })
    ));

    unsupported.z_score_policy = ZScorePolicy::NormalQuantile;
    let mut forecaster = DemandForecaster::from_series(unsupported, series).unwrap();
    forecaster.train_forecast_model().unwrap();
    let plan = forecaster.optimize_inventory().unwrap();
    assert!(plan.z_score > 1.96 && plan.z_score < 2.326);
}

#[test]
fn test_inventory_uses_lead_time_forecast() {
    let cfg = ForecastConfig {
        lead_time_days: 3,
        ..config(10)
    };
    let mut forecaster = DemandForecaster::from_series(cfg, weekly_series(90)).unwrap();
    forecaster.train_forecast_model().unwrap();

    let lead = forecaster.forecast_future(3).unwrap();
    let plan = forecaster.optimize_inventory().unwrap();
    let mean = lead.values().iter().sum::<f64>() / 3.0;

    assert_eq!(plan.lead_time_days, 3);
    assert_relative_eq!(plan.avg_daily_demand, mean, epsilon = 1e-9);
    assert_relative_eq!(
        plan.reorder_point,
        mean * 3.0 + plan.safety_stock,
        epsilon = 1e-9
    );
}

#[test]
fn test_pipeline_from_files() {
    let mut sales = NamedTempFile::new().unwrap();
    writeln!(sales, "date,quantity").unwrap();
    for (i, value) in weekly_series(70).values().iter().enumerate() {
        writeln!(sales, "{},{}", start() + Duration::days(i as i64), value).unwrap();
    }

    let mut cfg_file = NamedTempFile::new().unwrap();
    write!(
        cfg_file,
        r#"{{"forest": {{"n_trees": 8}}, "lead_time_days": 5, "horizon": 10}}"#
    )
    .unwrap();
    let cfg = ForecastConfig::from_json_file(cfg_file.path()).unwrap();

    let mut forecaster =
        DemandForecaster::new(cfg, SeriesSource::CsvFile(sales.path().to_path_buf())).unwrap();
    assert!(!forecaster.series().is_synthetic());
    assert_eq!(forecaster.series().len(), 70);

    let report = forecaster.train_forecast_model().unwrap();
    assert_eq!(report.train_rows, 50);
    assert_eq!(report.test_rows, 13);

    let out = tempfile::tempdir().unwrap();
    let forecast = forecaster.forecast_default_horizon().unwrap();
    forecast.write_csv(out.path().join("forecast.csv")).unwrap();
    report.write_csv(out.path().join("test.csv")).unwrap();

    let written = std::fs::read_to_string(out.path().join("forecast.csv")).unwrap();
    assert_eq!(written.lines().count(), 11);
    assert!(written.starts_with("date,forecast"));

    let plan = forecaster.optimize_inventory().unwrap();
    assert_eq!(plan.lead_time_days, 5);
}

#[test]
fn test_historical_decomposition() {
    let forecaster = DemandForecaster::from_series(config(5), weekly_series(84)).unwrap();
    let decomposition = forecaster.analyze_historical_data(7).unwrap();

    assert_eq!(decomposition.dates.len(), 84);
    assert_eq!(decomposition.seasonal_profile().len(), 7);
    assert!(decomposition.seasonal_strength() > 0.5);
    assert!(forecaster.analyze_historical_data(1).is_err());
    assert!(!forecaster.is_trained());
}
