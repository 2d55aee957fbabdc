use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use demand_forecast::{ForecastPoint, ForecastTrajectory, InventoryOptimizer, ZScorePolicy};
use rstest::rstest;

fn trajectory(values: &[f64]) -> ForecastTrajectory {
    let start = NaiveDate::from_ymd_opt(2025, 5, 30).unwrap();
    ForecastTrajectory::new(
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| ForecastPoint {
                date: start + Duration::days(i as i64),
                value,
            })
            .collect(),
    )
    .unwrap()
}

#[rstest]
#[case(100.0, 7)]
#[case(12.5, 1)]
#[case(0.0, 14)]
#[case(3.25, 30)]
fn test_constant_forecast_needs_no_safety_stock(#[case] demand: f64, #[case] lead_time: usize) {
    let optimizer = InventoryOptimizer::new(lead_time, 0.95, ZScorePolicy::Tabulated).unwrap();
    let plan = optimizer
        .optimize(&trajectory(&vec![demand; lead_time]))
        .unwrap();

    assert_eq!(plan.safety_stock, 0.0);
    assert_relative_eq!(plan.reorder_point, demand * lead_time as f64, epsilon = 1e-9);
    assert_relative_eq!(plan.avg_daily_demand, demand, epsilon = 1e-12);
}

#[rstest]
#[case(0.80, 1.282)]
#[case(0.90, 1.645)]
#[case(0.95, 1.96)]
#[case(0.99, 2.576)]
fn test_safety_stock_scales_with_z(#[case] level: f64, #[case] z: f64) {
    let values = [80.0, 120.0, 100.0, 90.0, 110.0];
    let optimizer = InventoryOptimizer::new(4, level, ZScorePolicy::Tabulated).unwrap();
    let plan = optimizer.optimize(&trajectory(&values)).unwrap();

    // sample std of the values is sqrt(250)
    let std = 250.0_f64.sqrt();
    assert_eq!(plan.z_score, z);
    assert_relative_eq!(plan.safety_stock, z * std * 2.0, epsilon = 1e-9);
    assert_relative_eq!(plan.reorder_point, 400.0 + plan.safety_stock, epsilon = 1e-9);
}

#[test]
fn test_more_volatile_forecast_needs_more_stock() {
    let optimizer = InventoryOptimizer::new(7, 0.95, ZScorePolicy::Tabulated).unwrap();
    let calm = optimizer
        .optimize(&trajectory(&[99.0, 101.0, 100.0, 100.0]))
        .unwrap();
    let wild = optimizer
        .optimize(&trajectory(&[60.0, 140.0, 100.0, 100.0]))
        .unwrap();

    assert_relative_eq!(calm.avg_daily_demand, wild.avg_daily_demand);
    assert!(wild.safety_stock > calm.safety_stock);
    assert!(wild.reorder_point > calm.reorder_point);
}

#[test]
fn test_report_formatting() {
    let optimizer = InventoryOptimizer::new(7, 0.95, ZScorePolicy::Tabulated).unwrap();
    let plan = optimizer
        .optimize(&trajectory(&[10.0, 11.0, 12.0]))
        .unwrap()
        .rounded();
    let text = plan.to_string();

    assert!(text.contains("Reorder Point"));
    assert!(text.contains("Safety Stock"));
    assert!(text.contains("95.0%"));
}

#[test]
fn test_empty_forecast_is_rejected() {
    let optimizer = InventoryOptimizer::new(7, 0.95, ZScorePolicy::Tabulated).unwrap();
    assert!(optimizer.optimize(&trajectory(&[])).is_err());
}
