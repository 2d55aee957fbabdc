use demand_forecast::{DemandForecaster, ForecastConfig, SeriesSource};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Usage: forecast_inventory [sales.json|sales.csv] [config.json]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("Demand Forecast: Inventory Planning Example");
    println!("===========================================\n");

    let mut args = std::env::args().skip(1);
    let sales_path = PathBuf::from(args.next().unwrap_or_else(|| "sales_data.json".to_string()));
    let config = match args.next() {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig {
            fallback_seed: Some(42),
            ..ForecastConfig::default()
        },
    };

    let source = match sales_path.extension().and_then(|e| e.to_str()) {
        Some("csv") => SeriesSource::CsvFile(sales_path),
        _ => SeriesSource::JsonFile(sales_path),
    };

    let mut forecaster = DemandForecaster::new(config, source)?;
    let series = forecaster.series();
    println!(
        "Loaded {} days of {:?} sales ({:?} to {:?})\n",
        series.len(),
        series.origin(),
        series.first_date(),
        series.last_date()
    );

    // Train on the earliest 80% of feature rows, evaluate on the rest
    let report = forecaster.train_forecast_model()?;
    println!("{}", report);

    if let Some(model) = forecaster.model() {
        println!("Feature importances:");
        let names = model.contract().names();
        for (name, importance) in names.iter().zip(model.estimator().feature_importances()) {
            println!("  {:<14} {:.3}", name, importance);
        }
        println!();
    }

    let forecast = forecaster.forecast_default_horizon()?;
    println!("Next {} days:", forecast.len());
    for point in forecast.points().iter().take(7) {
        println!("  {}  {:.2}", point.date, point.value);
    }
    if forecast.len() > 7 {
        println!("  ...");
    }
    println!();

    let plan = forecaster.optimize_inventory()?;
    println!("{}", plan.rounded());

    let decomposition = forecaster.analyze_historical_data(7)?;
    println!("Weekly seasonal profile:");
    for (i, effect) in decomposition.seasonal_profile().iter().enumerate() {
        println!("  day {}  {:+.2}", i, effect);
    }
    println!(
        "Seasonal strength: {:.2}",
        decomposition.seasonal_strength()
    );

    Ok(())
}
