use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::store::{JsonFileStore, RecordStore};

pub async fn handle(file: Option<PathBuf>, output_format: OutputFormat) -> anyhow::Result<()> {
    let path = file
        .or_else(|| std::env::var("DATA_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("deliveries.json"));

    let store = JsonFileStore::new(&path);
    let summary = store.load().await?.summary();

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("Data file: {}", store.path().display());
            println!("Patients:   {} (last id {})", summary.patients, summary.counters.patients);
            println!("Deliveries: {} (last id {})", summary.deliveries, summary.counters.deliveries);
            for (status, count) in &summary.deliveries_by_status {
                println!("  {:<11} {}", status, count);
            }
        }
    }
    Ok(())
}
