//! Demo that resolves a farmer's mandi prices through every tier and prints the
//! attempt trail. Live tiers decline, so the regional estimate answers.

use anyhow::Result;
use chrono::Local;
use kisan_mitra::config::AppConfig;
use kisan_mitra::prices::PriceService;
use kisan_mitra::profile::{ContextProvider, FarmPractice, FarmerContext, FileContextProvider};

fn demo_farmer() -> FarmerContext {
    FarmerContext {
        name: "रामलाल".into(),
        name_english: Some("Ramlal".into()),
        village: None,
        district: "Ludhiana".into(),
        state: "Punjab".into(),
        agro_climatic_zone: "Trans-Gangetic Plains".into(),
        language: "punjabi".into(),
        land_acres: 4.0,
        enrolled_schemes: Vec::new(),
        practice: FarmPractice::default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    kisan_mitra::init_tracing();

    let cfg = AppConfig::load_default()?;
    let farmer = FileContextProvider::new(cfg.profile_path.clone())
        .farmer_context()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "profile unavailable; using demo farmer");
            demo_farmer()
        });

    let service = PriceService::from_config(&cfg.prices)?;
    let report = service
        .farmer_prices(&farmer, Local::now().date_naive())
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("price-demo done ({})", report.provenance);
    Ok(())
}
