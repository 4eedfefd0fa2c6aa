// tests/price_fallback.rs
//
// Price resolution end to end: live tiers decline or fail, the regional model
// answers with a caveat, and its numbers hold the min <= modal <= max envelope
// for every commodity, state and month.

use chrono::NaiveDate;

use kisan_mitra::config::PriceConfig;
use kisan_mitra::prices::{
    modal_price, Commodity, MarketLocation, PriceQuery, PriceService, RegionalPriceModel,
    SpreadBands, ESTIMATE_CAVEAT,
};
use kisan_mitra::resolve::{AttemptStatus, Provenance};

const STATES: [&str; 12] = [
    "Uttar Pradesh",
    "Punjab",
    "Haryana",
    "Rajasthan",
    "Madhya Pradesh",
    "Bihar",
    "West Bengal",
    "Maharashtra",
    "Gujarat",
    "Karnataka",
    "Kerala",
    "",
];

fn offline_config() -> PriceConfig {
    PriceConfig {
        // Closed port: the probe fails fast with a transport error.
        scrape_url: "http://127.0.0.1:9/".to_string(),
        scrape_timeout_ms: 500,
        ..PriceConfig::default()
    }
}

fn april(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
}

#[test]
fn wheat_in_punjab_in_april() {
    let model = RegionalPriceModel::default();
    let p = model.commodity_price(Commodity::Wheat, &MarketLocation::new("Ludhiana", "Punjab"), 4);
    // 2200 * 1.15 = 2530, * 0.80 = 2024
    assert_eq!(p.modal_price, 2024);
    assert_eq!(p.price_range.min, 1922);
    assert_eq!(p.price_range.max, 2165);
    assert_eq!(p.markets.len(), 2);
    assert_eq!(p.markets[0].market_name, "मंडी समिति, Ludhiana, Punjab");
    assert_eq!(p.markets[1].market_name, "कृषि उपज मार्केट, Ludhiana");
}

#[test]
fn envelope_holds_for_every_commodity_state_and_month() {
    let model = RegionalPriceModel::default();
    for state in STATES {
        let loc = MarketLocation::new("Test", state);
        for month in 1..=12 {
            for c in Commodity::ALL {
                let p = model.commodity_price(c, &loc, month);
                assert_eq!(p.modal_price, modal_price(c, state, month));
                assert!(
                    p.price_range.min <= p.modal_price && p.modal_price <= p.price_range.max,
                    "{c} {state} m{month}: {:?}",
                    p.price_range
                );
                for m in &p.markets {
                    assert!(m.min_price <= m.modal_price && m.modal_price <= m.max_price);
                    assert!(m.min_price >= p.price_range.min);
                    assert!(m.max_price <= p.price_range.max);
                }
            }
        }
    }
}

#[test]
fn custom_bands_keep_the_envelope() {
    let model = RegionalPriceModel::new(SpreadBands {
        lower_bp: 1_000,
        upper_bp: 1_500,
        secondary_premium_bp: 500,
    });
    let p = model.commodity_price(Commodity::Onion, &MarketLocation::new("Nashik", "Maharashtra"), 7);
    assert!(p.price_range.min <= p.modal_price && p.modal_price <= p.price_range.max);
    assert_eq!(p.price_range.min, p.modal_price * 9 / 10);
}

#[test]
fn unknown_state_uses_base_price() {
    assert_eq!(modal_price(Commodity::Sugarcane, "Kerala", 8), 300);
    assert_eq!(modal_price(Commodity::Potato, "kerala", 2), 945);
}

#[tokio::test]
async fn live_tiers_fail_over_to_regional_estimate() {
    let service = PriceService::from_config(&offline_config()).unwrap();
    assert_eq!(
        service.resolver().attempt_names(),
        vec!["agmarknet-api", "agmarknet-scrape"]
    );

    let ans = service
        .resolve_table(PriceQuery::All, MarketLocation::new("Ludhiana", "Punjab"), april(10))
        .await
        .unwrap();

    assert_eq!(ans.provenance, Provenance::Synthetic);
    assert_eq!(ans.caveat.as_deref(), Some(ESTIMATE_CAVEAT));
    assert_eq!(ans.payload.entries.len(), 10);
    assert_eq!(ans.trail.len(), 2);
    assert_eq!(ans.trail[0].status, AttemptStatus::Declined);
    assert_eq!(ans.trail[1].status, AttemptStatus::Failed);
}

#[tokio::test]
async fn reachable_market_site_still_declines() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let site = axum::Router::new().route("/", axum::routing::get(|| async { "<html></html>" }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, site).await;
    });

    let cfg = PriceConfig {
        scrape_url: format!("http://{addr}/"),
        ..PriceConfig::default()
    };
    let service = PriceService::from_config(&cfg).unwrap();
    let ans = service
        .resolve_table(
            PriceQuery::Commodity(Commodity::Rice),
            MarketLocation::new("Bardhaman", "West Bengal"),
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
        )
        .await
        .unwrap();

    assert!(ans.provenance.is_synthetic());
    assert_eq!(ans.trail[1].status, AttemptStatus::Declined);
    assert!(ans.trail[1]
        .detail
        .as_deref()
        .unwrap()
        .contains("HTTP 200"));
    // 2950 * 0.90 = 2655, * 0.80 = 2124
    assert_eq!(ans.payload.entries[0].modal_price, 2124);
}

#[tokio::test]
async fn same_inputs_give_same_estimate() {
    let service = PriceService::from_config(&offline_config()).unwrap();
    let loc = MarketLocation::new("Indore", "Madhya Pradesh");
    let a = service
        .resolve_table(PriceQuery::All, loc.clone(), april(1))
        .await
        .unwrap();
    let b = service
        .resolve_table(PriceQuery::All, loc, april(1))
        .await
        .unwrap();
    assert_eq!(a.payload, b.payload);
}
