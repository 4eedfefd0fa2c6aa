// src/prices/service.rs
//! Tool-facing price operations: resolve a table, then dress it up as a report
//! (summary, regional insights, farmer message).

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use super::model::{CommodityPrice, PriceTable, RegionalPriceModel};
use super::sources::{AuthoritativeApiAttempt, ScrapeProbeAttempt};
use super::{Commodity, MarketLocation, PriceLookup, PriceQuery, UnknownCommodity};
use crate::config::PriceConfig;
use crate::profile::FarmerContext;
use crate::resolve::{NonEmptySuccess, Provenance, ResolveError, ResolveRequest, ResolvedAnswer, Resolver};

/// `DD-Mon-YYYY`, e.g. `25-Dec-2024`.
pub const DATE_FORMAT: &str = "%d-%b-%Y";

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("invalid date '{0}': expected DD-Mon-YYYY (e.g. 25-Dec-2024)")]
    InvalidDate(String),

    #[error(transparent)]
    UnknownCommodity(#[from] UnknownCommodity),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub fn parse_market_date(raw: &str) -> Result<NaiveDate, PriceError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| PriceError::InvalidDate(raw.to_string()))
}

pub fn format_market_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct CommoditySummary {
    pub name: String,
    pub min_price: u32,
    pub max_price: u32,
    pub markets_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceSummary {
    pub total_commodities: usize,
    pub total_markets: usize,
    /// Sorted by `max_price`, highest first.
    pub top_commodities: Vec<CommoditySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmerNote {
    pub farmer_name: String,
    pub farmer_location: String,
    pub agro_climatic_zone: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceReport {
    pub status: &'static str,
    pub date: String,
    pub location: String,
    pub price_data: PriceTable,
    pub summary: PriceSummary,
    pub insights: Vec<String>,
    pub data_source: String,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub farmer_context: FarmerNote,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommodityReport {
    pub status: &'static str,
    pub commodity: Commodity,
    pub date: String,
    pub location: String,
    pub price_info: CommodityPrice,
    pub data_source: String,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub message: String,
    pub timestamp: String,
}

pub fn summarize(table: &PriceTable) -> PriceSummary {
    let mut top: Vec<CommoditySummary> = table
        .entries
        .iter()
        .map(|e| CommoditySummary {
            name: e.commodity.to_string(),
            min_price: e.price_range.min,
            max_price: e.price_range.max,
            markets_count: e.markets.len(),
        })
        .collect();
    top.sort_by(|a, b| b.max_price.cmp(&a.max_price));
    PriceSummary {
        total_commodities: table.entries.len(),
        total_markets: table.total_markets(),
        top_commodities: top,
    }
}

/// Short farmer-facing observations. Seasonal advice keys on the report month.
pub fn regional_insights(table: &PriceTable, location: &MarketLocation, month: u32) -> Vec<String> {
    let mut insights = vec![format!(
        "{} फसलों के भाव की जानकारी {} के लिए उपलब्ध है",
        table.entries.len(),
        location
    )];

    let mut by_max: Vec<(&str, u32)> = table
        .entries
        .iter()
        .map(|e| (e.commodity.name(), e.price_range.max))
        .collect();
    by_max.sort_by(|a, b| b.1.cmp(&a.1));
    if let (true, Some(highest), Some(lowest)) = (by_max.len() >= 2, by_max.first(), by_max.last()) {
        insights.push(format!("सबसे अधिक भाव: {} (₹{}/क्विंटल)", highest.0, highest.1));
        insights.push(format!("सबसे कम भाव: {} (₹{}/क्विंटल)", lowest.0, lowest.1));
    }

    match month {
        3..=5 => insights.push(
            "रबी फसल की कटाई का समय - गेहूं और सरसों के भाव में गिरावट संभव".to_string(),
        ),
        10..=12 => insights.push(
            "खरीफ फसल की कटाई का समय - धान और कपास के भाव में गिरावट संभव".to_string(),
        ),
        6..=8 => insights.push("मानसून का समय - सब्जियों के भाव में वृद्धि संभव".to_string()),
        _ => {}
    }
    insights
}

pub const TABLE_ESTIMATE_SOURCE: &str = "Regional Price Estimates";
pub const SPOT_ESTIMATE_SOURCE: &str = "Regional Estimate";

fn data_source(provenance: &Provenance, estimate_label: &str) -> String {
    match provenance {
        Provenance::Synthetic => estimate_label.to_string(),
        Provenance::Live(name) => format!("AgMarkNet ({name})"),
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub struct PriceService {
    resolver: Resolver<PriceLookup>,
}

impl PriceService {
    /// API tier, scrape probe, then the regional model.
    pub fn from_config(cfg: &PriceConfig) -> anyhow::Result<Self> {
        let resolver = Resolver::builder()
            .attempt(AuthoritativeApiAttempt::new(Duration::from_millis(
                cfg.api_timeout_ms,
            )))
            .attempt(ScrapeProbeAttempt::new(
                cfg.scrape_url.clone(),
                Duration::from_millis(cfg.scrape_timeout_ms),
            )?)
            .policy(NonEmptySuccess)
            .fallback(RegionalPriceModel::new(cfg.spread))
            .build()?;
        Ok(Self { resolver })
    }

    pub fn with_resolver(resolver: Resolver<PriceLookup>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver<PriceLookup> {
        &self.resolver
    }

    pub async fn resolve_table(
        &self,
        query: PriceQuery,
        location: MarketLocation,
        as_of: NaiveDate,
    ) -> Result<ResolvedAnswer<PriceTable>, PriceError> {
        let request = ResolveRequest::<PriceLookup>::new(query, location, as_of);
        Ok(self.resolver.resolve(&request).await?)
    }

    /// Prices for the farmer's location on `as_of` (callers pass today).
    pub async fn farmer_prices(
        &self,
        farmer: &FarmerContext,
        as_of: NaiveDate,
    ) -> Result<PriceReport, PriceError> {
        let message = format!(
            "{} जी के क्षेत्र {} के आज के मंडी भाव",
            farmer.name,
            farmer.location()
        );
        self.report(farmer, as_of, message).await
    }

    /// Prices for the farmer's location on a `DD-Mon-YYYY` date.
    pub async fn prices_for_date(
        &self,
        farmer: &FarmerContext,
        date: &str,
    ) -> Result<PriceReport, PriceError> {
        let as_of = parse_market_date(date)?;
        let message = format!(
            "{} जी के क्षेत्र {} के {} के मंडी भाव",
            farmer.name,
            farmer.location(),
            format_market_date(as_of)
        );
        self.report(farmer, as_of, message).await
    }

    pub async fn report(
        &self,
        farmer: &FarmerContext,
        as_of: NaiveDate,
        message: String,
    ) -> Result<PriceReport, PriceError> {
        let location = farmer.location();
        let answer = self
            .resolve_table(PriceQuery::All, location.clone(), as_of)
            .await?;
        let table = answer.payload;
        Ok(PriceReport {
            status: "success",
            date: format_market_date(as_of),
            location: location.to_string(),
            summary: summarize(&table),
            insights: regional_insights(&table, &location, as_of.month()),
            data_source: data_source(&answer.provenance, TABLE_ESTIMATE_SOURCE),
            provenance: answer.provenance,
            note: answer.caveat,
            farmer_context: FarmerNote {
                farmer_name: farmer.name.clone(),
                farmer_location: location.to_string(),
                agro_climatic_zone: farmer.agro_climatic_zone.clone(),
                message,
            },
            timestamp: timestamp(),
            price_data: table,
        })
    }

    /// One commodity for the farmer's location. Estimates quote the district
    /// mandi only.
    pub async fn commodity_price(
        &self,
        farmer: &FarmerContext,
        commodity: &str,
        as_of: NaiveDate,
    ) -> Result<CommodityReport, PriceError> {
        let commodity: Commodity = commodity.parse()?;
        let location = farmer.location();
        let answer = self
            .resolve_table(PriceQuery::Commodity(commodity), location.clone(), as_of)
            .await?;
        let price_info = answer
            .payload
            .get(commodity)
            .cloned()
            .ok_or(PriceError::Resolve(ResolveError::NoResult {
                tried: answer.attempts_run(),
            }))?;
        let note = answer
            .provenance
            .is_synthetic()
            .then(|| format!("{commodity} की अनुमानित कीमत दिखाई गई है।"));
        Ok(CommodityReport {
            status: "success",
            commodity,
            date: format_market_date(as_of),
            location: location.to_string(),
            price_info,
            data_source: data_source(&answer.provenance, SPOT_ESTIMATE_SOURCE),
            provenance: answer.provenance,
            note,
            message: format!("{commodity} के भाव {location} में"),
            timestamp: timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_date_round_trips_format() {
        let d = parse_market_date("25-Dec-2024").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(format_market_date(d), "25-Dec-2024");
    }

    #[test]
    fn rejects_other_date_formats() {
        assert!(matches!(
            parse_market_date("2024-12-25"),
            Err(PriceError::InvalidDate(_))
        ));
        assert!(parse_market_date("31-Feb-2024").is_err());
    }

    #[test]
    fn summary_sorts_by_max_price() {
        let model = RegionalPriceModel::default();
        let loc = MarketLocation::new("Agra", "Uttar Pradesh");
        let table = model.table(&PriceQuery::All, &loc, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        let s = summarize(&table);
        assert_eq!(s.total_commodities, 10);
        assert_eq!(s.total_markets, 20);
        assert_eq!(s.top_commodities[0].name, "Cotton");
        assert_eq!(s.top_commodities.last().unwrap().name, "Sugarcane");
    }

    #[test]
    fn insights_include_extremes_and_season() {
        let model = RegionalPriceModel::default();
        let loc = MarketLocation::new("Agra", "Uttar Pradesh");
        let table = model.table(&PriceQuery::All, &loc, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        let out = regional_insights(&table, &loc, 4);
        assert_eq!(out.len(), 4);
        assert!(out[1].contains("Cotton"));
        assert!(out[2].contains("Sugarcane"));
        assert!(out[3].contains("रबी"));
    }
}
