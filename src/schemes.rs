// src/schemes.rs
//! Government scheme catalog and eligibility.
//!
//! Each scheme slug maps to one `EligibilityRule`; adding a scheme means adding
//! a registry entry. Unregistered slugs fall back to "requires land".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::profile::FarmerContext;

pub const ACRE_TO_HECTARE: f64 = 0.404686;

#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("schemes database not found: {0}")]
    NotFound(PathBuf),

    #[error("reading schemes database {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in schemes database: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("scheme '{0}' not found")]
    UnknownScheme(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub financial_assistance: String,
    #[serde(default)]
    pub documents_required: Vec<String>,
    #[serde(default)]
    pub how_to_apply: Vec<String>,
    #[serde(default)]
    pub contact_info: serde_json::Value,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub target_audience: Vec<String>,
}

pub fn load_catalog(path: &Path) -> Result<Vec<Scheme>, SchemeError> {
    if !path.exists() {
        return Err(SchemeError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| SchemeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EligibilityRule {
    /// Eligible when landholding is at most this many hectares.
    MaxLandholdingHectares(f64),
    /// Everyone qualifies.
    AllFarmers(String),
    /// Any positive landholding qualifies. `{acres}` in the reason is filled in.
    RequiresLand(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: String,
}

impl EligibilityRule {
    pub fn evaluate(&self, land_acres: f64) -> Eligibility {
        let hectares = land_acres * ACRE_TO_HECTARE;
        match self {
            EligibilityRule::MaxLandholdingHectares(limit) if hectares <= *limit => Eligibility {
                eligible: true,
                reason: format!(
                    "Eligible as landholding ({hectares:.2} hectares) is ≤ {limit} hectares"
                ),
            },
            EligibilityRule::MaxLandholdingHectares(limit) => Eligibility {
                eligible: false,
                reason: format!(
                    "Not eligible as landholding ({hectares:.2} hectares) exceeds {limit} hectares"
                ),
            },
            EligibilityRule::AllFarmers(reason) => Eligibility {
                eligible: true,
                reason: reason.clone(),
            },
            EligibilityRule::RequiresLand(reason) if land_acres > 0.0 => Eligibility {
                eligible: true,
                reason: reason.replace("{acres}", &land_acres.to_string()),
            },
            EligibilityRule::RequiresLand(_) => Eligibility {
                eligible: false,
                reason: "Not eligible without landholding".to_string(),
            },
        }
    }
}

pub struct EligibilityRegistry {
    rules: HashMap<String, EligibilityRule>,
    default_rule: EligibilityRule,
}

impl Default for EligibilityRegistry {
    fn default() -> Self {
        let rules = [
            ("pm-kisan", EligibilityRule::MaxLandholdingHectares(2.0)),
            (
                "pmfby",
                EligibilityRule::AllFarmers(
                    "Eligible as all farmers growing crops can benefit from crop insurance".into(),
                ),
            ),
            (
                "pmksy",
                EligibilityRule::RequiresLand(
                    "Eligible with {acres} acres landholding for irrigation support".into(),
                ),
            ),
            (
                "kcc",
                EligibilityRule::AllFarmers(
                    "Eligible as all farmers can access credit facilities".into(),
                ),
            ),
            (
                "soil-health-card",
                EligibilityRule::AllFarmers("Eligible for free soil testing service".into()),
            ),
        ]
        .into_iter()
        .map(|(slug, rule)| (slug.to_string(), rule))
        .collect();

        Self {
            rules,
            default_rule: EligibilityRule::RequiresLand(
                "Potentially eligible - please check specific criteria".into(),
            ),
        }
    }
}

impl EligibilityRegistry {
    pub fn with_rule(mut self, slug: impl Into<String>, rule: EligibilityRule) -> Self {
        self.rules.insert(slug.into(), rule);
        self
    }

    pub fn rule_for(&self, slug: &str) -> &EligibilityRule {
        self.rules
            .get(&slug.to_ascii_lowercase())
            .unwrap_or(&self.default_rule)
    }
}

/// True when any enrollment mentions the scheme's name or slug.
pub fn is_enrolled(scheme: &Scheme, enrollments: &[String]) -> bool {
    let name = scheme.name.to_lowercase();
    let slug = scheme.slug.to_lowercase();
    enrollments.iter().any(|e| {
        let e = e.to_lowercase();
        e.contains(&name) || e.contains(&slug)
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub scheme: Scheme,
    pub eligibility_reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledScheme {
    pub name: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LandDetails {
    pub total_acres: f64,
    pub total_hectares: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemesAnalysis {
    pub already_enrolled: usize,
    pub newly_recommended: usize,
    pub total_applicable: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemeReport {
    pub status: &'static str,
    pub farmer_name: String,
    pub farmer_hindi_name: String,
    pub farmer_location: String,
    pub land_details: LandDetails,
    pub message: String,
    pub already_enrolled_schemes: Vec<EnrolledScheme>,
    pub recommended_schemes: Vec<Recommendation>,
    pub total_schemes_available: usize,
    pub schemes_analysis: SchemesAnalysis,
}

pub fn recommend(
    farmer: &FarmerContext,
    catalog: &[Scheme],
    registry: &EligibilityRegistry,
) -> SchemeReport {
    let mut enrolled = Vec::new();
    let mut recommended = Vec::new();

    for scheme in catalog {
        if is_enrolled(scheme, &farmer.enrolled_schemes) {
            enrolled.push(EnrolledScheme {
                name: scheme.name.clone(),
                status: "Already Enrolled",
            });
            continue;
        }
        let verdict = registry.rule_for(&scheme.slug).evaluate(farmer.land_acres);
        if verdict.eligible {
            recommended.push(Recommendation {
                scheme: scheme.clone(),
                eligibility_reason: verdict.reason,
            });
        }
    }

    let english = farmer
        .name_english
        .clone()
        .unwrap_or_else(|| "N/A".to_string());
    let message = if recommended.is_empty() {
        format!(
            "No new relevant schemes found for {} ({english}) at this time. They appear to be enrolled in all applicable schemes.",
            farmer.name
        )
    } else {
        format!(
            "Found {} new scheme(s) that may be beneficial for {} ({english}).",
            recommended.len(),
            farmer.name
        )
    };
    let hectares = farmer.land_acres * ACRE_TO_HECTARE;

    SchemeReport {
        status: "success",
        farmer_name: english,
        farmer_hindi_name: farmer.name.clone(),
        farmer_location: farmer.location().to_string(),
        land_details: LandDetails {
            total_acres: farmer.land_acres,
            total_hectares: (hectares * 100.0).round() / 100.0,
        },
        message,
        schemes_analysis: SchemesAnalysis {
            already_enrolled: enrolled.len(),
            newly_recommended: recommended.len(),
            total_applicable: enrolled.len() + recommended.len(),
        },
        already_enrolled_schemes: enrolled,
        recommended_schemes: recommended,
        total_schemes_available: catalog.len(),
    }
}

/// Exact name or slug, else the first name containing the query.
pub fn find_scheme<'a>(catalog: &'a [Scheme], query: &str) -> Result<&'a Scheme, SchemeError> {
    let q = query.trim().to_lowercase();
    catalog
        .iter()
        .find(|s| {
            let name = s.name.to_lowercase();
            name == q || s.slug.to_lowercase() == q || name.contains(&q)
        })
        .ok_or_else(|| SchemeError::UnknownScheme(query.to_string()))
}

pub fn by_category(catalog: &[Scheme]) -> BTreeMap<String, Vec<&Scheme>> {
    let mut out: BTreeMap<String, Vec<&Scheme>> = BTreeMap::new();
    for s in catalog {
        out.entry(s.category.clone()).or_default().push(s);
    }
    out
}

/// Catalog entry without application details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeSummary {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub description: String,
    pub financial_assistance: String,
    pub target_audience: Vec<String>,
}

impl From<&Scheme> for SchemeSummary {
    fn from(s: &Scheme) -> Self {
        Self {
            name: s.name.clone(),
            slug: s.slug.clone(),
            category: s.category.clone(),
            description: s.description.clone(),
            financial_assistance: s.financial_assistance.clone(),
            target_audience: s.target_audience.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub status: &'static str,
    pub total_schemes: usize,
    pub schemes_by_category: BTreeMap<String, Vec<SchemeSummary>>,
    pub all_schemes: Vec<SchemeSummary>,
}

/// Every scheme, grouped by category and in catalog order.
pub fn list_catalog(catalog: &[Scheme]) -> CatalogListing {
    let schemes_by_category: BTreeMap<String, Vec<SchemeSummary>> = by_category(catalog)
        .into_iter()
        .map(|(category, schemes)| {
            (
                category,
                schemes.into_iter().map(SchemeSummary::from).collect(),
            )
        })
        .collect();
    CatalogListing {
        status: "success",
        total_schemes: catalog.len(),
        schemes_by_category,
        all_schemes: catalog.iter().map(SchemeSummary::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pm_kisan_boundary_is_two_hectares() {
        let rule = EligibilityRule::MaxLandholdingHectares(2.0);
        assert!(rule.evaluate(4.9).eligible); // 1.98 ha
        assert!(!rule.evaluate(5.0).eligible); // 2.02 ha
    }

    #[test]
    fn requires_land_fills_acres() {
        let r = EligibilityRegistry::default().rule_for("pmksy").evaluate(3.5);
        assert!(r.eligible);
        assert_eq!(r.reason, "Eligible with 3.5 acres landholding for irrigation support");
        assert!(!EligibilityRegistry::default()
            .rule_for("unknown-scheme")
            .evaluate(0.0)
            .eligible);
    }

    #[test]
    fn enrollment_matches_name_or_slug_substring() {
        let s = Scheme {
            name: "Kisan Credit Card".into(),
            slug: "kcc".into(),
            description: String::new(),
            category: "Credit".into(),
            benefits: vec![],
            financial_assistance: String::new(),
            documents_required: vec![],
            how_to_apply: vec![],
            contact_info: serde_json::Value::Null,
            application_deadline: None,
            target_audience: vec![],
        };
        assert!(is_enrolled(&s, &["KCC (since 2019)".to_string()]));
        assert!(is_enrolled(&s, &["kisan credit card".to_string()]));
        assert!(!is_enrolled(&s, &["PM-KISAN".to_string()]));
    }
}
