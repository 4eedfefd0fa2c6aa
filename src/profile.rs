//! Farmer profile: the context supplier for every tool lookup.
//!
//! Reads the `farmer_details` JSON record and exposes the few fields the
//! resolution tiers need. Missing optional fields fall back to defaults; a
//! missing district or state is an error because price tiers cannot run without it.
//!
//! Also builds the quick-reference summary and month-keyed seasonal advice.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::prices::MarketLocation;

pub const DEFAULT_FARMER_NAME: &str = "किसान भाई";
pub const DEFAULT_LANGUAGE: &str = "hindi";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("farmer profile not found: {0}")]
    NotFound(PathBuf),

    #[error("reading farmer profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in farmer profile: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("farmer profile has no farmer_details section")]
    MissingDetails,

    #[error("farmer profile has no district/state")]
    MissingLocation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub farmer_details: Option<FarmerDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmerDetails {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub location_details: LocationDetails,
    #[serde(default)]
    pub farm_details: FarmDetails,
    #[serde(default)]
    pub government_schemes_enrolled: Vec<String>,
    #[serde(default)]
    pub cropping_pattern: CroppingPattern,
    #[serde(default)]
    pub challenges_faced: Vec<serde_json::Value>,
    #[serde(default)]
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub name_english: Option<String>,
    pub primary_language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationDetails {
    pub village: Option<String>,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub state: String,
    pub agro_climatic_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmDetails {
    #[serde(default)]
    pub total_land_area_acres: f64,
    #[serde(default)]
    pub soil_types: Vec<LandFeature>,
    #[serde(default)]
    pub water_sources: Vec<LandFeature>,
}

/// A soil type or water source; only its `type` label is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandFeature {
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropPlan {
    #[serde(default)]
    pub crop_name: String,
    pub variety: Option<String>,
    pub area_acres: Option<f64>,
    pub growth_stage: Option<String>,
    pub sowing_date: Option<String>,
    pub seed_requirement_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CroppingPattern {
    #[serde(default)]
    pub kharif_crops: Vec<CropPlan>,
    #[serde(default)]
    pub rabi_crops_planned: Vec<CropPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub advisory_timing: Option<String>,
    pub information_format: Option<String>,
}

/// Farming practice details carried alongside the core context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FarmPractice {
    pub soil_types: Vec<String>,
    pub irrigation_sources: Vec<String>,
    pub challenges: Vec<serde_json::Value>,
    pub preferences: Preferences,
    pub cropping: CroppingPattern,
}

/// Flattened view handed to tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmerContext {
    pub name: String,
    pub name_english: Option<String>,
    pub village: Option<String>,
    pub district: String,
    pub state: String,
    pub agro_climatic_zone: String,
    pub language: String,
    pub land_acres: f64,
    pub enrolled_schemes: Vec<String>,
    pub practice: FarmPractice,
}

impl FarmerContext {
    pub fn location(&self) -> MarketLocation {
        MarketLocation::new(self.district.clone(), self.state.clone())
    }
}

impl TryFrom<FarmerDetails> for FarmerContext {
    type Error = ProfileError;

    fn try_from(d: FarmerDetails) -> Result<Self, Self::Error> {
        let district = d.location_details.district.trim().to_string();
        let state = d.location_details.state.trim().to_string();
        if district.is_empty() || state.is_empty() {
            return Err(ProfileError::MissingLocation);
        }
        Ok(Self {
            name: d
                .personal_info
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FARMER_NAME.to_string()),
            name_english: d.personal_info.name_english,
            village: d.location_details.village,
            district,
            state,
            agro_climatic_zone: d
                .location_details
                .agro_climatic_zone
                .unwrap_or_else(|| "Unknown".to_string()),
            language: d
                .personal_info
                .primary_language
                .map(|l| l.trim().to_ascii_lowercase())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            land_acres: d.farm_details.total_land_area_acres.max(0.0),
            enrolled_schemes: d.government_schemes_enrolled,
            practice: FarmPractice {
                soil_types: labels(d.farm_details.soil_types),
                irrigation_sources: labels(d.farm_details.water_sources),
                challenges: d.challenges_faced,
                preferences: d.preferences,
                cropping: d.cropping_pattern,
            },
        })
    }
}

fn labels(features: Vec<LandFeature>) -> Vec<String> {
    features
        .into_iter()
        .map(|f| f.kind)
        .filter(|k| !k.trim().is_empty())
        .collect()
}

pub trait ContextProvider: Send + Sync {
    fn farmer_context(&self) -> Result<FarmerContext, ProfileError>;
}

/// Reads the profile file on every call so edits are picked up without restart.
#[derive(Debug, Clone)]
pub struct FileContextProvider {
    path: PathBuf,
}

impl FileContextProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContextProvider for FileContextProvider {
    fn farmer_context(&self) -> Result<FarmerContext, ProfileError> {
        load_profile(&self.path)?.try_into()
    }
}

/// Fixed context, for demos and tests.
#[derive(Debug, Clone)]
pub struct StaticContextProvider(pub FarmerContext);

impl ContextProvider for StaticContextProvider {
    fn farmer_context(&self) -> Result<FarmerContext, ProfileError> {
        Ok(self.0.clone())
    }
}

pub fn load_profile(path: &Path) -> Result<FarmerDetails, ProfileError> {
    if !path.exists() {
        return Err(ProfileError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: ProfileDocument = serde_json::from_str(&raw)?;
    doc.farmer_details.ok_or(ProfileError::MissingDetails)
}

// ---- Context summary ----

#[derive(Debug, Clone, Serialize)]
pub struct SummaryLocation {
    pub village: Option<String>,
    pub district: String,
    pub state: String,
    pub agro_climatic_zone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentCrop {
    pub crop: String,
    pub variety: Option<String>,
    pub area_acres: Option<f64>,
    pub growth_stage: Option<String>,
    pub sowing_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmerSummary {
    pub name: String,
    pub name_english: Option<String>,
    pub location: SummaryLocation,
    pub primary_language: String,
    pub farm_size_acres: f64,
    pub current_crops: Vec<CurrentCrop>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Communication {
    pub language: String,
    pub timing: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickContext {
    pub soil_types: Vec<String>,
    pub irrigation_sources: Vec<String>,
    pub major_challenges: Vec<serde_json::Value>,
    pub preferred_communication: Communication,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    pub status: &'static str,
    pub farmer_summary: FarmerSummary,
    pub quick_context: QuickContext,
}

const TOP_CHALLENGES: usize = 3;

/// Quick-reference view of the farmer: who, where, what is in the field.
pub fn context_summary(farmer: &FarmerContext) -> ContextSummary {
    let practice = &farmer.practice;
    let current_crops = practice
        .cropping
        .kharif_crops
        .iter()
        .map(|c| CurrentCrop {
            crop: c.crop_name.clone(),
            variety: c.variety.clone(),
            area_acres: c.area_acres,
            growth_stage: c.growth_stage.clone(),
            sowing_date: c.sowing_date.clone(),
        })
        .collect();

    ContextSummary {
        status: "success",
        farmer_summary: FarmerSummary {
            name: farmer.name.clone(),
            name_english: farmer.name_english.clone(),
            location: SummaryLocation {
                village: farmer.village.clone(),
                district: farmer.district.clone(),
                state: farmer.state.clone(),
                agro_climatic_zone: farmer.agro_climatic_zone.clone(),
            },
            primary_language: farmer.language.clone(),
            farm_size_acres: farmer.land_acres,
            current_crops,
        },
        quick_context: QuickContext {
            soil_types: practice.soil_types.clone(),
            irrigation_sources: practice.irrigation_sources.clone(),
            major_challenges: practice
                .challenges
                .iter()
                .take(TOP_CHALLENGES)
                .cloned()
                .collect(),
            preferred_communication: Communication {
                language: farmer.language.clone(),
                timing: practice.preferences.advisory_timing.clone(),
                format: practice.preferences.information_format.clone(),
            },
        },
    }
}

// ---- Seasonal recommendations ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Kharif,
    Rabi,
    Summer,
}

impl Season {
    /// Kharif Jun-Oct, rabi Nov-Mar, summer Apr-May.
    pub fn for_month(month: u32) -> Self {
        match month {
            6..=10 => Season::Kharif,
            4 | 5 => Season::Summer,
            _ => Season::Rabi,
        }
    }

    pub fn stage(self) -> &'static str {
        match self {
            Season::Summer => "preparation",
            Season::Kharif | Season::Rabi => "active",
        }
    }

    fn priority_actions(self) -> &'static [&'static str] {
        match self {
            Season::Kharif => &[
                "Monitor pest activity - especially stem borer in rice",
                "Ensure proper drainage during heavy rains",
                "Apply second dose of nitrogen fertilizer",
                "Check for disease symptoms in humid conditions",
            ],
            Season::Rabi => &[
                "Prepare for wheat sowing if not done",
                "Monitor for aphid infestation in mustard",
                "Arrange irrigation schedule for winter crops",
                "Apply potash fertilizer for root development",
            ],
            Season::Summer => &[],
        }
    }
}

/// States on the Indo-Gangetic plains get waterlogging and fog warnings.
const GANGETIC_STATES: [&str; 3] = ["uttar pradesh", "punjab", "haryana"];

#[derive(Debug, Clone, Serialize)]
pub struct SeasonalAdvice {
    pub current_season: Season,
    pub season_stage: &'static str,
    pub month: u32,
    pub location: String,
    pub priority_actions: Vec<String>,
    pub crop_care_tips: Vec<String>,
    pub input_recommendations: Vec<String>,
    pub weather_considerations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonalReport {
    pub status: &'static str,
    pub seasonal_recommendations: SeasonalAdvice,
}

fn crop_tip(season: Season, crop: &CropPlan) -> Option<String> {
    let stage = crop.growth_stage.as_deref().unwrap_or("current");
    match season {
        Season::Kharif => match crop.crop_name.to_lowercase().as_str() {
            "rice" => Some(format!("Rice in {stage} stage - monitor for blast disease")),
            "sugarcane" => Some(format!(
                "Sugarcane in {stage} stage - ensure adequate water and earthing up"
            )),
            _ => None,
        },
        Season::Rabi => Some(match crop.seed_requirement_kg {
            Some(kg) => format!("Prepare for {} sowing - arrange {kg}kg seeds", crop.crop_name),
            None => format!("Prepare for {} sowing", crop.crop_name),
        }),
        Season::Summer => None,
    }
}

/// Season-specific actions for the farmer's crops and region in `month` (1-12).
pub fn seasonal_recommendations(farmer: &FarmerContext, month: u32) -> SeasonalReport {
    let season = Season::for_month(month);
    let cropping = &farmer.practice.cropping;
    let crops = match season {
        Season::Kharif => cropping.kharif_crops.as_slice(),
        Season::Rabi => cropping.rabi_crops_planned.as_slice(),
        Season::Summer => &[],
    };

    let mut weather = Vec::new();
    if GANGETIC_STATES.contains(&farmer.state.to_lowercase().as_str()) {
        match season {
            Season::Kharif => weather.push(
                "Monitor for excessive rainfall and waterlogging in Indo-Gangetic plains"
                    .to_string(),
            ),
            Season::Rabi => weather
                .push("Prepare for possible fog and cold wave affecting wheat growth".to_string()),
            Season::Summer => {}
        }
    }

    SeasonalReport {
        status: "success",
        seasonal_recommendations: SeasonalAdvice {
            current_season: season,
            season_stage: season.stage(),
            month,
            location: farmer.district.clone(),
            priority_actions: season
                .priority_actions()
                .iter()
                .map(|a| a.to_string())
                .collect(),
            crop_care_tips: crops.iter().filter_map(|c| crop_tip(season, c)).collect(),
            input_recommendations: Vec::new(),
            weather_considerations: weather,
        },
    }
}
