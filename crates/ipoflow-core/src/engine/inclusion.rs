use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{TradeDate, ValidationError};

/// Capitalization at which the MSCI prediction becomes `High`.
pub const LARGE_CAP_THRESHOLD_USD: f64 = 1e9;

const HEALTHCARE_SECTOR: &str = "Healthcare";
const BIOTECH_INDUSTRY_MARKERS: [&str; 2] = ["Biotech", "Pharmaceutical"];
const GROWTH_SECTORS: [&str; 3] = [
    "Technology",
    "Communication Services",
    "Consumer Discretionary",
];

/// User choice that replaces sector auto-detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectorOverride {
    #[default]
    AutoDetect,
    HealthcareBiotech,
    TechnologyGrowth,
    Other,
}

impl SectorOverride {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoDetect => "auto",
            Self::HealthcareBiotech => "healthcare-biotech",
            Self::TechnologyGrowth => "technology-growth",
            Self::Other => "other",
        }
    }
}

impl Display for SectorOverride {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectorOverride {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "auto-detect" => Ok(Self::AutoDetect),
            "healthcare-biotech" | "biotech" => Ok(Self::HealthcareBiotech),
            "technology-growth" | "tech" => Ok(Self::TechnologyGrowth),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidSectorOverride {
                value: value.to_owned(),
            }),
        }
    }
}

/// Sector bucket driving the sector-specific index rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorCategory {
    HealthcareBiotech,
    TechnologyGrowth,
    /// Auto-detection matched neither bucket.
    Unclassified,
    /// Explicitly opted out of sector rules.
    Other,
}

impl SectorCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HealthcareBiotech => "Healthcare / Biotech",
            Self::TechnologyGrowth => "Technology / Growth",
            Self::Unclassified => "Unclassified",
            Self::Other => "Other",
        }
    }
}

pub fn classify_sector(
    sector: &str,
    industry: &str,
    sector_override: SectorOverride,
) -> SectorCategory {
    match sector_override {
        SectorOverride::HealthcareBiotech => SectorCategory::HealthcareBiotech,
        SectorOverride::TechnologyGrowth => SectorCategory::TechnologyGrowth,
        SectorOverride::Other => SectorCategory::Other,
        SectorOverride::AutoDetect => {
            let biotech = sector == HEALTHCARE_SECTOR
                || BIOTECH_INDUSTRY_MARKERS
                    .iter()
                    .any(|marker| industry.contains(marker));
            if biotech {
                SectorCategory::HealthcareBiotech
            } else if GROWTH_SECTORS.contains(&sector) {
                SectorCategory::TechnologyGrowth
            } else {
                SectorCategory::Unclassified
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Probability {
    High,
    Medium,
    Low,
    Varies,
}

impl Probability {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Varies => "Varies",
        }
    }
}

impl Display for Probability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InclusionPrediction {
    pub index_name: String,
    pub target_window: String,
    pub probability: Probability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl InclusionPrediction {
    fn new(index_name: &str, target_window: impl Into<String>, probability: Probability) -> Self {
        Self {
            index_name: index_name.to_owned(),
            target_window: target_window.into(),
            probability,
            rationale: None,
        }
    }

    fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_owned());
        self
    }
}

/// Index additions expected for a recent IPO, in rule order.
pub fn predict_inclusions(
    first_trade_date: TradeDate,
    category: SectorCategory,
    market_cap_usd: f64,
) -> Vec<InclusionPrediction> {
    let mut predictions = Vec::with_capacity(6);

    // Months 11 and 12 get no Russell prediction.
    match first_trade_date.month() {
        1..=4 => predictions.push(InclusionPrediction::new(
            "Russell 2000/3000",
            "Late June",
            Probability::High,
        )),
        5..=10 => predictions.push(InclusionPrediction::new(
            "Russell 2000/3000",
            "Dec 11",
            Probability::High,
        )),
        _ => {}
    }

    predictions.push(InclusionPrediction::new(
        "CRSP US Total Market (VTI)",
        "Next Quarterly Rebalance",
        Probability::High,
    ));

    let msci_probability = if market_cap_usd >= LARGE_CAP_THRESHOLD_USD {
        Probability::High
    } else {
        Probability::Medium
    };
    predictions.push(InclusionPrediction::new(
        "MSCI USA IMI",
        "Next Index Review",
        msci_probability,
    ));

    let seasoned = first_trade_date.plus_days(365);
    predictions.push(
        InclusionPrediction::new(
            "S&P Composite 1500",
            format!("After {}", seasoned.format_month_year()),
            Probability::Low,
        )
        .with_rationale("Requires GAAP profitability and 12 months of seasoning"),
    );

    match category {
        SectorCategory::HealthcareBiotech => {
            predictions.push(InclusionPrediction::new(
                "S&P Biotech (XBI)",
                "Next Quarterly Rebalance",
                Probability::High,
            ));
            predictions.push(InclusionPrediction::new(
                "Nasdaq Biotech (NBI)",
                "December (Annual)",
                Probability::High,
            ));
        }
        SectorCategory::TechnologyGrowth | SectorCategory::Unclassified => {
            predictions.push(
                InclusionPrediction::new(
                    "Nasdaq 100 (QQQ)",
                    "Standard or Fast Entry (15 Days)",
                    Probability::Varies,
                )
                .with_rationale(
                    "Standard 3-month seasoning; qualifying mega-caps fast-track in 15 days",
                ),
            );
        }
        SectorCategory::Other => {}
    }

    predictions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> TradeDate {
        TradeDate::parse(raw).expect("date")
    }

    fn names(predictions: &[InclusionPrediction]) -> Vec<&str> {
        predictions.iter().map(|p| p.index_name.as_str()).collect()
    }

    #[test]
    fn override_parsing_accepts_cli_spellings() {
        assert_eq!("auto".parse::<SectorOverride>(), Ok(SectorOverride::AutoDetect));
        assert_eq!(
            " Healthcare-Biotech ".parse::<SectorOverride>(),
            Ok(SectorOverride::HealthcareBiotech)
        );
        assert!("fintech".parse::<SectorOverride>().is_err());
    }

    #[test]
    fn industry_markers_detect_biotech() {
        assert_eq!(
            classify_sector("Unknown", "Biotechnology", SectorOverride::AutoDetect),
            SectorCategory::HealthcareBiotech
        );
        assert_eq!(
            classify_sector(
                "Basic Materials",
                "Pharmaceutical Retailers",
                SectorOverride::AutoDetect
            ),
            SectorCategory::HealthcareBiotech
        );
        assert_eq!(
            classify_sector("Communication Services", "Internet", SectorOverride::AutoDetect),
            SectorCategory::TechnologyGrowth
        );
        assert_eq!(
            classify_sector("Industrials", "Airlines", SectorOverride::AutoDetect),
            SectorCategory::Unclassified
        );
    }

    #[test]
    fn explicit_override_wins_over_detection() {
        assert_eq!(
            classify_sector("Healthcare", "Biotechnology", SectorOverride::TechnologyGrowth),
            SectorCategory::TechnologyGrowth
        );
    }

    #[test]
    fn unclassified_still_gets_growth_prediction() {
        let predictions = predict_inclusions(date("2024-06-12"), SectorCategory::Unclassified, 0.0);

        assert_eq!(
            names(&predictions),
            vec![
                "Russell 2000/3000",
                "CRSP US Total Market (VTI)",
                "MSCI USA IMI",
                "S&P Composite 1500",
                "Nasdaq 100 (QQQ)",
            ]
        );
        assert_eq!(predictions[0].target_window, "Dec 11");
        assert_eq!(predictions[3].target_window, "After Jun 2025");
        assert_eq!(predictions[4].probability, Probability::Varies);
    }

    #[test]
    fn other_gets_no_sector_prediction() {
        let predictions = predict_inclusions(date("2024-12-02"), SectorCategory::Other, 2e9);

        assert_eq!(
            names(&predictions),
            vec!["CRSP US Total Market (VTI)", "MSCI USA IMI", "S&P Composite 1500"]
        );
        assert_eq!(predictions[1].probability, Probability::High);
    }
}
