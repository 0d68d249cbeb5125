//! Core data models for the risk analysis console

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DEFAULT_SECTOR: &str = "Comercial";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl RiskLevel {
    /// Upper-case label shown in the transcript and panel
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "BAJO",
            RiskLevel::Medium => "MEDIO",
            RiskLevel::MediumHigh => "MEDIO-ALTO",
            RiskLevel::High => "ALTO",
        }
    }
}

/// Optional data sources requested from the analysis backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum IncludeFlag {
    SuperciasData,
    DigitalFootprint,
    ScenarioAnalysis,
}

//
// ================= Transcript =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<CompanyAnalysis>,
}

//
// ================= Analysis Request =================
//

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Tax id (RUC), possibly synthesized
    pub company_id: String,
    pub company_name: String,
    pub sector: String,
    pub social_media_urls: Vec<String>,
    pub include_flags: BTreeSet<IncludeFlag>,
}

impl AnalysisRequest {
    /// Request with every optional data source enabled
    pub fn full(company_id: String, company_name: String, sector: String) -> Self {
        Self {
            company_id,
            company_name,
            sector,
            social_media_urls: Vec::new(),
            include_flags: [
                IncludeFlag::SuperciasData,
                IncludeFlag::DigitalFootprint,
                IncludeFlag::ScenarioAnalysis,
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn includes(&self, flag: IncludeFlag) -> bool {
        self.include_flags.contains(&flag)
    }
}

//
// ================= Analysis Response =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyAnalysis {
    pub company_info: CompanyInfo,
    #[serde(rename = "integrated_risk_assessment")]
    pub risk_assessment: RiskAssessment,
    pub hackathon_score: HackathonScore,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyInfo {
    #[serde(rename = "ruc")]
    pub tax_id: String,
    pub name: String,
    #[serde(default)]
    pub sector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    #[serde(rename = "final_risk_score")]
    pub final_score: f64,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    #[serde(default)]
    pub component_scores: BTreeMap<String, f64>,
    /// 0.0 – 1.0
    pub confidence_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HackathonScore {
    pub score: f64,
    pub classification: String,
    #[serde(rename = "color")]
    pub color_tag: String,
}

//
// ================= Search / Demo =================
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanySearchResult {
    pub found: bool,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemoCompany {
    pub name: String,
    #[serde(rename = "ruc")]
    pub tax_id: String,
    pub sector: String,
    #[serde(default)]
    pub description: String,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sender::User => "user",
            Sender::System => "system",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_decodes_backend_shape() {
        let raw = serde_json::json!({
            "company_info": { "ruc": "1791234567001", "name": "TechStart Ecuador S.A.", "sector": "Tecnología" },
            "analysis_timestamp": "2024-01-01T00:00:00",
            "integrated_risk_assessment": {
                "final_risk_score": 72.0,
                "risk_level": "medium",
                "recommendation": "APROBADO CON CONDICIONES - Perfil sólido",
                "component_scores": { "rag_score": 70.0, "digital_score": 64.5 },
                "weights_used": { "rag_analysis": 0.3 },
                "confidence_level": 0.85
            },
            "hackathon_score": { "score": 23.8, "classification": "DEFICIENTE", "color": "red", "max_score": 100 },
            "recommendations": ["Fortalecer presencia digital"]
        });

        let analysis: CompanyAnalysis = serde_json::from_value(raw).unwrap();
        assert_eq!(analysis.company_info.tax_id, "1791234567001");
        assert_eq!(analysis.risk_assessment.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.risk_assessment.component_scores.len(), 2);
        assert_eq!(analysis.hackathon_score.color_tag, "red");
    }

    #[test]
    fn test_medium_high_risk_level() {
        let level: RiskLevel = serde_json::from_str("\"medium-high\"").unwrap();
        assert_eq!(level, RiskLevel::MediumHigh);
        assert_eq!(level.to_string(), "MEDIO-ALTO");
    }

    #[test]
    fn test_unknown_risk_level_is_rejected() {
        assert!(serde_json::from_str::<RiskLevel>("\"catastrophic\"").is_err());
    }

    #[test]
    fn test_full_request_enables_every_source() {
        let request = AnalysisRequest::full(
            "1791234567001".into(),
            "TechStart".into(),
            DEFAULT_SECTOR.into(),
        );
        assert!(request.includes(IncludeFlag::SuperciasData));
        assert!(request.includes(IncludeFlag::DigitalFootprint));
        assert!(request.includes(IncludeFlag::ScenarioAnalysis));
        assert!(request.social_media_urls.is_empty());
    }
}
