//! Result formatting
//!
//! Turns analysis results into transcript text and dashboard panel state.
//! Everything here is pure and deterministic.

use crate::models::{CompanyAnalysis, DemoCompany};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Render a completed analysis as a transcript entry.
pub fn format_analysis(analysis: &CompanyAnalysis) -> String {
    let info = &analysis.company_info;
    let risk = &analysis.risk_assessment;
    let score = &analysis.hackathon_score;

    let mut out = String::new();

    // ── Identity ──
    out.push_str("🎯 **ANÁLISIS INTEGRAL COMPLETADO**\n\n");
    let _ = writeln!(out, "**🏢 Empresa:** {}", info.name);
    let _ = writeln!(out, "**📋 RUC:** {}", info.tax_id);
    let _ = writeln!(out, "**🏭 Sector:** {}", info.sector);
    out.push('\n');

    // ── Risk scoring ──
    out.push_str("**📊 SCORING DE RIESGO:**\n");
    let _ = writeln!(out, "• **Score Final:** {}/100", risk.final_score);
    let _ = writeln!(out, "• **Nivel de Riesgo:** {}", risk.risk_level.label());
    let _ = writeln!(
        out,
        "• **Confianza:** {}%",
        confidence_percent(risk.confidence_level)
    );
    out.push('\n');

    // ── Hackathon score ──
    out.push_str("**🏆 SCORE HACKATHON:**\n");
    let _ = writeln!(out, "• **Puntuación:** {}/100", score.score);
    let _ = writeln!(out, "• **Clasificación:** {}", score.classification);
    out.push('\n');

    // ── Recommendations ──
    out.push_str("**💡 RECOMENDACIÓN:**\n");
    let _ = writeln!(out, "{}", risk.recommendation);
    out.push('\n');

    out.push_str("**📋 RECOMENDACIONES ESPECÍFICAS:**\n");
    for rec in &analysis.recommendations {
        let _ = writeln!(out, "• {}", rec);
    }
    out.push('\n');

    out.push_str("¿Te gustaría ver simulaciones de escenarios o análisis más detallado?");
    out
}

/// Short listing shown when the full analysis could not be produced
pub fn format_demo_fallback(companies: &[DemoCompany]) -> String {
    let mut out = String::from("📊 Datos de demostración disponibles:\n");

    for (i, company) in companies.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {} ({}) - {}",
            i + 1,
            company.name,
            company.tax_id,
            company.sector
        );
    }

    out
}

/// Detailed listing for the "demo" quick action
pub fn format_demo_catalog(companies: &[DemoCompany]) -> String {
    let mut out = String::from("📊 **DATOS DE DEMOSTRACIÓN:**\n");

    for (i, company) in companies.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. **{}**\n   RUC: {}\n   Sector: {}\n   Descripción: {}\n",
            i + 1,
            company.name,
            company.tax_id,
            company.sector,
            company.description
        );
    }

    out
}

fn confidence_percent(confidence_level: f64) -> String {
    format!("{:.1}", confidence_level * 100.0)
}

//
// ================= Panel State =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentScore {
    /// Component key without `_score`, upper-cased
    pub label: String,
    pub value: f64,
    pub display: String,
}

/// Projection of the current analysis for the dashboard panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisPanel {
    pub company_name: String,
    pub tax_id: String,
    pub sector: String,
    pub hackathon_score: f64,
    pub classification: String,
    pub color_tag: String,
    pub confidence_percent: String,
    pub final_score: f64,
    pub risk_label: String,
    pub recommendation: String,
    pub component_scores: Vec<ComponentScore>,
}

impl From<&CompanyAnalysis> for AnalysisPanel {
    fn from(analysis: &CompanyAnalysis) -> Self {
        let risk = &analysis.risk_assessment;

        let mut component_scores: Vec<ComponentScore> = risk
            .component_scores
            .iter()
            .map(|(key, value)| ComponentScore {
                label: component_label(key),
                value: *value,
                display: format!("{:.1}", value),
            })
            .collect();
        component_scores.sort_by(|a, b| a.label.cmp(&b.label));

        Self {
            company_name: analysis.company_info.name.clone(),
            tax_id: analysis.company_info.tax_id.clone(),
            sector: analysis.company_info.sector.clone(),
            hackathon_score: analysis.hackathon_score.score,
            classification: analysis.hackathon_score.classification.clone(),
            color_tag: analysis.hackathon_score.color_tag.clone(),
            confidence_percent: confidence_percent(risk.confidence_level),
            final_score: risk.final_score,
            risk_label: risk.risk_level.label().to_string(),
            recommendation: risk.recommendation.clone(),
            component_scores,
        }
    }
}

fn component_label(key: &str) -> String {
    key.strip_suffix("_score").unwrap_or(key).to_uppercase()
}
