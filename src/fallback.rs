//! Fallback policy
//!
//! Degradation ladder for one submission:
//! SEARCH → ANALYSIS (× attempts) → DEMO LISTING → TERMINAL FAILURE
//!
//! A notice is pushed to the sink before every network attempt, so the
//! transcript always shows what is being tried. Every path ends in an
//! outcome; gateway errors never escape.

use crate::classifier::AnalysisTarget;
use crate::conversation::ConversationStore;
use crate::gateway::AnalysisGateway;
use crate::models::{AnalysisRequest, CompanyAnalysis, DemoCompany, DEFAULT_SECTOR};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const NOTICE_SEARCHING: &str = "🔍 Buscando empresa en Super de Compañías...";
pub const NOTICE_SEARCH_FAILED: &str =
    "❌ Error al buscar en Super de Compañías. Realizando análisis con datos simulados...";
pub const NOTICE_ANALYSING: &str = "🔍 Iniciando análisis integral...";
pub const NOTICE_ANALYSIS_FAILED: &str =
    "❌ Error al realizar el análisis. Intentando con datos de demostración...";

const FOUND_PLACEHOLDER_NAME: &str = "Empresa Encontrada";

/// Where ladder notices go (the session transcript in production)
pub trait NoticeSink: Send {
    fn notice(&mut self, text: String);
}

impl NoticeSink for ConversationStore {
    fn notice(&mut self, text: String) {
        self.append_system(text);
    }
}

/// Terminal result of one ladder run
#[derive(Debug, Clone, PartialEq)]
pub enum LadderOutcome {
    /// Comprehensive analysis succeeded
    Analysis(CompanyAnalysis),
    /// Analysis failed; demo companies listed instead
    DemoFallback(Vec<DemoCompany>),
    /// Demo listing requested directly
    DemoCatalog(Vec<DemoCompany>),
    /// Every rung failed
    Unreachable,
    /// Direct demo listing failed
    DemoUnavailable,
}

/// Coarse classification of a ladder result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderOutcomeKind {
    Success,
    Fallback,
    Failure,
}

impl LadderOutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LadderOutcomeKind::Success => "success",
            LadderOutcomeKind::Fallback => "fallback",
            LadderOutcomeKind::Failure => "failure",
        }
    }
}

impl LadderOutcome {
    pub fn kind(&self) -> LadderOutcomeKind {
        match self {
            LadderOutcome::Analysis(_) => LadderOutcomeKind::Success,
            LadderOutcome::DemoFallback(_) | LadderOutcome::DemoCatalog(_) => {
                LadderOutcomeKind::Fallback
            }
            LadderOutcome::Unreachable | LadderOutcome::DemoUnavailable => {
                LadderOutcomeKind::Failure
            }
        }
    }
}

pub struct FallbackPolicy {
    max_analysis_attempts: u32,
}

impl FallbackPolicy {
    pub fn new(max_analysis_attempts: u32) -> Self {
        Self {
            max_analysis_attempts: max_analysis_attempts.max(1),
        }
    }

    pub async fn run<S: NoticeSink + ?Sized>(
        &self,
        gateway: &dyn AnalysisGateway,
        target: &AnalysisTarget,
        sink: &mut S,
    ) -> LadderOutcome {
        match target {
            AnalysisTarget::Lookup { tax_id } => {
                let name = self.resolve_name(gateway, tax_id, sink).await;
                self.analyse(gateway, name, Some(tax_id.clone()), sink).await
            }
            AnalysisTarget::Named { name } => {
                self.analyse(gateway, name.clone(), None, sink).await
            }
            AnalysisTarget::Prefilled { name, tax_id } => {
                self.analyse(gateway, name.clone(), Some(tax_id.clone()), sink)
                    .await
            }
            AnalysisTarget::DemoListing => match gateway.demo_data().await {
                Ok(companies) => {
                    info!(companies = companies.len(), "Demo catalog loaded");
                    LadderOutcome::DemoCatalog(companies)
                }
                Err(e) => {
                    warn!(error = %e, kind = e.kind(), "Demo data unavailable");
                    LadderOutcome::DemoUnavailable
                }
            },
        }
    }

    /// Rung 1: look the tax id up. Never aborts; failures fall through to
    /// a synthesized name.
    async fn resolve_name<S: NoticeSink + ?Sized>(
        &self,
        gateway: &dyn AnalysisGateway,
        tax_id: &str,
        sink: &mut S,
    ) -> String {
        sink.notice(NOTICE_SEARCHING.to_string());

        match gateway.search_company(tax_id).await {
            Ok(result) if result.found => {
                let name = result
                    .company_name
                    .unwrap_or_else(|| FOUND_PLACEHOLDER_NAME.to_string());
                info!(%tax_id, company = %name, "Company found");
                name
            }
            Ok(_) => {
                info!(%tax_id, "Company not found, continuing with synthesized name");
                sink.notice(format!(
                    "❌ No se encontró empresa con RUC: {}. Intentando análisis con datos simulados...",
                    tax_id
                ));
                synthesized_name(tax_id)
            }
            Err(e) => {
                warn!(%tax_id, error = %e, kind = e.kind(), "Company search failed");
                sink.notice(NOTICE_SEARCH_FAILED.to_string());
                synthesized_name(tax_id)
            }
        }
    }

    /// Rung 2 (+ retries), then rung 3 on exhaustion
    async fn analyse<S: NoticeSink + ?Sized>(
        &self,
        gateway: &dyn AnalysisGateway,
        company_name: String,
        tax_id: Option<String>,
        sink: &mut S,
    ) -> LadderOutcome {
        let company_id = tax_id.unwrap_or_else(synthetic_tax_id);
        let request = AnalysisRequest::full(company_id, company_name, DEFAULT_SECTOR.to_string());

        for attempt in 1..=self.max_analysis_attempts {
            if attempt == 1 {
                sink.notice(NOTICE_ANALYSING.to_string());
            } else {
                sink.notice(format!(
                    "🔁 Reintentando análisis ({}/{})...",
                    attempt, self.max_analysis_attempts
                ));
            }

            debug!(
                company = %request.company_name,
                company_id = %request.company_id,
                attempt,
                "Requesting comprehensive analysis"
            );

            match gateway.comprehensive_analysis(&request).await {
                Ok(analysis) => {
                    info!(
                        company = %analysis.company_info.name,
                        final_score = analysis.risk_assessment.final_score,
                        attempt,
                        "Comprehensive analysis completed"
                    );
                    return LadderOutcome::Analysis(analysis);
                }
                Err(e) => {
                    warn!(
                        company = %request.company_name,
                        attempt,
                        error = %e,
                        kind = e.kind(),
                        "Comprehensive analysis failed"
                    );
                }
            }
        }

        sink.notice(NOTICE_ANALYSIS_FAILED.to_string());

        match gateway.demo_data().await {
            Ok(companies) => {
                info!(companies = companies.len(), "Degraded to demo listing");
                LadderOutcome::DemoFallback(companies)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Demo data unavailable, ladder exhausted");
                LadderOutcome::Unreachable
            }
        }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

fn synthesized_name(tax_id: &str) -> String {
    format!("Empresa {} {}", DEFAULT_SECTOR, tax_id)
}

/// Timestamp-derived stand-in for a missing tax id
fn synthetic_tax_id() -> String {
    format!("{}001", Utc::now().timestamp_millis())
}
