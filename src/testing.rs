//! Scripted gateway used by unit tests

use crate::error::ConsoleError;
use crate::gateway::AnalysisGateway;
use crate::models::{
    AnalysisRequest, CompanyAnalysis, CompanyInfo, CompanySearchResult, DemoCompany,
    HackathonScore, RiskAssessment, RiskLevel,
};
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Network,
    Backend,
    Decode,
}

impl Fault {
    fn into_error(self) -> ConsoleError {
        match self {
            Fault::Network => ConsoleError::Network("connection refused".into()),
            Fault::Backend => ConsoleError::Backend {
                status: 500,
                body: "{\"detail\":\"Error en análisis\"}".into(),
            },
            Fault::Decode => ConsoleError::Decode("missing field `analysis_result`".into()),
        }
    }
}

pub type Step<T> = std::result::Result<T, Fault>;

/// Gate that holds the analysis call open until released
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

pub struct ScriptedGateway {
    search: Step<CompanySearchResult>,
    /// One entry per attempt; the last one repeats
    analysis: Vec<Step<CompanyAnalysis>>,
    demo: Step<Vec<DemoCompany>>,
    gate: Option<Gate>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            search: Ok(CompanySearchResult { found: false, company_name: None }),
            analysis: vec![Ok(analysis_fixture("Empresa", "0000000000001", 72.0, RiskLevel::Medium))],
            demo: Ok(demo_fixture()),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search(mut self, step: Step<CompanySearchResult>) -> Self {
        self.search = step;
        self
    }

    pub fn with_analysis(mut self, steps: Vec<Step<CompanyAnalysis>>) -> Self {
        self.analysis = steps;
        self
    }

    pub fn with_demo(mut self, step: Step<Vec<DemoCompany>>) -> Self {
        self.demo = step;
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }

    fn analysis_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with("analysis:"))
            .count()
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedGateway {
    async fn search_company(&self, tax_id: &str) -> Result<CompanySearchResult> {
        self.record(format!("search:{}", tax_id));
        self.search.clone().map_err(Fault::into_error)
    }

    async fn comprehensive_analysis(&self, request: &AnalysisRequest) -> Result<CompanyAnalysis> {
        self.record(format!(
            "analysis:{}:{}",
            request.company_name, request.company_id
        ));
        let attempt = self.analysis_calls();

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let index = attempt.saturating_sub(1).min(self.analysis.len().saturating_sub(1));
        self.analysis[index].clone().map_err(Fault::into_error)
    }

    async fn demo_data(&self) -> Result<Vec<DemoCompany>> {
        self.record("demo".to_string());
        self.demo.clone().map_err(Fault::into_error)
    }
}

pub fn analysis_fixture(name: &str, tax_id: &str, final_score: f64, level: RiskLevel) -> CompanyAnalysis {
    let mut component_scores = BTreeMap::new();
    component_scores.insert("rag_score".to_string(), 70.0);
    component_scores.insert("financial_score".to_string(), 75.5);

    CompanyAnalysis {
        company_info: CompanyInfo {
            tax_id: tax_id.to_string(),
            name: name.to_string(),
            sector: "Comercial".to_string(),
        },
        risk_assessment: RiskAssessment {
            final_score,
            risk_level: level,
            recommendation: "APROBADO CON CONDICIONES - Perfil sólido".to_string(),
            component_scores,
            confidence_level: 0.8,
        },
        hackathon_score: HackathonScore {
            score: 22.4,
            classification: "DEFICIENTE".to_string(),
            color_tag: "red".to_string(),
        },
        recommendations: vec![
            "Fortalecer presencia digital".to_string(),
            "Presentar estados financieros auditados".to_string(),
        ],
    }
}

pub fn demo_fixture() -> Vec<DemoCompany> {
    vec![
        DemoCompany {
            name: "TechStart Ecuador S.A.".into(),
            tax_id: "1791234567001".into(),
            sector: "Tecnología".into(),
            description: "Startup de desarrollo de software".into(),
        },
        DemoCompany {
            name: "Comercial Los Andes".into(),
            tax_id: "0987654321001".into(),
            sector: "Comercio".into(),
            description: "Cadena de tiendas de retail".into(),
        },
        DemoCompany {
            name: "Manufactura Moderna S.A.".into(),
            tax_id: "1122334455001".into(),
            sector: "Manufactura".into(),
            description: "Fabricación de productos textiles".into(),
        },
    ]
}
