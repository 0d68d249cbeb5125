//! Analysis gateway
//!
//! Typed request/response pass-through over the analysis backend.
//! One network call per operation: no retries, no caching. Degradation
//! lives in the fallback ladder, not here.

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::models::{
    AnalysisRequest, CompanyAnalysis, CompanySearchResult, DemoCompany, IncludeFlag,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Backend operations consumed by the console
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn search_company(&self, tax_id: &str) -> Result<CompanySearchResult>;
    async fn comprehensive_analysis(&self, request: &AnalysisRequest) -> Result<CompanyAnalysis>;
    async fn demo_data(&self) -> Result<Vec<DemoCompany>>;
}

/// reqwest-backed gateway (connection-pooled)
#[derive(Clone)]
pub struct HttpAnalysisGateway {
    client: Client,
    base_url: String,
}

impl HttpAnalysisGateway {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET analysis backend");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url.as_str(), e))?;

        decode_response(url.as_str(), response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "POST analysis backend");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        decode_response(&url, response).await
    }

    fn parse_url(&self, path: &str) -> Result<Url> {
        Url::parse(&self.url(path))
            .map_err(|e| ConsoleError::Config(format!("Invalid backend URL {}: {}", self.base_url, e)))
    }
}

#[async_trait]
impl AnalysisGateway for HttpAnalysisGateway {
    async fn search_company(&self, tax_id: &str) -> Result<CompanySearchResult> {
        let mut url = self.parse_url("/hackathon/company-search")?;
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Config(format!("Backend URL cannot be a base: {}", self.base_url)))?
            .push(tax_id);

        let body: SearchResponse = self.get_json(url).await?;

        Ok(CompanySearchResult {
            found: body.found,
            company_name: body
                .company_data
                .and_then(|data| data.company_name)
                .filter(|name| !name.trim().is_empty()),
        })
    }

    async fn comprehensive_analysis(&self, request: &AnalysisRequest) -> Result<CompanyAnalysis> {
        let body = ComprehensiveAnalysisBody::from(request);
        let response: ComprehensiveAnalysisResponse = self
            .post_json("/hackathon/comprehensive-analysis", &body)
            .await?;

        Ok(response.analysis_result)
    }

    async fn demo_data(&self) -> Result<Vec<DemoCompany>> {
        let url = self.parse_url("/hackathon/demo-data")?;
        let response: DemoDataResponse = self.get_json(url).await?;
        Ok(response.demo_companies)
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ConsoleError {
    warn!(%url, error = %e, "Analysis backend unreachable");
    ConsoleError::Network(format!("{}: {}", url, e))
}

async fn decode_response<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(url, e))?;

    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "Analysis backend returned an error status");
        return Err(ConsoleError::Backend {
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        warn!(%url, error = %e, "Malformed analysis backend response");
        ConsoleError::Decode(format!("{}: {}", url, e))
    })
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
struct ComprehensiveAnalysisBody<'a> {
    company_ruc: &'a str,
    company_name: &'a str,
    sector: &'a str,
    social_media_urls: &'a [String],
    include_supercias_data: bool,
    include_digital_footprint: bool,
    include_scenario_analysis: bool,
}

impl<'a> From<&'a AnalysisRequest> for ComprehensiveAnalysisBody<'a> {
    fn from(request: &'a AnalysisRequest) -> Self {
        Self {
            company_ruc: &request.company_id,
            company_name: &request.company_name,
            sector: &request.sector,
            social_media_urls: &request.social_media_urls,
            include_supercias_data: request.includes(IncludeFlag::SuperciasData),
            include_digital_footprint: request.includes(IncludeFlag::DigitalFootprint),
            include_scenario_analysis: request.includes(IncludeFlag::ScenarioAnalysis),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComprehensiveAnalysisResponse {
    analysis_result: CompanyAnalysis,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    found: bool,
    #[serde(default)]
    company_data: Option<SearchCompanyData>,
}

#[derive(Debug, Deserialize)]
struct SearchCompanyData {
    #[serde(default)]
    company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DemoDataResponse {
    demo_companies: Vec<DemoCompany>,
}
