//! ViaCEP lookup provider implementation.
//!
//! This module resolves CEPs against the public ViaCEP service via
//! the /ws/{cep}/json/ endpoint.
//!
//! ViaCEP signals an unknown CEP with HTTP 200 and an `erro` marker in
//! the body rather than a 404. The marker appears as boolean `true` on
//! some deployments and as the string `"true"` on others; both count.
//! API documentation: https://viacep.com.br

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::errors::LookupError;
use crate::models::{strip_non_digits, AddressRecord, Cep, LookupReply};
use crate::provider::AddressProvider;

const BASE_URL: &str = "https://viacep.com.br/ws";
const PROVIDER_ID: &str = "viacep";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /ws/{cep}/json/
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    /// Not-found marker, present only for unknown CEPs
    #[serde(default)]
    erro: Option<serde_json::Value>,
    /// Masked CEP, e.g. "01001-000"
    #[serde(default)]
    cep: String,
    /// Street name
    #[serde(default)]
    logradouro: String,
    /// Address complement
    #[serde(default)]
    complemento: String,
    /// Neighborhood
    #[serde(default)]
    bairro: String,
    /// City
    #[serde(default)]
    localidade: String,
    /// Two-letter state code
    #[serde(default)]
    uf: String,
    /// IBGE city code
    #[serde(default)]
    ibge: String,
    /// GIA code
    #[serde(default)]
    gia: String,
    /// Phone area code
    #[serde(default)]
    ddd: String,
    /// SIAFI code
    #[serde(default)]
    siafi: String,
    // Note: unidade, estado, regiao exist on newer deployments but are not mapped
}

// ============================================================================
// ViaCepProvider
// ============================================================================

/// ViaCEP lookup provider.
///
/// The primary provider in the default chain. Free public service,
/// no API key.
pub struct ViaCepProvider {
    client: Client,
}

impl ViaCepProvider {
    /// Create a new ViaCEP provider.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Make the lookup request and map the response.
    async fn fetch(&self, cep: &Cep, timeout: Duration) -> Result<LookupReply, LookupError> {
        let url = format!("{}/{}/json/", BASE_URL, cep.as_str());

        debug!("ViaCEP request: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            return Err(LookupError::Network {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let reply = parse_body(&body)?;
        match &reply {
            LookupReply::Found(_) => debug!("ViaCEP resolved {}", cep),
            LookupReply::NotFound => debug!("ViaCEP has no record for {}", cep),
        }
        Ok(reply)
    }
}

impl Default for ViaCepProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressProvider for ViaCepProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn resolve(
        &self,
        cep: &Cep,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<LookupReply, LookupError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LookupError::Canceled),
            result = self.fetch(cep, timeout) => result,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Map a reqwest transport error to the lookup taxonomy.
fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout {
            provider: PROVIDER_ID.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        LookupError::Network {
            provider: PROVIDER_ID.to_string(),
            message: format!("Request failed: {}", err),
        }
    }
}

/// Whether the `erro` marker value signals an unknown CEP.
fn is_error_marker(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::String(text) => text == "true",
        _ => false,
    }
}

/// Map a 200 body to a definitive answer.
///
/// A body with the `erro` marker is NotFound. A body with an address
/// is Found. A 200 body with neither is a provider contract violation,
/// not a missing CEP.
fn parse_body(body: &str) -> Result<LookupReply, LookupError> {
    let response: ViaCepResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })?;

    if response.erro.as_ref().is_some_and(is_error_marker) {
        return Ok(LookupReply::NotFound);
    }

    let digits = strip_non_digits(&response.cep);
    if digits.is_empty() {
        return Err(LookupError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: "Response carries neither an address nor the erro marker".to_string(),
        });
    }

    Ok(LookupReply::Found(AddressRecord {
        cep: digits,
        street: response.logradouro,
        complement: response.complemento,
        neighborhood: response.bairro,
        city: response.localidade,
        state: response.uf,
        ibge: response.ibge,
        gia: response.gia,
        area_code: response.ddd,
        siafi: response.siafi,
    }))
}

// ============================================================================
// Tests
// ============================================================================
