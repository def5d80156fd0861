//! BrasilAPI lookup provider implementation.
//!
//! This module resolves CEPs against the public BrasilAPI service via
//! the /api/cep/v2/{cep} endpoint.
//!
//! Unlike ViaCEP, BrasilAPI signals an unknown CEP with a plain HTTP
//! 404. Its field names also differ, so the response is remapped onto
//! [`AddressRecord`]; GIA and SIAFI codes are not served and stay
//! empty. API documentation: https://brasilapi.com.br/docs
//!
//! The default chain uses this provider as the fallback behind ViaCEP.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::errors::LookupError;
use crate::models::{strip_non_digits, AddressRecord, Cep, LookupReply};
use crate::provider::AddressProvider;

const BASE_URL: &str = "https://brasilapi.com.br/api/cep/v2";
const PROVIDER_ID: &str = "brasilapi";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /api/cep/v2/{cep}
#[derive(Debug, Deserialize)]
struct BrasilApiResponse {
    /// CEP, usually unmasked already
    #[serde(default)]
    cep: String,
    /// Two-letter state code
    #[serde(default)]
    state: String,
    /// City
    #[serde(default)]
    city: String,
    /// Neighborhood
    #[serde(default)]
    neighborhood: String,
    /// Street name
    #[serde(default)]
    street: String,
    /// Address complement, rarely present
    #[serde(default)]
    complement: String,
    /// IBGE city code on v2 responses
    #[serde(default)]
    city_ibge: String,
    /// IBGE city code on older responses
    #[serde(default)]
    ibge: String,
    /// Phone area code
    #[serde(default)]
    state_ddd: String,
    // Note: service and location (coordinates) exist but are not mapped
}

// ============================================================================
// BrasilApiProvider
// ============================================================================

/// BrasilAPI lookup provider.
///
/// Free public service, no API key. BrasilAPI itself aggregates
/// several CEP sources behind one endpoint.
pub struct BrasilApiProvider {
    client: Client,
}

impl BrasilApiProvider {
    /// Create a new BrasilAPI provider.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Make the lookup request and map the response.
    async fn fetch(&self, cep: &Cep, timeout: Duration) -> Result<LookupReply, LookupError> {
        let url = format!("{}/{}", BASE_URL, cep.as_str());

        debug!("BrasilAPI request: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("BrasilAPI has no record for {}", cep);
            return Ok(LookupReply::NotFound);
        }

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
        debug!("BrasilAPI resolved {}", cep);
        Ok(reply)
    }
}

impl Default for BrasilApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressProvider for BrasilApiProvider {
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

/// Map a 200 body to a found reply in the canonical field layout.
fn parse_body(body: &str) -> Result<LookupReply, LookupError> {
    let response: BrasilApiResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })?;

    let digits = strip_non_digits(&response.cep);
    if digits.is_empty() {
        return Err(LookupError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: "Response carries no cep field".to_string(),
        });
    }

    let ibge = if response.city_ibge.is_empty() {
        response.ibge
    } else {
        response.city_ibge
    };

    Ok(LookupReply::Found(AddressRecord {
        cep: digits,
        street: response.street,
        complement: response.complement,
        neighborhood: response.neighborhood,
        city: response.city,
        state: response.state,
        ibge,
        gia: String::new(),
        area_code: response.state_ddd,
        siafi: String::new(),
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id() {
        let provider = BrasilApiProvider::new();
        assert_eq!(provider.id(), "brasilapi");
    }

    #[test]
    fn test_parse_found_body() {
        let json = r#"{
            "cep": "01001000",
            "state": "SP",
            "city": "São Paulo",
            "neighborhood": "Sé",
            "street": "Praça da Sé",
            "service": "open-cep"
        }"#;

        let reply = parse_body(json).unwrap();
        let record = match reply {
            LookupReply::Found(record) => record,
            LookupReply::NotFound => panic!("expected a found reply"),
        };
        assert_eq!(record.cep, "01001000");
        assert_eq!(record.street, "Praça da Sé");
        assert_eq!(record.neighborhood, "Sé");
        assert_eq!(record.city, "São Paulo");
        assert_eq!(record.state, "SP");
        assert!(record.gia.is_empty());
        assert!(record.siafi.is_empty());
    }

    #[test]
    fn test_parse_prefers_city_ibge() {
        let json = r#"{
            "cep": "01001000",
            "city": "São Paulo",
            "city_ibge": "3550308",
            "ibge": "ignored"
        }"#;

        match parse_body(json).unwrap() {
            LookupReply::Found(record) => assert_eq!(record.ibge, "3550308"),
            LookupReply::NotFound => panic!("expected a found reply"),
        }
    }

    #[test]
    fn test_parse_falls_back_to_ibge() {
        let json = r#"{"cep": "01001000", "ibge": "3550308"}"#;

        match parse_body(json).unwrap() {
            LookupReply::Found(record) => assert_eq!(record.ibge, "3550308"),
            LookupReply::NotFound => panic!("expected a found reply"),
        }
    }

    #[test]
    fn test_parse_area_code_from_state_ddd() {
        let json = r#"{"cep": "01001000", "state_ddd": "11"}"#;

        match parse_body(json).unwrap() {
            LookupReply::Found(record) => assert_eq!(record.area_code, "11"),
            LookupReply::NotFound => panic!("expected a found reply"),
        }
    }

    #[test]
    fn test_parse_normalizes_masked_cep() {
        let json = r#"{"cep": "01001-000", "city": "São Paulo"}"#;

        match parse_body(json).unwrap() {
            LookupReply::Found(record) => assert_eq!(record.cep, "01001000"),
            LookupReply::NotFound => panic!("expected a found reply"),
        }
    }

    #[test]
    fn test_parse_body_without_cep_is_provider_error() {
        let err = parse_body(r#"{"city": "São Paulo"}"#).unwrap_err();
        assert!(matches!(err, LookupError::Provider { .. }));
        assert_eq!(err.provider(), Some("brasilapi"));
    }

    #[test]
    fn test_parse_undecodable_body_is_provider_error() {
        let err = parse_body("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, LookupError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_resolve_observes_prior_cancellation() {
        let provider = BrasilApiProvider::new();
        let cep = Cep::parse("01001000").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = provider
            .resolve(&cep, Duration::from_secs(1), &cancel)
            .await;
        assert_eq!(result, Err(LookupError::Canceled));
    }
}
