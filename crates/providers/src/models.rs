//! Core models for CEP resolution.
//!
//! This module defines the canonical [`Cep`] identifier, the
//! [`AddressRecord`] payload providers return, and [`LookupReply`],
//! a provider's definitive answer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LookupError;

/// Number of digits in a canonical CEP.
pub const CEP_LEN: usize = 8;

/// Removes every non-digit character from the input.
///
/// This is the normalization step shared by [`Cep::parse`] and the
/// providers when cleaning the `cep` field of a response. Masked forms
/// like `"01310-100"` become `"01310100"`.
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Canonical CEP identifier: exactly eight ASCII digits.
///
/// The only way to obtain one is [`Cep::parse`], so holding a `Cep`
/// is proof the input already passed validation. Parsing strips mask
/// characters first, so `"01310-100"` and `"01310100"` produce the
/// same value.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cep(String);

impl Cep {
    /// Parse raw user input into a canonical CEP.
    ///
    /// Strips every non-digit character, then requires exactly
    /// [`CEP_LEN`] digits to remain. Pure and deterministic: the same
    /// input always yields the same result, and parsing a canonical
    /// value is idempotent.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let digits = strip_non_digits(raw);
        if digits.len() == CEP_LEN {
            Ok(Self(digits))
        } else {
            Err(LookupError::InvalidCep {
                raw: raw.to_string(),
            })
        }
    }

    /// The eight digits, unmasked.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `#####-###` display form.
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Cep {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cep {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cep> for String {
    fn from(cep: Cep) -> Self {
        cep.0
    }
}

/// Address data for a resolved CEP.
///
/// Field names follow Brazilian address terminology in English; the
/// ViaCEP client maps its Portuguese field names onto this shape and
/// the BrasilAPI client its own. Fields a provider does not supply are
/// empty strings, never absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressRecord {
    /// Canonical eight-digit CEP, mask stripped
    pub cep: String,

    /// Street name (logradouro)
    pub street: String,

    /// Address complement, when the CEP carries one
    pub complement: String,

    /// Neighborhood (bairro)
    pub neighborhood: String,

    /// City (localidade)
    pub city: String,

    /// Two-letter state code (UF)
    pub state: String,

    /// IBGE city code
    pub ibge: String,

    /// GIA code (SP state tax registry); empty outside ViaCEP
    pub gia: String,

    /// Phone area code (DDD)
    pub area_code: String,

    /// SIAFI code; empty outside ViaCEP
    pub siafi: String,
}

/// A provider's definitive answer for a CEP.
///
/// Both arms end the lookup: a provider that says the CEP does not
/// exist is as final as one that returns the address. Failures travel
/// through [`LookupError`](crate::errors::LookupError) instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupReply {
    /// The CEP exists and resolved to this address.
    Found(AddressRecord),

    /// The provider states the CEP does not exist.
    NotFound,
}
