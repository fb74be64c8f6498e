//! Provider identifiers shared by the credential store and the chat adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An LLM vendor. Used as the partition key for everything stored per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Gpt,
    Claude,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::Gpt, Provider::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Gpt => "gpt",
            Provider::Claude => "claude",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(Provider::Gemini),
            "gpt" => Ok(Provider::Gpt),
            "claude" => Ok(Provider::Claude),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// A provider as named by a caller, which may not be one we recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderTag {
    Known(Provider),
    Unknown(String),
}

impl ProviderTag {
    pub fn parse(s: &str) -> Self {
        match s.parse::<Provider>() {
            Ok(provider) => ProviderTag::Known(provider),
            Err(UnknownProvider(name)) => ProviderTag::Unknown(name),
        }
    }
}
