use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// List dialects understood by the parser set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceFormat {
    /// One domain per line, `*.domain` for subdomain scope.
    Domains,
    /// hosts-file syntax: `0.0.0.0 domain`.
    Hosts,
    /// Ad-block filter syntax: `||domain^`.
    Adblock,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Domains => "domains",
            SourceFormat::Hosts => "hosts",
            SourceFormat::Adblock => "adblock",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domains" | "plain" | "domain" => Ok(SourceFormat::Domains),
            "hosts" | "hostfile" => Ok(SourceFormat::Hosts),
            "adblock" | "abp" => Ok(SourceFormat::Adblock),
            other => Err(DomainError::UnknownFormat(other.to_string())),
        }
    }
}

impl TryFrom<String> for SourceFormat {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceFormat> for String {
    fn from(value: SourceFormat) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
