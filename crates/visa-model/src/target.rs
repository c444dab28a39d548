//! Target label encoding for `case_status`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Visa case outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Certified,
    Denied,
}

impl CaseStatus {
    pub const ALL: [Self; 2] = [Self::Certified, Self::Denied];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Certified => "Certified",
            Self::Denied => "Denied",
        }
    }

    /// Numeric class code. `Denied` is the positive class.
    pub fn code(self) -> u8 {
        match self {
            Self::Certified => 0,
            Self::Denied => 1,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Certified" => Ok(Self::Certified),
            "Denied" => Ok(Self::Denied),
            other => Err(ConfigError::invalid(format!(
                "unknown case_status label '{other}'"
            ))),
        }
    }
}

/// Fixed `{Certified: 0, Denied: 1}` mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetValueMapping;

impl TargetValueMapping {
    pub fn encode(self, label: &str) -> Option<u8> {
        label.parse::<CaseStatus>().ok().map(CaseStatus::code)
    }

    /// Code to label pairs, in code order.
    pub fn reverse_mapping(self) -> Vec<(u8, &'static str)> {
        CaseStatus::ALL
            .iter()
            .map(|status| (status.code(), status.as_str()))
            .collect()
    }
}
