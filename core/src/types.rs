//! Shared primitive types used across the engine and its stores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every monetary value is an exact decimal.
pub type Amount = rust_decimal::Decimal;

/// A stable identifier for a template, report or order.
pub type EntityId = String;

/// How a single transaction was paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller's requested payment policy for a generation call.
/// `Mixed` resolves each unhinted line by coin flip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPolicy {
    Cash,
    Card,
    #[default]
    #[serde(alias = "both")]
    Mixed,
}

impl PaymentPolicy {
    /// The single method this policy pins, if any.
    pub fn single(&self) -> Option<PaymentMethod> {
        match self {
            Self::Cash => Some(PaymentMethod::Cash),
            Self::Card => Some(PaymentMethod::Card),
            Self::Mixed => None,
        }
    }

    /// Method used when a line must be booked without a coin flip.
    pub fn default_method(&self) -> PaymentMethod {
        self.single().unwrap_or(PaymentMethod::Cash)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Mixed => "mixed",
        }
    }
}

impl FromStr for PaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            // "both" is the legacy spelling used by older template files.
            "mixed" | "both" => Ok(Self::Mixed),
            other => Err(format!("unknown payment policy '{other}'")),
        }
    }
}
