//! Contest descriptions: format, type, field size, entry fee and payout structure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contest format. Classic uses positional slots; showdown is a single game
/// with one captain plus flex slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestFormat {
    Classic,
    Showdown,
}

impl ContestFormat {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Showdown => "showdown",
        }
    }
}

impl fmt::Display for ContestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "showdown" => Ok(Self::Showdown),
            other => Err(format!("unknown contest format '{other}'")),
        }
    }
}

/// Cash games pay a flat multiple above a cutoff; GPPs pay a top-heavy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestType {
    Cash,
    Gpp,
}

impl ContestType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Gpp => "gpp",
        }
    }
}

impl fmt::Display for ContestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "gpp" => Ok(Self::Gpp),
            other => Err(format!("unknown contest type '{other}'")),
        }
    }
}

/// One GPP payout band: entries with `rank / N <= upper` earn `multiplier × fee`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutBand {
    pub upper: f64,
    pub multiplier: f64,
}

/// How a contest pays out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoutStructure {
    /// Everyone at or above the `(1 - threshold)` percentile earns `multiplier × fee`.
    Cash { threshold: f64, multiplier: f64 },
    /// Ordered bands, ascending by `upper`.
    Gpp { bands: Vec<PayoutBand> },
}

impl PayoutStructure {
    pub fn standard_cash() -> Self {
        Self::Cash {
            threshold: 0.44,
            multiplier: 2.0,
        }
    }

    pub fn standard_gpp() -> Self {
        let bands = [
            (0.01, 10.0),
            (0.05, 5.0),
            (0.10, 3.0),
            (0.20, 2.0),
            (0.30, 1.5),
            (0.40, 1.2),
        ]
        .into_iter()
        .map(|(upper, multiplier)| PayoutBand { upper, multiplier })
        .collect();
        Self::Gpp { bands }
    }

    pub fn contest_type(&self) -> ContestType {
        match self {
            Self::Cash { .. } => ContestType::Cash,
            Self::Gpp { .. } => ContestType::Gpp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContestError {
    #[error("field size must be at least 1 entrant")]
    EmptyField,
    #[error("entry fee must be positive, got {0}")]
    InvalidEntryFee(f64),
    #[error("cash threshold must be in (0, 1), got {0}")]
    InvalidCashThreshold(f64),
    #[error("payout multiplier must be positive, got {0}")]
    InvalidMultiplier(f64),
    #[error("GPP payout table is empty")]
    EmptyPayoutTable,
    #[error("GPP payout bands must be ascending within (0, 1]")]
    UnorderedBands,
}

/// A contest the lineup is entered into.
///
/// `field_size` counts every entrant including the evaluated lineup, so the
/// generated opponent field holds `field_size - 1` lineups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub format: ContestFormat,
    pub field_size: usize,
    pub entry_fee: f64,
    pub payout: PayoutStructure,
}

impl Contest {
    /// Standard contest for a format/type pair.
    pub fn default_for(format: ContestFormat, contest_type: ContestType) -> Self {
        match contest_type {
            ContestType::Cash => Self {
                format,
                field_size: 100,
                entry_fee: match format {
                    ContestFormat::Classic => 10.0,
                    ContestFormat::Showdown => 5.0,
                },
                payout: PayoutStructure::standard_cash(),
            },
            ContestType::Gpp => Self {
                format,
                field_size: 1000,
                entry_fee: 3.0,
                payout: PayoutStructure::standard_gpp(),
            },
        }
    }

    pub fn with_field_size(mut self, field_size: usize) -> Self {
        self.field_size = field_size;
        self
    }

    pub fn contest_type(&self) -> ContestType {
        self.payout.contest_type()
    }

    /// Opponent lineups needed to fill the field.
    pub fn opponent_count(&self) -> usize {
        self.field_size.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), ContestError> {
        if self.field_size == 0 {
            return Err(ContestError::EmptyField);
        }
        if !self.entry_fee.is_finite() || self.entry_fee <= 0.0 {
            return Err(ContestError::InvalidEntryFee(self.entry_fee));
        }
        match &self.payout {
            PayoutStructure::Cash {
                threshold,
                multiplier,
            } => {
                if !(*threshold > 0.0 && *threshold < 1.0) {
                    return Err(ContestError::InvalidCashThreshold(*threshold));
                }
                if !multiplier.is_finite() || *multiplier <= 0.0 {
                    return Err(ContestError::InvalidMultiplier(*multiplier));
                }
            }
            PayoutStructure::Gpp { bands } => {
                if bands.is_empty() {
                    return Err(ContestError::EmptyPayoutTable);
                }
                let mut prev = 0.0;
                for band in bands {
                    if !(band.upper > prev && band.upper <= 1.0) {
                        return Err(ContestError::UnorderedBands);
                    }
                    if !band.multiplier.is_finite() || band.multiplier <= 0.0 {
                        return Err(ContestError::InvalidMultiplier(band.multiplier));
                    }
                    prev = band.upper;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        for format in [ContestFormat::Classic, ContestFormat::Showdown] {
            for ct in [ContestType::Cash, ContestType::Gpp] {
                let contest = Contest::default_for(format, ct);
                assert!(contest.validate().is_ok());
                assert_eq!(contest.contest_type(), ct);
            }
        }
    }

    #[test]
    fn showdown_cash_fee_is_lower() {
        let c = Contest::default_for(ContestFormat::Showdown, ContestType::Cash);
        assert_eq!(c.entry_fee, 5.0);
        assert_eq!(c.opponent_count(), 99);
    }

    #[test]
    fn rejects_unordered_bands() {
        let mut c = Contest::default_for(ContestFormat::Classic, ContestType::Gpp);
        c.payout = PayoutStructure::Gpp {
            bands: vec![
                PayoutBand {
                    upper: 0.2,
                    multiplier: 2.0,
                },
                PayoutBand {
                    upper: 0.1,
                    multiplier: 3.0,
                },
            ],
        };
        assert_eq!(c.validate(), Err(ContestError::UnorderedBands));
    }

    #[test]
    fn rejects_bad_threshold_and_fee() {
        let mut c = Contest::default_for(ContestFormat::Classic, ContestType::Cash);
        c.payout = PayoutStructure::Cash {
            threshold: 1.0,
            multiplier: 2.0,
        };
        assert_eq!(c.validate(), Err(ContestError::InvalidCashThreshold(1.0)));

        let mut c = Contest::default_for(ContestFormat::Classic, ContestType::Cash);
        c.entry_fee = 0.0;
        assert_eq!(c.validate(), Err(ContestError::InvalidEntryFee(0.0)));

        let c = Contest::default_for(ContestFormat::Classic, ContestType::Cash).with_field_size(0);
        assert_eq!(c.validate(), Err(ContestError::EmptyField));
    }

    #[test]
    fn payout_serde_is_tagged() {
        let json = serde_json::to_string(&PayoutStructure::standard_cash()).unwrap();
        assert!(json.contains("\"type\":\"cash\""));
        let back: PayoutStructure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PayoutStructure::standard_cash());
    }

    #[test]
    fn parses_labels() {
        assert_eq!("GPP".parse::<ContestType>().unwrap(), ContestType::Gpp);
        assert_eq!(
            "showdown".parse::<ContestFormat>().unwrap(),
            ContestFormat::Showdown
        );
        assert!("h2h".parse::<ContestType>().is_err());
    }
}
