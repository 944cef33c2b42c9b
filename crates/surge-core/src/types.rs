//! Trading enums shared across the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Sign multiplier: +1 for long, -1 for short.
    pub fn sign(&self) -> i8 {
        match self {
            Self::Long => 1,
            Self::Short => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Priority class of an entry signal.
///
/// Determines which downstream gate checks may be bypassed and how long
/// re-entry on the instrument is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Tier 1: instant entry on raw 5m velocity. Bypasses all checks.
    Instant,
    /// Tier 2: fast entry with volume (or momentum-stack) confirmation.
    Fast,
    /// Tier 3: micro entry on 1m velocity plus consecutive candles.
    Micro,
    /// Legacy multi-signal scoring path.
    Legacy,
}

impl Tier {
    /// Numeric tier used in logs and diagnostics (legacy = 0).
    pub fn as_number(&self) -> u8 {
        match self {
            Self::Instant => 1,
            Self::Fast => 2,
            Self::Micro => 3,
            Self::Legacy => 0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant => write!(f, "TIER1"),
            Self::Fast => write!(f, "TIER2"),
            Self::Micro => write!(f, "TIER3"),
            Self::Legacy => write!(f, "LEGACY"),
        }
    }
}

/// Externally computed market-wide state.
///
/// Gates which directions may be entered; a flip into `Choppy`
/// liquidates all open positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    TrendingUp,
    TrendingDown,
    Choppy,
    ExtremeVolatility,
    LowVolatility,
    Moonshot,
}

impl Regime {
    /// Whether this regime admits new long entries.
    pub fn allows_long(&self) -> bool {
        matches!(self, Self::Moonshot | Self::TrendingUp | Self::LowVolatility)
    }

    /// Whether this regime admits new short entries.
    pub fn allows_short(&self) -> bool {
        matches!(self, Self::Moonshot | Self::TrendingDown)
    }

    /// Whether any new entries are admitted at all.
    pub fn allows_new_entries(&self) -> bool {
        !matches!(self, Self::Choppy | Self::ExtremeVolatility)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TrendingUp => "TRENDING_UP",
            Self::TrendingDown => "TRENDING_DOWN",
            Self::Choppy => "CHOPPY",
            Self::ExtremeVolatility => "EXTREME_VOLATILITY",
            Self::LowVolatility => "LOW_VOLATILITY",
            Self::Moonshot => "MOONSHOT",
        };
        write!(f, "{s}")
    }
}
