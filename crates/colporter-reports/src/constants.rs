//! Centralized constants for the report engine
//!
//! Program-specific values (percentages, budgets, goals) come from the
//! program record served by the API; these are the fixed rules and defaults.

// =============================================================================
// Revenue Split Defaults
// =============================================================================

/// Colporter share of revenue when the program leaves it unset
pub const DEFAULT_COLPORTER_PERCENTAGE: f64 = 50.0;

/// Global leader pool share of revenue when the program leaves it unset
pub const DEFAULT_LEADER_PERCENTAGE: f64 = 15.0;

// =============================================================================
// Bonification Tiers
// =============================================================================

/// Silver tier: minimum worked hours
pub const SILVER_HOURS: f64 = 280.0;

/// Silver tier: minimum net deposited amount (USD)
pub const SILVER_NET_AMOUNT: f64 = 3_480.0;

/// Silver tier reward (USD)
pub const SILVER_REWARD: f64 = 1_496.0;

/// Gold tier: minimum worked hours
pub const GOLD_HOURS: f64 = 320.0;

/// Gold tier: minimum net deposited amount (USD)
pub const GOLD_NET_AMOUNT: f64 = 4_800.0;

/// Gold tier reward (USD)
pub const GOLD_REWARD: f64 = 2_160.0;

// =============================================================================
// Formatting
// =============================================================================

/// Calendar date format used on the wire and in exports
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Month bucket label format (e.g. "June 2025")
pub const MONTH_LABEL_FORMAT: &str = "%B %Y";
