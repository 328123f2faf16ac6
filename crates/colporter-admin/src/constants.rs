//! Centralized constants for the colporter admin CLI
//!
//! Deployment-specific values (API URL, tokens, default program) are loaded
//! from config.toml.

// =============================================================================
// API Endpoints (relative to the configured base URL)
// =============================================================================

pub const TRANSACTIONS_PATH: &str = "/transactions";
pub const EXPENSES_PATH: &str = "/expenses";
pub const CASH_ADVANCES_PATH: &str = "/cash-advance";
pub const CHARGES_PATH: &str = "/charges";
pub const PEOPLE_PATH: &str = "/people";
pub const LEADER_PERCENTAGES_PATH: &str = "/leaders/percentages";

/// Program record (append `/{id}`)
pub const PROGRAM_PATH: &str = "/program";

pub const BONIFICATION_STATUS_PATH: &str = "/bonifications/status";
pub const DASHBOARD_STATS_PATH: &str = "/dashboard/stats";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";

// =============================================================================
// HTTP
// =============================================================================

/// Request timeout when config.toml leaves it unset
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Caching
// =============================================================================

/// Dashboard stats are re-fetched after this many seconds (5 minutes)
pub const DEFAULT_DASHBOARD_STATS_TTL_SECS: u64 = 300;

// =============================================================================
// File Names
// =============================================================================

/// Default config file path
pub const CONFIG_FILE: &str = "config.toml";

/// Persisted access/refresh tokens (in data directory)
pub const SESSION_FILENAME: &str = "session.json";

/// Program-wide weekly sales (in output directory)
pub const WEEKLY_REPORT_FILENAME: &str = "weekly_sales.csv";

/// Program-wide monthly sales (in output directory)
pub const MONTHLY_REPORT_FILENAME: &str = "monthly_sales.csv";

/// Colporter totals (in output directory)
pub const COLPORTERS_REPORT_FILENAME: &str = "colporter_totals.csv";

/// Leader totals (in output directory)
pub const LEADERS_REPORT_FILENAME: &str = "leader_totals.csv";
