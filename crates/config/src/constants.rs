//! Centralized constants
//!
//! Single source of truth for defaults used across crates. Settings
//! fall back to these when a value is not configured.

/// Service endpoints
pub mod endpoints {
    /// Backend base URL used when nothing is configured
    pub const API_BASE_DEFAULT: &str = "http://localhost:8000";

    /// Chat completion collaborator
    pub const CHAT_PATH: &str = "/api/chat";

    /// Analytics ingestion collaborator
    pub const ANALYTICS_EVENTS_PATH: &str = "/analytics/events";
}

/// Timeouts (milliseconds)
pub mod timeouts {
    /// Per-attempt timeout for general API calls
    pub const CLIENT_REQUEST_MS: u64 = 30_000;

    /// Per-attempt timeout on the chat path
    pub const CHAT_REQUEST_MS: u64 = 15_000;
}

/// Retry policy defaults
pub mod retry {
    /// Attempts per logical request, including the first
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Linear backoff unit; the wait after attempt `n` is `n * BACKOFF_MS`
    pub const BACKOFF_MS: u64 = 1_000;
}

/// Chat widget
pub mod chat {
    /// Trailing exchanges forwarded to the model as context
    pub const CONTEXT_WINDOW: usize = 2;

    /// Longest message accepted from the user
    pub const MAX_MESSAGE_CHARS: usize = 2_000;

    /// Live chat sessions held in memory
    pub const MAX_SESSIONS: usize = 10_000;

    /// Idle time after which a session is evicted (seconds)
    pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 1_800;

    /// How often idle sessions are swept (seconds)
    pub const SESSION_CLEANUP_INTERVAL_SECS: u64 = 300;
}

/// Analytics reporting
pub mod analytics {
    /// Identical events inside this window are dropped
    pub const DEBOUNCE_MS: u64 = 1_000;
}

/// Calculator input limits
pub mod limits {
    /// Upper bound for any annual rate input (percent)
    pub const MAX_RATE_PERCENT: f64 = 100.0;

    /// Longest investment horizon accepted (years)
    pub const MAX_TENURE_YEARS: u32 = 50;

    /// Longest loan accepted (months)
    pub const MAX_LOAN_MONTHS: u32 = 480;

    /// Smallest first-month principal repayment a loan must make (₹).
    /// Below this a rounded schedule cannot reduce the balance every month.
    pub const MIN_MONTHLY_PRINCIPAL: f64 = 0.02;

    /// Largest single amount accepted (₹1000 Cr)
    pub const MAX_AMOUNT: f64 = 10_000_000_000.0;

    /// FD compounding frequency when none is given (quarterly)
    pub const FD_COMPOUNDINGS_PER_YEAR: u32 = 4;
}

/// Income tax (India)
pub mod tax {
    /// Section 80C deduction ceiling
    pub const DEDUCTION_80C_CAP: f64 = 150_000.0;

    /// Health and education cess on computed tax (percent)
    pub const CESS_PERCENT: f64 = 4.0;

    /// Old regime slabs as (upper bound, rate percent); `None` is unbounded
    pub const OLD_REGIME_SLABS: &[(Option<f64>, f64)] = &[
        (Some(250_000.0), 0.0),
        (Some(500_000.0), 5.0),
        (Some(1_000_000.0), 20.0),
        (None, 30.0),
    ];

    /// New regime slabs (FY 2024-25)
    pub const NEW_REGIME_SLABS: &[(Option<f64>, f64)] = &[
        (Some(300_000.0), 0.0),
        (Some(700_000.0), 5.0),
        (Some(1_000_000.0), 10.0),
        (Some(1_200_000.0), 15.0),
        (Some(1_500_000.0), 20.0),
        (None, 30.0),
    ];
}
