// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. Gateway
//! behaviour is deliberately fixed here rather than exposed as tuning.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Gateway boundaries
// ---------------------------------------------------------------------------

/// Requests per second allowed against one gateway URL.
///
/// Shared by every document type routed to the same URL.
pub const GATEWAY_REQUESTS_PER_SECOND: u32 = 280;

/// Window over which `GATEWAY_REQUESTS_PER_SECOND` is measured.
pub const GATEWAY_RATE_WINDOW: Duration = Duration::from_secs(1);

/// Total attempts, first one included, before a 404 is final.
pub const NOT_FOUND_MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts that returned 404.
pub const NOT_FOUND_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Pause between attempts after any other failure: non-404 status,
/// transport error or a payload that failed validation.
pub const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(1500);

/// Query parameter carrying the gateway access token.
pub const GATEWAY_TOKEN_QUERY_PARAM: &str = "pinataGatewayToken";

// ---------------------------------------------------------------------------
// Graph walk boundaries
// ---------------------------------------------------------------------------

/// Hops followed through relationship documents when looking for the
/// parcel identifier behind a seed link.
pub const SEED_TRAVERSAL_MAX_HOPS: usize = 2;

// ---------------------------------------------------------------------------
// Environment keys
// ---------------------------------------------------------------------------

/// Prefix shared by every allowed-submitter variable.
pub const ALLOWED_SUBMITTER_ENV_PREFIX: &str = "ENVIO_WALLET_ADDRESS";

pub const MINIMAL_MODE_ENV: &str = "ENVIO_MINIMAL_MODE";

pub const SIDE_RECORDS_ENV: &str = "ENVIO_INDEX_SIDE_RECORDS";

pub const IMPROVEMENTS_ENV: &str = "ENVIO_INDEX_IMPROVEMENTS";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing a rejected response body.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
