//! # Protocol Constants & Client Configuration
//!
//! Every number the wire format depends on lives here. Most of them were
//! fixed years ago by deployed clients, so "tuning" them means breaking
//! interop with every other wallet on the network.
//!
//! [`ClientConfig`] is the one piece of runtime configuration: which core
//! node to ask about names, which hub to write to, how long to wait on HTTP.
//! Build it once at startup and pass it down by reference.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Base58check version byte for mainnet pay-to-pubkey-hash addresses.
pub const MAINNET_ADDRESS_VERSION: u8 = 0x00;

/// Hex suffix marking a private key as "derive the compressed public key".
pub const COMPRESSED_KEY_SUFFIX: &str = "01";

// ---------------------------------------------------------------------------
// Zone Files
// ---------------------------------------------------------------------------

/// Time-to-live written into every zone file we generate, in seconds.
pub const ZONE_FILE_TTL: u32 = 3600;

/// Owner name of the URI record that points at the profile token file.
pub const TOKEN_FILE_URI_NAME: &str = "_http._tcp";

/// URI record priority.
pub const TOKEN_FILE_URI_PRIORITY: u16 = 10;

/// URI record weight.
pub const TOKEN_FILE_URI_WEIGHT: u16 = 1;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// The only JWS algorithm the network has ever used.
pub const SIGNING_ALGORITHM: &str = "ES256K";

/// JWS `typ` header value.
pub const TOKEN_TYPE: &str = "JWT";

/// Default lifetime of a signed profile token.
pub const PROFILE_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Default lifetime of an auth request. Sign-in should not take an hour.
pub const AUTH_REQUEST_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Default lifetime of an auth response.
pub const AUTH_RESPONSE_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Version stamped on auth messages that carry the extended metadata block.
pub const AUTH_PROTOCOL_VERSION: &str = "1.1.0";

/// Default scope requested by an auth request.
pub const DEFAULT_SCOPE: &str = "store_write";

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Public core node used for name lookups.
pub const DEFAULT_CORE_NODE_URL: &str = "https://core.blockstack.org";

/// Default storage hub.
pub const DEFAULT_HUB_URL: &str = "https://hub.blockstack.org";

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for the network-facing pieces of the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the core node answering `/v1/names/...`.
    pub core_node_url: String,
    /// Storage hub to connect to when none is given explicitly.
    pub hub_url: String,
    /// Per-request timeout handed to the HTTP client.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            core_node_url: DEFAULT_CORE_NODE_URL.to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Same defaults, different core node.
    pub fn with_core_node(core_node_url: impl Into<String>) -> Self {
        Self {
            core_node_url: core_node_url.into(),
            ..Self::default()
        }
    }

    /// The name lookup endpoint, always ending in `/`.
    pub fn name_lookup_url(&self) -> String {
        format!("{}/v1/names/", self.core_node_url.trim_end_matches('/'))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
