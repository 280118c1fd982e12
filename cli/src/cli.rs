//! # CLI Interface
//!
//! Defines the command-line argument structure for `stackid` using `clap`
//! derive. Every network-facing flag can also be set through a `STACKID_*`
//! environment variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Identity toolkit: keys, profile tokens, zone files, name lookup and
/// sign-in requests.
#[derive(Parser, Debug)]
#[command(
    name = "stackid",
    about = "Identity toolkit for names, profiles and sign-in",
    version,
    propagate_version = true
)]
pub struct StackIdCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "STACKID_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "STACKID_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new private key and print it with its public key and address.
    Keygen(KeygenArgs),
    /// Resolve a name to its profile document.
    Lookup(LookupArgs),
    /// Print the zone file pointing a name at a token file URL.
    Zonefile(ZonefileArgs),
    /// Sign a profile document and print the token file.
    SignProfile(SignProfileArgs),
    /// Verify a profile token and print its claim.
    VerifyToken(VerifyTokenArgs),
    /// Create a signed sign-in request for an app origin.
    AuthRequest(AuthRequestArgs),
}

/// Arguments for `keygen`.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Emit the `01`-suffixed form that derives the compressed public key.
    #[arg(long)]
    pub compressed: bool,

    /// Write the private key to this file instead of printing it.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for `lookup`.
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Fully qualified name, e.g. `alice.id`.
    pub name: String,

    /// Core node answering `/v1/names/...`.
    #[arg(long, env = "STACKID_CORE_URL")]
    pub core_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "STACKID_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Also fetch and check the social proofs listed in the profile.
    #[arg(long)]
    pub proofs: bool,
}

/// Arguments for `zonefile`.
#[derive(Parser, Debug)]
pub struct ZonefileArgs {
    /// Fully qualified name the zone file belongs to.
    pub origin: String,

    /// Where the token file is hosted. `https://` is assumed if no scheme.
    pub token_file_url: String,
}

/// Arguments for `sign-profile`.
#[derive(Parser, Debug)]
pub struct SignProfileArgs {
    /// JSON file holding the profile document.
    pub profile: PathBuf,

    /// File holding the hex private key to sign with.
    #[arg(long, short = 'k', env = "STACKID_KEY_FILE")]
    pub key: PathBuf,

    /// Print the bare token instead of a token file.
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for `verify-token`.
#[derive(Parser, Debug)]
pub struct VerifyTokenArgs {
    /// Compact profile token.
    pub token: String,

    /// Expected issuer: hex public key or either of its addresses.
    pub public_key_or_address: String,
}

/// Arguments for `auth-request`.
#[derive(Parser, Debug)]
pub struct AuthRequestArgs {
    /// App origin, e.g. `https://app.example.com`.
    #[arg(long)]
    pub domain: String,

    /// Transit key file. Created with a fresh key when it does not exist.
    #[arg(long, short = 'k', env = "STACKID_TRANSIT_KEY_FILE")]
    pub key: PathBuf,

    /// Requested scopes. Defaults to `store_write`.
    #[arg(long = "scope")]
    pub scopes: Vec<String>,
}
