// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # stackid
//!
//! Entry point for the `stackid` binary. Parses CLI arguments, initializes
//! logging, and runs one SDK operation per invocation.
//!
//! - `keygen`        : generate a key, print key, public key and address
//! - `lookup`        : resolve a name to its profile (optionally checking proofs)
//! - `zonefile`      : render a profile zone file
//! - `sign-profile`  : sign a profile document into a token file
//! - `verify-token`  : verify a profile token and print its claim
//! - `auth-request`  : sign a sign-in request with a persisted transit key
//!
//! Results go to stdout, logs to stderr.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use stackid::auth::{make_auth_request, AuthRequestParams, FileTransitKeyStore, TransitKeyStore};
use stackid::config::ClientConfig;
use stackid::crypto::PrivateKey;
use stackid::network::{CoreNodeClient, HttpClient, NameResolver, ReqwestHttpClient};
use stackid::profile::lookup_profile;
use stackid::proofs::validate_proofs;
use stackid::token::{make_token_file, sign_profile_token, verify_profile_token, SignOptions};
use stackid::zonefile::make_profile_zone_file;

use cli::{Commands, StackIdCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = StackIdCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Lookup(args) => lookup(args).await,
        Commands::Zonefile(args) => {
            let zone_file = make_profile_zone_file(&args.origin, &args.token_file_url)
                .context("failed to build zone file")?;
            print!("{zone_file}");
            Ok(())
        }
        Commands::SignProfile(args) => sign_profile(args),
        Commands::VerifyToken(args) => {
            let decoded = verify_profile_token(&args.token, &args.public_key_or_address)
                .context("profile token did not verify")?;
            print_json(&decoded.payload["claim"])
        }
        Commands::AuthRequest(args) => auth_request(args).await,
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a hex private key from `path`, ignoring surrounding whitespace.
fn read_key_file(path: &Path) -> Result<PrivateKey> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    PrivateKey::from_hex(text.trim())
        .with_context(|| format!("key file {} does not hold a valid private key", path.display()))
}

/// Create `path` owner-only (0600 on unix) and write `hex` into it. The
/// mode is set at creation, so the key is never readable by others.
fn write_private_key_file(path: &Path, hex: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(hex.as_bytes())
}

fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let mut hex = PrivateKey::generate().to_hex();
    if args.compressed {
        hex.push_str("01");
    }
    let key = PrivateKey::from_hex(&hex)?;
    let public_key = key.public_key();

    match &args.output {
        Some(path) => {
            write_private_key_file(path, &hex)
                .with_context(|| format!("failed to write key to {}", path.display()))?;
            tracing::info!(path = %path.display(), "private key written");
        }
        None => println!("private key : {hex}"),
    }
    println!("public key  : {}", public_key.to_hex());
    println!("address     : {}", public_key.address());
    Ok(())
}

async fn lookup(args: cli::LookupArgs) -> Result<()> {
    let mut config = match args.core_url {
        Some(url) => ClientConfig::with_core_node(url),
        None => ClientConfig::default(),
    };
    config.request_timeout = std::time::Duration::from_secs(args.timeout);

    let http: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new(&config).context("failed to build HTTP client")?);
    let core = CoreNodeClient::new(Arc::clone(&http), &config);

    tracing::info!(name = %args.name, core = %config.core_node_url, "looking up name");
    let Some(profile) = lookup_profile(&core, http.as_ref(), &args.name)
        .await
        .with_context(|| format!("failed to resolve {}", args.name))?
    else {
        bail!("{} is not registered", args.name);
    };

    if !args.proofs {
        return print_json(&profile.to_json()?);
    }

    let owner = core
        .get_name_info(&args.name)
        .await
        .context("failed to fetch name owner")?
        .address;
    let proofs = validate_proofs(http.as_ref(), &profile, &owner, Some(&args.name)).await?;
    print_json(&serde_json::json!({
        "profile": profile.to_json()?,
        "proofs": proofs,
    }))
}

fn sign_profile(args: cli::SignProfileArgs) -> Result<()> {
    let key = read_key_file(&args.key)?;
    let text = std::fs::read_to_string(&args.profile)
        .with_context(|| format!("failed to read profile {}", args.profile.display()))?;
    let profile: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not JSON", args.profile.display()))?;

    let token = sign_profile_token(&profile, &key.to_hex(), SignOptions::default())?;
    tracing::info!(issuer = %key.address(), "profile signed");
    if args.raw {
        println!("{token}");
    } else {
        println!("{}", make_token_file(&[token])?);
    }
    Ok(())
}

async fn auth_request(args: cli::AuthRequestArgs) -> Result<()> {
    let store = FileTransitKeyStore::new(&args.key);
    let transit_key = match store.load().await? {
        Some(key) => key,
        None => {
            tracing::info!(path = %args.key.display(), "no transit key yet, generating one");
            store.generate_and_store().await?
        }
    };

    let mut params = AuthRequestParams::for_origin(&args.domain);
    if !args.scopes.is_empty() {
        params.scopes = args.scopes;
    }
    println!("{}", make_auth_request(&transit_key, &params)?);
    Ok(())
}
