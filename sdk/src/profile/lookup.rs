//! Name → profile, through a [`NameResolver`].

use crate::network::http::HttpClient;
use crate::network::resolver::{NameLookupError, NameResolver};
use crate::profile::document::ProfileDocument;
use crate::profile::resolver::{resolve_zone_file_to_profile, ResolveError};
use tracing::debug;

/// Look up `name` and resolve its profile against the owner's address.
///
/// An unregistered name is `Ok(None)`. A registered name without a zone
/// file is [`ResolveError::MissingZoneFile`].
pub async fn lookup_profile(
    resolver: &dyn NameResolver,
    http: &dyn HttpClient,
    name: &str,
) -> Result<Option<ProfileDocument>, ResolveError> {
    let response = match resolver.get_zone_file(name).await {
        Ok(response) => response,
        Err(NameLookupError::NotFound { .. }) => {
            debug!(name, "name not registered");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let zone_file = response
        .zonefile
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ResolveError::MissingZoneFile {
            name: name.to_string(),
        })?;

    let owner = match response.address {
        Some(address) => address,
        None => resolver.get_name_info(name).await?.address,
    };
    debug!(name, %owner, "resolving zone file");

    resolve_zone_file_to_profile(http, &zone_file, &owner)
        .await
        .map(Some)
}
