//! # Zone Files
//!
//! The on-chain half of name resolution. A name's zone file is tiny and
//! mostly exists to say where the profile token file lives.

pub mod codec;
pub mod record;

pub use codec::{parse_zone_file, render_zone_file, ParsedZoneFile, UriRecord, ZoneFileError};
pub use record::{make_profile_zone_file, token_file_url, with_default_scheme, ZoneFileRecord};
