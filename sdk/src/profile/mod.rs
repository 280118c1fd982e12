//! # Profiles
//!
//! The profile model and the pipeline that produces it:
//!
//! - [`document`]: schema.org `Person` JSON-LD plus accessors
//! - [`legacy`]: lifting of the flat pre-JSON-LD format
//! - [`resolver`]: zone file text → verified profile
//! - [`lookup`]: name → profile via a [`NameResolver`](crate::network::NameResolver)

pub mod document;
pub mod legacy;
pub mod lookup;
pub mod resolver;

pub use document::{
    Account, Image, PostalAddress, ProfileDocument, Thing, WebSite, PERSON_TYPE, SCHEMA_ORG_CONTEXT,
};
pub use legacy::{lift_legacy_person, person_from_legacy_json, PersonLegacy};
pub use lookup::lookup_profile;
pub use resolver::{resolve_zone_file_to_profile, ResolveError};
