//! # ocipa-oci
//!
//! Identity gateway backed by the OCI Identity REST API.
//!
//! - [`profile`] - Reads credentials from the OCI config file
//! - [`signer`] - Signs requests with the profile's API key
//! - [`client`] - Paginated, signed Identity API client

pub mod client;
pub mod error;
pub mod profile;
pub mod signer;

pub use client::{ClientOptions, DEFAULT_TIMEOUT, IdentityClient};
pub use error::{OciError, OciResult};
pub use profile::{DEFAULT_PROFILE, IDENTITY_API_VERSION, OciProfile, expand_home};
pub use signer::{RequestSigner, SIGNED_HEADERS};
