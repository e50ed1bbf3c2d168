//! OCI config file profiles.
//!
//! The OCI SDKs and CLI share an INI file (`~/.oci/config` by default) with
//! one section per profile:
//!
//! ```text
//! [DEFAULT]
//! user=ocid1.user.oc1..aaaa
//! fingerprint=12:34:56:...
//! key_file=~/.oci/oci_api_key.pem
//! tenancy=ocid1.tenancy.oc1..aaaa
//! region=us-ashburn-1
//! ```
//!
//! A named profile inherits every key it does not set from `DEFAULT`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat, Value};

use crate::error::{OciError, OciResult};

/// Profile used when none is requested.
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Identity API version path segment.
pub const IDENTITY_API_VERSION: &str = "20160918";

const REQUIRED_KEYS: [&str; 5] = ["user", "fingerprint", "key_file", "tenancy", "region"];

/// Credentials and tenancy context of one OCI config profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub name: String,
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
    pub pass_phrase: Option<String>,
}

impl OciProfile {
    /// Default config file location (`~/.oci/config`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".oci").join("config"))
    }

    /// Load `profile` from the config file at `path`.
    pub fn load(path: impl AsRef<Path>, profile: &str) -> OciResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OciError::configuration(format!(
                "OCI config file not found: {}",
                path.display()
            )));
        }

        let settings = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini))
            .build()
            .map_err(|e| OciError::configuration(format!("{}: {e}", path.display())))?;
        let sections: HashMap<String, Value> = settings
            .try_deserialize()
            .map_err(|e| OciError::configuration(format!("{}: {e}", path.display())))?;

        let mut values = section(&sections, DEFAULT_PROFILE).unwrap_or_default();
        if !profile.eq_ignore_ascii_case(DEFAULT_PROFILE) {
            let own = section(&sections, profile).ok_or_else(|| {
                OciError::configuration(format!(
                    "Profile {profile} not found in {}",
                    path.display()
                ))
            })?;
            values.extend(own);
        } else if values.is_empty() {
            return Err(OciError::configuration(format!(
                "Profile {profile} not found in {}",
                path.display()
            )));
        }

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| values.get(*key).is_none_or(|v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(OciError::configuration(format!(
                "Profile {profile} is missing required keys: {}",
                missing.join(", ")
            )));
        }

        let mut take = |key: &str| values.remove(key).unwrap_or_default().trim().to_string();
        Ok(Self {
            name: profile.to_string(),
            user: take("user"),
            fingerprint: take("fingerprint"),
            key_file: expand_home(&take("key_file")),
            tenancy: take("tenancy"),
            region: take("region"),
            pass_phrase: Some(take("pass_phrase")).filter(|p| !p.is_empty()),
        })
    }

    /// Key identifier used in request signatures.
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }

    /// Identity API base URL for the profile's region.
    pub fn identity_endpoint(&self) -> String {
        format!(
            "https://identity.{}.oraclecloud.com/{IDENTITY_API_VERSION}",
            self.region
        )
    }
}

/// Find a section by exact name, then ignoring case, as a string map.
fn section(sections: &HashMap<String, Value>, name: &str) -> Option<HashMap<String, String>> {
    let value = sections.get(name).or_else(|| {
        sections
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })?;

    let table = value.clone().into_table().ok()?;
    Some(
        table
            .into_iter()
            .filter_map(|(key, value)| value.into_string().ok().map(|v| (key, v)))
            .collect(),
    )
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
