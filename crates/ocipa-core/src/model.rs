//! Identity directory records.
//!
//! These mirror the subset of the OCI Identity API payloads the analyzer
//! reads. Field names follow the API's camelCase wire format so the REST
//! gateway and tenancy snapshots can deserialize them directly.

use serde::{Deserialize, Serialize};

/// Display name used for the tenancy root compartment.
pub const ROOT_COMPARTMENT_NAME: &str = "root";

/// Prefix shared by all user identifiers.
pub const USER_OCID_PREFIX: &str = "ocid1.user.";

/// A compartment inside the tenancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub id: String,
    pub name: String,
    /// Identifier of the parent compartment (the tenancy id for top-level ones).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<String>,
}

impl Compartment {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            compartment_id: None,
            lifecycle_state: None,
        }
    }
}

/// An IAM group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Links a user to one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
}

impl GroupMembership {
    pub fn new(user_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// A named set of policy statements attached to a compartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Compartment the policy is attached to.
    pub compartment_id: String,
    /// Statements in the order they were authored.
    #[serde(default)]
    pub statements: Vec<String>,
}

impl Policy {
    pub fn new(
        name: impl Into<String>,
        compartment_id: impl Into<String>,
        statements: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            compartment_id: compartment_id.into(),
            statements: statements.into_iter().map(Into::into).collect(),
        }
    }
}
