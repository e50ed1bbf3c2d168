//! In-memory identity gateway backed by a tenancy snapshot.
//!
//! A [`TenancySnapshot`] is a JSON document holding the compartments, groups,
//! memberships and policies of one tenancy. [`InMemoryGateway`] answers
//! gateway calls from it, which allows offline analysis of an exported
//! tenancy. Failures can be injected per operation and identifier to
//! simulate a partially unavailable directory, and every call is counted.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{GatewayOperation, IdentityGateway};
use crate::model::{Compartment, Group, GroupMembership, Policy};

// =============================================================================
// Snapshot
// =============================================================================

/// Errors that can occur while loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Point-in-time copy of the identity data of one tenancy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenancySnapshot {
    pub tenancy_id: String,
    #[serde(default)]
    pub compartments: Vec<Compartment>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub memberships: Vec<GroupMembership>,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl TenancySnapshot {
    /// Create an empty snapshot for the given tenancy.
    pub fn new(tenancy_id: impl Into<String>) -> Self {
        Self {
            tenancy_id: tenancy_id.into(),
            ..Default::default()
        }
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn with_compartment(mut self, compartment: Compartment) -> Self {
        self.compartments.push(compartment);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    #[must_use]
    pub fn with_membership(mut self, membership: GroupMembership) -> Self {
        self.memberships.push(membership);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }
}

// =============================================================================
// Call Counters
// =============================================================================

#[derive(Debug, Default)]
struct CallCounters {
    get_compartment_name: AtomicUsize,
    list_compartments: AtomicUsize,
    list_user_group_memberships: AtomicUsize,
    get_group: AtomicUsize,
    list_policies: AtomicUsize,
}

impl CallCounters {
    fn slot(&self, operation: GatewayOperation) -> &AtomicUsize {
        match operation {
            GatewayOperation::GetCompartmentName => &self.get_compartment_name,
            GatewayOperation::ListCompartments => &self.list_compartments,
            GatewayOperation::ListUserGroupMemberships => &self.list_user_group_memberships,
            GatewayOperation::GetGroup => &self.get_group,
            GatewayOperation::ListPolicies => &self.list_policies,
        }
    }
}

// =============================================================================
// In-Memory Gateway
// =============================================================================

/// Gateway answering from a [`TenancySnapshot`].
#[derive(Debug)]
pub struct InMemoryGateway {
    snapshot: TenancySnapshot,
    /// Injected failures. `None` as identifier fails every call of the operation.
    failures: HashMap<(GatewayOperation, Option<String>), GatewayError>,
    calls: CallCounters,
}

impl InMemoryGateway {
    pub fn new(snapshot: TenancySnapshot) -> Self {
        Self {
            snapshot,
            failures: HashMap::new(),
            calls: CallCounters::default(),
        }
    }

    /// Make `operation` fail with `error` whenever it is called for `id`.
    #[must_use]
    pub fn fail(
        mut self,
        operation: GatewayOperation,
        id: impl Into<String>,
        error: GatewayError,
    ) -> Self {
        self.failures.insert((operation, Some(id.into())), error);
        self
    }

    /// Make every call of `operation` fail with `error`.
    #[must_use]
    pub fn fail_all(mut self, operation: GatewayOperation, error: GatewayError) -> Self {
        self.failures.insert((operation, None), error);
        self
    }

    /// Number of times `operation` has been called.
    pub fn calls(&self, operation: GatewayOperation) -> usize {
        self.calls.slot(operation).load(Ordering::SeqCst)
    }

    /// Total number of gateway calls served.
    pub fn total_calls(&self) -> usize {
        [
            GatewayOperation::GetCompartmentName,
            GatewayOperation::ListCompartments,
            GatewayOperation::ListUserGroupMemberships,
            GatewayOperation::GetGroup,
            GatewayOperation::ListPolicies,
        ]
        .into_iter()
        .map(|op| self.calls(op))
        .sum()
    }

    /// Count the call and return the injected failure, if any.
    fn enter(&self, operation: GatewayOperation, id: &str) -> GatewayResult<()> {
        self.calls.slot(operation).fetch_add(1, Ordering::SeqCst);

        let injected = self
            .failures
            .get(&(operation, Some(id.to_string())))
            .or_else(|| self.failures.get(&(operation, None)));

        match injected {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityGateway for InMemoryGateway {
    async fn get_compartment_name(&self, compartment_id: &str) -> GatewayResult<String> {
        self.enter(GatewayOperation::GetCompartmentName, compartment_id)?;
        self.snapshot
            .compartments
            .iter()
            .find(|c| c.id == compartment_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| GatewayError::not_found(compartment_id))
    }

    async fn list_compartments(&self, tenancy_id: &str) -> GatewayResult<Vec<Compartment>> {
        self.enter(GatewayOperation::ListCompartments, tenancy_id)?;
        if tenancy_id != self.snapshot.tenancy_id {
            return Err(GatewayError::not_found(tenancy_id));
        }
        Ok(self.snapshot.compartments.clone())
    }

    async fn list_user_group_memberships(
        &self,
        _tenancy_id: &str,
        user_id: &str,
    ) -> GatewayResult<Vec<GroupMembership>> {
        self.enter(GatewayOperation::ListUserGroupMemberships, user_id)?;
        Ok(self
            .snapshot
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_group(&self, group_id: &str) -> GatewayResult<Group> {
        self.enter(GatewayOperation::GetGroup, group_id)?;
        self.snapshot
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(group_id))
    }

    async fn list_policies(&self, compartment_id: &str) -> GatewayResult<Vec<Policy>> {
        self.enter(GatewayOperation::ListPolicies, compartment_id)?;
        Ok(self
            .snapshot
            .policies
            .iter()
            .filter(|p| p.compartment_id == compartment_id)
            .cloned()
            .collect())
    }
}
