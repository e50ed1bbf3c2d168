//! Identity directory interface.
//!
//! Defines the operations the analyzer consumes from the identity service.
//! Implementations are provided by `ocipa-oci` (signed REST calls) and by
//! [`InMemoryGateway`](crate::memory::InMemoryGateway) (tenancy snapshots).

use std::fmt;

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::model::{Compartment, Group, GroupMembership, Policy};

/// Read-only access to compartments, groups and policies of one tenancy.
///
/// Each call is a single bounded request/response and may fail on its own.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Resolve a compartment identifier to its display name.
    async fn get_compartment_name(&self, compartment_id: &str) -> GatewayResult<String>;

    /// List every compartment in the tenancy subtree, at any access level.
    ///
    /// The tenancy root itself is not part of the listing.
    async fn list_compartments(&self, tenancy_id: &str) -> GatewayResult<Vec<Compartment>>;

    /// List the group memberships of a user.
    async fn list_user_group_memberships(
        &self,
        tenancy_id: &str,
        user_id: &str,
    ) -> GatewayResult<Vec<GroupMembership>>;

    /// Fetch a group by identifier.
    async fn get_group(&self, group_id: &str) -> GatewayResult<Group>;

    /// List the policies attached to one compartment.
    async fn list_policies(&self, compartment_id: &str) -> GatewayResult<Vec<Policy>>;
}

/// Names the gateway operations, for counters and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    GetCompartmentName,
    ListCompartments,
    ListUserGroupMemberships,
    GetGroup,
    ListPolicies,
}

impl fmt::Display for GatewayOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetCompartmentName => write!(f, "get_compartment_name"),
            Self::ListCompartments => write!(f, "list_compartments"),
            Self::ListUserGroupMemberships => write!(f, "list_user_group_memberships"),
            Self::GetGroup => write!(f, "get_group"),
            Self::ListPolicies => write!(f, "list_policies"),
        }
    }
}
