//! Policy aggregation.
//!
//! [`PolicyAnalyzer`] drives one analysis: it fetches the user's groups,
//! lists every compartment in the tenancy (the root is always appended),
//! fetches each compartment's policies and keeps the statements that name
//! one of the groups, annotated with compartment names.
//!
//! A failure scoped to one compartment or one identifier is logged, recorded
//! as a [`ScanWarning`] and replaced with an empty result; the scan carries on
//! with the remaining compartments. No call is retried.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ocipa_core::{Group, GroupMembership, InMemoryGateway, Policy, PolicyAnalyzer, TenancySnapshot};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tenancy_id = "ocid1.tenancy.oc1..aaaa";
//! let snapshot = TenancySnapshot::new(tenancy_id)
//!     .with_group(Group::new("ocid1.group.oc1..admins", "Admins"))
//!     .with_membership(GroupMembership::new("ocid1.user.oc1..aaaa", "ocid1.group.oc1..admins"))
//!     .with_policy(Policy::new(
//!         "TenantAdmins",
//!         tenancy_id,
//!         ["allow group Admins to manage all-resources in tenancy"],
//!     ));
//!
//! let analyzer = PolicyAnalyzer::new(Arc::new(InMemoryGateway::new(snapshot)), tenancy_id);
//! let report = analyzer.analyze("ocid1.user.oc1..aaaa").await;
//! for section in &report.sections {
//!     println!("{} ({})", section.policy_name, section.compartment_name);
//! }
//! assert_eq!(report.sections[0].compartment_name, "root");
//! # }
//! ```

use std::pin::pin;
use std::sync::Arc;

use futures_util::{StreamExt, stream};
use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::annotator::annotate;
use crate::error::GatewayResult;
use crate::gateway::IdentityGateway;
use crate::matcher::RelevanceMatcher;
use crate::model::{Group, Policy};
use crate::report::{AnalysisReport, RelevantStatement, ScanStage, ScanWarning, group_statements};
use crate::resolver::CompartmentNameResolver;

// =============================================================================
// Configuration
// =============================================================================

/// Tuning knobs for [`PolicyAnalyzer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Maximum number of policy listings in flight at once.
    ///
    /// Results are always consumed in scan order, so the report does not
    /// depend on this value. `0` is treated as `1`.
    pub policy_fetch_concurrency: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            policy_fetch_concurrency: 1,
        }
    }
}

// =============================================================================
// Analyzer
// =============================================================================

/// Finds the policy statements that apply to a user through group membership.
///
/// The analyzer itself holds no per-run state; every call to
/// [`analyze`](Self::analyze) starts with an empty name cache.
pub struct PolicyAnalyzer {
    gateway: Arc<dyn IdentityGateway>,
    tenancy_id: String,
    config: AnalyzerConfig,
}

impl PolicyAnalyzer {
    pub fn new(gateway: Arc<dyn IdentityGateway>, tenancy_id: impl Into<String>) -> Self {
        Self {
            gateway,
            tenancy_id: tenancy_id.into(),
            config: AnalyzerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    /// Names of the groups `user_id` belongs to.
    ///
    /// Any directory failure yields an empty set and a warning.
    pub async fn fetch_user_groups(
        &self,
        user_id: &str,
        warnings: &mut Vec<ScanWarning>,
    ) -> IndexSet<String> {
        info!(user_id = %user_id, "Fetching groups for user");

        match self.try_fetch_user_groups(user_id).await {
            Ok(groups) => {
                info!(count = groups.len(), "User group memberships resolved");
                for group in &groups {
                    debug!(group_id = %group.id, group_name = %group.name, "Member of group");
                }
                groups.into_iter().map(|g| g.name).collect()
            }
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    kind = %e.kind(),
                    error = %e,
                    "Error fetching user groups"
                );
                warnings.push(ScanWarning::new(ScanStage::UserGroups, user_id, &e));
                IndexSet::new()
            }
        }
    }

    async fn try_fetch_user_groups(&self, user_id: &str) -> GatewayResult<Vec<Group>> {
        let memberships = self
            .gateway
            .list_user_group_memberships(&self.tenancy_id, user_id)
            .await?;

        let mut groups = Vec::with_capacity(memberships.len());
        for membership in &memberships {
            groups.push(self.gateway.get_group(&membership.group_id).await?);
        }
        Ok(groups)
    }

    /// Identifiers of every compartment in the tenancy subtree, in directory order.
    ///
    /// The tenancy root is not included. A listing failure yields an empty
    /// list and a warning.
    pub async fn fetch_all_compartments(&self, warnings: &mut Vec<ScanWarning>) -> Vec<String> {
        info!("Fetching all compartments");

        match self.gateway.list_compartments(&self.tenancy_id).await {
            Ok(compartments) => {
                info!(count = compartments.len(), "Compartments listed");
                compartments.into_iter().map(|c| c.id).collect()
            }
            Err(e) => {
                warn!(
                    tenancy_id = %self.tenancy_id,
                    kind = %e.kind(),
                    error = %e,
                    "Error fetching compartments"
                );
                warnings.push(ScanWarning::new(
                    ScanStage::CompartmentListing,
                    &self.tenancy_id,
                    &e,
                ));
                Vec::new()
            }
        }
    }

    /// Policies attached to one compartment. A failure yields an empty list and a warning.
    pub async fn fetch_policies(
        &self,
        compartment_id: &str,
        warnings: &mut Vec<ScanWarning>,
    ) -> Vec<Policy> {
        let result = self.gateway.list_policies(compartment_id).await;
        absorb_policy_result(compartment_id, result, warnings)
    }

    /// Run the full analysis for `user_id`.
    pub async fn analyze(&self, user_id: &str) -> AnalysisReport {
        let mut warnings = Vec::new();

        let group_names = self.fetch_user_groups(user_id, &mut warnings).await;
        if group_names.is_empty() {
            info!(user_id = %user_id, "No groups found for user");
            return AnalysisReport::no_groups(user_id, &self.tenancy_id, warnings);
        }
        let matcher = RelevanceMatcher::new(&group_names);

        let mut compartment_ids = self.fetch_all_compartments(&mut warnings).await;
        compartment_ids.push(self.tenancy_id.clone());
        let compartments_scanned = compartment_ids.len();
        info!(compartments = compartments_scanned, "Scanning policies");

        let mut resolver = CompartmentNameResolver::new(self.gateway.clone(), &self.tenancy_id);
        let mut records = Vec::new();

        let concurrency = self.config.policy_fetch_concurrency.max(1);
        let fetches = stream::iter(compartment_ids)
            .map(|compartment_id| {
                let gateway = self.gateway.clone();
                async move {
                    let result = gateway.list_policies(&compartment_id).await;
                    (compartment_id, result)
                }
            })
            .buffered(concurrency);
        let mut fetches = pin!(fetches);

        while let Some((compartment_id, result)) = fetches.next().await {
            let policies = absorb_policy_result(&compartment_id, result, &mut warnings);
            debug!(
                compartment_id = %compartment_id,
                policies = policies.len(),
                "Scanning compartment"
            );

            for policy in &policies {
                collect_relevant(policy, &matcher, &mut resolver, &mut records).await;
            }
            warnings.extend(resolver.take_warnings());
        }

        info!(
            statements = records.len(),
            warnings = warnings.len(),
            "Policy analysis complete"
        );

        AnalysisReport {
            user_id: user_id.to_string(),
            tenancy_id: self.tenancy_id.clone(),
            group_names: group_names.into_iter().collect(),
            compartments_scanned,
            sections: group_statements(records),
            warnings,
        }
    }
}

fn absorb_policy_result(
    compartment_id: &str,
    result: GatewayResult<Vec<Policy>>,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<Policy> {
    match result {
        Ok(policies) => policies,
        Err(e) => {
            warn!(
                compartment_id = %compartment_id,
                kind = %e.kind(),
                error = %e,
                "Could not fetch policies in compartment"
            );
            warnings.push(ScanWarning::new(ScanStage::PolicyFetch, compartment_id, &e));
            Vec::new()
        }
    }
}

async fn collect_relevant(
    policy: &Policy,
    matcher: &RelevanceMatcher,
    resolver: &mut CompartmentNameResolver,
    records: &mut Vec<RelevantStatement>,
) {
    for statement in &policy.statements {
        let Some(group) = matcher.first_match(statement) else {
            continue;
        };
        debug!(policy = %policy.name, group = %group, "Relevant statement");

        let annotated = annotate(statement, resolver).await;
        let compartment_name = resolver.resolve(&policy.compartment_id).await;
        records.push(RelevantStatement {
            policy_name: policy.name.clone(),
            compartment_name,
            statement: annotated,
        });
    }
}
