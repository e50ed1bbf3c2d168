//! Analysis report types.
//!
//! The analyzer produces a flat list of [`RelevantStatement`] records while
//! scanning, then groups them by (policy name, compartment name) into
//! [`PolicySection`]s. Groups keep the order in which they were first seen
//! and statements keep their scan order. Identical statements under the same
//! key are kept as separate entries.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{GatewayError, GatewayErrorKind};

// =============================================================================
// Warnings
// =============================================================================

/// Pipeline stage in which a failure was absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    UserGroups,
    CompartmentListing,
    PolicyFetch,
    NameResolution,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserGroups => write!(f, "user groups"),
            Self::CompartmentListing => write!(f, "compartment listing"),
            Self::PolicyFetch => write!(f, "policy fetch"),
            Self::NameResolution => write!(f, "name resolution"),
        }
    }
}

/// A recoverable failure the analyzer substituted with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    pub stage: ScanStage,
    /// Identifier the failing call was made for.
    pub identifier: String,
    pub kind: GatewayErrorKind,
    /// Underlying cause.
    pub message: String,
}

impl ScanWarning {
    pub fn new(stage: ScanStage, identifier: impl Into<String>, error: &GatewayError) -> Self {
        Self {
            stage,
            identifier: identifier.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.identifier, self.message)
    }
}

// =============================================================================
// Statements and Sections
// =============================================================================

/// One statement found relevant to the analyzed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevantStatement {
    pub policy_name: String,
    /// Display name of the compartment the policy is attached to.
    pub compartment_name: String,
    /// Statement text with compartment identifiers replaced by names.
    pub statement: String,
}

/// Relevant statements of one policy in one compartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySection {
    pub policy_name: String,
    pub compartment_name: String,
    pub statements: Vec<String>,
}

/// Group records by (policy name, compartment name), keeping first-seen order.
pub fn group_statements(records: impl IntoIterator<Item = RelevantStatement>) -> Vec<PolicySection> {
    let mut grouped: IndexMap<(String, String), Vec<String>> = IndexMap::new();
    for record in records {
        grouped
            .entry((record.policy_name, record.compartment_name))
            .or_default()
            .push(record.statement);
    }

    grouped
        .into_iter()
        .map(|((policy_name, compartment_name), statements)| PolicySection {
            policy_name,
            compartment_name,
            statements,
        })
        .collect()
}

// =============================================================================
// Report
// =============================================================================

/// How an analysis ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// The user has no groups (or they could not be fetched). Nothing was scanned.
    NoGroups,
    /// Compartments were scanned but no statement names the user's groups.
    NoRelevantStatements,
    /// At least one relevant statement was found.
    Relevant { statements: usize },
}

/// Result of analyzing one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub user_id: String,
    pub tenancy_id: String,
    /// Names of the groups the user belongs to, in membership order.
    pub group_names: Vec<String>,
    /// Number of compartments scanned, tenancy root included.
    pub compartments_scanned: usize,
    pub sections: Vec<PolicySection>,
    pub warnings: Vec<ScanWarning>,
}

impl AnalysisReport {
    /// Report for a user without groups. No compartment was scanned.
    pub fn no_groups(
        user_id: impl Into<String>,
        tenancy_id: impl Into<String>,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenancy_id: tenancy_id.into(),
            group_names: Vec::new(),
            compartments_scanned: 0,
            sections: Vec::new(),
            warnings,
        }
    }

    pub fn total_statements(&self) -> usize {
        self.sections.iter().map(|s| s.statements.len()).sum()
    }

    pub fn outcome(&self) -> AnalysisOutcome {
        if self.group_names.is_empty() {
            AnalysisOutcome::NoGroups
        } else if self.sections.is_empty() {
            AnalysisOutcome::NoRelevantStatements
        } else {
            AnalysisOutcome::Relevant {
                statements: self.total_statements(),
            }
        }
    }
}
