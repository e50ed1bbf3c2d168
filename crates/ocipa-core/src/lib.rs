//! # ocipa-core
//!
//! Finds the policy statements in an OCI tenancy that apply to a user by
//! virtue of the user's group memberships.
//!
//! ## Modules
//!
//! - [`gateway`] - Interface to the identity directory
//! - [`memory`] - Snapshot-backed gateway for offline analysis
//! - [`resolver`] - Per-run compartment name cache
//! - [`matcher`] - Textual group relevance check
//! - [`annotator`] - Compartment identifier to name rewriting
//! - [`analyzer`] - The scan pipeline
//! - [`report`] - Report and warning types

pub mod analyzer;
pub mod annotator;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod memory;
pub mod model;
pub mod report;
pub mod resolver;

pub use analyzer::{AnalyzerConfig, PolicyAnalyzer};
pub use annotator::{CompartmentReference, annotate, compartment_references};
pub use error::{GatewayError, GatewayErrorKind, GatewayResult};
pub use gateway::{GatewayOperation, IdentityGateway};
pub use matcher::{RelevanceMatcher, is_relevant};
pub use memory::{InMemoryGateway, SnapshotError, TenancySnapshot};
pub use model::{
    Compartment, Group, GroupMembership, Policy, ROOT_COMPARTMENT_NAME, USER_OCID_PREFIX,
};
pub use report::{
    AnalysisOutcome, AnalysisReport, PolicySection, RelevantStatement, ScanStage, ScanWarning,
    group_statements,
};
pub use resolver::CompartmentNameResolver;
