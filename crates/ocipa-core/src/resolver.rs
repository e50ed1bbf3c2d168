//! Compartment name resolution.
//!
//! Policy statements and policy records refer to compartments by identifier.
//! [`CompartmentNameResolver`] turns those identifiers into display names,
//! remembering every successful lookup for the rest of the run. The resolver
//! is created per analysis and dropped with it; nothing is shared between
//! runs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::gateway::IdentityGateway;
use crate::model::ROOT_COMPARTMENT_NAME;
use crate::report::{ScanStage, ScanWarning};

/// Memoizing compartment identifier to display name translator.
pub struct CompartmentNameResolver {
    gateway: Arc<dyn IdentityGateway>,
    tenancy_id: String,
    /// Successfully resolved names. Fallbacks are never stored.
    cache: HashMap<String, String>,
    warnings: Vec<ScanWarning>,
}

impl CompartmentNameResolver {
    pub fn new(gateway: Arc<dyn IdentityGateway>, tenancy_id: impl Into<String>) -> Self {
        Self {
            gateway,
            tenancy_id: tenancy_id.into(),
            cache: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Resolve `compartment_id` to a display name.
    ///
    /// The tenancy root resolves to `"root"` without a directory call. When
    /// the directory lookup fails the identifier itself is returned and a
    /// warning is recorded; the next call for the same identifier asks the
    /// directory again.
    pub async fn resolve(&mut self, compartment_id: &str) -> String {
        if compartment_id == self.tenancy_id {
            return ROOT_COMPARTMENT_NAME.to_string();
        }

        if let Some(name) = self.cache.get(compartment_id) {
            return name.clone();
        }

        match self.gateway.get_compartment_name(compartment_id).await {
            Ok(name) => {
                debug!(compartment_id = %compartment_id, name = %name, "Resolved compartment name");
                self.cache.insert(compartment_id.to_string(), name.clone());
                name
            }
            Err(e) => {
                warn!(
                    compartment_id = %compartment_id,
                    kind = %e.kind(),
                    error = %e,
                    "Could not resolve compartment"
                );
                self.warnings.push(ScanWarning::new(
                    ScanStage::NameResolution,
                    compartment_id,
                    &e,
                ));
                compartment_id.to_string()
            }
        }
    }

    /// Cached name for `compartment_id`, without any lookup.
    pub fn cached(&self, compartment_id: &str) -> Option<&str> {
        self.cache.get(compartment_id).map(String::as_str)
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Warnings recorded so far, leaving the resolver's list empty.
    pub fn take_warnings(&mut self) -> Vec<ScanWarning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, GatewayErrorKind};
    use crate::gateway::GatewayOperation;
    use crate::memory::{InMemoryGateway, TenancySnapshot};
    use crate::model::Compartment;

    const TENANCY: &str = "ocid1.tenancy.oc1..root";
    const FINANCE: &str = "ocid1.compartment.oc1..fin";
    const BROKEN: &str = "ocid1.compartment.oc1..broken";

    fn gateway() -> Arc<InMemoryGateway> {
        Arc::new(
            InMemoryGateway::new(
                TenancySnapshot::new(TENANCY).with_compartment(Compartment::new(FINANCE, "Finance")),
            )
            .fail(
                GatewayOperation::GetCompartmentName,
                BROKEN,
                GatewayError::access_denied("NotAuthorizedOrNotFound"),
            ),
        )
    }

    #[tokio::test]
    async fn test_root_resolves_without_gateway_call() {
        let gateway = gateway();
        let mut resolver = CompartmentNameResolver::new(gateway.clone(), TENANCY);

        assert_eq!(resolver.resolve(TENANCY).await, "root");
        assert_eq!(resolver.resolve(TENANCY).await, "root");
        assert_eq!(gateway.calls(GatewayOperation::GetCompartmentName), 0);
    }

    #[tokio::test]
    async fn test_successful_lookup_is_cached() {
        let gateway = gateway();
        let mut resolver = CompartmentNameResolver::new(gateway.clone(), TENANCY);

        assert_eq!(resolver.resolve(FINANCE).await, "Finance");
        assert_eq!(resolver.resolve(FINANCE).await, "Finance");
        assert_eq!(gateway.calls(GatewayOperation::GetCompartmentName), 1);
        assert_eq!(resolver.cached(FINANCE), Some("Finance"));
        assert_eq!(resolver.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_id_and_is_not_cached() {
        let gateway = gateway();
        let mut resolver = CompartmentNameResolver::new(gateway.clone(), TENANCY);

        assert_eq!(resolver.resolve(BROKEN).await, BROKEN);
        assert_eq!(resolver.resolve(BROKEN).await, BROKEN);
        assert_eq!(gateway.calls(GatewayOperation::GetCompartmentName), 2);
        assert!(resolver.cached(BROKEN).is_none());
        assert!(resolver.is_empty());

        let warnings = resolver.take_warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].stage, ScanStage::NameResolution);
        assert_eq!(warnings[0].identifier, BROKEN);
        assert_eq!(warnings[0].kind, GatewayErrorKind::AccessDenied);
        assert!(resolver.take_warnings().is_empty());
    }

    #[tokio::test]
    async fn test_root_check_uses_configured_tenancy() {
        let gateway = gateway();
        let mut resolver = CompartmentNameResolver::new(gateway.clone(), "ocid1.tenancy.oc1..other");

        // A different tenancy's root is just an unknown identifier here.
        assert_eq!(resolver.resolve(TENANCY).await, TENANCY);
        assert_eq!(gateway.calls(GatewayOperation::GetCompartmentName), 1);
    }
}
