//! Statement annotation.
//!
//! Statements may scope a grant with `compartment <ocid>`. For display, each
//! such identifier is replaced with the compartment's name, e.g.
//! `... in compartment ocid1.compartment.oc1..aaa` becomes
//! `... in compartment Finance`. The keyword match ignores case; the
//! replacement always writes `compartment` followed by one space. Every
//! other byte of the statement is kept.

use std::sync::LazyLock;

use regex::Regex;

use crate::resolver::CompartmentNameResolver;

static COMPARTMENT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)compartment\s+(ocid1\.compartment\.[a-z0-9._-]+)")
        .expect("compartment reference pattern is valid")
});

/// A `compartment <ocid>` occurrence inside a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompartmentReference<'a> {
    /// Byte range of the whole `compartment <ocid>` match.
    pub span: (usize, usize),
    /// The identifier part.
    pub compartment_id: &'a str,
}

/// Find compartment identifier references, left to right.
pub fn compartment_references(statement: &str) -> Vec<CompartmentReference<'_>> {
    COMPARTMENT_REFERENCE
        .captures_iter(statement)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?;
            Some(CompartmentReference {
                span: (whole.start(), whole.end()),
                compartment_id: id.as_str(),
            })
        })
        .collect()
}

/// Replace compartment identifiers in `statement` with display names.
///
/// Identifiers are resolved in the order they appear. Resolved names land in
/// the resolver's cache.
pub async fn annotate(statement: &str, resolver: &mut CompartmentNameResolver) -> String {
    let references = compartment_references(statement);
    if references.is_empty() {
        return statement.to_string();
    }

    let mut annotated = String::with_capacity(statement.len());
    let mut last = 0;
    for reference in references {
        let (start, end) = reference.span;
        let name = resolver.resolve(reference.compartment_id).await;
        annotated.push_str(&statement[last..start]);
        annotated.push_str("compartment ");
        annotated.push_str(&name);
        last = end;
    }
    annotated.push_str(&statement[last..]);
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::GatewayError;
    use crate::gateway::GatewayOperation;
    use crate::memory::{InMemoryGateway, TenancySnapshot};
    use crate::model::Compartment;

    const TENANCY: &str = "ocid1.tenancy.oc1..root";

    fn resolver_with(gateway: InMemoryGateway) -> (Arc<InMemoryGateway>, CompartmentNameResolver) {
        let gateway = Arc::new(gateway);
        let resolver = CompartmentNameResolver::new(gateway.clone(), TENANCY);
        (gateway, resolver)
    }

    fn snapshot() -> TenancySnapshot {
        TenancySnapshot::new(TENANCY)
            .with_compartment(Compartment::new("ocid1.compartment.oc1..aaa", "Finance"))
            .with_compartment(Compartment::new("ocid1.compartment.oc1..bbb", "Ops"))
    }

    #[test]
    fn test_references_in_order() {
        let refs = compartment_references(
            "allow group A to read buckets in compartment ocid1.compartment.oc1..bbb where target.compartment.id = 'x' or Compartment   ocid1.compartment.oc1..aaa",
        );
        let ids: Vec<_> = refs.iter().map(|r| r.compartment_id).collect();
        assert_eq!(ids, vec!["ocid1.compartment.oc1..bbb", "ocid1.compartment.oc1..aaa"]);
    }

    #[tokio::test]
    async fn test_no_reference_is_noop() {
        let (gateway, mut resolver) = resolver_with(InMemoryGateway::new(snapshot()));
        let statement = "Allow group Admins to manage all-resources in compartment Finance:Payroll";

        assert_eq!(annotate(statement, &mut resolver).await, statement);
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_single_reference() {
        let (_, mut resolver) = resolver_with(InMemoryGateway::new(snapshot()));
        let annotated = annotate(
            "allow group Admins to manage all-resources in compartment ocid1.compartment.oc1..aaa",
            &mut resolver,
        )
        .await;
        assert_eq!(
            annotated,
            "allow group Admins to manage all-resources in compartment Finance"
        );
        assert_eq!(resolver.cached("ocid1.compartment.oc1..aaa"), Some("Finance"));
    }

    #[tokio::test]
    async fn test_multiple_references_and_normalized_keyword() {
        let (gateway, mut resolver) = resolver_with(InMemoryGateway::new(snapshot()));
        let annotated = annotate(
            "Allow group X to read all-resources in COMPARTMENT\tocid1.compartment.oc1..aaa where any {target.id = 'y'} and compartment ocid1.compartment.oc1..bbb and compartment ocid1.compartment.oc1..aaa",
            &mut resolver,
        )
        .await;
        assert_eq!(
            annotated,
            "Allow group X to read all-resources in compartment Finance where any {target.id = 'y'} and compartment Ops and compartment Finance"
        );
        // The repeated identifier is served from the cache.
        assert_eq!(gateway.calls(GatewayOperation::GetCompartmentName), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_reference_keeps_identifier() {
        let (_, mut resolver) = resolver_with(InMemoryGateway::new(snapshot()).fail(
            GatewayOperation::GetCompartmentName,
            "ocid1.compartment.oc1..aaa",
            GatewayError::transient("timeout"),
        ));
        let statement = "allow group A to read buckets in compartment ocid1.compartment.oc1..aaa";
        assert_eq!(annotate(statement, &mut resolver).await, statement);
        assert_eq!(resolver.take_warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_tenancy_ocid_is_not_a_compartment_reference() {
        let (gateway, mut resolver) = resolver_with(InMemoryGateway::new(snapshot()));
        let statement = "allow group A to read buckets in compartment id ocid1.tenancy.oc1..root";
        assert_eq!(annotate(statement, &mut resolver).await, statement);
        assert_eq!(gateway.total_calls(), 0);
    }
}
