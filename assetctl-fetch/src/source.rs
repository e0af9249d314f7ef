//! The remote-call seam.
//!
//! The engine only ever sees closures; commands build those closures from an
//! [`AssetSource`]. [`PlatformClient`](crate::PlatformClient) is the HTTP
//! implementation, tests provide in-memory ones.

use assetctl_core::{Page, ResourceKind, ResponseMeta};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

// ============================================================================
// Asset Source Trait
// ============================================================================

/// Performs single remote calls against the asset platform.
///
/// Every method is exactly one request: retries, paging and cancellation
/// are handled by the engine around it. Failures should carry one of the
/// payload types from [`crate::error`] so they classify correctly.
///
/// ## Implementing a Source
///
/// ```ignore
/// struct Fixture(Vec<Value>);
///
/// #[async_trait]
/// impl AssetSource for Fixture {
///     async fn search(&self, _query: &str, _page_size: u32, _cursor: Option<String>)
///         -> anyhow::Result<Page<Value>> {
///         Ok(Page::new(self.0.clone(), ResponseMeta::new("POST", "fixture", 200)))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Runs one page of a search query.
    ///
    /// `cursor` is the continuation token of the previous page. The returned
    /// page carries the next token, if any.
    async fn search(
        &self,
        query: &str,
        page_size: u32,
        cursor: Option<String>,
    ) -> anyhow::Result<Page<Value>>;

    /// Looks up one batch of assets by identifier.
    ///
    /// Callers keep `ids` within [`ResourceKind::batch_ceiling`].
    async fn get_assets(
        &self,
        kind: ResourceKind,
        ids: Vec<String>,
        at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Page<Value>>;

    /// Fetches a host snapshot as of `at`.
    ///
    /// The value is `None` when the platform had nothing meaningful for the
    /// host at that instant.
    async fn host_at(
        &self,
        host: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<(Option<Value>, ResponseMeta)>;
}

/// Extracts the `resource` of a snapshot response.
///
/// Missing, `null` and empty resources mean the asset did not exist.
pub fn meaningful(mut response: Value) -> Option<Value> {
    match response.get_mut("resource").map(Value::take) {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(resource) => Some(resource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meaningful_resource() {
        assert_eq!(
            meaningful(json!({"resource": {"ip": "10.0.0.1"}})),
            Some(json!({"ip": "10.0.0.1"}))
        );
        assert_eq!(meaningful(json!({"resource": null})), None);
        assert_eq!(meaningful(json!({"resource": {}})), None);
        assert_eq!(meaningful(json!({"other": 1})), None);
        assert_eq!(meaningful(json!(null)), None);
    }
}
