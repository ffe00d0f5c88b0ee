//! Tag reconciliation.
//!
//! Engines publish their verdicts as namespaced tags on the artifact.
//! [`reconcile`] computes the smallest set of writes that keeps those
//! tags consistent with the latest scan.

mod reconciler;

pub use reconciler::{in_namespace, make_tag, reconcile, TagDelta};
