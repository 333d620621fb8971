//! Cross-join planning: one join per distinct array path in a query.

mod cross_apply;

pub use cross_apply::{CrossApplyNode, CrossApplyPlan, FieldBinding};
