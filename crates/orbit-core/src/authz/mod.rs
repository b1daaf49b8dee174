//! Authorization evaluator.
//!
//! Purely functional: decisions are computed from the principal, the action
//! and the resource alone. Role dispatch is an exhaustive match over
//! [`Role`](crate::model::Role), so adding a role forces every rule to be
//! revisited.

pub mod action;
pub mod visibility;

pub use action::{can_perform, Action, Decision, Resource};
pub use visibility::{visibility_filter, DocumentFilter};
