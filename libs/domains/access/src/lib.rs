//! Authorization model: permission masks, access-control expressions and
//! the pure evaluation function combining them.
//!
//! Nothing in this crate touches the store or the network; handlers load
//! stored rules, build a [`Subject`] from verified claims and call
//! [`evaluate`].

mod evaluate;
mod expression;
mod permissions;

pub use evaluate::{evaluate, evaluate_event, Subject};
pub use expression::{AccessExpression, AccessMode, AccessRule, ExpressionParseError, Validity};
pub use permissions::{EventPermissions, GlobalPermissions};
