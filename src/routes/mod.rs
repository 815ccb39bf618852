//! Router Module Index
//!
//! Routes are split by the access they require, and the identity guard is
//! applied to whole modules in `create_router` rather than per route.

/// Routes open to anonymous callers.
pub mod public;

/// Routes behind the identity guard. Handlers apply the self-match,
/// ownership and role rules on top.
pub mod authenticated;

/// Routes behind the identity guard that additionally require the `admin` role.
pub mod admin;
