pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod shopping;
pub mod subscriptions;
pub mod tags;
pub mod users;

/// Postgres caps a statement at this many bind parameters.
pub(crate) const MAX_BIND_PARAMETERS: usize = 65535;
