// src/resolve/mod.rs
//! Graph walking: relation lookup and parcel identifier recovery.

pub mod identity;
pub mod relationships;

pub use identity::{parcel_identifier, IdentityResolver, Strategy};
pub use relationships::{
    both_targets, directional_target, first_link, links_for, relation_shape, side_of,
    strict_target, Direction, RelationShape,
};
