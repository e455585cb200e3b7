//! [`Fixture`](crate::Fixture) for std types.

mod collections;
mod scalars;
