//! Command implementations

pub(crate) mod columns;
pub(crate) mod common;
pub(crate) mod inspect;
pub(crate) mod rules;
pub(crate) mod validate;
