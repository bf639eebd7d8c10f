//! Shared test fixtures for linrelax crates.
//!
//! Fixtures only build constraints into a caller-provided
//! [`LinearSpec`](linrelax_core::LinearSpec), so any solver can be
//! plugged in before or after.
//!
//! - [`layout`] - Tab-based layout systems (three equal areas, pinwheel)
//! - [`conflict`] - Deliberately contradictory systems
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! linrelax-test = { workspace = true }
//! ```
//!
//! ```ignore
//! use linrelax_test::layout::three_equal_areas;
//! use linrelax_test::conflict::contradictory_hard_pair;
//! ```

pub mod conflict;
pub mod layout;

pub use conflict::{competing_soft_pair, contradictory_hard_pair, isolated_conflict, IsolatedConflict};
pub use layout::{pinwheel, three_equal_areas, Pinwheel, ThreeAreas};
