//! Cycle-level model of a Shepherd Cache tag store.
//!
//! The tag store approximates Belady's MIN replacement by splitting every
//! set into a small Shepherd Cache (SC) that observes reference order among
//! recently filled lines and a Main Cache (MC) holding lines promoted out
//! of SC. A per-set count matrix records how many hits each SC column
//! observed before a line's first re-reference; those counts drive
//! eviction.
//!
//! [`tags`] holds the tag store itself plus a small cycle-level cache front
//! end, [`sim`] the single-threaded simulation kernel that drives it, and
//! [`config`] the TOML-backed configuration.
pub mod config;
pub mod sim;
pub mod tags;
pub(crate) mod test_utils;
