//! Various collections of unit tests
//!
//! The bulk of the "we're confident this works" comes from fuzzing, but each failure from fuzzing
//! is used as a new unit test, so there's a few of them here as well.

/// "Basic" fuzz tests -- insertion, removal, and replacement on a single list
///
/// In the format printed by the `alist_basic` fuzz target.
mod basic;
/// Manually-written test cases
mod manual;
/// Checks that observers see exactly the structure of the tree
mod observer;
/// Key-ordered trees
mod sorted;
