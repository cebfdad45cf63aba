//! Migration utilities.
//!
//! Currently supports moving records off the legacy notes ref.

pub mod legacy_notes;

pub use legacy_notes::{MigrateError, MigrationOutcome, migrate_legacy_notes};
