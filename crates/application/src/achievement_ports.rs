mod ledger;
mod query;
mod store;

pub use ledger::ReferenceLedger;
pub use query::{AchievementListQuery, AchievementPage, PageRequest, ScanCursor};
pub use store::AchievementStore;
