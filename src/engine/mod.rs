mod matcher;
pub mod state;
mod traits;

pub use matcher::{should_remove, HashedMatcher};
pub use state::{
    prune_ban_table, ActiveBlockedState, DomainList, LocationBanTable, UserPreferences,
};
pub use traits::{BlockSource, DomainMatcher};
