pub mod marker;
pub mod prefs;
pub mod region;
pub mod storage;
pub mod user_record;
pub mod view_state;

pub use marker::MarkerStore;
pub use prefs::MapPrefs;
pub use region::RegionStore;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use user_record::UserRecord;
pub use view_state::{MemoryViewStates, PersistentViewStates, ViewState, ViewStateStore};
