pub mod events;
pub mod handler;

pub use events::{EventKind, LassoEvent, MapEvent};
pub use handler::{EventCallback, EventManager};
