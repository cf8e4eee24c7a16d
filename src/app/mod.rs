pub mod container;
pub mod picks;
pub mod session;
pub mod view;

pub use container::{Action, Dispatched, FetchScope, LiveSnapshot, StateContainer, StateError};
pub use session::{Notice, Session};
pub use view::{RosterSource, ViewInputs, ViewModel, PROP_ROW_CAP};
