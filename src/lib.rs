//! Restaurant lots
//!
//! Keeps a list of restaurants mirrored from a remote collection, draws one
//! at random weighted by its star tier, and logs every draw.

pub mod domain;
pub use domain::{
    Config, History, HistoryRecord, NewRestaurant, OpeningHours, Restaurant, RestaurantId, Tier,
};

/// The weighted draw and the selector that records it.
pub mod selection;
pub use selection::{Draw, Selection, Selector, UnsavedSelection};

/// Local documents, the remote collection, and the store tying them together.
pub mod storage;
pub use storage::{HttpRemote, MalformedLocalData, Remote, RemoteError, Store};
