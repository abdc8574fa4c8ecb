pub mod document;
pub mod remote;
pub mod store;

pub use document::{Document, MalformedLocalData, SaveError};
pub use remote::{HttpRemote, Remote, RemoteError, RemoteSetupError};
pub use store::{AddRestaurantError, HISTORY_FILE, RESTAURANTS_FILE, RefreshError, Store, UnsavedRecord};
