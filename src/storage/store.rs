//! The restaurant store.
//!
//! A [`Store`] owns the in-memory restaurant list and selection history, the
//! two JSON documents that mirror them, and the [`Remote`] the restaurant
//! list is reconciled against. The history has no remote counterpart.
//!
//! Every mutating operation takes `&mut self`, so there is exactly one writer
//! at a time. Callers sharing a store between threads wrap it in a mutex.

use std::path::Path;

use uuid::Uuid;

use crate::{
    domain::{History, HistoryRecord, NewRestaurant, Restaurant, RestaurantId},
    storage::{
        document::{Document, MalformedLocalData, SaveError},
        remote::{Remote, RemoteError},
    },
};

/// File name of the restaurant mirror inside the data directory.
pub const RESTAURANTS_FILE: &str = "restaurants.json";

/// File name of the selection history inside the data directory.
pub const HISTORY_FILE: &str = "history.json";

/// The restaurant list and selection history, mirrored to disk.
#[derive(Debug)]
pub struct Store<R> {
    remote: R,
    restaurants_doc: Document<Vec<Restaurant>>,
    history_doc: Document<History>,
    restaurants: Vec<Restaurant>,
    history: History,
}

impl<R> Store<R> {
    /// An empty store backed by documents in `root`.
    ///
    /// Nothing is read until [`Store::load_local`] is called.
    #[must_use]
    pub fn new(root: &Path, remote: R) -> Self {
        Self {
            remote,
            restaurants_doc: Document::new(root.join(RESTAURANTS_FILE)),
            history_doc: Document::new(root.join(HISTORY_FILE)),
            restaurants: Vec::new(),
            history: History::new(),
        }
    }

    /// Create a store and load whatever is on disk.
    ///
    /// The returned warnings are the documents that could not be used; see
    /// [`Store::load_local`].
    #[must_use]
    pub fn open(root: &Path, remote: R) -> (Self, Vec<MalformedLocalData>) {
        let mut store = Self::new(root, remote);
        let warnings = store.load_local();
        (store, warnings)
    }

    /// Read both documents into memory.
    ///
    /// A missing or corrupt document leaves its collection empty and is
    /// returned as a warning; this never fails.
    pub fn load_local(&mut self) -> Vec<MalformedLocalData> {
        let mut warnings = Vec::new();

        self.restaurants = self.restaurants_doc.load().unwrap_or_else(|e| {
            report(&e);
            warnings.push(e);
            Vec::new()
        });

        self.history = self.history_doc.load().unwrap_or_else(|e| {
            report(&e);
            warnings.push(e);
            History::new()
        });

        tracing::debug!(
            restaurants = self.restaurants.len(),
            history = self.history.len(),
            "Loaded local mirror"
        );
        warnings
    }

    /// The current restaurant list.
    #[must_use]
    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    /// Look up a restaurant by id.
    #[must_use]
    pub fn restaurant(&self, id: RestaurantId) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    /// The selection history.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// The remote this store refreshes from.
    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Append a history record for `restaurant` and persist the history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history document cannot be written. The
    /// record stays in memory regardless, and is handed back in the error.
    pub fn record_selection(&mut self, restaurant: Restaurant) -> Result<HistoryRecord, UnsavedRecord> {
        let record = self.history.record(restaurant).clone();
        tracing::info!(
            id = %record.id(),
            restaurant = %record.restaurant().id,
            "Recorded selection"
        );
        if let Err(source) = self.history_doc.save(&self.history) {
            return Err(UnsavedRecord { record, source });
        }
        Ok(record)
    }

    /// Remove a history record by id and persist the history.
    ///
    /// Returns the removed record, or `None` if there was no such record, in
    /// which case nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the history document cannot be written. The
    /// record stays removed from memory regardless.
    pub fn delete_history(&mut self, id: Uuid) -> Result<Option<HistoryRecord>, SaveError> {
        let Some(removed) = self.history.remove(id) else {
            tracing::debug!(%id, "No history record to delete");
            return Ok(None);
        };
        tracing::info!(%id, "Deleted history record");
        self.history_doc.save(&self.history)?;
        Ok(Some(removed))
    }
}

impl<R: Remote> Store<R> {
    /// Replace the restaurant list with the remote collection and persist it.
    ///
    /// Returns the number of restaurants fetched. On a remote failure both
    /// the in-memory list and the local mirror are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails, or if the fetched list
    /// cannot be written to disk (in which case the in-memory list has
    /// already been replaced).
    pub fn refresh_from_remote(&mut self) -> Result<usize, RefreshError> {
        let restaurants = self.remote.fetch_restaurants()?;
        let count = restaurants.len();

        self.restaurants = restaurants;
        tracing::info!(count, "Refreshed restaurants from remote");

        self.restaurants_doc.save(&self.restaurants)?;
        Ok(count)
    }

    /// Create a restaurant remotely, then refresh to pick up the fields the
    /// server derives from the maps link.
    ///
    /// Returns the number of restaurants after the refresh.
    ///
    /// # Errors
    ///
    /// Returns [`AddRestaurantError::Create`] if the remote refuses the
    /// restaurant (nothing changes locally), or [`AddRestaurantError::Refresh`]
    /// if it was created but the follow-up refresh failed.
    pub fn add_restaurant(&mut self, new: &NewRestaurant) -> Result<usize, AddRestaurantError> {
        self.remote
            .create_restaurant(new)
            .map_err(AddRestaurantError::Create)?;
        tracing::info!(maps_url = %new.maps_url(), rating = %new.rating(), "Created restaurant");

        Ok(self.refresh_from_remote()?)
    }
}

fn report(warning: &MalformedLocalData) {
    if warning.is_missing() {
        tracing::info!("{warning}; starting empty");
    } else {
        tracing::warn!("{warning}; starting empty");
    }
}

/// A failed refresh.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The remote could not be read. Nothing changed.
    #[error("failed to refresh restaurants: {0}")]
    Remote(#[from] RemoteError),
    /// The fetched list is in memory but could not be mirrored to disk.
    #[error("refreshed restaurants could not be saved: {0}")]
    Save(#[from] SaveError),
}

/// A history record that was kept in memory but could not be written.
#[derive(Debug, thiserror::Error)]
#[error("selection {} was not saved: {source}", record.id())]
pub struct UnsavedRecord {
    /// The record, as it stands in the in-memory history.
    pub record: HistoryRecord,
    /// The failed write.
    #[source]
    pub source: SaveError,
}

/// A failed attempt to add a restaurant.
#[derive(Debug, thiserror::Error)]
pub enum AddRestaurantError {
    /// The remote did not create the restaurant.
    #[error("failed to add restaurant: {0}")]
    Create(#[source] RemoteError),
    /// The restaurant was created, but the list could not be refreshed.
    #[error("restaurant added, but {0}")]
    Refresh(#[from] RefreshError),
}
