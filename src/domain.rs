//! Domain models for restaurant drawing.
//!
//! This module contains the core domain types: restaurants and their rating
//! tiers, the selection history log, and configuration.

mod config;
pub use config::{Config, ConfigError};

/// Selection history records and the history log.
pub mod history;
pub use history::{History, HistoryRecord};

/// Restaurant records as served by the remote collection.
pub mod restaurant;
pub use restaurant::{InvalidMapsUrlError, NewRestaurant, OpeningHours, Restaurant, RestaurantId};

mod tier;
pub use tier::{InvalidTierError, Tier};
