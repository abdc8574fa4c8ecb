//! The weighted draw.
//!
//! A draw rolls a number in `1..=100` and maps it to a target tier:
//!
//! | roll     | tier |
//! |----------|------|
//! | 1–85     | 1    |
//! | 86–95    | 2    |
//! | 96–100   | 3    |
//!
//! A restaurant is then picked uniformly from that tier. If the tier is empty
//! the pick falls back to all restaurants, so over mixed lists the effective
//! weighting is only approximately 85/10/5.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use uuid::Uuid;

use crate::{
    domain::{HistoryRecord, Restaurant, Tier},
    storage::{SaveError, Store, UnsavedRecord},
};

/// Highest roll that targets [`Tier::One`].
pub const TIER_ONE_MAX_ROLL: u8 = 85;

/// Highest roll that targets [`Tier::Two`]. Anything above targets
/// [`Tier::Three`].
pub const TIER_TWO_MAX_ROLL: u8 = 95;

/// The tier a roll in `1..=100` targets.
#[must_use]
pub const fn target_tier(roll: u8) -> Tier {
    if roll <= TIER_ONE_MAX_ROLL {
        Tier::One
    } else if roll <= TIER_TWO_MAX_ROLL {
        Tier::Two
    } else {
        Tier::Three
    }
}

/// Roll a number in `1..=100`.
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(1..=100)
}

/// Pick a restaurant for a given roll.
///
/// Returns `None` only when `restaurants` is empty.
pub fn pick_for_roll<'a, R: Rng + ?Sized>(
    restaurants: &'a [Restaurant],
    roll: u8,
    rng: &mut R,
) -> Option<&'a Restaurant> {
    let target = target_tier(roll);
    let in_tier: Vec<&Restaurant> = restaurants.iter().filter(|r| r.rating == target).collect();

    if let Some(&picked) = in_tier.choose(rng) {
        return Some(picked);
    }

    tracing::debug!(roll, %target, "No restaurants in target tier, picking from all");
    restaurants.choose(rng)
}

/// Roll and pick a restaurant, without recording anything.
///
/// Returns `None` only when `restaurants` is empty.
pub fn choose<'a, R: Rng + ?Sized>(restaurants: &'a [Restaurant], rng: &mut R) -> Option<&'a Restaurant> {
    let roll = roll(rng);
    pick_for_roll(restaurants, roll, rng)
}

/// The result of a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draw {
    /// A restaurant was picked and recorded.
    Picked(Selection),
    /// There was nothing to pick from.
    NoRestaurantsAvailable,
}

impl Draw {
    /// The selection, if one was made.
    #[must_use]
    pub const fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Picked(selection) => Some(selection),
            Self::NoRestaurantsAvailable => None,
        }
    }
}

/// A recorded pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The restaurant that was picked.
    pub restaurant: Restaurant,
    /// Id of the history record written for this pick.
    pub record_id: Uuid,
    /// When the pick happened.
    pub selected_at: DateTime<Utc>,
}

impl From<HistoryRecord> for Selection {
    fn from(record: HistoryRecord) -> Self {
        Self {
            record_id: record.id(),
            selected_at: record.selected_at(),
            restaurant: record.restaurant().clone(),
        }
    }
}

/// A pick that happened but could not be written to the history document.
///
/// The pick is in the store's in-memory history all the same.
#[derive(Debug, thiserror::Error)]
#[error("picked '{}' but could not save it: {source}", selection.restaurant.name)]
pub struct UnsavedSelection {
    /// The pick.
    pub selection: Selection,
    /// The failed write.
    #[source]
    pub source: SaveError,
}

impl From<UnsavedRecord> for UnsavedSelection {
    fn from(unsaved: UnsavedRecord) -> Self {
        Self {
            selection: unsaved.record.into(),
            source: unsaved.source,
        }
    }
}

/// Draws restaurants from a [`Store`] and records each pick in its history.
#[derive(Debug, Clone)]
pub struct Selector<R = StdRng> {
    rng: R,
}

impl Selector<StdRng> {
    /// A selector seeded from the operating system.
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// A selector with a fixed seed, for reproducible draws.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Selector<R> {
    /// A selector drawing from `rng`.
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw one restaurant from the store's current list and record it.
    ///
    /// An empty list yields [`Draw::NoRestaurantsAvailable`] and records
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the pick if the history could not be
    /// persisted. The record is still present in the store's in-memory
    /// history.
    pub fn select<Rm>(&mut self, store: &mut Store<Rm>) -> Result<Draw, UnsavedSelection> {
        let roll = roll(&mut self.rng);
        self.select_with_roll(store, roll)
    }

    fn select_with_roll<Rm>(
        &mut self,
        store: &mut Store<Rm>,
        roll: u8,
    ) -> Result<Draw, UnsavedSelection> {
        let Some(picked) = pick_for_roll(store.restaurants(), roll, &mut self.rng).cloned() else {
            tracing::info!("No restaurants to draw from");
            return Ok(Draw::NoRestaurantsAvailable);
        };

        tracing::debug!(roll, restaurant = %picked.id, tier = %picked.rating, "Drew restaurant");
        let record = store.record_selection(picked)?;

        Ok(Draw::Picked(record.into()))
    }
}
