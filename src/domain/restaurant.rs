use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

use crate::domain::Tier;

/// Server-assigned identifier of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(u64);

impl RestaurantId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RestaurantId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A restaurant as served by the remote collection.
///
/// Everything except the maps URL and rating is derived by the server, so a
/// restaurant is never built locally from user input. It is replaced
/// wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    /// Server-assigned identity.
    pub id: RestaurantId,
    /// Link to the restaurant on a map service.
    pub maps_url: String,
    /// Star tier used to weight the draw.
    pub rating: Tier,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Phone number, as formatted by the server.
    pub phone: String,
    /// When the restaurant was added to the collection.
    ///
    /// Timestamps sent without an offset are taken to be UTC.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Opening hours, in the order the server lists them.
    #[serde(default)]
    pub opening_hours: Vec<OpeningHours>,
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map_err(|e| de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

/// RFC 3339 first, then a bare `2024-12-17T08:30:00` read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
}

/// One opening-hours line of a restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    /// Server-assigned identity of this entry.
    pub id: u64,
    /// The restaurant this entry belongs to.
    pub restaurant_id: RestaurantId,
    /// Day label, e.g. `Monday`.
    pub day_of_week: String,
    /// Free-text hours, e.g. `11:00–14:30, 17:00–21:00`.
    pub open_info: String,
}

/// A request to add a restaurant to the remote collection.
///
/// Only the maps URL and rating are client supplied; the server resolves the
/// rest from the maps link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    maps_url: String,
    rating: Tier,
}

impl NewRestaurant {
    /// Validate a maps URL and pair it with a rating.
    ///
    /// The link is kept as typed (minus surrounding whitespace), since the
    /// server keys restaurants on it.
    ///
    /// # Errors
    ///
    /// Returns an error if `maps_url` is not an absolute `http` or `https`
    /// URL.
    pub fn new(maps_url: &str, rating: Tier) -> Result<Self, InvalidMapsUrlError> {
        let trimmed = maps_url.trim();
        let url = Url::parse(trimmed).map_err(|e| InvalidMapsUrlError {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidMapsUrlError {
                input: trimmed.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Self {
            maps_url: trimmed.to_string(),
            rating,
        })
    }

    /// The validated maps URL.
    #[must_use]
    pub fn maps_url(&self) -> &str {
        &self.maps_url
    }

    /// The requested rating.
    #[must_use]
    pub const fn rating(&self) -> Tier {
        self.rating
    }
}

/// Error returned when a maps link cannot be used to create a restaurant.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid maps URL '{input}': {reason}")]
pub struct InvalidMapsUrlError {
    input: String,
    reason: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const PAYLOAD: &str = r#"{
        "id": 7,
        "mapsUrl": "https://maps.app.goo.gl/abc",
        "rating": 2,
        "name": "Noodle Bar",
        "address": "1 Main St",
        "phone": "02-1234-5678",
        "createdAt": "2024-12-17T08:30:00Z",
        "openingHours": [
            {"id": 1, "restaurantId": 7, "dayOfWeek": "Monday", "openInfo": "11:00-21:00"},
            {"id": 2, "restaurantId": 7, "dayOfWeek": "Tuesday", "openInfo": "Closed"}
        ]
    }"#;

    #[test]
    fn decodes_server_payload() {
        let restaurant: Restaurant = serde_json::from_str(PAYLOAD).unwrap();

        assert_eq!(restaurant.id, RestaurantId::new(7));
        assert_eq!(restaurant.rating, Tier::Two);
        assert_eq!(restaurant.name, "Noodle Bar");
        assert_eq!(restaurant.opening_hours.len(), 2);
        assert_eq!(restaurant.opening_hours[1].day_of_week, "Tuesday");
        assert_eq!(restaurant.opening_hours[1].restaurant_id, restaurant.id);
    }

    #[test]
    fn missing_opening_hours_defaults_to_empty() {
        let payload = r#"{"id": 1, "mapsUrl": "u", "rating": 1, "name": "n",
            "address": "a", "phone": "p", "createdAt": "2024-12-17T08:30:00Z"}"#;
        let restaurant: Restaurant = serde_json::from_str(payload).unwrap();
        assert!(restaurant.opening_hours.is_empty());
    }

    #[test]
    fn created_at_without_offset_is_read_as_utc() {
        let payload = PAYLOAD.replace("2024-12-17T08:30:00Z", "2024-12-17T08:30:00");
        let restaurant: Restaurant = serde_json::from_str(&payload).unwrap();

        assert_eq!(
            restaurant.created_at,
            Utc.with_ymd_and_hms(2024, 12, 17, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn created_at_with_offset_is_converted_to_utc() {
        let payload = PAYLOAD.replace("2024-12-17T08:30:00Z", "2024-12-17T16:30:00.250+08:00");
        let restaurant: Restaurant = serde_json::from_str(&payload).unwrap();

        assert_eq!(
            restaurant.created_at,
            Utc.with_ymd_and_hms(2024, 12, 17, 8, 30, 0).unwrap()
                + chrono::TimeDelta::milliseconds(250)
        );
    }

    #[test]
    fn garbage_created_at_is_rejected() {
        let payload = PAYLOAD.replace("2024-12-17T08:30:00Z", "last tuesday");
        let error = serde_json::from_str::<Restaurant>(&payload).unwrap_err();
        assert!(error.to_string().contains("invalid timestamp 'last tuesday'"));
    }

    #[test]
    fn created_at_survives_a_save_and_reload() {
        let restaurant: Restaurant = serde_json::from_str(PAYLOAD).unwrap();
        let json = serde_json::to_string(&restaurant).unwrap();
        assert_eq!(serde_json::from_str::<Restaurant>(&json).unwrap(), restaurant);
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let payload = PAYLOAD.replace(r#""rating": 2"#, r#""rating": 5"#);
        let error = serde_json::from_str::<Restaurant>(&payload).unwrap_err();
        assert!(error.to_string().contains("must be 1, 2 or 3"));
    }

    #[test]
    fn new_restaurant_serializes_to_creation_body() {
        let new = NewRestaurant::new("https://maps.app.goo.gl/xyz", Tier::Three).unwrap();
        let body = serde_json::to_value(&new).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"mapsUrl": "https://maps.app.goo.gl/xyz", "rating": 3})
        );
    }

    #[test]
    fn new_restaurant_keeps_the_link_as_typed() {
        let cases = [
            ("  https://maps.app.goo.gl  ", "https://maps.app.goo.gl"),
            (
                "https://www.google.com/maps/place/鼎泰豐",
                "https://www.google.com/maps/place/鼎泰豐",
            ),
        ];
        for (input, expected) in cases {
            let new = NewRestaurant::new(input, Tier::One).unwrap();
            assert_eq!(new.maps_url(), expected);
            assert_eq!(serde_json::to_value(&new).unwrap()["mapsUrl"], expected);
        }
    }

    #[test]
    fn new_restaurant_rejects_bad_urls() {
        assert!(NewRestaurant::new("not a url", Tier::One).is_err());
        assert!(NewRestaurant::new("ftp://maps.example/x", Tier::One).is_err());
        assert!(NewRestaurant::new("", Tier::One).is_err());
    }
}
