//! Bookable listings: destinations and events

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::serde_helpers::{id_string, lenient_opt, string_list};

/// Resource families exposed by the upstream API through the `endpoint`
/// query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceEndpoint {
    Destinations,
    Events,
    Feedback,
    Transactions,
}

crate::impl_wire_name_conversions!(ResourceEndpoint {
    Destinations => "destinations",
    Events => "events",
    Feedback => "feedback",
    Transactions => "transactions",
});

/// Common accessors used when matching records returned by list queries.
pub trait Listing {
    fn id(&self) -> &str;
    fn slug(&self) -> &str;
    fn category(&self) -> Option<&str>;
}

/// A travel destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "string_list")]
    pub images: Vec<String>,
    /// Columns the fetch layer does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing for Destination {
    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// A scheduled event (festival, tour, workshop)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Sheet date cells arrive in several formats; kept as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, deserialize_with = "string_list")]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}
