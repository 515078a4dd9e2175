use crate::geo::{Coordinates, Unit};
use crate::overlay::{Overlay, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Business {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: String,
    pub business_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Deal {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.starts_at.is_none_or(|start| start <= now);
        let running = self.expires_at.is_none_or(|end| now < end);
        started && running
    }
}

impl Record for Deal {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub business_id: String,
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Record for Review {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub favorites: BTreeSet<String>,
    /// Most recently viewed first.
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub preferred_categories: BTreeSet<String>,
}

impl Profile {
    /// Returns true when the business is now a favorite.
    pub fn toggle_favorite(&mut self, business_id: &str) -> bool {
        if self.favorites.remove(business_id) {
            false
        } else {
            self.favorites.insert(business_id.to_string());
            true
        }
    }

    pub fn record_view(&mut self, business_id: &str) {
        self.history.retain(|id| id != business_id);
        self.history.insert(0, business_id.to_string());
        self.history.truncate(HISTORY_LIMIT);
    }
}

/// Read-only data shipped with the service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BaseData {
    #[serde(default)]
    pub businesses: Vec<Business>,
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// User edits layered over [`BaseData`], persisted as one document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub businesses: Overlay<Business>,
    #[serde(default)]
    pub deals: Overlay<Deal>,
    #[serde(default)]
    pub reviews: Overlay<Review>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessDraft {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DealDraft {
    pub business_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discount_percent: Option<u8>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDraft {
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewUpdate {
    pub rating: u8,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentDraft {
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesUpdate {
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Rating,
    Reviews,
    Distance,
    Newest,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub has_deal: Option<bool>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn origin(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSummary {
    #[serde(flatten)]
    pub business: Business,
    pub average_rating: f64,
    pub review_count: usize,
    pub active_deals: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ScoredReview {
    #[serde(flatten)]
    pub review: Review,
    pub credibility: u32,
}

#[derive(Debug, Serialize)]
pub struct BusinessDetail {
    #[serde(flatten)]
    pub summary: BusinessSummary,
    pub deals: Vec<Deal>,
    pub reviews: Vec<ScoredReview>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub summary: BusinessSummary,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct DealsQuery {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub business_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub user: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub business_id: String,
    pub favorite: bool,
}
