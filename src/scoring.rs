use crate::models::{Business, Profile, Review};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

const LIKE_WEIGHT: u32 = 2;
const COMMENT_WEIGHT: u32 = 1;

const CATEGORY_WEIGHT: f64 = 3.0;
const RATING_WEIGHT: f64 = 2.0;
const CREDIBILITY_CAP: f64 = 20.0;
const CREDIBILITY_DIVISOR: f64 = 10.0;
const DEAL_BONUS: f64 = 2.0;
const HISTORY_WEIGHT: f64 = 1.5;

/// Bonus for fresh reviews, by age in whole days.
pub fn recency_bucket(age_days: i64) -> u32 {
    match age_days {
        i64::MIN..=7 => 10,
        8..=30 => 5,
        31..=90 => 2,
        _ => 0,
    }
}

pub fn credibility_at(review: &Review, now: DateTime<Utc>) -> u32 {
    let age_days = (now - review.created_at).num_days();
    let comments = u32::try_from(review.comments.len()).unwrap_or(u32::MAX);
    review
        .likes
        .saturating_mul(LIKE_WEIGHT)
        .saturating_add(comments.saturating_mul(COMMENT_WEIGHT))
        .saturating_add(recency_bucket(age_days))
}

pub fn average_credibility_at(reviews: &[&Review], now: DateTime<Utc>) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: f64 = reviews
        .iter()
        .map(|review| f64::from(credibility_at(review, now)))
        .sum();
    total / reviews.len() as f64
}

/// Mean of review ratings, or the listed rating when nobody has reviewed yet.
pub fn aggregate_rating(business: &Business, reviews: &[&Review]) -> f64 {
    if reviews.is_empty() {
        return business.rating;
    }
    let total: f64 = reviews.iter().map(|review| f64::from(review.rating)).sum();
    total / reviews.len() as f64
}

/// What a profile has shown interest in, resolved against visible businesses.
#[derive(Debug, Default)]
pub struct Interests {
    pub categories: BTreeSet<String>,
    pub history_categories: BTreeSet<String>,
    pub history_tags: BTreeSet<String>,
    pub seen: BTreeSet<String>,
}

impl Interests {
    pub fn from_profile(profile: &Profile, businesses: &[Business]) -> Self {
        let mut interests = Interests {
            categories: profile
                .preferred_categories
                .iter()
                .map(|category| category.to_lowercase())
                .collect(),
            seen: profile.history.iter().cloned().collect(),
            ..Interests::default()
        };

        for business in businesses {
            let category = business.category.to_lowercase();
            if profile.favorites.contains(&business.id) {
                interests.categories.insert(category.clone());
            }
            if interests.seen.contains(&business.id) {
                interests.categories.insert(category.clone());
                interests.history_categories.insert(category);
                interests
                    .history_tags
                    .extend(business.tags.iter().map(|tag| tag.to_lowercase()));
            }
        }

        interests
    }

    pub fn matches_category(&self, business: &Business) -> bool {
        self.categories.contains(&business.category.to_lowercase())
    }

    pub fn matches_history(&self, business: &Business) -> bool {
        self.history_categories
            .contains(&business.category.to_lowercase())
            || business
                .tags
                .iter()
                .any(|tag| self.history_tags.contains(&tag.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationInputs {
    pub category_match: bool,
    pub rating: f64,
    pub average_credibility: f64,
    pub has_active_deal: bool,
    pub history_match: bool,
}

pub fn recommendation_score(inputs: RecommendationInputs) -> f64 {
    let mut score = inputs.rating * RATING_WEIGHT;
    score += inputs.average_credibility.min(CREDIBILITY_CAP) / CREDIBILITY_DIVISOR;
    if inputs.category_match {
        score += CATEGORY_WEIGHT;
    }
    if inputs.has_active_deal {
        score += DEAL_BONUS;
    }
    if inputs.history_match {
        score += HISTORY_WEIGHT;
    }
    score
}
