//! Read-side view of the directory: base data merged with the overlay at a
//! fixed instant. Building one is cheap enough to do per request.

use crate::errors::DirectoryError;
use crate::geo::{haversine, within_radius, Coordinates, Unit};
use crate::models::{
    AppData, BaseData, Business, BusinessDetail, BusinessSummary, CategoryCount, Deal, Profile,
    Recommendation, Review, ScoredReview, SearchQuery, SortKey,
};
use crate::scoring::{
    aggregate_rating, average_credibility_at, credibility_at, recommendation_score, Interests,
    RecommendationInputs,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub struct Directory {
    now: DateTime<Utc>,
    businesses: Vec<Business>,
    deals: Vec<Deal>,
    reviews: Vec<Review>,
}

impl Directory {
    pub fn at(now: DateTime<Utc>, base: &BaseData, data: &AppData) -> Self {
        let businesses = data.businesses.visible(&base.businesses);
        let live: BTreeSet<&str> = businesses.iter().map(|b| b.id.as_str()).collect();

        let deals = data
            .deals
            .visible(&base.deals)
            .into_iter()
            .filter(|deal| live.contains(deal.business_id.as_str()))
            .collect();
        let reviews = data
            .reviews
            .visible(&base.reviews)
            .into_iter()
            .filter(|review| live.contains(review.business_id.as_str()))
            .collect();

        Self {
            now,
            businesses,
            deals,
            reviews,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    pub fn business(&self, id: &str) -> Result<&Business, DirectoryError> {
        self.businesses
            .iter()
            .find(|business| business.id == id)
            .ok_or_else(|| DirectoryError::not_found("business", id))
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn deal(&self, id: &str) -> Result<&Deal, DirectoryError> {
        self.deals
            .iter()
            .find(|deal| deal.id == id)
            .ok_or_else(|| DirectoryError::not_found("deal", id))
    }

    pub fn deals_for(&self, business_id: &str) -> Vec<&Deal> {
        self.deals
            .iter()
            .filter(|deal| deal.business_id == business_id)
            .collect()
    }

    pub fn active_deals(&self) -> Vec<&Deal> {
        self.deals
            .iter()
            .filter(|deal| deal.is_active_at(self.now))
            .collect()
    }

    pub fn review(&self, id: &str) -> Result<&Review, DirectoryError> {
        self.reviews
            .iter()
            .find(|review| review.id == id)
            .ok_or_else(|| DirectoryError::not_found("review", id))
    }

    fn raw_reviews_for(&self, business_id: &str) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|review| review.business_id == business_id)
            .collect()
    }

    /// Most credible first, newest breaking ties.
    pub fn reviews_for(&self, business_id: &str) -> Vec<ScoredReview> {
        let mut scored: Vec<ScoredReview> = self
            .raw_reviews_for(business_id)
            .into_iter()
            .map(|review| ScoredReview {
                credibility: credibility_at(review, self.now),
                review: review.clone(),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.credibility
                .cmp(&a.credibility)
                .then_with(|| b.review.created_at.cmp(&a.review.created_at))
        });
        scored
    }

    pub fn categories(&self) -> Vec<CategoryCount> {
        let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
        for business in &self.businesses {
            let entry = counts
                .entry(business.category.to_lowercase())
                .or_insert_with(|| (business.category.clone(), 0));
            entry.1 += 1;
        }
        counts
            .into_values()
            .map(|(name, count)| CategoryCount { name, count })
            .collect()
    }

    pub fn summarize(
        &self,
        business: &Business,
        origin: Option<(Coordinates, Unit)>,
    ) -> BusinessSummary {
        let reviews = self.raw_reviews_for(&business.id);
        let active_deals = self
            .deals
            .iter()
            .filter(|deal| deal.business_id == business.id && deal.is_active_at(self.now))
            .count();
        let distance = origin.and_then(|(point, unit)| {
            business
                .location
                .map(|location| haversine(point, location, unit))
        });

        BusinessSummary {
            business: business.clone(),
            average_rating: aggregate_rating(business, &reviews),
            review_count: reviews.len(),
            active_deals,
            distance,
        }
    }

    pub fn detail(&self, id: &str) -> Result<BusinessDetail, DirectoryError> {
        let business = self.business(id)?;
        Ok(BusinessDetail {
            summary: self.summarize(business, None),
            deals: self.deals_for(id).into_iter().cloned().collect(),
            reviews: self.reviews_for(id),
        })
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<BusinessSummary>, DirectoryError> {
        let origin = query.origin();
        if let Some(point) = origin {
            if !point.is_valid() {
                return Err(DirectoryError::invalid("lat/lon out of range"));
            }
        }
        if query.radius.is_some() && origin.is_none() {
            return Err(DirectoryError::invalid("radius requires lat and lon"));
        }
        if query.radius.is_some_and(|radius| !(radius >= 0.0)) {
            return Err(DirectoryError::invalid("radius must be non-negative"));
        }

        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);

        let mut results: Vec<BusinessSummary> = self
            .businesses
            .iter()
            .filter(|business| needle.as_deref().is_none_or(|text| matches_text(business, text)))
            .filter(|business| {
                category
                    .as_deref()
                    .is_none_or(|wanted| business.category.to_lowercase() == wanted)
            })
            .map(|business| self.summarize(business, origin.map(|point| (point, query.unit))))
            .filter(|summary| {
                query
                    .min_rating
                    .is_none_or(|min| summary.average_rating >= min)
            })
            .filter(|summary| match query.has_deal {
                Some(wanted) => (summary.active_deals > 0) == wanted,
                None => true,
            })
            .filter(|summary| match (query.radius, origin) {
                (Some(radius), Some(point)) => summary
                    .business
                    .location
                    .is_some_and(|location| within_radius(point, location, radius, query.unit)),
                _ => true,
            })
            .collect();

        sort_summaries(&mut results, query.sort);
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Highest score first; businesses already in the profile's history are
    /// left out.
    pub fn recommend(&self, profile: &Profile, limit: usize) -> Vec<Recommendation> {
        let interests = Interests::from_profile(profile, &self.businesses);

        let mut ranked: Vec<Recommendation> = self
            .businesses
            .iter()
            .filter(|business| !interests.seen.contains(&business.id))
            .map(|business| {
                let summary = self.summarize(business, None);
                let reviews = self.raw_reviews_for(&business.id);
                let score = recommendation_score(RecommendationInputs {
                    category_match: interests.matches_category(business),
                    rating: summary.average_rating,
                    average_credibility: average_credibility_at(&reviews, self.now),
                    has_active_deal: summary.active_deals > 0,
                    history_match: interests.matches_history(business),
                });
                Recommendation { summary, score }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| by_name(&a.summary.business, &b.summary.business))
        });
        ranked.truncate(limit);
        ranked
    }
}

fn matches_text(business: &Business, needle: &str) -> bool {
    let fields = [
        &business.name,
        &business.category,
        &business.description,
        &business.address,
    ];
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
        || business
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

fn by_name(a: &Business, b: &Business) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn sort_summaries(results: &mut [BusinessSummary], key: SortKey) {
    results.sort_by(|a, b| {
        let primary = match key {
            SortKey::Name => Ordering::Equal,
            SortKey::Rating => desc_f64(a.average_rating, b.average_rating),
            SortKey::Reviews => b.review_count.cmp(&a.review_count),
            SortKey::Distance => match (a.distance, b.distance) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Newest => b.business.created_at.cmp(&a.business.created_at),
        };
        primary.then_with(|| by_name(&a.business, &b.business))
    });
}
