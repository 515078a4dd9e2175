use crate::directory::Directory;
use crate::errors::DirectoryError;
use crate::models::{
    AppData, BaseData, Business, BusinessDraft, Comment, CommentDraft, Deal, DealDraft, Profile,
    Review, ReviewDraft, ReviewUpdate,
};
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn required(value: &str, field: &str) -> Result<String, DirectoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DirectoryError::invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn check_review_rating(rating: u8) -> Result<(), DirectoryError> {
    if !(1..=5).contains(&rating) {
        return Err(DirectoryError::invalid("rating must be between 1 and 5"));
    }
    Ok(())
}

fn build_business(
    id: String,
    draft: BusinessDraft,
    created_at: Option<DateTime<Utc>>,
) -> Result<Business, DirectoryError> {
    let rating = draft.rating.unwrap_or(0.0);
    if !(0.0..=5.0).contains(&rating) {
        return Err(DirectoryError::invalid("rating must be between 0 and 5"));
    }
    if draft.location.is_some_and(|point| !point.is_valid()) {
        return Err(DirectoryError::invalid("location out of range"));
    }

    Ok(Business {
        id,
        name: required(&draft.name, "name")?,
        category: required(&draft.category, "category")?,
        description: draft.description.trim().to_string(),
        address: draft.address.trim().to_string(),
        phone: optional(draft.phone),
        website: optional(draft.website),
        hours: optional(draft.hours),
        tags: draft
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        rating,
        location: draft.location,
        created_at,
    })
}

pub fn create_business(
    data: &mut AppData,
    draft: BusinessDraft,
    now: DateTime<Utc>,
) -> Result<Business, DirectoryError> {
    let business = build_business(new_id(), draft, Some(now))?;
    data.businesses.upsert(business.clone());
    info!(id = %business.id, name = %business.name, "business created");
    Ok(business)
}

pub fn update_business(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    draft: BusinessDraft,
) -> Result<Business, DirectoryError> {
    let existing = data
        .businesses
        .find(&base.businesses, id)
        .ok_or_else(|| DirectoryError::not_found("business", id))?;
    let business = build_business(existing.id, draft, existing.created_at)?;
    data.businesses.upsert(business.clone());
    info!(id, "business updated");
    Ok(business)
}

pub fn delete_business(base: &BaseData, data: &mut AppData, id: &str) -> Result<(), DirectoryError> {
    if data.businesses.find(&base.businesses, id).is_none() {
        return Err(DirectoryError::not_found("business", id));
    }
    data.businesses.remove(id);
    info!(id, "business deleted");
    Ok(())
}

pub fn restore_business(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
) -> Result<Business, DirectoryError> {
    if !data.businesses.deleted.contains(id) {
        return Err(DirectoryError::not_found("deleted business", id));
    }
    // Custom-only records are dropped on delete; only base records come back.
    let business = base
        .businesses
        .iter()
        .find(|business| business.id == id)
        .cloned()
        .ok_or_else(|| DirectoryError::not_found("business", id))?;
    data.businesses.restore(id);
    info!(id, "business restored");
    Ok(business)
}

fn build_deal(id: String, draft: DealDraft) -> Result<Deal, DirectoryError> {
    if let (Some(start), Some(end)) = (draft.starts_at, draft.expires_at) {
        if end <= start {
            return Err(DirectoryError::invalid("expires_at must be after starts_at"));
        }
    }
    if draft.discount_percent.is_some_and(|percent| percent > 100) {
        return Err(DirectoryError::invalid("discount_percent must be at most 100"));
    }
    Ok(Deal {
        id,
        business_id: draft.business_id,
        title: required(&draft.title, "title")?,
        description: draft.description.trim().to_string(),
        discount_percent: draft.discount_percent,
        starts_at: draft.starts_at,
        expires_at: draft.expires_at,
    })
}

pub fn create_deal(
    base: &BaseData,
    data: &mut AppData,
    draft: DealDraft,
    now: DateTime<Utc>,
) -> Result<Deal, DirectoryError> {
    Directory::at(now, base, data).business(&draft.business_id)?;
    let deal = build_deal(new_id(), draft)?;
    data.deals.upsert(deal.clone());
    info!(id = %deal.id, business_id = %deal.business_id, "deal created");
    Ok(deal)
}

pub fn update_deal(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    draft: DealDraft,
    now: DateTime<Utc>,
) -> Result<Deal, DirectoryError> {
    let directory = Directory::at(now, base, data);
    directory.deal(id)?;
    directory.business(&draft.business_id)?;
    let deal = build_deal(id.to_string(), draft)?;
    data.deals.upsert(deal.clone());
    info!(id, "deal updated");
    Ok(deal)
}

pub fn delete_deal(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    now: DateTime<Utc>,
) -> Result<(), DirectoryError> {
    Directory::at(now, base, data).deal(id)?;
    data.deals.remove(id);
    info!(id, "deal deleted");
    Ok(())
}

pub fn create_review(
    base: &BaseData,
    data: &mut AppData,
    business_id: &str,
    draft: ReviewDraft,
    now: DateTime<Utc>,
) -> Result<Review, DirectoryError> {
    Directory::at(now, base, data).business(business_id)?;
    check_review_rating(draft.rating)?;
    let review = Review {
        id: new_id(),
        business_id: business_id.to_string(),
        author: required(&draft.author, "author")?,
        rating: draft.rating,
        text: required(&draft.text, "text")?,
        likes: 0,
        comments: Vec::new(),
        created_at: now,
    };
    data.reviews.upsert(review.clone());
    info!(id = %review.id, business_id, "review created");
    Ok(review)
}

/// Applies `change` to a visible review and stores the edited copy.
fn edit_review(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    now: DateTime<Utc>,
    change: impl FnOnce(&mut Review) -> Result<(), DirectoryError>,
) -> Result<Review, DirectoryError> {
    let mut review = Directory::at(now, base, data).review(id)?.clone();
    change(&mut review)?;
    data.reviews.upsert(review.clone());
    Ok(review)
}

pub fn update_review(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    update: ReviewUpdate,
    now: DateTime<Utc>,
) -> Result<Review, DirectoryError> {
    check_review_rating(update.rating)?;
    let text = required(&update.text, "text")?;
    let review = edit_review(base, data, id, now, |review| {
        review.rating = update.rating;
        review.text = text;
        Ok(())
    })?;
    info!(id, "review updated");
    Ok(review)
}

pub fn delete_review(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    now: DateTime<Utc>,
) -> Result<(), DirectoryError> {
    Directory::at(now, base, data).review(id)?;
    data.reviews.remove(id);
    info!(id, "review deleted");
    Ok(())
}

pub fn like_review(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Review, DirectoryError> {
    edit_review(base, data, id, now, |review| {
        review.likes = review.likes.saturating_add(1);
        Ok(())
    })
}

pub fn comment_review(
    base: &BaseData,
    data: &mut AppData,
    id: &str,
    draft: CommentDraft,
    now: DateTime<Utc>,
) -> Result<Review, DirectoryError> {
    let comment = Comment {
        author: required(&draft.author, "author")?,
        text: required(&draft.text, "text")?,
        created_at: now,
    };
    edit_review(base, data, id, now, |review| {
        review.comments.push(comment);
        Ok(())
    })
}

/// Profiles are keyed by the trimmed user name on every path.
fn user_key(user: &str) -> Result<String, DirectoryError> {
    required(user, "user")
}

pub fn profile(data: &AppData, user: &str) -> Profile {
    data.profiles
        .get(user.trim())
        .cloned()
        .unwrap_or_default()
}

fn profile_mut<'a>(data: &'a mut AppData, user: &str) -> Result<&'a mut Profile, DirectoryError> {
    let user = user_key(user)?;
    Ok(data.profiles.entry(user).or_default())
}

pub fn toggle_favorite(
    base: &BaseData,
    data: &mut AppData,
    user: &str,
    business_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, DirectoryError> {
    let user = user_key(user)?;
    let already = data
        .profiles
        .get(&user)
        .is_some_and(|profile| profile.favorites.contains(business_id));
    // Unfavoriting a business that has since been deleted is still allowed.
    if !already {
        Directory::at(now, base, data).business(business_id)?;
    }
    let favorite = data
        .profiles
        .entry(user)
        .or_default()
        .toggle_favorite(business_id);
    info!(business_id, favorite, "favorite toggled");
    Ok(favorite)
}

pub fn record_view(
    base: &BaseData,
    data: &mut AppData,
    user: &str,
    business_id: &str,
    now: DateTime<Utc>,
) -> Result<Profile, DirectoryError> {
    Directory::at(now, base, data).business(business_id)?;
    let profile = profile_mut(data, user)?;
    profile.record_view(business_id);
    Ok(profile.clone())
}

pub fn set_preferred_categories(
    data: &mut AppData,
    user: &str,
    categories: Vec<String>,
) -> Result<Profile, DirectoryError> {
    let profile = profile_mut(data, user)?;
    profile.preferred_categories = categories
        .into_iter()
        .map(|category| category.trim().to_string())
        .filter(|category| !category.is_empty())
        .collect();
    Ok(profile.clone())
}

pub fn reset(data: &mut AppData) {
    data.businesses.clear();
    data.deals.clear();
    data.reviews.clear();
    data.profiles.clear();
    info!("overlay cleared");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::tests::{now, sample_base};
    use crate::geo::Coordinates;

    fn draft(name: &str) -> BusinessDraft {
        BusinessDraft {
            name: name.into(),
            category: "Services".into(),
            description: "  fixes things ".into(),
            address: String::new(),
            phone: Some("  ".into()),
            website: None,
            hours: None,
            tags: vec!["repair".into(), " ".into()],
            rating: Some(4.0),
            location: Some(Coordinates {
                lat: 40.0,
                lon: -74.0,
            }),
        }
    }

    #[test]
    fn create_business_normalizes_fields() {
        let mut data = AppData::default();
        let business = create_business(&mut data, draft(" Fixit "), now()).unwrap();
        assert_eq!(business.name, "Fixit");
        assert_eq!(business.description, "fixes things");
        assert_eq!(business.phone, None);
        assert_eq!(business.tags, vec!["repair".to_string()]);
        assert_eq!(business.created_at, Some(now()));
        assert_eq!(data.businesses.custom.len(), 1);
    }

    #[test]
    fn create_business_rejects_bad_input() {
        let mut data = AppData::default();
        assert!(create_business(&mut data, draft("  "), now()).is_err());

        let mut bad = draft("Fixit");
        bad.location = Some(Coordinates { lat: 100.0, lon: 0.0 });
        assert!(create_business(&mut data, bad, now()).is_err());

        let mut bad = draft("Fixit");
        bad.rating = Some(6.0);
        assert!(create_business(&mut data, bad, now()).is_err());
        assert!(data.businesses.custom.is_empty());
    }

    #[test]
    fn update_base_business_keeps_id_and_overrides() {
        let base = sample_base();
        let mut data = AppData::default();
        let updated = update_business(&base, &mut data, "b1", draft("New Bakery")).unwrap();
        assert_eq!(updated.id, "b1");
        assert_eq!(updated.created_at, base.businesses[0].created_at);

        let dir = Directory::at(now(), &base, &data);
        assert_eq!(dir.business("b1").unwrap().name, "New Bakery");
        assert_eq!(base.businesses[0].name, "Sunrise Bakery");
    }

    #[test]
    fn delete_then_restore_business() {
        let base = sample_base();
        let mut data = AppData::default();
        delete_business(&base, &mut data, "b2").unwrap();
        assert!(delete_business(&base, &mut data, "b2").is_err());
        assert!(matches!(
            create_deal(
                &base,
                &mut data,
                DealDraft {
                    business_id: "b2".into(),
                    title: "x".into(),
                    description: String::new(),
                    discount_percent: None,
                    starts_at: None,
                    expires_at: None,
                },
                now()
            ),
            Err(DirectoryError::NotFound { .. })
        ));

        let restored = restore_business(&base, &mut data, "b2").unwrap();
        assert_eq!(restored.name, "Iron Gym");
        assert!(restore_business(&base, &mut data, "b2").is_err());
    }

    #[test]
    fn deal_window_must_be_ordered() {
        let base = sample_base();
        let mut data = AppData::default();
        let result = create_deal(
            &base,
            &mut data,
            DealDraft {
                business_id: "b1".into(),
                title: "Backwards".into(),
                description: String::new(),
                discount_percent: Some(10),
                starts_at: Some(now()),
                expires_at: Some(now()),
            },
            now(),
        );
        assert!(matches!(result, Err(DirectoryError::Invalid(_))));
    }

    #[test]
    fn review_lifecycle() {
        let base = sample_base();
        let mut data = AppData::default();
        let review = create_review(
            &base,
            &mut data,
            "b3",
            ReviewDraft {
                author: "jo".into(),
                rating: 5,
                text: "great pancakes".into(),
            },
            now(),
        )
        .unwrap();

        like_review(&base, &mut data, &review.id, now()).unwrap();
        let liked = like_review(&base, &mut data, "r3", now()).unwrap();
        assert_eq!(liked.likes, 1);
        let commented = comment_review(
            &base,
            &mut data,
            &review.id,
            CommentDraft {
                author: "al".into(),
                text: "agreed".into(),
            },
            now(),
        )
        .unwrap();
        assert_eq!(commented.likes, 1);
        assert_eq!(commented.comments.len(), 1);

        let dir = Directory::at(now(), &base, &data);
        let scored = dir.reviews_for("b3");
        assert_eq!(scored[0].review.id, review.id);
        assert_eq!(scored[0].credibility, 2 + 1 + 10);

        delete_review(&base, &mut data, &review.id, now()).unwrap();
        assert!(like_review(&base, &mut data, &review.id, now()).is_err());
    }

    #[test]
    fn review_rating_bounds() {
        let base = sample_base();
        let mut data = AppData::default();
        for rating in [0, 6] {
            let result = create_review(
                &base,
                &mut data,
                "b1",
                ReviewDraft {
                    author: "jo".into(),
                    rating,
                    text: "hm".into(),
                },
                now(),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn favorites_and_history_need_live_business() {
        let base = sample_base();
        let mut data = AppData::default();
        assert!(toggle_favorite(&base, &mut data, "ana", "b1", now()).unwrap());
        assert!(toggle_favorite(&base, &mut data, "ana", "missing", now()).is_err());
        record_view(&base, &mut data, "ana", "b2", now()).unwrap();

        delete_business(&base, &mut data, "b1").unwrap();
        assert!(!toggle_favorite(&base, &mut data, "ana", "b1", now()).unwrap());

        let stored = profile(&data, "ana");
        assert!(stored.favorites.is_empty());
        assert_eq!(stored.history, vec!["b2".to_string()]);
        assert!(record_view(&base, &mut data, " ", "b2", now()).is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let base = sample_base();
        let mut data = AppData::default();
        delete_business(&base, &mut data, "b1").unwrap();
        set_preferred_categories(&mut data, "ana", vec!["Food".into()]).unwrap();
        reset(&mut data);
        assert!(data.profiles.is_empty());
        assert_eq!(Directory::at(now(), &base, &data).businesses().len(), 4);
    }

    fn deal_draft(business_id: &str, title: &str) -> DealDraft {
        DealDraft {
            business_id: business_id.into(),
            title: title.into(),
            description: String::new(),
            discount_percent: Some(10),
            starts_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn update_and_delete_deal() {
        let base = sample_base();
        let mut data = AppData::default();
        let updated = update_deal(&base, &mut data, "d2", deal_draft("b1", "Muffins again"), now())
            .unwrap();
        assert_eq!(updated.id, "d2");

        let dir = Directory::at(now(), &base, &data);
        assert_eq!(dir.deal("d2").unwrap().title, "Muffins again");
        assert_eq!(dir.active_deals().len(), 2);

        assert!(matches!(
            update_deal(&base, &mut data, "nope", deal_draft("b1", "x"), now()),
            Err(DirectoryError::NotFound { .. })
        ));
        assert!(matches!(
            update_deal(&base, &mut data, "d2", deal_draft("missing", "x"), now()),
            Err(DirectoryError::NotFound { .. })
        ));

        delete_deal(&base, &mut data, "d1", now()).unwrap();
        assert!(delete_deal(&base, &mut data, "d1", now()).is_err());
        let dir = Directory::at(now(), &base, &data);
        assert!(dir.deals_for("b2").is_empty());
        assert_eq!(base.deals.len(), 2);
    }

    #[test]
    fn update_review_changes_rating_and_text() {
        let base = sample_base();
        let mut data = AppData::default();
        let review = update_review(
            &base,
            &mut data,
            "r3",
            ReviewUpdate {
                rating: 5,
                text: " much better now ".into(),
            },
            now(),
        )
        .unwrap();
        assert_eq!(review.text, "much better now");

        let dir = Directory::at(now(), &base, &data);
        let diner = dir.business("b3").unwrap();
        assert_eq!(dir.summarize(diner, None).average_rating, 5.0);

        let bad = ReviewUpdate {
            rating: 0,
            text: "meh".into(),
        };
        assert!(matches!(
            update_review(&base, &mut data, "r3", bad, now()),
            Err(DirectoryError::Invalid(_))
        ));
    }

    #[test]
    fn restore_brings_back_deals_and_reviews() {
        let base = sample_base();
        let mut data = AppData::default();
        delete_business(&base, &mut data, "b1").unwrap();
        let dir = Directory::at(now(), &base, &data);
        assert!(dir.reviews_for("b1").is_empty());
        assert!(dir.deals_for("b1").is_empty());

        restore_business(&base, &mut data, "b1").unwrap();
        let dir = Directory::at(now(), &base, &data);
        assert_eq!(dir.reviews_for("b1").len(), 2);
        assert_eq!(dir.deals_for("b1").len(), 1);
    }

    #[test]
    fn restoring_custom_business_leaves_state_untouched() {
        let base = sample_base();
        let mut data = AppData::default();
        let business = create_business(&mut data, draft("Pop-up"), now()).unwrap();
        delete_business(&base, &mut data, &business.id).unwrap();

        assert!(matches!(
            restore_business(&base, &mut data, &business.id),
            Err(DirectoryError::NotFound { .. })
        ));
        assert!(data.businesses.deleted.contains(&business.id));
    }

    #[test]
    fn profile_keys_are_trimmed_everywhere() {
        let base = sample_base();
        let mut data = AppData::default();
        set_preferred_categories(&mut data, " ana ", vec!["Food".into()]).unwrap();
        record_view(&base, &mut data, "ana", "b2", now()).unwrap();
        toggle_favorite(&base, &mut data, "ana  ", "b1", now()).unwrap();

        assert_eq!(data.profiles.len(), 1);
        let stored = profile(&data, " ana");
        assert!(stored.preferred_categories.contains("Food"));
        assert_eq!(stored.history, vec!["b2".to_string()]);
        assert!(stored.favorites.contains("b1"));
    }
}
