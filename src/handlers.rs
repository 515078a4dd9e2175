use crate::catalog;
use crate::chatbot::{self, ChatReply, ChatRequest};
use crate::directory::Directory;
use crate::errors::AppError;
use crate::models::{
    Business, BusinessDetail, BusinessDraft, BusinessSummary, CategoriesUpdate, CategoryCount,
    CommentDraft, Deal, DealDraft, DealsQuery, FavoriteResponse, Profile, Recommendation,
    RecommendationsQuery, Review, ReviewDraft, ReviewUpdate, ScoredReview, SearchQuery,
};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

const DEFAULT_RECOMMENDATIONS: usize = 5;

pub async fn search_businesses(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BusinessSummary>>, AppError> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    Ok(Json(directory.search(&query)?))
}

pub async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BusinessDetail>, AppError> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    Ok(Json(directory.detail(&id)?))
}

pub async fn create_business(
    State(state): State<AppState>,
    Json(draft): Json<BusinessDraft>,
) -> Result<(StatusCode, Json<Business>), AppError> {
    let mut data = state.data.lock().await;
    let business = catalog::create_business(&mut data, draft, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(business)))
}

pub async fn update_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<BusinessDraft>,
) -> Result<Json<Business>, AppError> {
    let mut data = state.data.lock().await;
    let business = catalog::update_business(&state.base, &mut data, &id, draft)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(business))
}

pub async fn delete_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    catalog::delete_business(&state.base, &mut data, &id)?;
    persist_data(&state.data_path, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Business>, AppError> {
    let mut data = state.data.lock().await;
    let business = catalog::restore_business(&state.base, &mut data, &id)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(business))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScoredReview>>, AppError> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    directory.business(&id)?;
    Ok(Json(directory.reviews_for(&id)))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ReviewDraft>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let mut data = state.data.lock().await;
    let review = catalog::create_review(&state.base, &mut data, &id, draft, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ReviewUpdate>,
) -> Result<Json<Review>, AppError> {
    let mut data = state.data.lock().await;
    let review = catalog::update_review(&state.base, &mut data, &id, update, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    catalog::delete_review(&state.base, &mut data, &id, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Review>, AppError> {
    let mut data = state.data.lock().await;
    let review = catalog::like_review(&state.base, &mut data, &id, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(review))
}

pub async fn comment_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<CommentDraft>,
) -> Result<Json<Review>, AppError> {
    let mut data = state.data.lock().await;
    let review = catalog::comment_review(&state.base, &mut data, &id, draft, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(review))
}

pub async fn list_deals(
    State(state): State<AppState>,
    Query(query): Query<DealsQuery>,
) -> Result<Json<Vec<Deal>>, AppError> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    let now = directory.now();
    let deals = directory
        .deals()
        .iter()
        .filter(|deal| {
            query
                .business_id
                .as_deref()
                .is_none_or(|id| deal.business_id == id)
        })
        .filter(|deal| match query.active {
            Some(wanted) => deal.is_active_at(now) == wanted,
            None => true,
        })
        .cloned()
        .collect();
    Ok(Json(deals))
}

pub async fn create_deal(
    State(state): State<AppState>,
    Json(draft): Json<DealDraft>,
) -> Result<(StatusCode, Json<Deal>), AppError> {
    let mut data = state.data.lock().await;
    let deal = catalog::create_deal(&state.base, &mut data, draft, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn update_deal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<DealDraft>,
) -> Result<Json<Deal>, AppError> {
    let mut data = state.data.lock().await;
    let deal = catalog::update_deal(&state.base, &mut data, &id, draft, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(deal))
}

pub async fn delete_deal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    catalog::delete_deal(&state.base, &mut data, &id, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryCount>> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    Json(directory.categories())
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<Profile> {
    let data = state.data.lock().await;
    Json(catalog::profile(&data, &user))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path((user, business_id)): Path<(String, String)>,
) -> Result<Json<FavoriteResponse>, AppError> {
    let mut data = state.data.lock().await;
    let favorite =
        catalog::toggle_favorite(&state.base, &mut data, &user, &business_id, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(FavoriteResponse {
        business_id,
        favorite,
    }))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path((user, business_id)): Path<(String, String)>,
) -> Result<Json<Profile>, AppError> {
    let mut data = state.data.lock().await;
    let profile = catalog::record_view(&state.base, &mut data, &user, &business_id, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(profile))
}

pub async fn set_categories(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(update): Json<CategoriesUpdate>,
) -> Result<Json<Profile>, AppError> {
    let mut data = state.data.lock().await;
    let profile = catalog::set_preferred_categories(&mut data, &user, update.categories)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(profile))
}

pub async fn recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> Json<Vec<Recommendation>> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    let profile = catalog::profile(&data, &query.user);
    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATIONS);
    Json(directory.recommend(&profile, limit))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    let data = state.data.lock().await;
    let directory = Directory::at(Utc::now(), &state.base, &data);
    let profile = request
        .user
        .as_deref()
        .map(|user| catalog::profile(&data, user))
        .unwrap_or_default();
    Json(chatbot::respond(&directory, &profile, &request))
}

pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    catalog::reset(&mut data);
    persist_data(&state.data_path, &data).await?;
    Ok(StatusCode::NO_CONTENT)
}
