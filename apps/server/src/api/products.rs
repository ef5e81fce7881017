use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use pricepulse_core::products::{NewProduct, Product, SweepSummary, TrackedProduct};
use pricepulse_core::utils::decimal_input;
use rust_decimal::Decimal;
use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackProductRequest {
    url: String,
    #[serde(deserialize_with = "decimal_input::deserialize_decimal")]
    target_price: Decimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTargetRequest {
    #[serde(deserialize_with = "decimal_input::deserialize_decimal")]
    target_price: Decimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProductsQuery {
    after_id: Option<i64>,
    limit: Option<i64>,
}

async fn track_product(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackProductRequest>,
) -> ApiResult<(StatusCode, Json<TrackedProduct>)> {
    let tracked = state
        .product_service
        .track_product(&body.url, body.target_price)
        .await?;
    Ok((StatusCode::CREATED, Json(tracked)))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(new_product): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.product_service.create(new_product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.product_service.list_products(
        query.after_id.unwrap_or(0),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;
    Ok(Json(products))
}

async fn get_product(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Product>> {
    let product = state.product_service.get_by_id(id).await?;
    Ok(Json(product))
}

async fn update_target_price(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateTargetRequest>,
) -> ApiResult<Json<Product>> {
    let product = state
        .product_service
        .update_target_price(id, body.target_price)
        .await?;
    Ok(Json(product))
}

/// Runs a full sweep inline and reports its counters.
async fn check_prices(State(state): State<Arc<AppState>>) -> ApiResult<Json<SweepSummary>> {
    let summary = state.product_service.check_prices().await?;
    Ok(Json(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products/track", post(track_product))
        .route("/products/check", post(check_prices))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/target", put(update_target_price))
}
