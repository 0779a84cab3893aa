//! Basket handlers for the signed-in customer.
//!
//! ```text
//! GET /api/v1/basket
//! GET /api/v1/basket/{id}
//! POST /api/v1/basket {"productId":5,"quantity":2}
//! PATCH /api/v1/basket/{id}/increment
//! PATCH /api/v1/basket/{id}/decrement
//! DELETE /api/v1/basket/{id}
//! ```
//!
//! Every entry operation is scoped to the caller; another customer's entry
//! id behaves exactly like a missing one.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::BasketLine;
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts::CreatedResponse;
use crate::inbound::http::auth::AuthenticatedIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Add-to-basket body for `POST /api/v1/basket`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToBasketRequest {
    #[schema(example = 5)]
    pub product_id: i64,
    /// Applies when the product is new to the basket; a repeat add bumps the
    /// existing entry by one.
    #[schema(example = 2)]
    pub quantity: i64,
}

/// Basket entry joined with its product.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BasketLineResponse {
    pub id: i64,
    pub product_id: i64,
    #[schema(example = "Protein bar")]
    pub product_name: String,
    #[schema(example = 2.5)]
    pub unit_price: f64,
    pub quantity: i32,
}

impl From<BasketLine> for BasketLineResponse {
    fn from(line: BasketLine) -> Self {
        Self {
            id: line.id.get(),
            product_id: line.product_id.get(),
            product_name: line.product_name,
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// List the caller's basket.
#[utoipa::path(
    get,
    path = "/api/v1/basket",
    responses(
        (status = 200, description = "Basket entries", body = [BasketLineResponse]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["basket"],
    operation_id = "listBasket"
)]
#[get("/basket")]
pub async fn list_basket(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<web::Json<Vec<BasketLineResponse>>> {
    let lines = state.basket.list(&caller).await?;
    Ok(web::Json(lines.into_iter().map(Into::into).collect()))
}

/// Fetch one basket entry.
#[utoipa::path(
    get,
    path = "/api/v1/basket/{id}",
    params(("id" = i64, Path, description = "Basket entry id")),
    responses(
        (status = 200, description = "Basket entry", body = BasketLineResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Entry not found", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["basket"],
    operation_id = "getBasketEntry"
)]
#[get("/basket/{id}")]
pub async fn get_basket_entry(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    path: web::Path<i64>,
) -> ApiResult<web::Json<BasketLineResponse>> {
    let line = state.basket.get(&caller, path.into_inner()).await?;
    Ok(web::Json(line.into()))
}

/// Add a product or bump its existing entry.
#[utoipa::path(
    post,
    path = "/api/v1/basket",
    request_body = AddToBasketRequest,
    responses(
        (status = 201, description = "Entry created or incremented", body = CreatedResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema),
        (status = 409, description = "Quantity at its limit", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["basket"],
    operation_id = "addToBasket"
)]
#[post("/basket")]
pub async fn add_to_basket(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    payload: web::Json<AddToBasketRequest>,
) -> ApiResult<HttpResponse> {
    let AddToBasketRequest {
        product_id,
        quantity,
    } = payload.into_inner();
    let id = state
        .basket
        .add_to_basket(&caller, product_id, quantity)
        .await?;
    Ok(HttpResponse::Created().json(CreatedResponse { id: id.get() }))
}

/// Add one to an entry.
#[utoipa::path(
    patch,
    path = "/api/v1/basket/{id}/increment",
    params(("id" = i64, Path, description = "Basket entry id")),
    responses(
        (status = 200, description = "Incremented"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Entry not found", body = ErrorSchema),
        (status = 409, description = "Quantity at its limit", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["basket"],
    operation_id = "incrementBasketEntry"
)]
#[patch("/basket/{id}/increment")]
pub async fn increment_entry(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.basket.increment(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Remove one from an entry. An entry at one is left alone with `409`.
#[utoipa::path(
    patch,
    path = "/api/v1/basket/{id}/decrement",
    params(("id" = i64, Path, description = "Basket entry id")),
    responses(
        (status = 200, description = "Decremented"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Entry not found", body = ErrorSchema),
        (status = 409, description = "Quantity already at one", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["basket"],
    operation_id = "decrementBasketEntry"
)]
#[patch("/basket/{id}/decrement")]
pub async fn decrement_entry(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.basket.decrement(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Remove an entry.
#[utoipa::path(
    delete,
    path = "/api/v1/basket/{id}",
    params(("id" = i64, Path, description = "Basket entry id")),
    responses(
        (status = 200, description = "Removed"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Entry not found", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["basket"],
    operation_id = "deleteBasketEntry"
)]
#[delete("/basket/{id}")]
pub async fn delete_entry(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.basket.delete(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}
