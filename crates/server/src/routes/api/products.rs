//! Product API.
//!
//! Reads are public. Writes require the `admin` role and each successful
//! write pushes the refreshed catalog to realtime observers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::form_urlencoded;

use emporium_core::{NewProduct, PageInfo, Product, ProductId, ProductQuery, ProductUpdate};

use super::{ApiJson, Envelope, created, ok};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Raw listing parameters. Every field is parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub query: Option<String>,
}

impl ListParams {
    #[must_use]
    pub fn to_query(&self) -> ProductQuery {
        ProductQuery::from_params(
            self.limit.as_deref(),
            self.page.as_deref(),
            self.sort.as_deref(),
            self.query.as_deref(),
        )
    }

    /// Link to `page` of the same listing under `path`.
    #[must_use]
    pub fn page_link(&self, path: &str, query: &ProductQuery, page: u32) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("limit", &query.page.page_size.to_string());
        params.append_pair("page", &page.to_string());
        if let Some(sort) = query.sort {
            params.append_pair("sort", sort.as_str());
        }
        if let Some(filter) = self.query.as_deref().filter(|_| query.filter.is_some()) {
            params.append_pair("query", filter);
        }
        format!("{path}?{}", params.finish())
    }
}

/// Listing response; pagination fields sit beside the payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub status: &'static str,
    pub payload: Vec<Product>,
    #[serde(flatten)]
    pub info: PageInfo,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{pid}", get(show).put(update).delete(delete))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductListResponse>> {
    let query = params.to_query();
    let page = state.catalog().list(&query).await?;
    let info = page.info;
    Ok(Json(ProductListResponse {
        status: "success",
        payload: page.items,
        info,
        prev_link: info
            .prev_page
            .map(|p| params.page_link("/api/products", &query, p)),
        next_link: info
            .next_page
            .map(|p| params.page_link("/api/products", &query, p)),
    }))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<Json<Envelope<Product>>> {
    let product = state.catalog().get(ProductId::parse(&pid)?).await?;
    Ok(ok(product))
}

#[instrument(skip(state, admin, input), fields(admin = %admin.0.id))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().create(input).await?;
    Ok(created(product))
}

#[instrument(skip(state, admin, update), fields(admin = %admin.0.id))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(pid): Path<String>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Envelope<Product>>> {
    let product = state
        .catalog()
        .update(ProductId::parse(&pid)?, update)
        .await?;
    Ok(ok(product))
}

#[instrument(skip(state, admin), fields(admin = %admin.0.id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(pid): Path<String>,
) -> Result<Json<Envelope<()>>> {
    state.catalog().delete(ProductId::parse(&pid)?).await?;
    Ok(Json(Envelope::message("product deleted")))
}
