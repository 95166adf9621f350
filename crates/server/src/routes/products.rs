//! Product view handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use emporium_core::{CartId, PageInfo, Product, ProductId};

use super::api::products::ListParams;
use crate::error::ViewError;
use crate::filters;
use crate::middleware::SessionCart;
use crate::state::AppState;

/// Values echoed back into the listing form.
#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    pub limit: u32,
    pub sort: String,
    pub query: String,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<Product>,
    pub info: PageInfo,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
    pub form: ListingForm,
    pub cart_id: CartId,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub cart_id: CartId,
}

/// Display the paginated product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    SessionCart(cart_id): SessionCart,
    Query(params): Query<ListParams>,
) -> Result<ProductsIndexTemplate, ViewError> {
    let query = params.to_query();
    let page = state.catalog().list(&query).await?;
    let info = page.info;

    let form = ListingForm {
        limit: query.page.page_size,
        sort: query.sort.map(|s| s.as_str().to_string()).unwrap_or_default(),
        query: query
            .filter
            .as_ref()
            .and(params.query.clone())
            .unwrap_or_default(),
    };

    Ok(ProductsIndexTemplate {
        products: page.items,
        info,
        prev_link: info
            .prev_page
            .map(|p| params.page_link("/products", &query, p)),
        next_link: info
            .next_page
            .map(|p| params.page_link("/products", &query, p)),
        form,
        cart_id,
    })
}

/// Display one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    SessionCart(cart_id): SessionCart,
    Path(pid): Path<String>,
) -> Result<ProductShowTemplate, ViewError> {
    let product = state.catalog().get(ProductId::parse(&pid)?).await?;
    Ok(ProductShowTemplate { product, cart_id })
}
