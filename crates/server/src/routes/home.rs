//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use emporium_core::{PageRequest, Product, ProductQuery};

use crate::error::ViewError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Account;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: u32 = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<Product>,
    pub account: Option<Account>,
}

/// Display the home page.
#[instrument(skip(state, account))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
) -> Result<HomeTemplate, ViewError> {
    let query = ProductQuery {
        page: PageRequest {
            page: 1,
            page_size: FEATURED_COUNT,
        },
        ..ProductQuery::default()
    };
    let page = state.catalog().list(&query).await?;

    Ok(HomeTemplate {
        products: page.items,
        account,
    })
}
