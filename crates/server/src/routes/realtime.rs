//! Live catalog.
//!
//! The page opens an `EventSource` on `/realtime/products`. Every observer
//! receives the full catalog once on connect and again after each product
//! write, as a `products` event whose data is the JSON product list.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, instrument, warn};

use emporium_core::Product;

use crate::error::ViewError;
use crate::filters;
use crate::state::AppState;

/// SSE event name for catalog snapshots.
const SNAPSHOT_EVENT: &str = "products";

/// Realtime catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "realtime.html")]
pub struct RealtimeTemplate {
    pub products: Vec<Product>,
}

/// Display the live catalog page.
#[instrument(skip(state))]
pub async fn page(State(state): State<AppState>) -> Result<RealtimeTemplate, ViewError> {
    let products = state.catalog().snapshot().await?;
    Ok(RealtimeTemplate { products })
}

fn snapshot_event(products: &[Product]) -> Event {
    let json = serde_json::to_string(products).unwrap_or_else(|_| "[]".to_string());
    Event::default().event(SNAPSHOT_EVENT).data(json)
}

/// Stream catalog snapshots to one observer.
///
/// The subscription is taken before the initial snapshot is read, so a
/// write racing the connect is never lost.
#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ViewError> {
    let mut receiver = state.feed().subscribe();
    let initial = state.catalog().snapshot().await?;
    debug!(observers = state.feed().observer_count(), "realtime observer connected");

    let stream = async_stream::stream! {
        yield Ok(snapshot_event(&initial));
        loop {
            match receiver.recv().await {
                Ok(snapshot) => yield Ok(snapshot_event(&snapshot)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "realtime observer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

