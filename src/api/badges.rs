//! Badge shop endpoints and the optimistic purchase flow

use std::collections::BTreeSet;

use serde_json::Value;

use super::{encode_segment, normalize};
use crate::client::{ApiClient, RequestDescriptor};
use crate::error::ApiError;
use crate::optimistic::{optimistic, MutationOutcome, StateCell};

pub use super::types::Badge;

pub async fn list(client: &ApiClient) -> Result<Vec<Badge>, ApiError> {
    let payload = client
        .send_value(RequestDescriptor::get("/api/badges"))
        .await?;
    Ok(normalize::badge_list(payload))
}

pub async fn purchase(client: &ApiClient, badge_id: &str) -> Result<Value, ApiError> {
    client
        .send_value(RequestDescriptor::post(format!(
            "/api/badges/{}/purchase",
            encode_segment(badge_id)
        )))
        .await
}

/// Local badge-shop state the purchase flow mutates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopState {
    pub points: i64,
    pub owned: BTreeSet<String>,
}

/// Buy a badge optimistically: deduct the price and mark it owned right
/// away, then reconcile with whatever balance and ownership list the server
/// reports, or roll both back on failure.
///
/// Already-owned badges and an insufficient balance short-circuit without
/// issuing a request.
pub async fn purchase_badge(
    client: &ApiClient,
    shop: &StateCell<ShopState>,
    badge: &Badge,
) -> Result<MutationOutcome<Value>, ApiError> {
    optimistic(
        shop,
        |state| !state.owned.contains(&badge.id) && state.points >= badge.price,
        |state| {
            state.points -= badge.price;
            state.owned.insert(badge.id.clone());
        },
        || purchase(client, &badge.id),
        |state, result| {
            if let Some(points) = normalize::purchase_points(result) {
                state.points = points;
            }
            if let Some(ids) = normalize::owned_ids(result) {
                state.owned = ids.into_iter().collect();
            }
        },
    )
    .await
}
