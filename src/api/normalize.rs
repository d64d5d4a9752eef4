//! Per-resource payload normalization
//!
//! Field names drift between server versions (`points`/`point`/`balance`,
//! `likesNum`/`likes`, `id`/`badgeId`). Rather than optional chaining at
//! every call site, each variant is resolved here once, with an explicit
//! precedence order.

use serde_json::Value;

use super::types::Badge;

/// Point balance from `/api/points/me`. Precedence: `points` > `point` >
/// `balance`.
pub fn balance(payload: &Value) -> Option<i64> {
    ["points", "point", "balance"]
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_i64))
}

/// Point balance inside a purchase result. Precedence: `points` >
/// `user.points` > `wallet.points`.
pub fn purchase_points(payload: &Value) -> Option<i64> {
    payload
        .get("points")
        .or_else(|| payload.get("user").and_then(|u| u.get("points")))
        .or_else(|| payload.get("wallet").and_then(|w| w.get("points")))
        .and_then(Value::as_i64)
}

/// Owned badge ids inside a purchase result. Precedence: `ownedIds` >
/// `badgesOwned` > `badges`. Numeric ids are stringified.
pub fn owned_ids(payload: &Value) -> Option<Vec<String>> {
    let list = payload
        .get("ownedIds")
        .or_else(|| payload.get("badgesOwned"))
        .or_else(|| payload.get("badges"))?
        .as_array()?;

    Some(list.iter().filter_map(id_string).collect())
}

/// Server's answer to a like mutation; either field may be absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikeResult {
    pub like_num: Option<i64>,
    pub liked: Option<bool>,
}

/// Like state from a like/unlike response. The mutation endpoint answers
/// with `likeNum` (singular), unlike the list payloads. Liked flag
/// precedence: `liked` > `isLiked`.
pub fn like_result(payload: &Value) -> LikeResult {
    LikeResult {
        like_num: payload.get("likeNum").and_then(Value::as_i64),
        liked: payload
            .get("liked")
            .or_else(|| payload.get("isLiked"))
            .and_then(Value::as_bool),
    }
}

/// Like count on a post payload. Precedence: `likesNum` > `likes` >
/// `likeCount`.
pub fn like_count(payload: &Value) -> Option<i64> {
    ["likesNum", "likes", "likeCount"]
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_i64))
}

/// List payloads arrive bare or wrapped in `{content: [...]}`
pub fn list_items(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("content") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// String list (quiz keywords): bare array or under `keywords`/`content`
pub fn string_list(payload: Value) -> Vec<String> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("keywords").or_else(|| map.remove("content")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// One badge record. Id precedence: `id` > `badgeId` (stringified when
/// numeric); price precedence: `price` > `cost`, defaulting to 0.
pub fn badge(payload: &Value) -> Option<Badge> {
    let id = payload
        .get("id")
        .or_else(|| payload.get("badgeId"))
        .and_then(id_string)?;

    Some(Badge {
        id,
        name: payload
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        emoji: payload
            .get("emoji")
            .and_then(Value::as_str)
            .map(str::to_string),
        description: payload
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        price: payload
            .get("price")
            .or_else(|| payload.get("cost"))
            .and_then(Value::as_i64)
            .unwrap_or(0),
        owned: payload
            .get("owned")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

/// Badge catalog: normalized records, unrecognizable entries dropped
pub fn badge_list(payload: Value) -> Vec<Badge> {
    list_items(payload).iter().filter_map(badge).collect()
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
