//! Domain resource types
//!
//! Wire fields are camelCase. Shapes that drift between server versions
//! (badge catalogs, like counters) go through [`super::normalize`] instead
//! of per-call optional chaining.

use serde::{Deserialize, Serialize};

/// One board post as rendered in the list and detail screens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(alias = "likes")]
    pub likes_num: i64,
    pub liked: bool,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: Option<String>,
    pub created_at: Option<String>,
}

/// One badge-shop catalog entry, already normalized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub emoji: Option<String>,
    pub description: String,
    pub price: i64,
    pub owned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizQuestion {
    pub id: Option<i64>,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizSet {
    pub keyword: Option<String>,
    pub questions: Vec<QuizQuestion>,
}
