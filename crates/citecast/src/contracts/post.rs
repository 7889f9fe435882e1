use std::sync::LazyLock;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{compile_schema, validate_against, ValidationIssues};

const POSTS_SCHEMA_JSON: &str = include_str!("../../../../schema/posts-v1.json");

static POSTS_SCHEMA: LazyLock<Result<Validator, String>> =
    LazyLock::new(|| compile_schema(POSTS_SCHEMA_JSON));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    X,
    Threads,
    Bluesky,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Linkedin,
        Platform::X,
        Platform::Threads,
        Platform::Bluesky,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
            Platform::Threads => "threads",
            Platform::Bluesky => "bluesky",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated social post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostVariant {
    pub platform: Platform,
    pub content_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    pub citation_block: String,
}

/// Accepts either a bare array of posts or `{"posts": [...]}` and returns the
/// normalized list.
///
/// A bare array is wrapped before validation, so issues always point below
/// `/posts`.
pub fn validate_post_variants(value: &Value) -> Result<Vec<PostVariant>, ValidationIssues> {
    let wrapped;
    let value = if value.is_array() {
        wrapped = json!({ "posts": value });
        &wrapped
    } else {
        value
    };

    validate_against::<PostList>(&POSTS_SCHEMA, value).map(|list| list.posts)
}

#[derive(Deserialize)]
struct PostList {
    posts: Vec<PostVariant>,
}
