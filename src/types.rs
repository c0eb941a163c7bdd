//! Wire and domain types shared by the clients

use serde::{Deserialize, Serialize};

/// Access + refresh token pair issued by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Response envelope used by every Barguni endpoint: `{ data, message }`,
/// plus a machine-readable `code` on failures.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Classification of a failed response, decoded once from its `code` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// The access token expired; recoverable with a refresh
    Expired,
    /// Anything else, passed to the caller untouched
    Other { code: Option<String> },
}

impl UpstreamFailure {
    pub fn from_code(code: Option<String>, expired_code: &str) -> Self {
        match code {
            Some(code) if code == expired_code => UpstreamFailure::Expired,
            code => UpstreamFailure::Other { code },
        }
    }
}

/// A shared household basket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    #[serde(rename = "bkt_id", alias = "id")]
    pub id: i64,
    #[serde(rename = "bkt_name", alias = "name", default)]
    pub name: String,
    /// Invite code other members use to join
    #[serde(rename = "joinCode", default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
}

/// A grocery item tracked in a basket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub reg_date: Option<String>,
    #[serde(default)]
    pub shelf_life: Option<String>,
    #[serde(default)]
    pub used: Option<bool>,
}

impl Item {
    /// Whether this item is named and `text` occurs in its name, content or category.
    /// Unnamed items never match.
    pub fn matches(&self, text: &str) -> bool {
        let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) else {
            return false;
        };

        name.contains(text)
            || self.content.as_deref().is_some_and(|c| c.contains(text))
            || self.category.as_deref().is_some_and(|c| c.contains(text))
    }
}

/// Server-side item filter; unset fields do not constrain the search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basket_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<bool>,
}

impl ItemSearch {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    pub fn in_basket(mut self, basket_id: i64) -> Self {
        self.basket_id = Some(basket_id);
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn used(mut self, used: bool) -> Self {
        self.used = Some(used);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            UpstreamFailure::from_code(Some("J003".to_string()), "J003"),
            UpstreamFailure::Expired
        );
        assert_eq!(
            UpstreamFailure::from_code(Some("J001".to_string()), "J003"),
            UpstreamFailure::Other { code: Some("J001".to_string()) }
        );
        assert_eq!(
            UpstreamFailure::from_code(None, "J003"),
            UpstreamFailure::Other { code: None }
        );
    }

    #[test]
    fn test_refresh_envelope_decoding() {
        let body = r#"{"data":{"accessToken":"NEW","refreshToken":"R2"},"message":"ok"}"#;
        let envelope: Envelope<SessionTokens> = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.data, Some(SessionTokens::new("NEW", "R2")));
        assert_eq!(envelope.message.as_deref(), Some("ok"));
        assert!(envelope.code.is_none());
    }

    #[test]
    fn test_basket_field_names() {
        let basket: Basket =
            serde_json::from_str(r#"{"bkt_id":7,"bkt_name":"home","joinCode":"ab12"}"#).unwrap();
        assert_eq!(basket.id, 7);
        assert_eq!(basket.name, "home");
        assert_eq!(basket.join_code.as_deref(), Some("ab12"));
    }

    #[test]
    fn test_item_search_omits_unset_fields() {
        let filter = ItemSearch::keyword("milk").in_basket(3).used(false);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({"keyword": "milk", "basketId": 3, "used": false})
        );
        assert_eq!(serde_json::to_value(ItemSearch::default()).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_item_matches() {
        let item: Item = serde_json::from_str(
            r#"{"itemId":1,"name":"milk","content":"2L carton","category":"dairy"}"#,
        )
        .unwrap();

        assert!(item.matches("mil"));
        assert!(item.matches("carton"));
        assert!(item.matches("dairy"));
        assert!(!item.matches("bread"));

        let unnamed: Item = serde_json::from_str(r#"{"itemId":2,"category":"dairy"}"#).unwrap();
        assert!(!unnamed.matches("dairy"));
    }
}
