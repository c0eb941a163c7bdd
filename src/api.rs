//! Typed wrappers for the Barguni endpoints used by the app screens

use crate::auth_client::ApiClient;
use crate::error::Result;
use crate::request::PendingRequest;
use crate::types::{Basket, Item, ItemSearch};
use std::sync::Arc;
use tracing::debug;

/// Basket id that selects every basket the user belongs to
pub const ALL_BASKETS: i64 = -1;

/// Endpoint wrappers over any [`ApiClient`]
///
/// Use a [`PlainClient`](crate::PlainClient) for [`login`](Self::login) and an
/// [`AuthClientHttp`](crate::AuthClientHttp) for everything else.
pub struct BarguniApi<C: ApiClient> {
    client: Arc<C>,
}

impl<C: ApiClient> Clone for BarguniApi<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl<C: ApiClient> BarguniApi<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Email test login, returns the issued access token
    pub async fn login(&self, email: &str) -> Result<String> {
        let request = PendingRequest::post(format!("/api/user/login?email={}", encode(email)));
        self.client.send(request).await?.data()
    }

    /// Baskets the current user is a member of
    pub async fn baskets(&self) -> Result<Vec<Basket>> {
        self.client
            .send(PendingRequest::get("/api/user/baskets"))
            .await?
            .data()
    }

    /// Basket details, including its invite code
    pub async fn basket(&self, basket_id: i64) -> Result<Basket> {
        self.client
            .send(PendingRequest::get(format!("/api/basket/{basket_id}")))
            .await?
            .data()
    }

    /// Invite code of a basket, for sharing with new members
    pub async fn join_code(&self, basket_id: i64) -> Result<Option<String>> {
        Ok(self.basket(basket_id).await?.join_code)
    }

    /// Join a basket by invite code, returns the joined basket's id
    pub async fn join_basket(&self, join_code: &str) -> Result<i64> {
        let request = PendingRequest::post(format!("/api/basket/join/{}", encode(join_code.trim())));
        self.client.send(request).await?.data()
    }

    /// Items in a basket; [`ALL_BASKETS`] lists across every basket.
    /// `used` filters on the used flag when given.
    pub async fn items(&self, basket_id: i64, used: Option<bool>) -> Result<Vec<Item>> {
        let path = match used {
            Some(used) => format!("/api/item/list/{basket_id}?used={used}"),
            None => format!("/api/item/list/{basket_id}"),
        };
        self.client.send(PendingRequest::get(path)).await?.data()
    }

    /// Items matching a server-side filter
    pub async fn search_items_filtered(&self, filter: &ItemSearch) -> Result<Vec<Item>> {
        let request = PendingRequest::get("/api/item/search").json(filter)?;
        self.client.send(request).await?.data()
    }

    /// Items across all baskets whose name, content or category contains `text`
    pub async fn search_items(&self, text: &str) -> Result<Vec<Item>> {
        let items = self.items(ALL_BASKETS, None).await?;
        let total = items.len();
        let matched: Vec<Item> = items.into_iter().filter(|item| item.matches(text)).collect();

        debug!(total, matched = matched.len(), "Filtered item search");
        Ok(matched)
    }
}
