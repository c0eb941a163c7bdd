//! Barguni Rust Client
//!
//! A Rust client library for the Barguni basket-sharing API,
//! with bearer authentication, persisted session tokens and transparent
//! refresh of expired access tokens.

pub mod api;
pub mod auth_client;
pub mod error;
pub mod request;
pub mod session;
pub mod token_store;
pub mod types;

pub use api::BarguniApi;
pub use auth_client::{
    ApiClient, AuthClientConfig, AuthClientHttp, PlainClient, DEFAULT_EXPIRED_CODE,
    DEFAULT_REFRESH_HEADER,
};
pub use error::{ClientError, Result};
pub use request::{ApiResponse, PendingRequest};
pub use session::Session;
pub use token_store::{CredentialStore, MemoryCredentialStore};
pub use types::{Basket, Item, ItemSearch, SessionTokens};
