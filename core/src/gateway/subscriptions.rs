//! Subscriptions API.
//!
//! See <https://developer.feedly.com/v3/subscriptions/>.

use crate::client::FeedlrClient;
use crate::error::Result;
use crate::http::{escape_id, HttpMethod};
use crate::input::{input_to_params, Payload, RequestInput};
use crate::object::ApiObject;
use crate::transport::Transport;

impl<T: Transport> FeedlrClient<T> {
    /// The user's subscriptions, as a collection.
    pub fn user_subscriptions(&self) -> Result<ApiObject> {
        self.build_object(HttpMethod::Get, "/subscriptions", None, &[])
    }

    /// Subscribe to a feed. `subscription` must offer a mapping, e.g.
    /// `{"id": "feed/http://example.com/rss", "title": "Example"}`.
    pub fn add_subscription<I: RequestInput + ?Sized>(&self, subscription: &I) -> Result<ApiObject> {
        let payload = Payload::Mapping(input_to_params(subscription)?);
        self.build_object(HttpMethod::Post, "/subscriptions", Some(payload), &[])
    }

    /// Feedly updates a subscription by posting it again.
    pub fn update_subscription<I: RequestInput + ?Sized>(&self, subscription: &I) -> Result<ApiObject> {
        self.add_subscription(subscription)
    }

    pub fn delete_subscription(&self, subscription_id: &str) -> Result<ApiObject> {
        let path = format!("/subscriptions/{}", escape_id(subscription_id));
        self.build_object(HttpMethod::Delete, &path, None, &[])
    }
}
