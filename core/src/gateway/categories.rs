//! Categories API.
//!
//! See <https://developer.feedly.com/v3/categories/>.

use serde_json::{json, Map};

use crate::client::FeedlrClient;
use crate::error::Result;
use crate::http::{escape_id, HttpMethod};
use crate::input::Payload;
use crate::object::ApiObject;
use crate::transport::Transport;

impl<T: Transport> FeedlrClient<T> {
    pub fn user_categories(&self) -> Result<ApiObject> {
        self.build_object(HttpMethod::Get, "/categories", None, &[])
    }

    pub fn change_category_label(&self, category_id: &str, label: &str) -> Result<ApiObject> {
        let mut body = Map::new();
        body.insert("label".to_string(), json!(label));
        let path = format!("/categories/{}", escape_id(category_id));
        self.build_object(HttpMethod::Post, &path, Some(Payload::Mapping(body)), &[])
    }

    pub fn delete_category(&self, category_id: &str) -> Result<ApiObject> {
        let path = format!("/categories/{}", escape_id(category_id));
        self.build_object(HttpMethod::Delete, &path, None, &[])
    }
}

/// Feedly's id for a user category, e.g. `user/abc/category/tech`.
pub fn category_id(user_id: &str, label: &str) -> String {
    format!("user/{user_id}/category/{label}")
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::client::tests::ScriptedTransport;
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;

    fn client(transport: ScriptedTransport) -> FeedlrClient<ScriptedTransport> {
        FeedlrClient::new(ClientConfig::new("https://sandbox.feedly.com/v3"), transport)
    }

    #[test]
    fn list_categories() {
        let c = client(ScriptedTransport::respond(
            200,
            r#"[{"id":"user/u1/category/tech","label":"Tech"}]"#,
        ));
        let collection = c.user_categories().unwrap().into_collection().unwrap();
        assert_eq!(collection.items()[0].str("label"), Some("Tech"));
        assert!(c.transport().requests.borrow()[0].path.ends_with("/categories"));
    }

    #[test]
    fn rename_posts_label_to_escaped_path() {
        let c = client(ScriptedTransport::respond(200, ""));
        let id = category_id("u1", "tech");
        assert!(c.change_category_label(&id, "Technology").unwrap().is_success());

        let req = &c.transport().requests.borrow()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "https://sandbox.feedly.com/v3/categories/user%2Fu1%2Fcategory%2Ftech");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"label": "Technology"}));
    }

    #[test]
    fn delete_category_requires_auth() {
        let c = client(ScriptedTransport::respond(401, r#"{"errorMessage":"token expired"}"#));
        let err = c.delete_category("user/u1/category/tech").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.response().unwrap().message(), "token expired");
    }
}
