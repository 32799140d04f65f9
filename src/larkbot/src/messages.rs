//! Message content for Lark.
//!
//! Provides:
//! - Rich-text post types as the platform serializes them
//! - A builder for posts
//! - Plain-text listings of users and chats used as command replies

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{ChatSummary, UserInfo};

/// One inline element of a post line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum PostTag {
    /// Plain text.
    Text {
        text: String,
        /// Decode HTML entities in `text`.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        un_escape: bool,
    },
    /// Hyperlink.
    A { text: String, href: String },
    /// Mention of a user by open id.
    At { user_id: String },
    /// Uploaded image.
    Img {
        image_key: String,
        #[serde(default)]
        width: u32,
        #[serde(default)]
        height: u32,
    },
}

impl PostTag {
    /// A plain text element.
    pub fn text(text: impl Into<String>) -> Self {
        PostTag::Text {
            text: text.into(),
            un_escape: false,
        }
    }

    /// A hyperlink element.
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        PostTag::A {
            text: text.into(),
            href: href.into(),
        }
    }

    /// A mention element.
    pub fn at(user_id: impl Into<String>) -> Self {
        PostTag::At {
            user_id: user_id.into(),
        }
    }
}

/// One line of a post.
pub type PostLine = Vec<PostTag>;

/// A post body in one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOfLocale {
    /// Post title.
    #[serde(default)]
    pub title: String,
    /// Lines of inline elements.
    #[serde(default)]
    pub content: Vec<PostLine>,
}

/// A rich-text post keyed by locale (`zh_cn`, `en_us`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(pub BTreeMap<String, PostOfLocale>);

impl Post {
    /// Body for `locale`, if present.
    pub fn locale(&self, locale: &str) -> Option<&PostOfLocale> {
        self.0.get(locale)
    }

    /// Whether the post has no locale at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builder for single-locale posts.
///
/// # Example
///
/// ```rust
/// use larkbot::messages::{PostBuilder, PostTag};
///
/// let post = PostBuilder::new("en_us")
///     .title("Deploy")
///     .text_line("release 1.2 is out")
///     .line(vec![PostTag::text("notes: "), PostTag::link("here", "https://example.com")])
///     .build();
///
/// assert_eq!(post.locale("en_us").unwrap().content.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PostBuilder {
    locale: String,
    body: PostOfLocale,
}

impl PostBuilder {
    /// Create a builder for `locale`.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            body: PostOfLocale::default(),
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.body.title = title.into();
        self
    }

    /// Append a line of elements.
    pub fn line(mut self, line: PostLine) -> Self {
        self.body.content.push(line);
        self
    }

    /// Append a line holding a single text element.
    pub fn text_line(self, text: impl Into<String>) -> Self {
        self.line(vec![PostTag::text(text)])
    }

    /// Build the post.
    pub fn build(self) -> Post {
        let mut locales = BTreeMap::new();
        locales.insert(self.locale, self.body);
        Post(locales)
    }
}

/// Render users one per line as `name (open id)`.
pub fn format_users(users: &[UserInfo]) -> String {
    if users.is_empty() {
        return "no users".to_string();
    }

    users
        .iter()
        .map(|user| {
            let name = if user.name.is_empty() {
                &user.en_name
            } else {
                &user.name
            };
            format!("{} ({})", name, user.open_id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render chats one per line as `name (chat id)`.
pub fn format_chats(chats: &[ChatSummary]) -> String {
    if chats.is_empty() {
        return "no chats".to_string();
    }

    chats
        .iter()
        .map(|chat| format!("{} ({})", chat.name, chat.chat_id))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_post_serialization() {
        let post = PostBuilder::new("zh_cn")
            .title("hello")
            .line(vec![
                PostTag::text("hi "),
                PostTag::at("ou_1"),
                PostTag::link("docs", "https://example.com"),
            ])
            .build();

        assert_eq!(
            serde_json::to_value(&post).unwrap(),
            json!({
                "zh_cn": {
                    "title": "hello",
                    "content": [[
                        {"tag": "text", "text": "hi "},
                        {"tag": "at", "user_id": "ou_1"},
                        {"tag": "a", "text": "docs", "href": "https://example.com"}
                    ]]
                }
            })
        );
    }

    #[test]
    fn test_post_deserialization() {
        let post: Post = serde_json::from_value(json!({
            "en_us": {
                "title": "t",
                "content": [[
                    {"tag": "text", "text": "&lt;b&gt;", "un_escape": true},
                    {"tag": "img", "image_key": "img_1", "width": 300, "height": 200}
                ]]
            }
        }))
        .unwrap();

        let body = post.locale("en_us").unwrap();
        assert_eq!(
            body.content[0],
            vec![
                PostTag::Text {
                    text: "&lt;b&gt;".into(),
                    un_escape: true
                },
                PostTag::Img {
                    image_key: "img_1".into(),
                    width: 300,
                    height: 200
                },
            ]
        );
        assert!(post.locale("zh_cn").is_none());
        assert!(Post::default().is_empty());
    }

    #[test]
    fn test_format_users() {
        let users = vec![
            UserInfo {
                open_id: "ou_1".into(),
                name: "Alice".into(),
                ..Default::default()
            },
            UserInfo {
                open_id: "ou_2".into(),
                en_name: "Bob".into(),
                ..Default::default()
            },
        ];

        assert_eq!(format_users(&users), "Alice (ou_1)\nBob (ou_2)");
        assert_eq!(format_users(&[]), "no users");
    }

    #[test]
    fn test_format_chats() {
        let chats = vec![ChatSummary {
            chat_id: "oc_1".into(),
            name: "ops".into(),
            ..Default::default()
        }];

        assert_eq!(format_chats(&chats), "ops (oc_1)");
        assert_eq!(format_chats(&[]), "no chats");
    }
}
