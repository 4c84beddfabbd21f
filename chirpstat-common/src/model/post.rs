use crate::model::{
    Id,
    link::Link,
    network::Network,
    user::{UserHandle, UserMarker},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub network: Network,
    pub author: PostAuthor,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    /// `published_at` shifted by the configured GMT offset, as local wall-clock time.
    pub adjusted_published_at: PrimitiveDateTime,
    pub is_protected: bool,
    pub source: Option<String>,
    pub location: Option<String>,
    pub in_reply_to_post_id: Option<Id<PostMarker>>,
    pub in_reply_to_user_id: Option<Id<UserMarker>>,
    pub in_retweet_of_post_id: Option<Id<PostMarker>>,
    pub reply_count: u32,
    pub retweet_count: u32,
    pub favlike_count: u32,
    pub link: Option<Link>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostAuthor {
    pub id: Id<UserMarker>,
    pub handle: UserHandle,
    pub full_name: String,
    pub avatar: Option<String>,
}

/// A post together with how many times it was favorited.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct FavoritedPost {
    #[serde(flatten)]
    pub post: Post,
    pub favorite_count: u64,
}

/// Post as delivered by the crawler, inserted only if not yet stored.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NewPost {
    pub id: Id<PostMarker>,
    #[serde(default)]
    pub network: Network,
    pub author: PostAuthor,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub in_reply_to_post_id: Option<Id<PostMarker>>,
    #[serde(default)]
    pub in_reply_to_user_id: Option<Id<UserMarker>>,
    #[serde(default)]
    pub in_retweet_of_post_id: Option<Id<PostMarker>>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub retweet_count: u32,
    #[serde(default)]
    pub favlike_count: u32,
}
