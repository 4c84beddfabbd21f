use chirpstat_common::model::{
    ModelValidationError,
    link::Link,
    network::Network,
    post::{FavoritedPost, Post, PostAuthor},
    user::{NetworkUser, UserHandle},
};
use sqlx::FromRow;
use time::{OffsetDateTime, PrimitiveDateTime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub network: String,
    pub author_user_id: i64,
    pub author_username: String,
    pub author_fullname: String,
    pub author_avatar: Option<String>,
    pub post_text: String,
    pub pub_date: OffsetDateTime,
    pub adj_pub_date: PrimitiveDateTime,
    pub is_protected: bool,
    pub source: Option<String>,
    pub location: Option<String>,
    pub in_reply_to_post_id: Option<i64>,
    pub in_reply_to_user_id: Option<i64>,
    pub in_retweet_of_post_id: Option<i64>,
    pub reply_count_cache: i32,
    pub retweet_count_cache: i32,
    pub favlike_count_cache: i32,
    pub link_url: Option<String>,
    pub link_expanded_url: Option<String>,
    pub link_title: Option<String>,
    pub link_image_src: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FavoritedPostRecord {
    #[sqlx(flatten)]
    pub post: PostRecord,
    pub favd_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct NetworkUserRecord {
    pub user_id: i64,
    pub user_name: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub follower_count: i64,
    pub is_protected: bool,
    pub network: String,
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let link = value.link_url.map(|url| Link {
            url,
            expanded_url: value.link_expanded_url,
            title: value.link_title,
            image_src: value.link_image_src,
        });

        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            network: Network::new(value.network)?,
            author: PostAuthor {
                id: value.author_user_id.cast_unsigned().into(),
                handle: UserHandle::new(value.author_username)?,
                full_name: value.author_fullname,
                avatar: value.author_avatar,
            },
            text: value.post_text,
            published_at: value.pub_date,
            adjusted_published_at: value.adj_pub_date,
            is_protected: value.is_protected,
            source: value.source,
            location: value.location,
            in_reply_to_post_id: value.in_reply_to_post_id.map(|id| id.cast_unsigned().into()),
            in_reply_to_user_id: value.in_reply_to_user_id.map(|id| id.cast_unsigned().into()),
            in_retweet_of_post_id: value
                .in_retweet_of_post_id
                .map(|id| id.cast_unsigned().into()),
            reply_count: value.reply_count_cache.try_into()?,
            retweet_count: value.retweet_count_cache.try_into()?,
            favlike_count: value.favlike_count_cache.try_into()?,
            link,
        })
    }
}

impl TryFrom<FavoritedPostRecord> for FavoritedPost {
    type Error = ModelValidationError;

    fn try_from(value: FavoritedPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            post: value.post.try_into()?,
            favorite_count: value.favd_count.try_into()?,
        })
    }
}

impl TryFrom<NetworkUserRecord> for NetworkUser {
    type Error = ModelValidationError;

    fn try_from(value: NetworkUserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            handle: UserHandle::new(value.user_name)?,
            full_name: value.full_name,
            avatar: value.avatar,
            follower_count: value.follower_count.try_into()?,
            is_protected: value.is_protected,
            network: Network::new(value.network)?,
        })
    }
}
