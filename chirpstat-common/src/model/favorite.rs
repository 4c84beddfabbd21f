use crate::model::{
    Id,
    link::Link,
    network::Network,
    post::{NewPost, PostMarker},
    user::{NewUser, UserHandle, UserMarker},
};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt::Display, num::NonZeroU32, str::FromStr};

/// Everything needed to record that `favoriter_id` favorited `post`.
///
/// The author and links are optional extras the crawler may have collected
/// alongside the post; they are stored if not already present.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NewFavorite {
    #[serde(default)]
    pub favoriter_id: Option<Id<UserMarker>>,
    pub post: NewPost,
    #[serde(default)]
    pub author: Option<NewUser>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl NewFavorite {
    /// The favoriter id, unless it is missing or zero.
    #[must_use]
    pub fn favoriter(&self) -> Option<Id<UserMarker>> {
        self.favoriter_id.filter(|id| !id.is_unset())
    }
}

/// Post columns a favorites listing may be ordered by.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub enum SortField {
    PostId,
    AuthorUserId,
    AuthorUsername,
    AuthorFullname,
    PostText,
    #[default]
    PubDate,
    Network,
    IsProtected,
    Source,
    Location,
    InReplyToPostId,
    InReplyToUserId,
    InRetweetOfPostId,
    ReplyCountCache,
    RetweetCountCache,
    FavlikeCountCache,
}

impl SortField {
    pub const ALL: [SortField; 16] = [
        SortField::PostId,
        SortField::AuthorUserId,
        SortField::AuthorUsername,
        SortField::AuthorFullname,
        SortField::PostText,
        SortField::PubDate,
        SortField::Network,
        SortField::IsProtected,
        SortField::Source,
        SortField::Location,
        SortField::InReplyToPostId,
        SortField::InReplyToUserId,
        SortField::InRetweetOfPostId,
        SortField::ReplyCountCache,
        SortField::RetweetCountCache,
        SortField::FavlikeCountCache,
    ];

    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            SortField::PostId => "post_id",
            SortField::AuthorUserId => "author_user_id",
            SortField::AuthorUsername => "author_username",
            SortField::AuthorFullname => "author_fullname",
            SortField::PostText => "post_text",
            SortField::PubDate => "pub_date",
            SortField::Network => "network",
            SortField::IsProtected => "is_protected",
            SortField::Source => "source",
            SortField::Location => "location",
            SortField::InReplyToPostId => "in_reply_to_post_id",
            SortField::InReplyToUserId => "in_reply_to_user_id",
            SortField::InRetweetOfPostId => "in_retweet_of_post_id",
            SortField::ReplyCountCache => "reply_count_cache",
            SortField::RetweetCountCache => "retweet_count_cache",
            SortField::FavlikeCountCache => "favlike_count_cache",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == name)
    }

    /// Like [`SortField::parse`], but unknown names fall back to `pub_date`.
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    /// Counter columns only make sense to sort by among posts that have a nonzero count.
    #[must_use]
    pub fn requires_positive_count(self) -> bool {
        matches!(self, SortField::ReplyCountCache | SortField::RetweetCountCache)
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name_or_default(s))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Infallible;

    /// Anything but `DESC` sorts ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Descending)
        } else {
            Ok(SortDirection::Ascending)
        }
    }
}

/// Favorites of one account looked up by user id.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct FavoritesByUserQuery {
    pub owner: Id<UserMarker>,
    pub network: Network,
    /// Page size; zero returns every row.
    pub count: u32,
    pub sort: SortField,
    pub direction: SortDirection,
    /// Only posts with an id strictly below this one.
    pub older_than: Option<Id<PostMarker>>,
    pub page: NonZeroU32,
}

impl FavoritesByUserQuery {
    #[must_use]
    pub fn new(owner: Id<UserMarker>, network: Network) -> Self {
        Self {
            owner,
            network,
            count: 0,
            sort: SortField::PubDate,
            direction: SortDirection::Descending,
            older_than: None,
            page: NonZeroU32::MIN,
        }
    }

    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        (self.count > 0).then_some(self.count)
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.count)
    }

    #[must_use]
    pub fn cursor(&self) -> Option<Id<PostMarker>> {
        self.older_than.filter(|id| !id.is_unset())
    }
}

/// Favorites of one account looked up by username, newest first by default.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct FavoritesByUsernameQuery {
    pub username: UserHandle,
    pub network: Network,
    /// Row limit; zero returns every row.
    pub count: u32,
    pub sort: SortField,
    pub in_last_days: Option<NonZeroU32>,
}

impl FavoritesByUsernameQuery {
    #[must_use]
    pub fn new(username: UserHandle, network: Network) -> Self {
        Self {
            username,
            network,
            count: 0,
            sort: SortField::PubDate,
            in_last_days: None,
        }
    }

    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        (self.count > 0).then_some(self.count)
    }
}
