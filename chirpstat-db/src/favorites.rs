use crate::{
    client::{DbClient, DbError, Result},
    query::{self, Statement},
    record::{FavoritedPostRecord, NetworkUserRecord, PostRecord},
};
use chirpstat_common::model::{
    Id,
    favorite::{FavoritesByUserQuery, FavoritesByUsernameQuery, NewFavorite, SortField},
    network::Network,
    post::{FavoritedPost, Post, PostMarker},
    user::{NetworkUser, UserHandle, UserMarker},
};
use futures::{StreamExt, stream::BoxStream};
use sqlx::PgPool;
use std::num::NonZeroU32;
use tracing::{debug, info};

impl DbClient {
    /// Records that the favoriter favorited `favorite.post`, storing the post first if needed.
    ///
    /// Returns the number of favorite rows inserted, which is zero when the
    /// favorite already existed.
    pub async fn add_favorite(&self, favorite: &NewFavorite) -> Result<u64> {
        let favoriter = favorite.favoriter().ok_or(DbError::MissingFavoriter)?;
        let post = &favorite.post;

        let mut tx = self.pool.begin().await?;

        let mut statement = query::insert_post(post);
        let new_post = statement.build().execute(&mut *tx).await?.rows_affected() > 0;

        if let Some(author) = &favorite.author {
            let mut statement = query::upsert_user(author, &post.network);
            statement.build().execute(&mut *tx).await?;
        }

        for link in &favorite.links {
            let mut statement = query::insert_link(post.id, &post.network, link);
            statement.build().execute(&mut *tx).await?;
        }

        let mut statement =
            query::insert_favorite(post.id, post.author.id, favoriter, &post.network);
        let inserted = statement.build().execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;

        info!(
            post_id = %post.id,
            network = %post.network,
            %favoriter,
            new_post,
            inserted,
            "Added favorite"
        );
        Ok(inserted)
    }

    pub async fn remove_favorite(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
        network: &Network,
    ) -> Result<u64> {
        let mut statement = query::delete_favorite(post_id, user_id, network);
        let removed = statement.build().execute(&self.pool).await?.rows_affected();

        info!(%post_id, %user_id, %network, removed, "Removed favorite");
        Ok(removed)
    }

    /// Favorites of `owner`, newest first, `count` per page.
    pub async fn fetch_favorite_posts(
        &self,
        owner: Id<UserMarker>,
        network: Network,
        count: u32,
        page: NonZeroU32,
    ) -> Result<Vec<Post>> {
        let mut favorites = FavoritesByUserQuery::new(owner, network);
        favorites.count = count;
        favorites.page = page;

        self.fetch_favorite_posts_with(&favorites).await
    }

    /// Favorites of `owner` with a post id strictly below `older_than`, newest first.
    pub async fn fetch_favorite_posts_older_than(
        &self,
        owner: Id<UserMarker>,
        network: Network,
        count: u32,
        older_than: Id<PostMarker>,
    ) -> Result<Vec<Post>> {
        let mut favorites = FavoritesByUserQuery::new(owner, network);
        favorites.count = count;
        favorites.older_than = Some(older_than);

        self.fetch_favorite_posts_with(&favorites).await
    }

    pub async fn fetch_favorite_posts_with(
        &self,
        favorites: &FavoritesByUserQuery,
    ) -> Result<Vec<Post>> {
        let mut statement = query::favorites_by_user(favorites, self.settings.gmt_offset_hours);
        let records = statement
            .build_query_as::<PostRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(
            owner = %favorites.owner,
            network = %favorites.network,
            sort = %favorites.sort,
            rows = records.len(),
            "Fetched favorite posts"
        );
        posts_from_records(records)
    }

    #[must_use]
    pub fn favorite_posts_cursor(
        &self,
        owner: Id<UserMarker>,
        network: Network,
        count: u32,
    ) -> FavoritePostCursor {
        let mut favorites = FavoritesByUserQuery::new(owner, network);
        favorites.count = count;

        self.favorite_posts_cursor_with(favorites)
    }

    #[must_use]
    pub fn favorite_posts_cursor_with(&self, favorites: FavoritesByUserQuery) -> FavoritePostCursor {
        FavoritePostCursor::new(self, CursorSource::ByUser(favorites))
    }

    /// Favorites of the account called `username`, newest first.
    pub async fn fetch_favorite_posts_by_username(
        &self,
        username: UserHandle,
        network: Network,
        count: u32,
    ) -> Result<Vec<Post>> {
        let mut favorites = FavoritesByUsernameQuery::new(username, network);
        favorites.count = count;
        favorites.sort = SortField::PubDate;

        self.fetch_favorite_posts_by_username_with(&favorites).await
    }

    pub async fn fetch_favorite_posts_by_username_with(
        &self,
        favorites: &FavoritesByUsernameQuery,
    ) -> Result<Vec<Post>> {
        let mut statement =
            query::favorites_by_username(favorites, self.settings.gmt_offset_hours);
        let records = statement
            .build_query_as::<PostRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(
            username = favorites.username.get(),
            network = %favorites.network,
            sort = %favorites.sort,
            rows = records.len(),
            "Fetched favorite posts by username"
        );
        posts_from_records(records)
    }

    #[must_use]
    pub fn favorite_posts_by_username_cursor(
        &self,
        username: UserHandle,
        network: Network,
        count: u32,
    ) -> FavoritePostCursor {
        let mut favorites = FavoritesByUsernameQuery::new(username, network);
        favorites.count = count;

        self.favorite_posts_by_username_cursor_with(favorites)
    }

    #[must_use]
    pub fn favorite_posts_by_username_cursor_with(
        &self,
        favorites: FavoritesByUsernameQuery,
    ) -> FavoritePostCursor {
        FavoritePostCursor::new(self, CursorSource::ByUsername(favorites))
    }

    /// Posts written by `author` that others favorited, with their favorite counts.
    ///
    /// Posts sharing the same text are collapsed into one row. Rows are ranked by
    /// publish week, then favorite count, then publish time, all descending.
    pub async fn fetch_posts_favorited_by_author(
        &self,
        author: Id<UserMarker>,
        network: &Network,
        count: u32,
        page: NonZeroU32,
    ) -> Result<Vec<FavoritedPost>> {
        let mut statement = query::posts_favorited_by_author(
            author,
            network,
            count,
            page,
            self.settings.gmt_offset_hours,
        );
        let records = statement
            .build_query_as::<FavoritedPostRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(%author, %network, rows = records.len(), "Fetched posts favorited by author");
        let posts = records
            .into_iter()
            .map(FavoritedPost::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    /// Accounts that favorited the post, most recent favorite first.
    pub async fn fetch_favoriters(
        &self,
        post_id: Id<PostMarker>,
        network: &Network,
        public_only: bool,
    ) -> Result<Vec<NetworkUser>> {
        let mut statement = query::favoriters_of_post(post_id, network, public_only);
        let records = statement
            .build_query_as::<NetworkUserRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(%post_id, %network, public_only, rows = records.len(), "Fetched favoriters");
        let users = records
            .into_iter()
            .map(NetworkUser::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }
}

fn posts_from_records(records: Vec<PostRecord>) -> Result<Vec<Post>> {
    let posts = records
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<_, _>>()?;
    Ok(posts)
}

#[derive(Clone, Debug)]
enum CursorSource {
    ByUser(FavoritesByUserQuery),
    ByUsername(FavoritesByUsernameQuery),
}

impl CursorSource {
    fn statement(&self, gmt_offset_hours: i32) -> Statement {
        match self {
            CursorSource::ByUser(favorites) => query::favorites_by_user(favorites, gmt_offset_hours),
            CursorSource::ByUsername(favorites) => {
                query::favorites_by_username(favorites, gmt_offset_hours)
            }
        }
    }
}

/// Lazily evaluated favorites listing.
///
/// Nothing is sent to the database until [`FavoritePostCursor::posts`] is
/// called; rows are then mapped to posts one at a time as they arrive.
pub struct FavoritePostCursor {
    pool: PgPool,
    gmt_offset_hours: i32,
    source: CursorSource,
    statement: Option<Statement>,
}

impl FavoritePostCursor {
    fn new(client: &DbClient, source: CursorSource) -> Self {
        Self {
            pool: client.pool.clone(),
            gmt_offset_hours: client.settings.gmt_offset_hours,
            source,
            statement: None,
        }
    }

    /// Runs the query and streams its rows. Every call runs the query again.
    pub fn posts(&mut self) -> BoxStream<'_, Result<Post>> {
        let statement = self
            .statement
            .insert(self.source.statement(self.gmt_offset_hours));

        debug!(source = ?self.source, "Streaming favorite posts");
        statement
            .build_query_as::<PostRecord>()
            .fetch(&self.pool)
            .map(|record| -> Result<Post> { Ok(Post::try_from(record?)?) })
            .boxed()
    }
}
