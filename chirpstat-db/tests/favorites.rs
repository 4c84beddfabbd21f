//! Repository tests against a scratch PostgreSQL database per test.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use chirpstat_common::model::{
    Id,
    favorite::{FavoritesByUserQuery, FavoritesByUsernameQuery, NewFavorite, SortField},
    link::Link,
    network::Network,
    post::{NewPost, PostAuthor},
    user::{NewUser, UserHandle},
};
use chirpstat_db::client::{DbClient, DbError, DbSettings};
use futures::TryStreamExt;
use sqlx::PgPool;
use std::num::NonZeroU32;
use time::{Duration, OffsetDateTime, macros::datetime};

const AUTHOR: u64 = 13;
const FAVORITER: u64 = 930_061;

fn client(pool: PgPool) -> DbClient {
    DbClient::new(pool, DbSettings::default())
}

fn published(day: u8) -> OffsetDateTime {
    datetime!(2011-02-01 10:00 UTC) + Duration::days(i64::from(day))
}

fn favorite(post_id: u64, favoriter: u64, text: &str, published_at: OffsetDateTime) -> NewFavorite {
    NewFavorite {
        favoriter_id: Some(Id::new(favoriter)),
        post: NewPost {
            id: Id::new(post_id),
            network: Network::twitter(),
            author: PostAuthor {
                id: Id::new(AUTHOR),
                handle: UserHandle::new("ev".to_owned()).unwrap(),
                full_name: "Ev Williams".to_owned(),
                avatar: None,
            },
            text: text.to_owned(),
            published_at,
            is_protected: false,
            source: Some("web".to_owned()),
            location: None,
            in_reply_to_post_id: None,
            in_reply_to_user_id: None,
            in_retweet_of_post_id: None,
            reply_count: 0,
            retweet_count: 0,
            favlike_count: 0,
        },
        author: None,
        links: Vec::new(),
    }
}

async fn insert_user(pool: &PgPool, user_id: u64, user_name: &str) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO users (user_id, user_name, network) VALUES ($1, $2, 'twitter')")
        .bind(user_id.cast_signed())
        .bind(user_name)
        .execute(pool)
        .await?;
    Ok(())
}

async fn favorite_rows(pool: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT count(*) FROM favorites")
        .fetch_one(pool)
        .await
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn adding_twice_keeps_one_row(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool.clone());
    let new_favorite = favorite(100, FAVORITER, "first", published(0));

    assert_eq!(db.add_favorite(&new_favorite).await?, 1);
    assert_eq!(db.add_favorite(&new_favorite).await?, 0);
    assert_eq!(favorite_rows(&pool).await?, 1);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn missing_favoriter_is_rejected(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool.clone());

    let mut new_favorite = favorite(100, FAVORITER, "first", published(0));
    new_favorite.favoriter_id = None;
    assert!(matches!(
        db.add_favorite(&new_favorite).await,
        Err(DbError::MissingFavoriter)
    ));

    new_favorite.favoriter_id = Some(Id::new(0));
    assert!(matches!(
        db.add_favorite(&new_favorite).await,
        Err(DbError::MissingFavoriter)
    ));

    let posts: i64 = sqlx::query_scalar("SELECT count(*) FROM posts")
        .fetch_one(&pool)
        .await?;
    assert_eq!(posts, 0);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn remove_missing_favorite_affects_nothing(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool.clone());
    let network = Network::twitter();

    assert_eq!(
        db.remove_favorite(Id::new(100), Id::new(FAVORITER), &network)
            .await?,
        0
    );

    db.add_favorite(&favorite(100, FAVORITER, "first", published(0)))
        .await?;
    assert_eq!(
        db.remove_favorite(Id::new(100), Id::new(FAVORITER), &network)
            .await?,
        1
    );
    assert_eq!(favorite_rows(&pool).await?, 0);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn post_author_and_links_are_stored(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool.clone());

    let mut new_favorite = favorite(100, FAVORITER, "read this", published(0));
    new_favorite.author = Some(NewUser {
        id: Id::new(AUTHOR),
        handle: UserHandle::new("ev".to_owned()).unwrap(),
        full_name: "Ev Williams".to_owned(),
        avatar: None,
        follower_count: 1_000,
        is_protected: false,
    });
    new_favorite.links = vec![Link {
        url: "http://t.co/abc".to_owned(),
        expanded_url: Some("http://example.com/".to_owned()),
        title: None,
        image_src: None,
    }];
    db.add_favorite(&new_favorite).await?;

    let posts = db
        .fetch_favorite_posts(Id::new(FAVORITER), Network::twitter(), 10, NonZeroU32::MIN)
        .await?;
    assert_eq!(posts.len(), 1);
    let link = posts[0].link.as_ref().unwrap();
    assert_eq!(link.expanded_url.as_deref(), Some("http://example.com/"));

    let authors: i64 = sqlx::query_scalar("SELECT follower_count FROM users WHERE user_id = $1")
        .bind(AUTHOR.cast_signed())
        .fetch_one(&pool)
        .await?;
    assert_eq!(authors, 1_000);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn cursor_returns_strictly_older_posts(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool);
    for (day, post_id) in (100..106).enumerate() {
        let day = u8::try_from(day).unwrap();
        db.add_favorite(&favorite(post_id, FAVORITER, "post", published(day)))
            .await?;
    }

    let posts = db
        .fetch_favorite_posts_older_than(Id::new(FAVORITER), Network::twitter(), 0, Id::new(103))
        .await?;
    let ids: Vec<u64> = posts.iter().map(|post| post.id.get()).collect();
    assert_eq!(ids, [102, 101, 100]);

    let posts = db
        .fetch_favorite_posts_older_than(Id::new(FAVORITER), Network::twitter(), 2, Id::new(103))
        .await?;
    let ids: Vec<u64> = posts.iter().map(|post| post.id.get()).collect();
    assert_eq!(ids, [102, 101]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn pages_and_unknown_sort(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool);
    for (day, post_id) in (100..105).enumerate() {
        let day = u8::try_from(day).unwrap();
        db.add_favorite(&favorite(post_id, FAVORITER, "post", published(day)))
            .await?;
    }

    let second_page = db
        .fetch_favorite_posts(
            Id::new(FAVORITER),
            Network::twitter(),
            2,
            NonZeroU32::new(2).unwrap(),
        )
        .await?;
    let ids: Vec<u64> = second_page.iter().map(|post| post.id.get()).collect();
    assert_eq!(ids, [102, 101]);

    let mut unknown = FavoritesByUserQuery::new(Id::new(FAVORITER), Network::twitter());
    unknown.sort = "favd_count".parse().unwrap();
    let defaulted = FavoritesByUserQuery::new(Id::new(FAVORITER), Network::twitter());
    assert_eq!(
        db.fetch_favorite_posts_with(&unknown).await?,
        db.fetch_favorite_posts_with(&defaulted).await?
    );

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn lazy_cursor_matches_list(pool: PgPool) -> Result<(), DbError> {
    let db = DbClient::new(
        pool,
        DbSettings {
            gmt_offset_hours: 5,
        },
    );
    for (day, post_id) in (100..104).enumerate() {
        let day = u8::try_from(day).unwrap();
        db.add_favorite(&favorite(post_id, FAVORITER, "post", published(day)))
            .await?;
    }

    let listed = db
        .fetch_favorite_posts(Id::new(FAVORITER), Network::twitter(), 3, NonZeroU32::MIN)
        .await?;

    let mut cursor = db.favorite_posts_cursor(Id::new(FAVORITER), Network::twitter(), 3);
    let streamed: Vec<_> = cursor.posts().try_collect().await?;
    assert_eq!(streamed, listed);

    let streamed_again: Vec<_> = cursor.posts().try_collect().await?;
    assert_eq!(streamed_again, listed);

    let newest = &listed[0];
    assert_eq!(
        newest.adjusted_published_at,
        {
            let shifted = newest.published_at - Duration::hours(5);
            time::PrimitiveDateTime::new(shifted.date(), shifted.time())
        }
    );

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn favorites_by_username(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool.clone());
    insert_user(&pool, FAVORITER, "ginatrapani").await?;

    let mut popular = favorite(100, FAVORITER, "popular", published(0));
    popular.post.retweet_count = 10;
    db.add_favorite(&popular).await?;
    db.add_favorite(&favorite(101, FAVORITER, "quiet", published(1)))
        .await?;
    db.add_favorite(&favorite(102, 42, "someone else's", published(2)))
        .await?;

    let handle = UserHandle::new("ginatrapani".to_owned()).unwrap();
    let posts = db
        .fetch_favorite_posts_by_username(handle.clone(), Network::twitter(), 0)
        .await?;
    let ids: Vec<u64> = posts.iter().map(|post| post.id.get()).collect();
    assert_eq!(ids, [101, 100]);

    let mut by_retweets = FavoritesByUsernameQuery::new(handle.clone(), Network::twitter());
    by_retweets.sort = SortField::RetweetCountCache;
    let posts = db.fetch_favorite_posts_by_username_with(&by_retweets).await?;
    let ids: Vec<u64> = posts.iter().map(|post| post.id.get()).collect();
    assert_eq!(ids, [100]);

    let mut cursor = db.favorite_posts_by_username_cursor(handle, Network::twitter(), 1);
    let streamed: Vec<_> = cursor.posts().try_collect().await?;
    assert_eq!(streamed.len(), 1);
    assert_eq!(streamed[0].id.get(), 101);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn author_ranking_counts_favorites(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool);

    for favoriter in [1, 2, 3] {
        db.add_favorite(&favorite(100, favoriter, "loved", published(0)))
            .await?;
    }
    db.add_favorite(&favorite(101, 1, "liked", published(1)))
        .await?;
    // same text posted again is collapsed into one row
    db.add_favorite(&favorite(102, 2, "liked", published(1)))
        .await?;

    let ranked = db
        .fetch_posts_favorited_by_author(Id::new(AUTHOR), &Network::twitter(), 10, NonZeroU32::MIN)
        .await?;

    let summary: Vec<(&str, u64)> = ranked
        .iter()
        .map(|favorited| (favorited.post.text.as_str(), favorited.favorite_count))
        .collect();
    assert_eq!(summary, [("loved", 3), ("liked", 2)]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn post_with_two_links_is_listed_once(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool);

    for favoriter in [1, 2, 3] {
        let mut new_favorite = favorite(100, favoriter, "two links", published(0));
        new_favorite.links = ["http://a", "http://b"]
            .into_iter()
            .map(|url| Link {
                url: url.to_owned(),
                expanded_url: None,
                title: None,
                image_src: None,
            })
            .collect();
        db.add_favorite(&new_favorite).await?;
    }

    let posts = db
        .fetch_favorite_posts(Id::new(1), Network::twitter(), 10, NonZeroU32::MIN)
        .await?;
    let ids: Vec<u64> = posts.iter().map(|post| post.id.get()).collect();
    assert_eq!(ids, [100]);
    assert_eq!(posts[0].link.as_ref().map(|link| link.url.as_str()), Some("http://a"));

    let ranked = db
        .fetch_posts_favorited_by_author(Id::new(AUTHOR), &Network::twitter(), 10, NonZeroU32::MIN)
        .await?;
    let summary: Vec<(&str, u64)> = ranked
        .iter()
        .map(|favorited| (favorited.post.text.as_str(), favorited.favorite_count))
        .collect();
    assert_eq!(summary, [("two links", 3)]);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn favoriters_newest_first(pool: PgPool) -> Result<(), DbError> {
    let db = client(pool.clone());
    insert_user(&pool, 1, "first").await?;
    insert_user(&pool, 2, "second").await?;

    let mut protected = favorite(100, 1, "secret", published(0));
    protected.post.is_protected = true;
    db.add_favorite(&protected).await?;
    db.add_favorite(&favorite(100, 2, "secret", published(0)))
        .await?;
    sqlx::query("UPDATE favorites SET fav_timestamp = fav_timestamp - interval '1 hour' WHERE fav_of_user_id = 1")
        .execute(&pool)
        .await?;

    let network = Network::twitter();
    let users = db.fetch_favoriters(Id::new(100), &network, false).await?;
    let handles: Vec<&str> = users.iter().map(|user| user.handle.get()).collect();
    assert_eq!(handles, ["second", "first"]);

    assert!(db.fetch_favoriters(Id::new(100), &network, true).await?.is_empty());

    Ok(())
}
