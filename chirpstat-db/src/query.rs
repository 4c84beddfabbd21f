//! SQL assembly for the favorites repository.
//!
//! Caller values always go through `push_bind`. The only text spliced into a
//! statement are column names from [`SortField`] and the keywords of
//! [`SortDirection`].

use chirpstat_common::model::{
    Id,
    favorite::{FavoritesByUserQuery, FavoritesByUsernameQuery, SortDirection, SortField},
    link::Link,
    network::Network,
    post::{NewPost, PostMarker},
    user::{NewUser, UserMarker},
};
use sqlx::{Postgres, QueryBuilder};
use std::num::NonZeroU32;

pub(crate) type Statement = QueryBuilder<'static, Postgres>;

const POST_COLUMNS: &str = "p.post_id, p.network, p.author_user_id, p.author_username, \
    p.author_fullname, p.author_avatar, p.post_text, p.pub_date, p.is_protected, p.source, \
    p.location, p.in_reply_to_post_id, p.in_reply_to_user_id, p.in_retweet_of_post_id, \
    p.reply_count_cache, p.retweet_count_cache, p.favlike_count_cache, \
    l.url AS link_url, l.expanded_url AS link_expanded_url, l.title AS link_title, \
    l.image_src AS link_image_src";

const FAVORITED_POSTS: &str = " FROM posts p \
    INNER JOIN favorites f ON f.post_id = p.post_id AND f.network = p.network \
    LEFT JOIN LATERAL (SELECT url, expanded_url, title, image_src FROM links \
        WHERE links.post_id = p.post_id AND links.network = p.network \
        ORDER BY links.id LIMIT 1) l ON TRUE";

const USER_COLUMNS: &str =
    "u.user_id, u.user_name, u.full_name, u.avatar, u.follower_count, u.is_protected, u.network";

fn push_post_columns(statement: &mut Statement, gmt_offset_hours: i32) {
    statement.push(POST_COLUMNS);
    statement.push(", (p.pub_date AT TIME ZONE 'UTC') - make_interval(hours => ");
    statement.push_bind(gmt_offset_hours);
    statement.push(") AS adj_pub_date");
}

fn push_counter_filter(statement: &mut Statement, sort: SortField) {
    if sort.requires_positive_count() {
        statement.push(format!(" AND p.{} > 0", sort.column()));
    }
}

fn push_order(statement: &mut Statement, sort: SortField, direction: SortDirection) {
    let direction = direction.keyword();
    statement.push(format!(" ORDER BY p.{} {direction}", sort.column()));
    // tie-break so pages never overlap
    if sort != SortField::PostId {
        statement.push(format!(", p.post_id {direction}"));
    }
}

fn push_limit(statement: &mut Statement, limit: Option<u32>, offset: u64) {
    let Some(limit) = limit else {
        return;
    };

    statement.push(" LIMIT ");
    statement.push_bind(i64::from(limit));
    if offset > 0 {
        statement.push(" OFFSET ");
        statement.push_bind(offset.cast_signed());
    }
}

pub(crate) fn favorites_by_user(query: &FavoritesByUserQuery, gmt_offset_hours: i32) -> Statement {
    let mut statement = Statement::new("SELECT ");
    push_post_columns(&mut statement, gmt_offset_hours);
    statement.push(FAVORITED_POSTS);

    statement.push(" WHERE f.fav_of_user_id = ");
    statement.push_bind(query.owner.get().cast_signed());
    statement.push(" AND p.network = ");
    statement.push_bind(query.network.get().to_owned());

    push_counter_filter(&mut statement, query.sort);
    if let Some(cursor) = query.cursor() {
        statement.push(" AND p.post_id < ");
        statement.push_bind(cursor.get().cast_signed());
    }

    push_order(&mut statement, query.sort, query.direction);
    push_limit(&mut statement, query.limit(), query.offset());
    statement
}

pub(crate) fn favorites_by_username(
    query: &FavoritesByUsernameQuery,
    gmt_offset_hours: i32,
) -> Statement {
    let mut statement = Statement::new("SELECT ");
    push_post_columns(&mut statement, gmt_offset_hours);
    statement.push(FAVORITED_POSTS);
    statement.push(" INNER JOIN users u ON u.user_id = f.fav_of_user_id AND u.network = f.network");

    statement.push(" WHERE u.user_name = ");
    statement.push_bind(query.username.get().to_owned());
    statement.push(" AND p.network = ");
    statement.push_bind(query.network.get().to_owned());

    if let Some(days) = query.in_last_days {
        statement.push(" AND p.pub_date >= CURRENT_DATE - make_interval(days => ");
        statement.push_bind(days.get().cast_signed());
        statement.push(")");
    }
    push_counter_filter(&mut statement, query.sort);

    push_order(&mut statement, query.sort, SortDirection::Descending);
    push_limit(&mut statement, query.limit(), 0);
    statement
}

/// One row per distinct post text, newest week first, then most favorited.
pub(crate) fn posts_favorited_by_author(
    author: Id<UserMarker>,
    network: &Network,
    count: u32,
    page: NonZeroU32,
    gmt_offset_hours: i32,
) -> Statement {
    let mut statement = Statement::new("SELECT * FROM (SELECT DISTINCT ON (p.post_text) ");
    push_post_columns(&mut statement, gmt_offset_hours);
    statement.push(", count(*) OVER (PARTITION BY p.post_text) AS favd_count");
    statement.push(FAVORITED_POSTS);

    statement.push(" WHERE p.author_user_id = ");
    statement.push_bind(author.get().cast_signed());
    statement.push(" AND p.network = ");
    statement.push_bind(network.get().to_owned());
    statement.push(" ORDER BY p.post_text, p.pub_date DESC) favorited");

    statement.push(
        " ORDER BY date_trunc('week', favorited.pub_date) DESC, \
        favorited.favd_count DESC, favorited.pub_date DESC, favorited.post_id DESC",
    );
    let offset = u64::from(page.get() - 1) * u64::from(count);
    push_limit(&mut statement, (count > 0).then_some(count), offset);
    statement
}

pub(crate) fn favoriters_of_post(
    post_id: Id<PostMarker>,
    network: &Network,
    public_only: bool,
) -> Statement {
    let mut statement = Statement::new(format!("SELECT {USER_COLUMNS}"));
    statement.push(
        " FROM posts p \
        INNER JOIN favorites f ON f.post_id = p.post_id AND f.network = p.network \
        INNER JOIN users u ON u.user_id = f.fav_of_user_id AND u.network = f.network",
    );

    statement.push(" WHERE p.network = ");
    statement.push_bind(network.get().to_owned());
    statement.push(" AND f.post_id = ");
    statement.push_bind(post_id.get().cast_signed());
    if public_only {
        statement.push(" AND NOT p.is_protected");
    }

    statement.push(" ORDER BY f.fav_timestamp DESC");
    statement
}

pub(crate) fn insert_post(post: &NewPost) -> Statement {
    let mut statement = Statement::new(
        "INSERT INTO posts (post_id, network, author_user_id, author_username, \
        author_fullname, author_avatar, post_text, pub_date, is_protected, source, location, \
        in_reply_to_post_id, in_reply_to_user_id, in_retweet_of_post_id, reply_count_cache, \
        retweet_count_cache, favlike_count_cache) VALUES (",
    );

    let mut values = statement.separated(", ");
    values.push_bind(post.id.get().cast_signed());
    values.push_bind(post.network.get().to_owned());
    values.push_bind(post.author.id.get().cast_signed());
    values.push_bind(post.author.handle.get().to_owned());
    values.push_bind(post.author.full_name.clone());
    values.push_bind(post.author.avatar.clone());
    values.push_bind(post.text.clone());
    values.push_bind(post.published_at);
    values.push_bind(post.is_protected);
    values.push_bind(post.source.clone());
    values.push_bind(post.location.clone());
    values.push_bind(post.in_reply_to_post_id.map(|id| id.get().cast_signed()));
    values.push_bind(post.in_reply_to_user_id.map(|id| id.get().cast_signed()));
    values.push_bind(post.in_retweet_of_post_id.map(|id| id.get().cast_signed()));
    values.push_bind(post.reply_count.cast_signed());
    values.push_bind(post.retweet_count.cast_signed());
    values.push_bind(post.favlike_count.cast_signed());
    values.push_unseparated(") ON CONFLICT (post_id, network) DO NOTHING");

    statement
}

pub(crate) fn upsert_user(user: &NewUser, network: &Network) -> Statement {
    let mut statement = Statement::new(
        "INSERT INTO users (user_id, user_name, full_name, avatar, follower_count, \
        is_protected, network) VALUES (",
    );

    let mut values = statement.separated(", ");
    values.push_bind(user.id.get().cast_signed());
    values.push_bind(user.handle.get().to_owned());
    values.push_bind(user.full_name.clone());
    values.push_bind(user.avatar.clone());
    values.push_bind(user.follower_count.cast_signed());
    values.push_bind(user.is_protected);
    values.push_bind(network.get().to_owned());
    values.push_unseparated(
        ") ON CONFLICT (user_id, network) DO UPDATE SET user_name = EXCLUDED.user_name, \
        full_name = EXCLUDED.full_name, avatar = EXCLUDED.avatar, \
        follower_count = EXCLUDED.follower_count, is_protected = EXCLUDED.is_protected",
    );

    statement
}

pub(crate) fn insert_link(post_id: Id<PostMarker>, network: &Network, link: &Link) -> Statement {
    let mut statement = Statement::new(
        "INSERT INTO links (post_id, network, url, expanded_url, title, image_src) VALUES (",
    );

    let mut values = statement.separated(", ");
    values.push_bind(post_id.get().cast_signed());
    values.push_bind(network.get().to_owned());
    values.push_bind(link.url.clone());
    values.push_bind(link.expanded_url.clone());
    values.push_bind(link.title.clone());
    values.push_bind(link.image_src.clone());
    values.push_unseparated(") ON CONFLICT (post_id, network, url) DO NOTHING");

    statement
}

pub(crate) fn insert_favorite(
    post_id: Id<PostMarker>,
    author_id: Id<UserMarker>,
    favoriter_id: Id<UserMarker>,
    network: &Network,
) -> Statement {
    let mut statement = Statement::new(
        "INSERT INTO favorites (post_id, author_user_id, fav_of_user_id, network) VALUES (",
    );

    let mut values = statement.separated(", ");
    values.push_bind(post_id.get().cast_signed());
    values.push_bind(author_id.get().cast_signed());
    values.push_bind(favoriter_id.get().cast_signed());
    values.push_bind(network.get().to_owned());
    values.push_unseparated(") ON CONFLICT (post_id, fav_of_user_id, network) DO NOTHING");

    statement
}

pub(crate) fn delete_favorite(
    post_id: Id<PostMarker>,
    user_id: Id<UserMarker>,
    network: &Network,
) -> Statement {
    let mut statement = Statement::new("DELETE FROM favorites WHERE post_id = ");
    statement.push_bind(post_id.get().cast_signed());
    statement.push(" AND fav_of_user_id = ");
    statement.push_bind(user_id.get().cast_signed());
    statement.push(" AND network = ");
    statement.push_bind(network.get().to_owned());
    statement
}
