use chirpstat_common::model::{
    Id,
    favorite::{FavoritesByUserQuery, FavoritesByUsernameQuery, NewFavorite, SortDirection, SortField},
    network::Network,
    post::PostMarker,
    user::{UserHandle, UserMarker},
};
use chirpstat_db::{
    client::{DbClient, DbError},
    favorites::FavoritePostCursor,
};
use clap::{Args, Parser, Subcommand};
use futures::TryStreamExt;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufReader, Read, Write},
    num::NonZeroU32,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

/// Maintenance tool for the favorites store.
///
/// Connection settings come from the environment (`DATABASE_URL`,
/// `DATABASE_MAX_CONNECTIONS`, `GMT_OFFSET_HOURS`) or a `.env` file.
/// Results are printed as JSON, one object per line.
#[derive(Parser, Debug)]
#[command(name = "chirpstat-admin")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Record a favorite described by a JSON file (`-` reads stdin).
    Favorite {
        #[arg(long)]
        file: PathBuf,
    },
    /// Remove a favorite.
    Unfavorite {
        #[arg(long)]
        post: Id<PostMarker>,
        #[arg(long)]
        user: Id<UserMarker>,
        #[arg(long, default_value_t = Network::twitter())]
        network: Network,
    },
    /// List the posts an account favorited.
    Favorites(FavoritesArgs),
    /// Rank an author's posts by how often others favorited them.
    Favorited {
        #[arg(long)]
        author: Id<UserMarker>,
        #[arg(long, default_value_t = Network::twitter())]
        network: Network,
        #[arg(long, default_value_t = 20)]
        count: u32,
        #[arg(long, default_value_t = NonZeroU32::MIN)]
        page: NonZeroU32,
    },
    /// List the accounts that favorited a post.
    Favoriters {
        #[arg(long)]
        post: Id<PostMarker>,
        #[arg(long, default_value_t = Network::twitter())]
        network: Network,
        /// Skip protected posts.
        #[arg(long)]
        public_only: bool,
    },
}

#[derive(Args, Debug)]
pub struct FavoritesArgs {
    #[arg(long, required_unless_present = "username", conflicts_with = "username")]
    user_id: Option<Id<UserMarker>>,
    #[arg(long)]
    username: Option<UserHandle>,
    #[arg(long, default_value_t = Network::twitter())]
    network: Network,
    /// Rows per page, 0 for all.
    #[arg(long, default_value_t = 0)]
    count: u32,
    /// Post column to sort by; unknown columns sort by `pub_date`.
    #[arg(long, default_value_t = SortField::PubDate)]
    sort: SortField,
    /// `DESC` or anything else for ascending. Ignored with `--username`.
    #[arg(long, default_value = "DESC")]
    direction: SortDirection,
    #[arg(long, default_value_t = NonZeroU32::MIN)]
    page: NonZeroU32,
    /// Only posts with a smaller id.
    #[arg(long)]
    older_than: Option<Id<PostMarker>>,
    /// Only posts published in the last N days. Requires `--username`.
    #[arg(long, requires = "username", conflicts_with = "user_id")]
    days: Option<NonZeroU32>,
    /// Stream rows as they arrive instead of loading the whole list.
    #[arg(long)]
    stream: bool,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid favorite JSON: {0}")]
    InvalidInput(serde_json::Error),
    #[error("Writing output failed: {0}")]
    Output(#[from] std::io::Error),
    #[error("Serializing output failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Either --user-id or --username is required")]
    MissingAccount,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct RowsAffected {
    rows: u64,
}

pub async fn run(db: &DbClient, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Migrate => db.migrate().await?,
        Command::Favorite { file } => {
            let favorite = read_favorite(&file)?;
            let rows = db.add_favorite(&favorite).await?;
            print_row(&RowsAffected { rows })?;
        }
        Command::Unfavorite {
            post,
            user,
            network,
        } => {
            let rows = db.remove_favorite(post, user, &network).await?;
            print_row(&RowsAffected { rows })?;
        }
        Command::Favorites(args) => list_favorites(db, args).await?,
        Command::Favorited {
            author,
            network,
            count,
            page,
        } => {
            let posts = db
                .fetch_posts_favorited_by_author(author, &network, count, page)
                .await?;
            print_rows(&posts)?;
        }
        Command::Favoriters {
            post,
            network,
            public_only,
        } => {
            let users = db.fetch_favoriters(post, &network, public_only).await?;
            print_rows(&users)?;
        }
    }

    Ok(())
}

async fn list_favorites(db: &DbClient, args: FavoritesArgs) -> Result<(), CommandError> {
    if let Some(username) = args.username {
        let mut favorites = FavoritesByUsernameQuery::new(username, args.network);
        favorites.count = args.count;
        favorites.sort = args.sort;
        favorites.in_last_days = args.days;

        if args.stream {
            return stream_posts(db.favorite_posts_by_username_cursor_with(favorites)).await;
        }
        return print_rows(&db.fetch_favorite_posts_by_username_with(&favorites).await?);
    }

    let owner = args.user_id.ok_or(CommandError::MissingAccount)?;
    let mut favorites = FavoritesByUserQuery::new(owner, args.network);
    favorites.count = args.count;
    favorites.sort = args.sort;
    favorites.direction = args.direction;
    favorites.page = args.page;
    favorites.older_than = args.older_than;

    if args.stream {
        return stream_posts(db.favorite_posts_cursor_with(favorites)).await;
    }
    print_rows(&db.fetch_favorite_posts_with(&favorites).await?)
}

async fn stream_posts(mut cursor: FavoritePostCursor) -> Result<(), CommandError> {
    let mut posts = cursor.posts();
    let mut streamed = 0_usize;
    while let Some(post) = posts.try_next().await? {
        print_row(&post)?;
        streamed += 1;
    }

    info!(streamed, "Finished streaming favorites");
    Ok(())
}

fn read_favorite(path: &Path) -> Result<NewFavorite, CommandError> {
    let read_error = |source| CommandError::Read {
        path: path.to_owned(),
        source,
    };

    let mut json = Vec::new();
    if path == Path::new("-") {
        std::io::stdin().read_to_end(&mut json).map_err(read_error)?;
    } else {
        let file = File::open(path).map_err(read_error)?;
        BufReader::new(file)
            .read_to_end(&mut json)
            .map_err(read_error)?;
    }

    serde_json::from_slice(&json).map_err(CommandError::InvalidInput)
}

fn print_row<T: Serialize>(row: &T) -> Result<(), CommandError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, row)?;
    writeln!(stdout)?;
    Ok(())
}

fn print_rows<T: Serialize>(rows: &[T]) -> Result<(), CommandError> {
    rows.iter().try_for_each(print_row)
}
