use cinetrack_config::{Config, PathManager};
use cinetrack_core::{ExploreCategory, ExploreTab};
use cinetrack_models::{MediaType, WatchStatus};
use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::context::{AlreadyReported, App};
use commands::{browse, clear, community, config, library, session};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinetrack")]
#[command(about = "CineTrack - Discover movies and shows, keep a watchlist, rate and share")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Keep watchlists, ratings and posts in a local file instead of the hosted store
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    offline: bool,

    /// Use DIR for config, credentials, data and logs
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what's trending this week
    #[command(long_about = "List the movies and shows trending across the metadata service this week. People are left out of the listing.")]
    Trending,

    /// Search movies and shows
    Search {
        /// Search text
        query: String,

        /// Results page
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Browse by tab, category and genre
    #[command(long_about = "Browse titles. The trending tab ignores category and genres; the movies and tv tabs list popular or top rated titles, or discover titles in all of the given genres.")]
    Explore {
        /// trending, movies or tv
        #[arg(long, default_value = "trending")]
        tab: ExploreTab,

        /// popular or top_rated
        #[arg(long, default_value = "popular")]
        category: ExploreCategory,

        /// Genre ids to filter by (comma separated)
        #[arg(long = "genre", value_delimiter = ',')]
        genres: Vec<u32>,

        /// Results page
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show details for a movie or show
    #[command(long_about = "Show details, cast, trailer and similar titles. When signed in, also shows whether the title is on your watchlist and your rating.")]
    Show {
        /// movie or tv
        media: MediaType,
        id: u64,
    },

    /// Show a person's profile and best-known work
    Person { id: u64 },

    /// Sign in with a verified identity
    #[command(long_about = "Complete sign-in for a verified email address. The user is created on first sign-in and a session token is stored in the credentials file.")]
    Signin {
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Avatar image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Forget the stored session
    Signout,

    /// Show the signed-in profile
    Whoami,

    /// Show any user's public profile
    #[command(long_about = "Show a user's public profile: watchlist counts, ratings and average score. User ids are in the user_id field of `cinetrack feed --output json`.")]
    Profile { user_id: String },

    /// Manage your watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: WatchlistCommands,
    },

    /// Rate a movie or show from 1 to 10
    Rate {
        media: MediaType,
        id: u64,
        /// Score from 1 to 10
        score: u8,

        /// Optional written review
        #[arg(long)]
        review: Option<String>,
    },

    /// List your ratings
    Ratings,

    /// Remove your rating
    Unrate { media: MediaType, id: u64 },

    /// Show the community feed
    Feed,

    /// Share a title with the community
    #[command(long_about = "Create a community post for a movie or show. Without a caption, a default one is used.")]
    Share {
        media: MediaType,
        id: u64,

        #[arg(long)]
        caption: Option<String>,
    },

    /// Like or unlike a post
    Like { post_id: String },

    /// Comment on a post
    Comment { post_id: String, text: String },

    /// Show the comments on a post
    Comments { post_id: String },

    /// Delete one of your posts
    DeletePost { post_id: String },

    /// Show configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },

    /// Clear local data
    #[command(long_about = "Clear local data. Use --offline-data to delete the offline store, --session to sign out, --credentials to delete the credentials file, or --all to clear everything.")]
    Clear {
        /// Clear offline data and credentials
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["offline_data", "credentials", "session"])]
        all: bool,

        /// Delete the offline store file
        #[arg(long, action = ArgAction::SetTrue)]
        offline_data: bool,

        /// Delete the credentials file (secrets and session)
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Forget the stored session only
        #[arg(long, action = ArgAction::SetTrue)]
        session: bool,
    },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    /// List watchlist entries, newest first
    List {
        /// Only entries with this status
        #[arg(long)]
        status: Option<WatchStatus>,
    },
    /// Add a title with status plan_to_watch
    Add { media: MediaType, id: u64 },
    /// Remove a title
    Remove { media: MediaType, id: u64 },
    /// Change a title's status (plan_to_watch, watching, completed)
    Status {
        media: MediaType,
        id: u64,
        status: WatchStatus,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
}

async fn run(command: Commands, paths: PathManager, config: Config, offline: bool, output: &output::Output) -> color_eyre::Result<()> {
    // These only touch local files
    match &command {
        Commands::Config { cmd: ConfigCommands::Show { full } } => {
            return config::run_config_show(&paths, &config, *full, output);
        }
        Commands::Clear { all, offline_data, credentials, session } => {
            return clear::run_clear(&paths, *all, *offline_data, *credentials, *session, output);
        }
        _ => {}
    }

    let mut app = App::new(paths, config, offline)?;
    match command {
        Commands::Trending => browse::run_trending(&app, output).await,
        Commands::Search { query, page } => browse::run_search(&app, &query, page, output).await,
        Commands::Explore { tab, category, genres, page } => {
            browse::run_explore(&app, tab, category, genres, page, output).await
        }
        Commands::Show { media, id } => browse::run_show(&app, media, id, output).await,
        Commands::Person { id } => browse::run_person(&app, id, output).await,
        Commands::Signin { email, name, image } => session::run_signin(&mut app, &email, name, image, output).await,
        Commands::Signout => session::run_signout(&mut app, output).await,
        Commands::Whoami => session::run_whoami(&app, output).await,
        Commands::Profile { user_id } => session::run_profile(&app, &user_id, output).await,
        Commands::Watchlist { cmd } => match cmd {
            WatchlistCommands::List { status } => library::run_watchlist_list(&app, status, output).await,
            WatchlistCommands::Add { media, id } => library::run_watchlist_add(&app, media, id, output).await,
            WatchlistCommands::Remove { media, id } => library::run_watchlist_remove(&app, media, id, output).await,
            WatchlistCommands::Status { media, id, status } => {
                library::run_watchlist_status(&app, media, id, status, output).await
            }
        },
        Commands::Rate { media, id, score, review } => library::run_rate(&app, media, id, score, review, output).await,
        Commands::Ratings => library::run_ratings(&app, output).await,
        Commands::Unrate { media, id } => library::run_unrate(&app, media, id, output).await,
        Commands::Feed => community::run_feed(&app, output).await,
        Commands::Share { media, id, caption } => community::run_share(&app, media, id, caption, output).await,
        Commands::Like { post_id } => community::run_like(&app, &post_id, output).await,
        Commands::Comment { post_id, text } => community::run_comment(&app, &post_id, &text, output).await,
        Commands::Comments { post_id } => community::run_comments(&app, &post_id, output).await,
        Commands::DeletePost { post_id } => community::run_delete_post(&app, &post_id, output).await,
        Commands::Config { .. } | Commands::Clear { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = match &cli.home {
        Some(home) => PathManager::with_base(home),
        None => PathManager::default(),
    };
    let config = Config::load_or_default(&paths.config_file()).map_err(|e| eyre!("{:#}", e))?;

    logging::init_logging(cli.verbose, cli.quiet, &config.logging).map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match run(cli.command, paths, config, cli.offline, &output).await {
        // The failure was already shown as a notice
        Err(report) if report.downcast_ref::<AlreadyReported>().is_some() => std::process::exit(1),
        result => result,
    }
}
