use super::context::App;
use super::session::status_label;
use crate::output::{score, table, truncate, Output};
use cinetrack_core::keys;
use cinetrack_models::{MediaType, Rating, WatchStatus, WatchlistEntry};
use color_eyre::Result;
use owo_colors::OwoColorize;

pub async fn run_watchlist_list(app: &App, status: Option<WatchStatus>, output: &Output) -> Result<()> {
    let session = app.require_session()?;
    let views = app.views()?;
    let spinner = output.spinner("Loading watchlist...");
    let entries = views.watchlist(&session.user_id).await;
    spinner.finish_and_clear();
    let entries: Vec<WatchlistEntry> = entries?
        .into_iter()
        .filter(|e| status.map_or(true, |s| e.status == s))
        .collect();

    output.data(&entries, |entries| print_watchlist(entries));
    Ok(())
}

pub async fn run_watchlist_add(app: &App, media: MediaType, id: u64, output: &Output) -> Result<()> {
    let views = app.views()?;
    let actions = app.actions();
    // Snapshot fields come from the live details
    let details = views.details(media, id).await?;
    let added = actions.add_to_watchlist(&details).await;
    let added = app.finish(added, output)?;
    output.data(&added, |_| {});
    Ok(())
}

pub async fn run_watchlist_remove(app: &App, media: MediaType, id: u64, output: &Output) -> Result<()> {
    let removed = app.actions().remove_from_watchlist(media, id).await;
    let removed = app.finish(removed, output)?;
    output.data(&removed, |_| {});
    Ok(())
}

pub async fn run_watchlist_status(app: &App, media: MediaType, id: u64, status: WatchStatus, output: &Output) -> Result<()> {
    let session = app.require_session()?;
    let views = app.views()?;
    // Load the list first so the status change lands in the cached copy
    views.watchlist(&session.user_id).await?;

    let updated = app.actions().update_watchlist_status(media, id, status).await;
    app.finish(updated, output)?;

    let entries = app
        .cache
        .get::<Vec<WatchlistEntry>>(&keys::watchlist(&session.user_id))?
        .unwrap_or_default();
    output.data(&entries, |entries| print_watchlist(entries));
    Ok(())
}

pub async fn run_rate(app: &App, media: MediaType, id: u64, value: u8, review: Option<String>, output: &Output) -> Result<()> {
    let views = app.views()?;
    let details = views.details(media, id).await?;
    let saved = app.actions().rate(&details, value, review).await;
    let saved = app.finish(saved, output)?;

    let average = views.average_rating(id, media).await?;
    output.data(&saved, |_| {
        println!("Community average: {} / 10", score(average));
    });
    Ok(())
}

pub async fn run_unrate(app: &App, media: MediaType, id: u64, output: &Output) -> Result<()> {
    let removed = app.actions().delete_rating(media, id).await;
    let removed = app.finish(removed, output)?;
    output.data(&removed, |_| {});
    Ok(())
}

pub async fn run_ratings(app: &App, output: &Output) -> Result<()> {
    let session = app.require_session()?;
    let views = app.views()?;
    let spinner = output.spinner("Loading ratings...");
    let ratings = views.ratings(&session.user_id).await;
    spinner.finish_and_clear();
    let ratings = ratings?;

    output.data(&ratings, |ratings| print_ratings(ratings));
    Ok(())
}

pub fn print_watchlist(entries: &[WatchlistEntry]) {
    if entries.is_empty() {
        println!("{}", "Your watchlist is empty".bright_black());
        return;
    }
    let mut t = table(["ID", "Type", "Title", "Status", "Added"]);
    for entry in entries {
        t.add_row(vec![
            entry.movie_id.to_string(),
            entry.media_type.label().to_string(),
            truncate(&entry.snapshot.title, 48),
            status_label(entry.status).to_string(),
            entry.added_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    println!("{}", t);
}

pub fn print_ratings(ratings: &[Rating]) {
    if ratings.is_empty() {
        println!("{}", "You haven't rated anything yet".bright_black());
        return;
    }
    let mut t = table(["ID", "Type", "Title", "Rating", "Review"]);
    for rating in ratings {
        t.add_row(vec![
            rating.movie_id.to_string(),
            rating.media_type.label().to_string(),
            truncate(&rating.snapshot.title, 40),
            format!("{}/10", rating.rating),
            truncate(rating.review.as_deref().unwrap_or(""), 60),
        ]);
    }
    println!("{}", t);
}
