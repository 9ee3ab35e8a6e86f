use super::context::App;
use crate::output::{table, truncate, Output};
use cinetrack_core::keys;
use cinetrack_models::{Comment, CommunityPost, MediaType};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;

pub async fn run_feed(app: &App, output: &Output) -> Result<()> {
    let views = app.views()?;
    let spinner = output.spinner("Loading community feed...");
    let posts = views.feed(app.session.as_ref()).await;
    spinner.finish_and_clear();
    let posts = posts?;

    output.data(&posts, |posts| print_feed(posts, app.session.as_ref().map(|s| s.user_id.as_str())));
    Ok(())
}

pub async fn run_share(app: &App, media: MediaType, id: u64, caption: Option<String>, output: &Output) -> Result<()> {
    let views = app.views()?;
    let details = views.details(media, id).await?;
    let post = app.actions().share(&details, caption).await;
    let post = app.finish(post, output)?;
    output.data(&post, |post| println!("Post id: {}", post.id));
    Ok(())
}

pub async fn run_like(app: &App, post_id: &str, output: &Output) -> Result<()> {
    let views = app.views()?;
    // Prime the viewer's feed so the like shows up optimistically
    views.feed(app.session.as_ref()).await?;

    let outcome = app.actions().toggle_like(post_id).await;
    let outcome = app.finish(outcome, output)?;
    output.data(&outcome, |outcome| {
        let heart = if outcome.is_liked { "♥".red().to_string() } else { "♡".to_string() };
        println!("{} {} like(s)", heart, outcome.likes);
    });
    Ok(())
}

pub async fn run_comment(app: &App, post_id: &str, content: &str, output: &Output) -> Result<()> {
    let views = app.views()?;
    views.comments(post_id).await?;

    let saved = app.actions().add_comment(post_id, content).await;
    app.finish(saved, output)?;

    let thread = app
        .cache
        .get::<Vec<Comment>>(&keys::comments(post_id))?
        .unwrap_or_default();
    output.data(&thread, |thread| print_comments(thread));
    Ok(())
}

pub async fn run_comments(app: &App, post_id: &str, output: &Output) -> Result<()> {
    let views = app.views()?;
    let spinner = output.spinner("Loading comments...");
    let thread = views.comments(post_id).await;
    spinner.finish_and_clear();
    let thread = thread?;

    output.data(&thread, |thread| print_comments(thread));
    Ok(())
}

pub async fn run_delete_post(app: &App, post_id: &str, output: &Output) -> Result<()> {
    let views = app.views()?;
    let post = views
        .feed(app.session.as_ref())
        .await?
        .into_iter()
        .find(|p| p.id == post_id)
        .ok_or_else(|| eyre!("Post {} not found", post_id))?;

    let deleted = app.actions().delete_post(&post).await;
    app.finish(deleted, output)?;
    Ok(())
}

fn print_feed(posts: &[CommunityPost], viewer: Option<&str>) {
    if posts.is_empty() {
        println!("{}", "No posts yet. Share something with 'cinetrack share'".bright_black());
        return;
    }
    let mut t = table(["Post", "By", "Title", "Caption", "Likes", "Comments"]);
    for post in posts {
        let author = post
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| post.user_id.clone());
        let author = if viewer.is_some_and(|v| post.is_owned_by(v)) {
            format!("{} (you)", author)
        } else {
            author
        };
        let likes = match post.is_liked {
            Some(true) => format!("♥ {}", post.likes),
            _ => post.likes.to_string(),
        };
        t.add_row(vec![
            post.id.clone(),
            author,
            truncate(&post.title, 32),
            truncate(post.content.as_deref().unwrap_or(""), 48),
            likes,
            post.comment_count.to_string(),
        ]);
    }
    println!("{}", t);
}

fn print_comments(thread: &[Comment]) {
    if thread.is_empty() {
        println!("{}", "No comments yet".bright_black());
        return;
    }
    for comment in thread {
        let author = comment
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| comment.user_id.clone());
        println!(
            "{} {} {}",
            author.bold(),
            comment.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            comment.content
        );
    }
}
