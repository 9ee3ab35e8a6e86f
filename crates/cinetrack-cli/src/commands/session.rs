use super::context::App;
use crate::output::{detail_table, score, Output};
use super::library::{print_ratings, print_watchlist};
use cinetrack_core::{sign_in, ProfileView};
use cinetrack_models::WatchStatus;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use tracing::info;

/// Complete an identity-provider callback: find or create the user, then
/// persist a signed session token in the credentials file
pub async fn run_signin(
    app: &mut App,
    email: &str,
    name: Option<String>,
    image: Option<String>,
    output: &Output,
) -> Result<()> {
    let secret = app.session_secret()?;
    let service = app.stores.service.clone();
    let signed_in = sign_in(service.as_ref(), &secret, email, name, image).await?;

    app.credentials.set_session_token(signed_in.token.clone());
    app.credentials
        .save()
        .map_err(|e| eyre!("Failed to save session: {}", e))?;
    info!("Signed in as {}", signed_in.user.id);

    output.data(&json!({ "user": signed_in.user }), |_| {
        output.success(format!("Signed in as {}", signed_in.user.display_name()));
    });
    Ok(())
}

pub async fn run_signout(app: &mut App, output: &Output) -> Result<()> {
    if app.credentials.get_session_token().is_none() {
        output.info("Not signed in");
        return Ok(());
    }
    app.credentials.clear_session();
    app.credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    app.cache.clear();
    output.success("Signed out");
    Ok(())
}

/// Profile screen: who is signed in and what their library looks like
pub async fn run_whoami(app: &App, output: &Output) -> Result<()> {
    let Some(session) = app.session.as_ref() else {
        output.info("Not signed in");
        return Ok(());
    };
    let views = app.views()?;
    let spinner = output.spinner("Loading profile...");
    let profile = views.profile_view(session).await;
    spinner.finish_and_clear();
    let profile = profile?;

    output.data(&profile, |profile| {
        let name = profile
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| session.email.clone());
        let mut rows = vec![("Email", session.email.clone()), ("User ID", session.user_id.clone())];
        rows.extend(summary_rows(profile));
        let store = if app.is_offline() {
            format!("offline ({})", app.paths.offline_store_file().display())
        } else {
            "hosted".to_string()
        };
        rows.push(("Store", store));
        println!("{}", detail_table(&name, &rows));
    });
    Ok(())
}

/// Another user's public profile with their watchlist and ratings
pub async fn run_profile(app: &App, user_id: &str, output: &Output) -> Result<()> {
    let views = app.views()?;
    let spinner = output.spinner("Loading profile...");
    let profile = views.user_profile(user_id).await;
    spinner.finish_and_clear();
    let profile = profile?.ok_or_else(|| eyre!("User not found: {}", user_id))?;

    output.data(&profile, |profile| {
        let (name, email) = match &profile.user {
            Some(user) => (
                user.name.clone().unwrap_or_else(|| "Anonymous User".to_string()),
                user.email.clone(),
            ),
            None => ("Anonymous User".to_string(), String::new()),
        };
        let mut rows = vec![("Email", email), ("User ID", user_id.to_string())];
        rows.extend(summary_rows(profile));
        println!("{}", detail_table(&name, &rows));
        print_watchlist(&profile.watchlist);
        print_ratings(&profile.ratings);
    });
    Ok(())
}

fn summary_rows(profile: &ProfileView) -> Vec<(&'static str, String)> {
    let mut rows: Vec<(&'static str, String)> = WatchStatus::ALL
        .iter()
        .map(|status| (status_label(*status), profile.count(*status).to_string()))
        .collect();
    rows.push(("Ratings", profile.ratings.len().to_string()));
    rows.push(("Average rating", score(profile.average_rating)));
    rows
}

pub fn status_label(status: WatchStatus) -> &'static str {
    match status {
        WatchStatus::PlanToWatch => "Plan to watch",
        WatchStatus::Watching => "Watching",
        WatchStatus::Completed => "Completed",
    }
}
