use super::context::App;
use crate::output::{detail_table, score, table, truncate, Output};
use cinetrack_core::{DetailView, ExploreCategory, ExploreState, ExploreTab, PersonView};
use cinetrack_models::{ContentItem, MediaType, Paged};
use cinetrack_sources::{ImageSize, ImageUrls};
use color_eyre::Result;
use owo_colors::OwoColorize;

const OVERVIEW_WIDTH: usize = 300;

pub async fn run_trending(app: &App, output: &Output) -> Result<()> {
    let views = app.views()?;
    let spinner = output.spinner("Loading trending titles...");
    let page = views.trending().await;
    spinner.finish_and_clear();
    let page = page?;

    output.data(&page, |page| print_listing("Trending this week", page, None));
    Ok(())
}

pub async fn run_search(app: &App, query: &str, page: u32, output: &Output) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        output.warn("Nothing to search for");
        return Ok(());
    }

    let views = app.views()?;
    let spinner = output.spinner(format!("Searching for '{}'...", query));
    let results = views.search(query, page.max(1)).await;
    spinner.finish_and_clear();
    let results = results?;

    output.data(&results, |results| {
        if results.results.is_empty() {
            println!("No results found for '{}'", query);
        } else {
            print_listing(&format!("Results for '{}'", query), results, None);
        }
    });
    Ok(())
}

pub async fn run_explore(
    app: &App,
    tab: ExploreTab,
    category: ExploreCategory,
    genres: Vec<u32>,
    page: u32,
    output: &Output,
) -> Result<()> {
    let mut state = ExploreState::new(tab, category);
    state.set_genres(genres);
    state.set_page(page);

    let views = app.views()?;
    let spinner = output.spinner(format!("Loading {}...", tab));
    let listing = views.explore(&state).await;
    let genre_list = views.genres(tab).await;
    spinner.finish_and_clear();
    let listing = listing?;
    let genre_list = genre_list?;

    output.data(&listing, |listing| {
        let heading = match tab {
            ExploreTab::Trending => "Trending".to_string(),
            _ => format!("{} / {}", tab, category),
        };
        print_listing(&heading, listing, tab.media());
        if !genre_list.is_empty() {
            let names: Vec<String> = genre_list
                .iter()
                .map(|g| {
                    let label = format!("{} ({})", g.name, g.id);
                    if state.genres().contains(&g.id) {
                        label.green().to_string()
                    } else {
                        label
                    }
                })
                .collect();
            println!("Genres: {}", names.join(", "));
        }
    });
    Ok(())
}

pub async fn run_show(app: &App, media: MediaType, id: u64, output: &Output) -> Result<()> {
    let views = app.views()?;
    let spinner = output.spinner("Loading details...");
    let view = views.detail_view(media, id, app.session.as_ref()).await;
    spinner.finish_and_clear();
    let view = view?;

    let images = ImageUrls::new(app.config.content.image_base_url.clone());
    output.data(&view, |view| print_detail(view, &images));
    Ok(())
}

pub async fn run_person(app: &App, id: u64, output: &Output) -> Result<()> {
    let views = app.views()?;
    let spinner = output.spinner("Loading person...");
    let view = views.person_view(id).await;
    spinner.finish_and_clear();
    let view = view?;

    let images = ImageUrls::new(app.config.content.image_base_url.clone());
    output.data(&view, |view| print_person(view, &images));
    Ok(())
}

fn print_listing(heading: &str, page: &Paged<ContentItem>, fallback: Option<MediaType>) {
    println!("{}", heading.bright_cyan().bold());
    let mut t = table(["ID", "Type", "Title", "Year", "Score"]);
    for item in &page.results {
        let media = item.media_type.or(fallback).map(|m| m.label()).unwrap_or("-");
        t.add_row(vec![
            item.id.to_string(),
            media.to_string(),
            truncate(item.display_title(), 48),
            item.year().map(|y| y.to_string()).unwrap_or_default(),
            score(item.vote_average),
        ]);
    }
    println!("{}", t);
    if page.total_pages > 1 {
        println!("Page {} of {}", page.page, page.total_pages);
    }
}

fn print_detail(view: &DetailView, images: &ImageUrls) {
    let details = &view.details;
    let item = &details.item;

    let mut rows = vec![
        ("Type", details.media_type().label().to_string()),
        ("Released", item.display_date().unwrap_or("-").to_string()),
        ("Score", format!("{} / 10", score(item.vote_average))),
        (
            "Genres",
            details.genres.iter().map(|g| g.name.as_str()).collect::<Vec<_>>().join(", "),
        ),
    ];
    if let Some(runtime) = details.runtime.or_else(|| details.episode_run_time.first().copied()) {
        rows.push(("Runtime", format!("{} min", runtime)));
    }
    if let Some(seasons) = details.number_of_seasons {
        rows.push(("Seasons", seasons.to_string()));
    }
    if let Some(trailer) = details.trailer() {
        rows.push(("Trailer", format!("https://www.youtube.com/watch?v={}", trailer.key)));
    }
    if let Some(poster) = images.url(item.poster_path.as_deref(), ImageSize::W500) {
        rows.push(("Poster", poster));
    }
    rows.push(("Community", format!("{} / 10", score(view.average_rating))));
    match view.in_watchlist {
        Some(true) => rows.push(("Watchlist", "✓".green().to_string())),
        Some(false) => rows.push(("Watchlist", "-".to_string())),
        None => {}
    }
    if let Some(rating) = &view.user_rating {
        rows.push(("Your rating", format!("{} / 10", rating.rating)));
    }

    println!("{}", detail_table(item.display_title(), &rows));
    if !item.overview.is_empty() {
        println!("{}\n", truncate(&item.overview, OVERVIEW_WIDTH));
    }

    if let Some(credits) = &details.credits {
        let cast: Vec<String> = credits
            .cast
            .iter()
            .take(8)
            .map(|c| match &c.character {
                Some(character) if !character.is_empty() => format!("{} ({}) as {}", c.name, c.id, character),
                _ => format!("{} ({})", c.name, c.id),
            })
            .collect();
        if !cast.is_empty() {
            println!("{} {}", "Cast:".bold(), cast.join(", "));
        }
    }

    if !view.similar.is_empty() {
        let similar: Vec<String> = view
            .similar
            .iter()
            .map(|s| format!("{} ({})", s.display_title(), s.id))
            .collect();
        println!("{} {}", "Similar:".bold(), similar.join(", "));
    }
}

fn print_person(view: &PersonView, images: &ImageUrls) {
    let person = &view.person;
    let mut rows = vec![
        ("Known for", person.known_for_department.clone().unwrap_or_else(|| "-".to_string())),
        ("Born", person.birthday.clone().unwrap_or_else(|| "-".to_string())),
    ];
    if let Some(deathday) = &person.deathday {
        rows.push(("Died", deathday.clone()));
    }
    if let Some(place) = &person.place_of_birth {
        rows.push(("Birthplace", place.clone()));
    }
    if let Some(photo) = images.url(person.profile_path.as_deref(), ImageSize::W185) {
        rows.push(("Photo", photo));
    }
    println!("{}", detail_table(&person.name, &rows));
    if !person.biography.is_empty() {
        println!("{}\n", truncate(&person.biography, OVERVIEW_WIDTH * 2));
    }

    let mut t = table(["ID", "Type", "Title", "Character"]);
    for credit in &view.known_for {
        t.add_row(vec![
            credit.id.to_string(),
            credit.media_type.label().to_string(),
            truncate(credit.display_title(), 48),
            credit.character.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", t);
}
