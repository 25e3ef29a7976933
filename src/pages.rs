use crate::config::SiteConfig;
use crate::error::Result;
use crate::markdown;
use crate::notes::{Navigation, NoteDate};
use askama_axum::Template;

/// Template for the `/daily` listing
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    title: &'a str,
    site: &'a SiteConfig,
    dates: &'a [NoteDate],
}

/// Template for a single daily note
#[derive(Template)]
#[template(path = "note.html")]
pub struct NotePage<'a> {
    title: String,
    site: &'a SiteConfig,
    date: &'a NoteDate,
    content: String,
    show_rename_notice: bool,
    navigation: Vec<NavLink>,
}

/// Template for a daily note that does not exist
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage<'a> {
    title: &'a str,
    site: &'a SiteConfig,
    path: &'a str,
}

/// One link in the previous/next navigation below a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub rel: &'static str,
    pub class: &'static str,
}

impl NavLink {
    /// Links for the neighbours that exist; a missing side gets no link at all.
    #[must_use]
    pub fn from_navigation(navigation: &Navigation) -> Vec<Self> {
        let previous = navigation.previous.as_ref().map(|date| Self {
            href: date.url_path(),
            label: "<< previous note",
            rel: "prev",
            class: "col-1 justify-self-start",
        });
        let next = navigation.next.as_ref().map(|date| Self {
            href: date.url_path(),
            label: "next note >>",
            rel: "next",
            class: "col-2 justify-self-end",
        });

        previous.into_iter().chain(next).collect()
    }
}

/// Render the listing of all daily notes, most recent first.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_index(site: &SiteConfig, dates: &[NoteDate]) -> Result<String> {
    tracing::debug!("Rendering index page with {} notes", dates.len());
    let page = IndexPage {
        title: "Daily Notes",
        site,
        dates,
    };
    Ok(page.render()?)
}

/// Render one daily note with links to its neighbours in `dates`.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_note(
    site: &SiteConfig,
    date: &NoteDate,
    note_markdown: &str,
    dates: &[NoteDate],
) -> Result<String> {
    tracing::debug!("Rendering daily note {date}");
    let navigation = Navigation::locate(date, dates);

    let page = NotePage {
        title: format!("Daily Note - {date}"),
        site,
        date,
        content: markdown::render(note_markdown),
        show_rename_notice: site.rename.applies_to(date),
        navigation: NavLink::from_navigation(&navigation),
    };
    Ok(page.render()?)
}

/// Render the page shown for a daily note that does not exist.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_not_found(site: &SiteConfig, path: &str) -> Result<String> {
    let page = NotFoundPage {
        title: "Not Found",
        site,
        path,
    };
    Ok(page.render()?)
}
