//! The single HTML page.

use std::fmt::Write as _;

use vista::image::ImageFormat;
use vista::render::{PAGE_TAGLINE, PAGE_TITLE, Theme, escape_html};

const TEMPLATE: &str = include_str!("../../assets/index.html");

/// Renders the page with `selected` preselected in the theme selector.
#[must_use]
pub fn render(selected: Theme) -> String {
    let mut options = String::new();
    for theme in Theme::ALL {
        let attr = if theme == selected { " selected" } else { "" };
        let _ = write!(
            options,
            "<option value=\"{}\"{attr}>{}</option>",
            theme.as_str(),
            theme.label()
        );
    }

    let accept = ImageFormat::ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    TEMPLATE
        .replace("{{title}}", &escape_html(PAGE_TITLE))
        .replace("{{tagline}}", &escape_html(PAGE_TAGLINE))
        .replace("{{theme_options}}", &options)
        .replace("{{accept}}", &accept)
}
