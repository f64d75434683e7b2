//! Plain-text rendering of turns for the terminal.

use std::fmt::Write as _;

use bookbot_books::{BookDetail, Error as BooksError, SearchPage};
use bookbot_core::{TurnError, TurnOutcome};
use bookbot_core::conversation::{Conversation, Item, Role};
use owo_colors::{OwoColorize, Style};

const DESCRIPTION_LIMIT: usize = 200;

/// Renders search pages, book records and errors as text.
///
/// Output depends only on the input, so rendering the same page twice
/// gives the same text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Creates a renderer. ANSI colors are used only when `color` is set.
    #[inline]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders a numbered list of results followed by the page footer.
    /// Numbers start at 1 on every page.
    pub fn search_page(&self, page: &SearchPage) -> String {
        let mut out = String::new();
        if page.items.is_empty() {
            let empty = self.paint("No books found.", Style::new().dimmed());
            out.push_str(&empty);
            out.push('\n');
            if page.total_count == 0 {
                return out;
            }
        }

        for (idx, item) in page.items.iter().enumerate() {
            let title = match &item.subtitle {
                Some(subtitle) => format!("{}: {subtitle}", item.title),
                None => item.title.clone(),
            };
            let number = format!("{:>2}.", idx + 1);
            let _ = writeln!(
                out,
                "{} {}",
                self.paint(&number, Style::new().bright_black()),
                self.paint(&title, Style::new().bold().bright_white())
            );
            let _ = writeln!(out, "    Author(s): {}", authors(&item.authors));
            let _ = writeln!(
                out,
                "    Published: {}",
                item.published_date.as_deref().unwrap_or("N/A")
            );
            if let Some(description) = &item.description {
                let _ = writeln!(
                    out,
                    "    {}",
                    truncate(&plain_text(description), DESCRIPTION_LIMIT)
                );
            }
            if let Some(preview_url) = &item.preview_url {
                let _ = writeln!(
                    out,
                    "    Preview: {}",
                    self.paint(preview_url, Style::new().underline())
                );
            }
            let _ = writeln!(
                out,
                "    {}",
                self.paint(&format!("ID: {}", item.id), Style::new().dimmed())
            );
        }

        out.push('\n');
        out.push_str(&self.footer(page));
        out.push('\n');
        out
    }

    fn footer(&self, page: &SearchPage) -> String {
        let pagination = page.pagination();
        format!(
            "Page {} of {}  {} {}",
            pagination.current_page(),
            pagination.total_pages(),
            self.button("prev", !pagination.previous_disabled()),
            self.button("next", !pagination.next_disabled())
        )
    }

    fn button(&self, label: &str, enabled: bool) -> String {
        if enabled {
            self.paint(&format!("[{label}]"), Style::new().bright_cyan())
        } else {
            self.paint(&format!("({label})"), Style::new().dimmed())
        }
    }

    /// Renders one book record as a card.
    pub fn book_detail(&self, detail: &BookDetail) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}",
            self.paint(&detail.title, Style::new().bold().bright_white())
        );
        if let Some(subtitle) = &detail.subtitle {
            let _ = writeln!(out, "{subtitle}");
        }
        let _ = writeln!(out, "Author(s): {}", authors(&detail.authors));
        let _ = writeln!(
            out,
            "Publisher: {}",
            detail.publisher.as_deref().unwrap_or("N/A")
        );
        let _ = writeln!(
            out,
            "Published: {}",
            detail.published_date.as_deref().unwrap_or("N/A")
        );
        if let Some(page_count) = detail.page_count {
            let _ = writeln!(out, "Pages: {page_count}");
        }
        if !detail.categories.is_empty() {
            let categories = detail.categories.join(", ");
            let _ = writeln!(out, "Categories: {categories}");
        }
        if let Some(description) = &detail.description {
            let _ = writeln!(out, "\n{}\n", plain_text(description));
        }
        if let Some(preview_url) = &detail.preview_url {
            let _ = writeln!(
                out,
                "Preview: {}",
                self.paint(preview_url, Style::new().underline())
            );
        }
        out
    }

    /// Renders an error in place of a result.
    pub fn error(&self, err: &BooksError) -> String {
        format!(
            "{}\n",
            self.paint(&format!("Error: {err}"), Style::new().bright_red())
        )
    }

    /// Renders a turn that could not be completed.
    pub fn turn_error(&self, err: &TurnError) -> String {
        let message = format!("Sorry, {err}. Please try again.");
        format!("{}\n", self.paint(&message, Style::new().bright_red()))
    }

    /// Renders what a turn produced. Text replies have nothing besides the
    /// assistant message, so they yield `None`.
    pub fn outcome(&self, outcome: &TurnOutcome) -> Option<String> {
        let rendered = match outcome {
            TurnOutcome::Text => return None,
            TurnOutcome::Search { result, .. } => match result {
                Ok(page) => self.search_page(page),
                Err(err) => self.error(err),
            },
            TurnOutcome::Detail { result, .. } => match result {
                Ok(detail) => self.book_detail(detail),
                Err(err) => self.error(err),
            },
        };
        Some(rendered)
    }

    /// Renders one transcript item: the speaker, the message and, for
    /// assistant items, the outcome.
    pub fn item(&self, item: &Item) -> String {
        let message = item.message();
        let speaker = self.speaker(message.role);
        let mut out = format!("{speaker} {}\n", message.content);
        if let Some(rendered) = item.outcome().and_then(|o| self.outcome(o)) {
            out.push_str(&rendered);
        }
        out
    }

    /// The label put in front of a message.
    pub fn speaker(&self, role: Role) -> String {
        match role {
            Role::User => {
                self.paint("You:", Style::new().bold().bright_green())
            }
            Role::Assistant => {
                self.paint("Bookbot:", Style::new().bold().bright_cyan())
            }
        }
    }

    /// Renders the whole conversation as the user saw it.
    pub fn transcript(&self, conversation: &Conversation) -> String {
        conversation
            .transcript()
            .iter()
            .map(|item| self.item(item))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_owned()
        }
    }
}

fn authors(authors: &[String]) -> String {
    if authors.is_empty() {
        "Unknown".to_owned()
    } else {
        authors.join(", ")
    }
}

/// Drops HTML tags and collapses whitespace.
fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => text.push(ch),
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_owned(),
    }
}
