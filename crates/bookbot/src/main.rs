//! A terminal front-end for `bookbot`.

#[macro_use]
extern crate tracing;

use std::io::{IsTerminal as _, Write as _};
use std::pin::pin;
use std::process::ExitCode;
use std::time::Duration;

use bookbot::SessionBuilder;
use bookbot::render::Renderer;
use bookbot_books::{
    BooksClient, BooksConfigBuilder, SearchPage, SearchParameters,
};
use bookbot_core::conversation::Role;
use bookbot_core::{TurnError, TurnOutcome};
use bookbot_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const GREETING: &str = "Hi! I'm Bookbot. Ask me about books, authors or \
                        subjects, and I'll look them up for you.";

const HELP: &str = "\
Commands:
  /next      show the next page of results
  /prev      show the previous page of results
  /open <n>  show the details of the n-th result on the page
  /history   print the conversation so far
  /help      show this help
  /quit      leave";

/// Chat about books in the terminal.
#[derive(Debug, Parser)]
#[command(name = "bookbot", version, about)]
struct Args {
    /// API key of the completion service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of an OpenAI-compatible completion service.
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Model to talk to.
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Google Books API key. The public quota is used without one.
    #[arg(long, env = "GOOGLE_BOOKS_API_KEY", hide_env_values = true)]
    books_api_key: Option<String>,

    /// Base URL of the Google Books API.
    #[arg(long, env = "GOOGLE_BOOKS_BASE_URL")]
    books_base_url: Option<String>,

    /// Timeout of every remote request, in seconds.
    #[arg(long, env = "BOOKBOT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Next,
    Prev,
    Open(&'a str),
    History,
    Help,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Command::Message(line);
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match name {
            "next" => Command::Next,
            "prev" => Command::Prev,
            "open" => Command::Open(arg),
            "history" => Command::History,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(name),
        }
    }
}

/// The search whose page is on screen.
struct Browsing {
    params: SearchParameters,
    page: SearchPage,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout_secs);
    let renderer =
        Renderer::new(!args.no_color && std::io::stdout().is_terminal());

    let mut openai_config =
        OpenAIConfigBuilder::with_api_key(args.api_key).with_timeout(timeout);
    if let Some(base_url) = args.base_url {
        openai_config = openai_config.with_base_url(base_url);
    }
    if let Some(model) = args.model {
        openai_config = openai_config.with_model(model);
    }
    let model_provider = match OpenAIProvider::new(openai_config.build()) {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("cannot create the model provider: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut books_config = BooksConfigBuilder::new().with_timeout(timeout);
    if let Some(api_key) = args.books_api_key {
        books_config = books_config.with_api_key(api_key);
    }
    if let Some(base_url) = args.books_base_url {
        books_config = books_config.with_base_url(base_url);
    }
    let books = match BooksClient::new(books_config.build()) {
        Ok(books) => books,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_model_provider(model_provider)
        .with_books_client(books)
        .on_transcript(move |delta| {
            delta_tx.send(delta.to_owned()).ok();
        })
        .build();
    let mut session = match session {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut waiter = Waiter {
        deltas: &mut delta_rx,
        style: progress_style,
        speaker: renderer.speaker(Role::Assistant),
    };

    println!("{} {GREETING}", renderer.speaker(Role::Assistant));
    println!("Type /help for commands.");
    let mut browsing: Option<Browsing> = None;

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };

        let turn = match Command::parse(&line) {
            Command::Message("") => continue,
            Command::Message(message) => {
                waiter.wait(session.send_message(message)).await
            }
            Command::Open(arg) => {
                let Some(browsing) = &browsing else {
                    println!("There are no results to open.");
                    continue;
                };
                let item = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| browsing.page.items.get(idx));
                let Some(item) = item else {
                    let count = browsing.page.items.len();
                    println!("Pick a result between 1 and {count}.");
                    continue;
                };
                let book_id = item.id.clone();
                waiter.wait(session.select_item(&book_id)).await
            }
            command @ (Command::Next | Command::Prev) => {
                let Some(current) = &mut browsing else {
                    println!("There are no results to page through.");
                    continue;
                };
                let pagination = current.page.pagination();
                let offset = if command == Command::Next {
                    pagination.next_offset()
                } else {
                    pagination.previous_offset()
                };
                let Some(offset) = offset else {
                    println!("There is no such page.");
                    continue;
                };
                let (result, _) = waiter
                    .wait(session.change_page(&current.params, offset))
                    .await;
                match result {
                    Ok(page) => {
                        print!("{}", renderer.search_page(&page));
                        current.page = page;
                    }
                    Err(err) => print!("{}", renderer.error(&err)),
                }
                continue;
            }
            Command::History => {
                print!("{}", renderer.transcript(session.conversation()));
                continue;
            }
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
            Command::Unknown(name) => {
                println!("Unknown command /{name}. Try /help.");
                continue;
            }
        };

        let (result, streamed) = turn;
        match result {
            Ok(item) => {
                let message = item.message();
                let outcome = item.outcome();
                let is_text = matches!(outcome, Some(TurnOutcome::Text));
                if !streamed || !is_text {
                    println!(
                        "{} {}",
                        renderer.speaker(message.role),
                        message.content
                    );
                }
                let rendered = outcome.and_then(|o| renderer.outcome(o));
                if let Some(rendered) = rendered {
                    print!("{rendered}");
                }
                if let Some(TurnOutcome::Search {
                    params,
                    result: Ok(page),
                }) = outcome
                {
                    browsing = Some(Browsing {
                        params: params.clone(),
                        page: page.clone(),
                    });
                }
            }
            Err(TurnError::EmptyUtterance) => {}
            Err(err) => {
                warn!("turn failed: {err:?}");
                print!("{}", renderer.turn_error(&err));
            }
        }
    }

    let conversation = session.close();
    debug!("session closed after {} messages", conversation.len());
    ExitCode::SUCCESS
}

/// Shows a spinner until a future resolves, printing assistant text as it
/// streams in.
struct Waiter<'a> {
    deltas: &'a mut mpsc::UnboundedReceiver<String>,
    style: ProgressStyle,
    speaker: String,
}

impl Waiter<'_> {
    /// Returns the output and whether any text was printed.
    async fn wait<F: Future>(&mut self, fut: F) -> (F::Output, bool) {
        let mut fut = pin!(fut);
        let mut streamed = false;
        let mut progress_bar = Some(self.spinner());

        let output = loop {
            if let Some(progress_bar) = &progress_bar {
                progress_bar.inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            select! {
                output = &mut fut => break output,
                Some(delta) = self.deltas.recv() => {
                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    self.print_delta(&delta, &mut streamed);
                }
                _ = sleep => {}
            }
        };

        if let Some(progress_bar) = progress_bar {
            progress_bar.finish_and_clear();
        }
        while let Ok(delta) = self.deltas.try_recv() {
            self.print_delta(&delta, &mut streamed);
        }
        if streamed {
            println!();
        }
        (output, streamed)
    }

    fn spinner(&self) -> ProgressBar {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(self.style.clone());
        progress_bar.set_message("📚 Thinking...");
        progress_bar
    }

    fn print_delta(&self, delta: &str, streamed: &mut bool) {
        if !*streamed {
            print!("{} ", self.speaker);
            *streamed = true;
        }
        print!("{delta}");
        std::io::stdout().flush().ok();
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(Command::parse("/next\n"), Command::Next);
        assert_eq!(Command::parse(" /prev "), Command::Prev);
        assert_eq!(Command::parse("/open  3\n"), Command::Open("3"));
        assert_eq!(Command::parse("/open"), Command::Open(""));
        assert_eq!(Command::parse("/history"), Command::History);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/shelf"), Command::Unknown("shelf"));
        assert_eq!(
            Command::parse("  books about whales \n"),
            Command::Message("books about whales")
        );
        assert_eq!(Command::parse("\n"), Command::Message(""));
    }
}
