use std::sync::{Arc, Mutex};
use std::time::Duration;

use bookbot::render::Renderer;
use bookbot::{DEFAULT_SYSTEM_PROMPT, SessionBuilder};
use bookbot_books::{
    BooksClient, BooksConfigBuilder, Error as BooksError, SearchParameters,
};
use bookbot_core::conversation::Role;
use bookbot_core::{TurnError, TurnOutcome};
use bookbot_model::{ErrorKind, ModelMessage};
use bookbot_test_model::{PresetResponse, TestModelProvider};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SEARCH_PAGE: &str = r#"{
  "totalItems": 23,
  "items": [
    {
      "id": "MxUuEAAAQBAJ",
      "volumeInfo": {
        "title": "Murder on the Orient Express",
        "authors": ["Agatha Christie"],
        "publishedDate": "2011-03-15"
      }
    },
    {
      "id": "abc123",
      "volumeInfo": {
        "title": "The A.B.C. Murders",
        "authors": ["Agatha Christie"]
      }
    }
  ]
}"#;

const SECOND_PAGE: &str = r#"{
  "totalItems": 23,
  "items": [
    { "id": "p2", "volumeInfo": { "title": "Curtain" } }
  ]
}"#;

const DETAIL: &str = r#"{
  "id": "abc123",
  "volumeInfo": {
    "title": "The A.B.C. Murders",
    "authors": ["Agatha Christie"],
    "publisher": "HarperCollins",
    "pageCount": 256
  }
}"#;

const SEARCH_ERROR: &str = r#"{
  "error": { "code": 400, "message": "Invalid value" }
}"#;

/// A books service stub that answers every connection from `route` and
/// records the request lines.
struct BooksStub {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl BooksStub {
    async fn start(route: fn(&str) -> (&'static str, &'static str)) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(vec![]));
        tokio::spawn({
            let requests = Arc::clone(&requests);
            async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let requests = Arc::clone(&requests);
                    tokio::spawn(handle(stream, route, requests));
                }
            }
        });
        Self { base_url, requests }
    }

    fn client(&self) -> BooksClient {
        let config = BooksConfigBuilder::new()
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(2))
            .build();
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        BooksClient::with_http_client(config, http)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    mut stream: TcpStream,
    route: fn(&str) -> (&'static str, &'static str),
    requests: Arc<Mutex<Vec<String>>>,
) {
    let mut buf = vec![];
    let mut chunk = [0; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or_default().to_owned();
    let path = request_line.split(' ').nth(1).unwrap_or_default();
    let (status, body) = route(path);
    requests.lock().unwrap().push(request_line.clone());

    let resp = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(resp.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn library(path: &str) -> (&'static str, &'static str) {
    if path.starts_with("/volumes/abc123") {
        ("200 OK", DETAIL)
    } else if path.contains("startIndex=10") {
        ("200 OK", SECOND_PAGE)
    } else if path.starts_with("/volumes?") {
        ("200 OK", SEARCH_PAGE)
    } else {
        ("404 Not Found", r#"{"error":{"code":404,"message":"nope"}}"#)
    }
}

fn broken_search(_path: &str) -> (&'static str, &'static str) {
    ("400 Bad Request", SEARCH_ERROR)
}

fn by_author(author: &str) -> SearchParameters {
    SearchParameters {
        author: Some(author.to_owned()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_search_by_author() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::tool_call(
        "search",
        json!({ "inauthor": "Agatha Christie" }),
    ));
    let mut session = SessionBuilder::with_model_provider(provider.clone())
        .with_books_client(stub.client())
        .build()
        .unwrap();

    let item = session
        .send_message("find books by Agatha Christie")
        .await
        .unwrap();

    assert_eq!(item.message().role, Role::Assistant);
    let Some(TurnOutcome::Search { params, result }) = item.outcome() else {
        panic!("expected a search outcome, got {:?}", item.outcome());
    };
    assert_eq!(params, &by_author("Agatha Christie"));
    let page = result.as_ref().unwrap();
    assert_eq!(page.page_offset, 0);
    assert_eq!(page.items.len(), 2);
    assert_eq!(
        stub.requests(),
        vec![
            "GET /volumes?q=inauthor:Agatha%20Christie&startIndex=0\
             &maxResults=10 HTTP/1.1"
        ]
    );

    // The model gets the system prompt and both book tools.
    let requests = provider.recorded_requests();
    assert_eq!(
        requests[0].messages[0],
        ModelMessage::System(DEFAULT_SYSTEM_PROMPT.to_owned())
    );
    let tools: Vec<_> =
        requests[0].tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tools, vec!["detail", "search"]);
}

#[tokio::test]
async fn test_off_topic_request_is_declined() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::text(
        "I can only help with books. Is there a book you are looking for?",
    ));
    let deltas = Arc::new(Mutex::new(String::new()));
    let mut session = SessionBuilder::with_model_provider(provider)
        .with_books_client(stub.client())
        .on_transcript({
            let deltas = Arc::clone(&deltas);
            move |delta| deltas.lock().unwrap().push_str(delta)
        })
        .build()
        .unwrap();

    let item = session
        .send_message("what's the weather today")
        .await
        .unwrap();

    assert_eq!(item.outcome(), Some(&TurnOutcome::Text));
    assert!(item.message().content.starts_with("I can only help"));
    assert_eq!(*deltas.lock().unwrap(), item.message().content);
    assert!(stub.requests().is_empty());
    assert_eq!(session.conversation().len(), 2);
}

#[tokio::test]
async fn test_select_item_shows_details() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::tool_call(
        "search",
        json!({ "inauthor": "Agatha Christie" }),
    ));
    provider.add_turn(PresetResponse::tool_call(
        "detail",
        json!({ "bookId": "abc123" }),
    ));
    let mut session = SessionBuilder::with_model_provider(provider.clone())
        .with_books_client(stub.client())
        .build()
        .unwrap();

    session
        .send_message("find books by Agatha Christie")
        .await
        .unwrap();
    let item = session.select_item("abc123").await.unwrap();

    let Some(TurnOutcome::Detail { book_id, result }) = item.outcome() else {
        panic!("expected a detail outcome, got {:?}", item.outcome());
    };
    assert_eq!(book_id, "abc123");
    let detail = result.as_ref().unwrap();
    assert_eq!(detail.publisher.as_deref(), Some("HarperCollins"));
    let rendered = Renderer::new(false).book_detail(detail);
    assert!(rendered.starts_with("The A.B.C. Murders\n"));
    assert!(rendered.contains("Pages: 256\n"));

    // The selection is a regular user turn that names the identifier.
    let history: Vec<_> = session.conversation().history().collect();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].role, Role::User);
    assert!(history[2].content.contains("abc123"));
    let requests = provider.recorded_requests();
    assert_eq!(
        requests[1].messages.last(),
        Some(&ModelMessage::User(history[2].content.clone()))
    );
    assert_eq!(
        stub.requests().last().map(String::as_str),
        Some("GET /volumes/abc123 HTTP/1.1")
    );
}

#[tokio::test]
async fn test_search_failure_is_shown_inline() {
    let stub = BooksStub::start(broken_search).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::tool_call(
        "search",
        json!({ "intitle": "Dune" }),
    ));
    provider.add_turn(PresetResponse::text("Sorry about that."));
    let mut session = SessionBuilder::with_model_provider(provider)
        .with_books_client(stub.client())
        .build()
        .unwrap();

    let item = session.send_message("Dune").await.unwrap();
    let outcome = item.outcome().unwrap();
    assert_eq!(
        outcome.error(),
        Some(&BooksError::SearchUnavailable("Invalid value".to_owned()))
    );
    assert_eq!(
        Renderer::new(false).outcome(outcome).unwrap(),
        "Error: book search is unavailable: Invalid value\n"
    );

    // The session goes on.
    assert_eq!(session.conversation().len(), 2);
    session.send_message("never mind").await.unwrap();
    assert_eq!(session.conversation().len(), 4);
}

#[tokio::test]
async fn test_history_grows_by_two_per_turn() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::text("Hello, reader!"));
    provider.add_turn(PresetResponse::tool_call(
        "search",
        json!({ "subject": "poetry" }),
    ));
    provider.add_turn(PresetResponse::tool_call(
        "detail",
        json!({ "bookId": "abc123" }),
    ));
    let mut session = SessionBuilder::with_model_provider(provider)
        .with_books_client(stub.client())
        .build()
        .unwrap();

    session.send_message("Hi").await.unwrap();
    session.send_message("some poetry please").await.unwrap();
    session.select_item("abc123").await.unwrap();

    let conversation = session.close();
    assert_eq!(conversation.len(), 6);
    let roles: Vec<_> = conversation.history().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [Role::User, Role::Assistant].repeat(3),
        "history alternates between user and assistant"
    );
    assert_eq!(conversation.transcript().len(), conversation.len());
}

#[tokio::test]
async fn test_model_failure_leaves_history_unchanged() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::text("Hello, reader!"));
    let mut session = SessionBuilder::with_model_provider(provider)
        .with_books_client(stub.client())
        .build()
        .unwrap();

    session.send_message("Hi").await.unwrap();
    let before = session.conversation().clone();

    // The script has no answer for a second turn.
    let err = session.send_message("Any tips?").await.unwrap_err();
    assert!(
        matches!(
            err,
            TurnError::ModelUnavailable {
                kind: ErrorKind::RateLimitExceeded,
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(session.conversation(), &before);
    assert_eq!(
        session.send_message("  ").await.unwrap_err(),
        TurnError::EmptyUtterance
    );
    assert_eq!(session.conversation(), &before);
}

#[tokio::test]
async fn test_invalid_tool_call_is_retried_once() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_user_input_step();
    provider.add_assistant_response_attempts(vec![
        PresetResponse::tool_call("detail", json!({ "bookId": "  " })),
        PresetResponse::tool_call("detail", json!({ "bookId": "abc123" })),
    ]);
    let mut session = SessionBuilder::with_model_provider(provider.clone())
        .with_books_client(stub.client())
        .build()
        .unwrap();

    let item = session.send_message("tell me about abc123").await.unwrap();

    assert!(matches!(
        item.outcome(),
        Some(TurnOutcome::Detail { result: Ok(_), .. })
    ));
    assert_eq!(provider.recorded_requests().len(), 2);
    // Only the valid call reached the books service.
    assert_eq!(stub.requests(), vec!["GET /volumes/abc123 HTTP/1.1"]);
}

#[tokio::test]
async fn test_change_page_keeps_history() {
    let stub = BooksStub::start(library).await;
    let mut provider = TestModelProvider::default();
    provider.add_turn(PresetResponse::tool_call(
        "search",
        json!({ "inauthor": "Agatha Christie" }),
    ));
    let mut session = SessionBuilder::with_model_provider(provider.clone())
        .with_books_client(stub.client())
        .build()
        .unwrap();

    let item = session
        .send_message("find books by Agatha Christie")
        .await
        .unwrap();
    let Some(TurnOutcome::Search {
        params,
        result: Ok(first),
    }) = item.outcome().cloned()
    else {
        panic!("expected a search page");
    };
    let before = session.conversation().clone();

    let next = first.pagination().next_offset().unwrap();
    let second = session.change_page(&params, next).await.unwrap();
    assert_eq!(second.page_offset, 10);
    assert_eq!(second.items[0].id, "p2");
    assert_eq!(
        Renderer::new(false)
            .search_page(&second)
            .lines()
            .last()
            .unwrap(),
        "Page 2 of 3  [prev] [next]"
    );

    let previous = second.pagination().previous_offset().unwrap();
    let back = session.change_page(&params, previous).await.unwrap();
    assert_eq!(back, first);

    assert_eq!(session.conversation(), &before);
    assert_eq!(provider.recorded_requests().len(), 1);
    assert_eq!(stub.requests().len(), 3);
}
