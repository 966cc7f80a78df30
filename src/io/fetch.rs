use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::{PipelineError, Result};
use crate::models::Workspace;

/// Cap on the saved chapter text, in characters
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Navigation wait budget
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("chapterspin/", env!("CARGO_PKG_VERSION"));

/// Elements whose text is never visible
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start and end a line of text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "caption", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// What a fetcher hands back for one page
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Full page HTML
    pub html: String,
    /// Visible body text
    pub text: String,
    /// Full-page PNG, if the fetcher can render
    pub screenshot: Option<Vec<u8>>,
}

/// Retrieves a chapter page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// Plain HTTP fetcher. Returns the served HTML without rendering, so no screenshot.
pub struct HttpPageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        info!("Navigating to {}", url);

        let timed_out = |e: &reqwest::Error| e.is_timeout();
        let to_error = |e: reqwest::Error| {
            if timed_out(&e) {
                PipelineError::FetchTimeout {
                    url: url.to_string(),
                    seconds: self.timeout.as_secs(),
                }
            } else {
                PipelineError::Transport(format!("failed to fetch {url}: {e}"))
            }
        };

        let response = self.client.get(url.clone()).send().await.map_err(to_error)?;
        let status = response.status();
        let html = response.text().await.map_err(to_error)?;

        if !status.is_success() {
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body: html.chars().take(500).collect(),
            });
        }

        let text = extract_visible_text(&html);
        debug!(
            "Fetched {} bytes of HTML, {} chars of text",
            html.len(),
            text.chars().count()
        );

        Ok(FetchedPage {
            html,
            text,
            screenshot: None,
        })
    }
}

/// Visible text of the `<body>`, one line per block element
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").ok().and_then(|s| document.select(&s).next());

    let mut collector = TextCollector::default();
    collector.walk(body.unwrap_or_else(|| document.root_element()));
    collector.finish()
}

/// Inline runs accumulate into the current line; block boundaries flush it
#[derive(Default)]
struct TextCollector {
    lines: Vec<String>,
    current: String,
}

impl TextCollector {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.current.push_str(text),
                Node::Element(el) if HIDDEN_TAGS.contains(&el.name()) => {}
                Node::Element(el) => {
                    let block = BLOCK_TAGS.contains(&el.name());
                    if block {
                        self.flush();
                    }
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.walk(child_el);
                    }
                    if block {
                        self.flush();
                    }
                }
                _ => {}
            }
        }
    }

    fn flush(&mut self) {
        let line = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.lines.join("\n")
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Paths written by [`save_fetched_page`]
#[derive(Debug, Clone)]
pub struct FetchArtifacts {
    pub text_path: std::path::PathBuf,
    pub html_path: std::path::PathBuf,
    pub screenshot_path: Option<std::path::PathBuf>,
}

/// Persist a fetched page into the workspace, overwriting the previous fetch
pub fn save_fetched_page(page: &FetchedPage, workspace: &Workspace) -> Result<FetchArtifacts> {
    workspace.ensure_dirs()?;

    let text_path = workspace.chapter_text();
    let html_path = workspace.html();
    let screenshot = workspace.screenshot();

    workspace.write_text(&html_path, &page.html)?;
    workspace.write_text(&text_path, truncate_chars(&page.text, MAX_TEXT_CHARS))?;

    let screenshot_path = match &page.screenshot {
        Some(bytes) => {
            std::fs::write(&screenshot, bytes).map_err(|e| PipelineError::io(&screenshot, e))?;
            Some(screenshot)
        }
        None => {
            // a stale screenshot would belong to an earlier page
            if screenshot.exists() {
                std::fs::remove_file(&screenshot)
                    .map_err(|e| PipelineError::io(&screenshot, e))?;
            }
            None
        }
    };

    Ok(FetchArtifacts {
        text_path,
        html_path,
        screenshot_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head><title>Chapter 1</title>
<style>p { color: red; }</style></head>
<body>
  <h1>Chapter 1</h1>
  <script>var hidden = true;</script>
  <p>The  sea was
     calm.</p>
  <p>Dawn came.</p>
</body></html>"#;

    struct StubFetcher(FetchedPage);

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, _url: &Url) -> Result<FetchedPage> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_extract_visible_text() {
        let text = extract_visible_text(PAGE);
        assert_eq!(text, "Chapter 1\nThe sea was calm.\nDawn came.");
    }

    #[test]
    fn test_inline_markup_keeps_sentences_whole() {
        let html = "<html><body><p>He read <i>The Gates of Morning</i> by \
                    <a href=\"/wiki/Stacpoole\">Stacpoole</a>, slowly.</p></body></html>";
        assert_eq!(
            extract_visible_text(html),
            "He read The Gates of Morning by Stacpoole, slowly."
        );
    }

    #[test]
    fn test_line_breaks_at_block_boundaries() {
        let html = "<body><div>One<br>Two <b>bold</b></div><ul><li>a</li><li><em>b</em></li></ul>\
                    tail <span>text</span></body>";
        assert_eq!(extract_visible_text(html), "One\nTwo bold\na\nb\ntail text");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_saved_text_is_capped() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let page = FetchedPage {
            html: "<html></html>".to_string(),
            text: "ä".repeat(MAX_TEXT_CHARS * 3),
            screenshot: None,
        };
        save_fetched_page(&page, &ws).unwrap();
        let saved = std::fs::read_to_string(ws.chapter_text()).unwrap();
        assert_eq!(saved.chars().count(), MAX_TEXT_CHARS);
    }

    #[tokio::test]
    async fn test_refetch_overwrites_same_files() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let url = Url::parse("https://example.com/chapter").unwrap();

        for round in 0..2 {
            let fetcher = StubFetcher(FetchedPage {
                html: format!("<html>{round}</html>"),
                text: format!("text {round}"),
                screenshot: Some(vec![0x89, b'P', b'N', b'G', round]),
            });
            let page = fetcher.fetch(&url).await.unwrap();
            save_fetched_page(&page, &ws).unwrap();
        }

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["chapter.html", "chapter.txt", "screenshot.png"]);
        assert_eq!(std::fs::read_to_string(ws.chapter_text()).unwrap(), "text 1");
    }

    #[test]
    fn test_missing_screenshot_removes_stale_one() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        std::fs::write(ws.screenshot(), b"old").unwrap();

        let artifacts = save_fetched_page(&FetchedPage::default(), &ws).unwrap();
        assert!(artifacts.screenshot_path.is_none());
        assert!(!ws.screenshot().exists());
    }

    #[tokio::test]
    async fn test_http_fetcher() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Chapter_1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/wiki/Chapter_1", server.uri())).unwrap();
        let page = HttpPageFetcher::new().unwrap().fetch(&url).await.unwrap();
        assert_eq!(page.html, PAGE);
        assert!(page.text.contains("Dawn came."));
        assert!(!page.text.contains("hidden"));
        assert!(page.screenshot.is_none());
    }

    #[tokio::test]
    async fn test_http_fetcher_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let fetcher = HttpPageFetcher::with_timeout(Duration::from_millis(200)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, PipelineError::FetchTimeout { .. }));
    }

    #[tokio::test]
    async fn test_http_fetcher_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = HttpPageFetcher::new().unwrap().fetch(&url).await.unwrap_err();
        assert!(matches!(err, PipelineError::Api { status: 404, .. }));
    }
}
