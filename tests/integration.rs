use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use page_censor::strategy::DEFAULT_IMAGE_PLACEHOLDER;
use page_censor::{
    BatchAction, CensorBuilder, CensorError, Collector, ContentFilter, FsPage, HttpModeration,
    ImageFilter, InboundBatch, Lookup, MemoryPage, Moderation, ModerationRequest,
    ModerationResult, Page, SettingsStore, Strategy, TextFilter, moderate, moderate_page,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://example.com/";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn words(targets: &[&str]) -> ModerationResult {
    ModerationResult {
        words: targets.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

fn text_batch(origin: &str, targets: &[&str]) -> InboundBatch {
    InboundBatch::new(BatchAction::ChangeContent, origin, words(targets))
}

async fn wait_for_publishes(page: &MemoryPage, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while page.publish_count() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("page was not published in time");
}

/// Page that always fails to publish -- for testing error paths.
#[derive(Clone, Default)]
struct FailingPage {
    attempts: Arc<AtomicUsize>,
}

impl Page for FailingPage {
    fn url(&self) -> String {
        URL.to_string()
    }

    async fn publish(&self, _html: &str) -> page_censor::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CensorError::Publish("simulated failure".into()))
    }
}

/// Moderation backend answering every request with the same verdict.
#[derive(Clone)]
struct FixedModeration {
    verdict: ModerationResult,
    calls: Arc<AtomicUsize>,
}

impl FixedModeration {
    fn new(verdict: ModerationResult) -> Self {
        Self {
            verdict,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Moderation for FixedModeration {
    async fn analyze(&self, _request: &ModerationRequest) -> page_censor::Result<ModerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict.clone())
    }
}

// ---------------------------------------------------------------------------
// Filtering properties
// ---------------------------------------------------------------------------

#[test]
fn replace_leaves_no_occurrence_behind() {
    let filter = TextFilter::default();
    let out = filter.apply(
        r#"<body><p>ab ab</p><div title="ab">xab<em>abab</em></div></body>"#,
        "ab",
        None,
    );
    assert_eq!(out.matches("ab").count(), 0);
    assert!(out.contains(r#"<div title="***">x***<em>******</em></div>"#));
}

#[test]
fn image_remove_keeps_the_element() {
    let filter = ImageFilter::new(Strategy::Remove);
    let out = filter.apply(r#"<body><img alt="bad.png" src="bad.png"></body>"#, "bad.png", None);
    assert!(out.contains(r#"<body><img alt="" src=""></body>"#));
}

#[test]
fn replacement_containing_target_is_not_idempotent() {
    let filter = TextFilter::new(Strategy::Replace("[ab]".into()));
    let once = filter.apply("<body>ab</body>", "ab", None);
    let twice = filter.apply(&once, "ab", None);
    assert!(once.contains("<body>[ab]</body>"));
    assert!(twice.contains("<body>[[ab]]</body>"));
}

#[test]
fn fixed_point_replacement_stabilizes() {
    let filter = TextFilter::default();
    let once = filter.apply("<body>ab</body>", "ab", None);
    let twice = filter.apply(&once, "ab", None);
    assert_eq!(once, twice);
}

#[test]
fn url_attributes_survive_text_filtering() {
    let out = TextFilter::default().apply(r#"<body><a href="ab">ab</a></body>"#, "ab", None);
    assert!(out.contains(r#"<a href="ab">***</a>"#));
}

#[test]
fn target_order_changes_the_result() {
    let store = SettingsStore::default();
    let coordinator = page_censor::Coordinator::new(&store);

    let forward = coordinator.apply_all_text("<body>ab</body>", &["a", "ab"], None);
    let backward = coordinator.apply_all_text("<body>ab</body>", &["ab", "a"], None);

    assert!(forward.contains("<body>***b</body>"));
    assert!(backward.contains("<body>***</body>"));
}

#[test]
fn server_value_absent_resolves_to_empty() {
    let filter = TextFilter::new(Strategy::ReplaceByServerValue(Lookup::Words));
    let data = ModerationResult {
        words: vec!["other".into()],
        filtered_words: vec!["o***".into()],
        ..Default::default()
    };
    let out = filter.apply("<body>aa ab bc</body>", "ab", Some(&data));
    assert!(out.contains("<body>aa  bc</body>"));
}

#[test]
fn metacharacters_match_literally() {
    let out = TextFilter::default().apply("<body>aXb a.b</body>", "a.b", None);
    assert!(out.contains("<body>aXb ***</body>"));
}

#[test]
fn end_to_end_replace() {
    let out = TextFilter::default().apply("<body>aa ab bc</body>", "ab", None);
    assert!(out.contains("<body>aa *** bc</body>"));
}

// ---------------------------------------------------------------------------
// Render worker tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn worker_renders_and_publishes() {
    let page = MemoryPage::new(URL, "<body>aa ab bc</body>");
    let handle = CensorBuilder::new(page.clone()).build();

    handle.submit(text_batch(&page.html(), &["ab"])).unwrap();
    handle.shutdown().await;

    assert_eq!(page.publish_count(), 1);
    assert_eq!(page.html(), "<html><head></head><body>aa *** bc</body></html>");
}

#[tokio::test]
async fn worker_renders_image_batches() {
    let page = MemoryPage::new(URL, r#"<body><img alt="cat" src="bad.png"></body>"#);
    let handle = CensorBuilder::new(page.clone()).build();

    let verdict = ModerationResult {
        urls: vec!["bad.png".into()],
        ..Default::default()
    };
    handle
        .submit(InboundBatch::new(BatchAction::ChangeImageUrl, page.html(), verdict))
        .unwrap();
    handle.shutdown().await;

    let expected = format!(r#"<img alt="cat" src="{DEFAULT_IMAGE_PLACEHOLDER}">"#);
    assert!(page.html().contains(&expected));
}

#[tokio::test]
async fn worker_uses_server_values_for_images() {
    let store = SettingsStore::default();
    store.update(|s| s.image_filter_method = 3);
    let page = MemoryPage::new(URL, r#"<body><img src="bad.png"></body>"#);
    let handle = CensorBuilder::new(page.clone()).settings(store).build();

    let verdict = ModerationResult {
        urls: vec!["bad.png".into()],
        filtered_urls: vec!["safe.png".into()],
        ..Default::default()
    };
    handle
        .submit(InboundBatch::new(BatchAction::ChangeImageUrl, page.html(), verdict))
        .unwrap();
    handle.shutdown().await;

    assert!(page.html().contains(r#"<img src="safe.png">"#));
}

#[tokio::test]
async fn stale_method_batch_is_discarded() {
    let store = SettingsStore::default();
    let page = MemoryPage::new(URL, "<body>aa ab bc</body>");
    let handle = CensorBuilder::new(page.clone()).settings(store.clone()).build();

    // Requested under Replace, answered after the user switched to Remove.
    store.set_value("censorMethod", "2").unwrap();
    let mut verdict = words(&["ab"]);
    verdict.kind = Some(json!("1"));
    handle
        .submit(InboundBatch::new(BatchAction::ChangeContent, page.html(), verdict))
        .unwrap();
    handle.shutdown().await;

    assert_eq!(page.publish_count(), 0);
    assert_eq!(page.html(), "<body>aa ab bc</body>");
}

#[tokio::test]
async fn matching_method_echo_is_applied() {
    let page = MemoryPage::new(URL, "<body>aa ab bc</body>");
    let handle = CensorBuilder::new(page.clone()).build();

    let mut verdict = words(&["ab"]);
    verdict.kind = Some(json!(1));
    verdict.request_url = Some(URL.into());
    handle
        .submit(InboundBatch::new(BatchAction::ChangeContent, page.html(), verdict))
        .unwrap();
    handle.shutdown().await;

    assert!(page.html().contains("<body>aa *** bc</body>"));
}

#[tokio::test]
async fn batch_for_another_url_is_discarded() {
    let page = MemoryPage::new(URL, "<body>aa ab bc</body>");
    let handle = CensorBuilder::new(page.clone()).build();

    page.navigate("https://example.com/next");
    let mut verdict = words(&["ab"]);
    verdict.request_url = Some(URL.into());
    handle
        .submit(InboundBatch::new(BatchAction::ChangeContent, page.html(), verdict))
        .unwrap();
    handle.shutdown().await;

    assert_eq!(page.publish_count(), 0);
}

#[tokio::test]
async fn settings_change_applies_to_next_batch() {
    let store = SettingsStore::default();
    let page = MemoryPage::new(URL, "<body>ab cd</body>");
    let handle = CensorBuilder::new(page.clone()).settings(store.clone()).build();

    handle.submit(text_batch(&page.html(), &["ab"])).unwrap();
    wait_for_publishes(&page, 1).await;
    assert!(page.html().contains("<body>*** cd</body>"));

    assert!(store.update(|s| s.censor_method = 3));
    handle.submit(text_batch(&page.html(), &["cd"])).unwrap();
    handle.shutdown().await;

    // Already rendered content is not re-filtered.
    assert!(page.html().contains("<body>*** <s>cd</s></body>"));
}

#[tokio::test]
async fn shutdown_drains_queued_batches() {
    let page = MemoryPage::new(URL, "<body>a b c</body>");
    let handle = CensorBuilder::new(page.clone()).channel_buffer(8).build();

    let origin = page.html();
    for target in ["a", "b", "c"] {
        handle.submit(text_batch(&origin, &[target])).unwrap();
    }
    handle.shutdown().await;

    assert_eq!(page.publish_count(), 3);
    assert!(page.html().contains("<body>a b ***</body>"));
}

#[tokio::test]
async fn submit_fails_when_buffer_is_full() {
    let page = MemoryPage::new(URL, "<body>ab</body>");
    let handle = CensorBuilder::new(page.clone()).channel_buffer(1).build();

    // The worker has not been polled yet on this single-threaded runtime.
    handle.submit(text_batch("<body>ab</body>", &["ab"])).unwrap();
    let err = handle.submit(text_batch("<body>ab</body>", &["ab"]));
    assert!(matches!(err, Err(CensorError::ChannelClosed)));

    handle.shutdown().await;
    assert_eq!(page.publish_count(), 1);
}

#[tokio::test]
async fn sender_is_refused_after_shutdown() {
    let page = MemoryPage::new(URL, "<body>ab</body>");
    let handle = CensorBuilder::new(page.clone()).build();
    let sender = handle.sender();
    assert!(!sender.is_closed());

    sender.submit(text_batch("<body>ab</body>", &["ab"])).unwrap();
    handle.shutdown().await;

    assert!(sender.is_closed());
    let err = sender.submit(text_batch("<body>ab</body>", &["ab"]));
    assert!(matches!(err, Err(CensorError::ChannelClosed)));
    assert_eq!(page.publish_count(), 1);
}

#[tokio::test]
async fn senders_submit_from_many_tasks() {
    let page = MemoryPage::new(URL, "<body>ab</body>");
    let handle = CensorBuilder::new(page.clone()).channel_buffer(16).build();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let sender = handle.sender();
            tokio::spawn(async move { sender.submit(text_batch("<body>ab</body>", &["ab"])) })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap().unwrap();
    }
    handle.shutdown().await;

    assert_eq!(page.publish_count(), 4);
}

#[tokio::test]
async fn publish_failure_does_not_stop_worker() {
    let page = FailingPage::default();
    let attempts = page.attempts.clone();
    let handle = CensorBuilder::new(page).build();

    handle.submit(text_batch("<body>ab</body>", &["ab"])).unwrap();
    handle.submit_or_log(text_batch("<body>ab</body>", &["ab"]));
    handle.shutdown().await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fs_page_receives_rendered_body() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("pages/example/index.html");
    let handle = CensorBuilder::new(FsPage::new(&target, URL)).build();

    handle.submit(text_batch("<body>aa ab bc</body>", &["ab"])).unwrap();
    handle.shutdown().await;

    let written = tokio::fs::read_to_string(&target).await.unwrap();
    assert_eq!(written, "<html><head></head><body>aa *** bc</body></html>");
}

#[tokio::test]
async fn fs_page_overwrites_previous_render() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("index.html");
    let page = FsPage::new(&target, URL);

    page.publish("<p>first</p>").await.unwrap();
    page.publish("<p>second</p>").await.unwrap();

    let written = tokio::fs::read_to_string(&target).await.unwrap();
    assert_eq!(written, "<p>second</p>");
}

// ---------------------------------------------------------------------------
// Moderation client tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_moderation_posts_request_and_parses_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/text/analyze"))
        .and(body_json(json!({
            "words": ["hello", "ab"],
            "images": [],
            "rate": 50,
            "type": "1",
            "requestUrl": URL,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "words": ["ab"],
            "filteredWords": ["a*"],
            "type": 1,
            "requestUrl": URL,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let moderation = HttpModeration::new(format!("{}/api/text/analyze", server.uri()));
    let request = ModerationRequest::new(vec!["hello".into(), "ab".into()], vec![], 50)
        .with_kind(1)
        .with_request_url(URL);
    let verdict = moderation.analyze(&request).await.unwrap();

    assert_eq!(verdict.words, ["ab"]);
    assert!(verdict.urls.is_empty());
    assert_eq!(verdict.filtered_word("ab"), Some("a*"));
    assert!(verdict.is_current(1, URL));
}

#[tokio::test]
async fn http_moderation_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let moderation = HttpModeration::new(server.uri());
    let request = ModerationRequest::new(vec!["ab".into()], vec![], 50);
    let err = moderation.analyze(&request).await;
    assert!(matches!(err, Err(CensorError::Moderation(_))));
}

#[tokio::test]
async fn http_moderation_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let moderation = HttpModeration::new(server.uri());
    let request = ModerationRequest::new(vec!["ab".into()], vec![], 50);
    let err = moderation.analyze(&request).await;
    assert!(matches!(err, Err(CensorError::Moderation(_))));
}

#[tokio::test]
async fn moderate_page_runs_both_halves() {
    let text = FixedModeration::new(words(&["ab"]));
    let image = FixedModeration::new(ModerationResult {
        urls: vec!["x.png".into()],
        ..Default::default()
    });
    let text_request = ModerationRequest::new(vec!["ab".into()], vec![], 50);
    let image_request = ModerationRequest::new(vec![], vec!["x.png".into()], 50);

    let batches = moderate_page(&text, &image, &text_request, &image_request, "<body></body>")
        .await
        .unwrap();

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].action, BatchAction::ChangeContent);
    assert_eq!(batches[0].targets(), ["ab".to_string()]);
    assert_eq!(batches[1].action, BatchAction::ChangeImageUrl);
    assert_eq!(batches[1].origin_html, "<body></body>");
}

#[tokio::test]
async fn moderate_page_skips_empty_requests() {
    let text = FixedModeration::new(words(&["ab"]));
    let image = FixedModeration::new(ModerationResult::default());
    let text_request = ModerationRequest::new(vec!["ab".into()], vec![], 50);
    let image_request = ModerationRequest::new(vec![], vec![], 50);

    let batches = moderate_page(&text, &image, &text_request, &image_request, "<body></body>")
        .await
        .unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(text.calls(), 1);
    assert_eq!(image.calls(), 0);
}

// ---------------------------------------------------------------------------
// Full round-trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_moderate_and_render() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "words": ["badword"],
            "type": "1",
            "requestUrl": URL,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "urls": ["x.png"],
            "type": 1,
            "requestUrl": URL,
        })))
        .mount(&server)
        .await;

    let store = SettingsStore::default();
    let page = MemoryPage::new(
        URL,
        r#"<body><p>hello badword</p><script>badword()</script><img src="x.png"></body>"#,
    );
    let handle = CensorBuilder::new(page.clone()).settings(store.clone()).build();

    let mut collector = Collector::new();
    assert_eq!(collector.collect(&page.html()).unwrap(), 3);
    let collected = collector.request(store.get().harm_level);
    assert_eq!(collected.words, ["hello", "badword"]);

    let settings = store.get();
    let text = HttpModeration::new(format!("{}/text", server.uri()));
    let text_request = ModerationRequest::new(collected.words, vec![], collected.rate)
        .with_kind(settings.censor_method)
        .with_request_url(URL);
    let batch = moderate(&text, &text_request, BatchAction::ChangeContent, page.html())
        .await
        .unwrap();
    handle.submit(batch).unwrap();
    wait_for_publishes(&page, 1).await;

    let image = HttpModeration::new(format!("{}/image", server.uri()));
    let image_request = ModerationRequest::new(vec![], collected.images, collected.rate)
        .with_kind(settings.image_filter_method)
        .with_request_url(URL);
    let batch = moderate(&image, &image_request, BatchAction::ChangeImageUrl, page.html())
        .await
        .unwrap();
    handle.submit(batch).unwrap();
    handle.shutdown().await;

    let html = page.html();
    assert!(html.contains("<p>hello ***</p>"));
    // The filter walks script content; only extraction skips it.
    assert!(html.contains("<script>***()</script>"));
    assert!(html.contains(&format!(r#"<img src="{DEFAULT_IMAGE_PLACEHOLDER}">"#)));
}
