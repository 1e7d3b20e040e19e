use std::time::Duration;

use biblot::error::ResolveError;
use biblot::fetch::PassageFetcher;
use biblot::resolver::{PassageKind, ReferenceResolver};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JUAN_3_16: &str = r##"<!DOCTYPE html>
<html>
<head>
<title>Juan 3:16 RVR1960 - Bible Gateway</title>
<script>window.dataLayer = []; if (a < b) { track(); }</script>
<style>.passage-text { font-size: 1em; }</style>
</head>
<body>
<div class="passage-col">
<div class="passage-text version-RVR1960"><p class="verse"><span class="text Juan-3-16"><sup class="versenum">16 </sup>Porque de tal manera amó Dios...<sup class="crossreference">(<a href="#cRVR1960-26131A">A</a>)</sup></span></p><a class="full-chap-link" href="/passage/?search=Juan%203">Read full chapter</a><div class="crossrefs"><h4>Cross references</h4><ol><li>Juan 3:16 : Ro 5:8</li></ol></div><a href="/verse/es/Juan%203:16">Juan 3:16 in all Spanish translations</a></div>
</div>
</body>
</html>"##;

const SALMOS_23: &str = r##"<html><body>
<div class="passage-text"><h3>Jehová es mi pastor</h3><p><span class="chapternum">23 </span>Jehová es mi pastor; nada me faltará.</p><p><sup class="versenum">2 </sup>En lugares de delicados pastos me hará descansar(A).</p><a href="#">Read full chapter</a></div>
</body></html>"##;

const NO_RESULTS: &str = r#"<html><body>
<div class="search-results"><h3>No results found.</h3></div>
</body></html>"#;

fn resolver_for(server: &MockServer) -> ReferenceResolver {
    let base_url = format!("{}/passage/?search=", server.uri());
    let fetcher = PassageFetcher::new(base_url, Duration::from_secs(5)).unwrap();
    ReferenceResolver::new(fetcher, "RVR1960")
}

fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_resolve_verse_returns_clean_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passage/"))
        .and(query_param("search", "Juan 3:16"))
        .and(query_param("version", "RVR1960"))
        .respond_with(page(JUAN_3_16))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let text = resolver.resolve_verse("Juan 3:16").await.unwrap();

    assert_eq!(text, "Porque de tal manera amó Dios...");
}

#[tokio::test]
async fn test_resolve_verse_flat_container() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page(
            r#"<div class="passage-text">16 Porque de tal manera amó Dios... (A) Read full chapter</div>"#,
        ))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let text = resolver.resolve_verse("Juan 3:16").await.unwrap();

    assert_eq!(text, "Porque de tal manera amó Dios...");
}

#[tokio::test]
async fn test_resolve_chapter_with_optional_end_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page(
            "<!DOCTYPE html><html><head><title>Juan 3</title><body>\
             <div class=\"passage-text\"><p>16 Porque de tal manera amó Dios\
             <p>17 Porque no envió Dios a su Hijo(A)</div>",
        ))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let text = resolver.resolve_chapter("Juan 3").await.unwrap();

    assert_eq!(
        text,
        "16 Porque de tal manera amó Dios\n17 Porque no envió Dios a su Hijo"
    );
}

#[tokio::test]
async fn test_requests_carry_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .respond_with(page(JUAN_3_16))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    resolver.resolve_verse("Juan 3:16").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(agent.contains("Chrome/91"));
    let language = requests[0]
        .headers
        .get("accept-language")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(language.starts_with("es-ES"));
}

#[tokio::test]
async fn test_translation_override_changes_version_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("version", "NVI"))
        .respond_with(page(JUAN_3_16))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server).with_version("NVI");
    assert_eq!(resolver.version(), "NVI");
    resolver.resolve_verse("Juan 3:16").await.unwrap();
}

#[tokio::test]
async fn test_resolve_chapter_keeps_verse_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("search", "Salmos 23"))
        .respond_with(page(SALMOS_23))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let text = resolver.resolve_chapter("Salmos 23").await.unwrap();

    assert!(text.starts_with("Jehová es mi pastor\n23 Jehová es mi pastor; nada me faltará."));
    assert!(text.contains("2 En lugares de delicados pastos me hará descansar."));
    assert!(!text.contains("(A)"));
    assert!(!text.contains("Read full chapter"));
}

#[tokio::test]
async fn test_missing_container_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page(NO_RESULTS))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let err = resolver.resolve_verse("Libro 99:99").await.unwrap_err();

    assert!(matches!(err, ResolveError::NotFound { .. }));
    assert_eq!(err.reference(), "Libro 99:99");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_empty_container_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page(r#"<div class="passage-text"><a>Read full chapter</a></div>"#))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let err = resolver.resolve_verse("Juan 3:16").await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[tokio::test]
async fn test_server_error_is_retryable_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let err = resolver
        .resolve("Juan 3:16", PassageKind::Verse)
        .await
        .unwrap_err();

    match &err {
        ResolveError::FetchStatus { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected FetchStatus, got {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_source_is_fetch_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base_url = format!("http://127.0.0.1:{}/passage/?search=", port);

    let fetcher = PassageFetcher::new(base_url, Duration::from_secs(2)).unwrap();
    let resolver = ReferenceResolver::new(fetcher, "RVR1960");
    let err = resolver.resolve_verse("Juan 3:16").await.unwrap_err();

    assert!(matches!(err, ResolveError::Fetch { .. }));
    assert!(err.is_retryable());
}
