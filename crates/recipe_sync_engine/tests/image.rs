use std::sync::{Arc, Once};

use recipe_sync_engine::{
    attach_cover_image, try_attach_cover_image, AttachResult, ContentStore, EntryFields, EntryId,
    FetchSettings, ImageAttachError, MemoryContentStore, PostStatus, ReqwestHttpClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sync_logging::initialize_for_tests);
}

fn store_with_entry() -> (Arc<MemoryContentStore>, EntryId) {
    let store = Arc::new(MemoryContentStore::new());
    let id = store
        .create_entry(
            &EntryFields {
                kind: "recipe".into(),
                title: "Bigos".into(),
                content: String::new(),
                status: PostStatus::Draft,
                author: 1,
            },
            "2024-01-01T00:00:00+00:00",
        )
        .unwrap();
    (store, id)
}

fn client() -> ReqwestHttpClient {
    ReqwestHttpClient::new(FetchSettings::default()).unwrap()
}

#[tokio::test]
async fn downloads_and_attaches_cover() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/bigos%20duzy.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (store, entry) = store_with_entry();
    let url = format!("{}/img/bigos%20duzy.png", server.uri());
    let result = try_attach_cover_image(store.as_ref(), &client(), entry, &url)
        .await
        .unwrap();

    let AttachResult::Attached(media_id) = result else {
        panic!("expected a new attachment, got {result:?}");
    };
    let media = store.media(media_id).unwrap();
    assert_eq!(media.filename, "bigos duzy.png");
    assert_eq!(media.byte_len, 4);
    assert_eq!(store.entry(entry).unwrap().cover_image, Some(media_id));
}

#[tokio::test]
async fn existing_cover_short_circuits() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let (store, entry) = store_with_entry();
    let first = format!("{}/a.jpg", server.uri());
    assert!(attach_cover_image(store.as_ref(), &client(), entry, &first).await);

    let other = format!("{}/b.jpg", server.uri());
    let result = try_attach_cover_image(store.as_ref(), &client(), entry, &other)
        .await
        .unwrap();
    assert_eq!(result, AttachResult::AlreadyPresent);
    assert!(attach_cover_image(store.as_ref(), &client(), entry, &other).await);
}

#[tokio::test]
async fn rejects_non_http_urls_without_fetching() {
    init_logging();
    let (store, entry) = store_with_entry();

    for url in ["not a url", "ftp://example.com/a.jpg", "file:///etc/passwd"] {
        let err = try_attach_cover_image(store.as_ref(), &client(), entry, url)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageAttachError::InvalidUrl(_)), "{url}: {err}");
    }
    assert!(!attach_cover_image(store.as_ref(), &client(), entry, "not a url").await);
    assert!(store.entry(entry).unwrap().cover_image.is_none());
}

#[tokio::test]
async fn non_200_leaves_entry_untouched() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (store, entry) = store_with_entry();
    let url = format!("{}/missing.jpg", server.uri());
    let err = try_attach_cover_image(store.as_ref(), &client(), entry, &url)
        .await
        .unwrap_err();

    assert!(matches!(err, ImageAttachError::HttpStatus(404)));
    assert!(!attach_cover_image(store.as_ref(), &client(), entry, &url).await);
    assert!(store.entry(entry).unwrap().cover_image.is_none());
}

#[tokio::test]
async fn empty_body_is_not_stored() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (store, entry) = store_with_entry();
    let url = format!("{}/empty.jpg", server.uri());
    let err = try_attach_cover_image(store.as_ref(), &client(), entry, &url)
        .await
        .unwrap_err();

    assert!(matches!(err, ImageAttachError::EmptyBody));
    assert!(store.entry(entry).unwrap().cover_image.is_none());
}

#[tokio::test]
async fn unknown_entry_surfaces_store_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .mount(&server)
        .await;

    let store = MemoryContentStore::new();
    let url = format!("{}/a.jpg", server.uri());
    let err = try_attach_cover_image(&store, &client(), EntryId(99), &url)
        .await
        .unwrap_err();

    assert!(matches!(err, ImageAttachError::Store(_)));
}
