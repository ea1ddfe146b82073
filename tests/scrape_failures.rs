use foi_torrent::adapters::DfatAdapter;
use foi_torrent::contract::{MockFetcher, MockPackager, MockRecordStore, RecordStore};
use foi_torrent::error::{
    AnnounceError, ExtractionError, FetchError, PackagingError, RequestError, RetrievalError,
    ScrapeError,
};
use foi_torrent::fetch::Page;
use foi_torrent::scrape::Scraper;
use foi_torrent::store::JsonFileStore;
use std::path::PathBuf;
use tempfile::tempdir;

fn row(reference: &str, documents: &str) -> String {
    format!(
        "<tr><td>{reference}</td><td>5 July 2013</td><td>Desc</td><td>{documents}</td><td>Full</td></tr>"
    )
}

fn listing_fetcher(rows: Vec<String>) -> MockFetcher {
    let markup = format!(
        r#"<table id="requests"><tbody>{}</tbody></table>"#,
        rows.concat()
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch_page()
        .times(1)
        .returning(move |url| Ok(Page::new(url.to_string(), markup.clone())));
    fetcher
}

fn adapter() -> DfatAdapter {
    DfatAdapter::with_base_url("http://dfat.test")
}

fn ok_packager() -> MockPackager {
    let mut packager = MockPackager::new();
    packager
        .expect_package()
        .returning(|_, name| Ok(PathBuf::from("torrents").join(name.replace('/', "_"))));
    packager.expect_announce().returning(|_, _| Ok(()));
    packager
}

#[tokio::test]
async fn mailto_anchor_discards_the_whole_request() {
    let tmp = tempdir().unwrap();
    // fetch_bytes has no expectation: any download would panic.
    let fetcher = listing_fetcher(vec![row(
        "13/1",
        r#"<a href="/foi/a.pdf">A</a><a href="mailto:foi@dfat.gov.au">Ask us</a>"#,
    )]);
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();
    let packager = MockPackager::new();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path().join("requests"));
    let report = scraper.scrape(&adapter()).await.unwrap();

    assert_eq!(report.discovered, 1);
    assert!(report.persisted.is_empty());
    assert!(matches!(
        report.failed[0].error,
        RequestError::Extraction(ExtractionError::InvalidAnchor(_))
    ));
    assert!(store.list(None).await.unwrap().is_empty());
    assert!(!tmp.path().join("requests").exists());
}

#[tokio::test]
async fn anchor_without_href_discards_the_whole_request() {
    let mut store = MockRecordStore::new();
    store.expect_find_one().returning(|_| Ok(None));
    store.expect_insert().never();
    let fetcher = listing_fetcher(vec![row("13/1", r#"<a href="/foi/a.pdf">A</a><a>B</a>"#)]);
    let packager = MockPackager::new();
    let tmp = tempdir().unwrap();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path());
    let report = scraper.scrape(&adapter()).await.unwrap();
    assert!(matches!(
        report.failed[0].error,
        RequestError::Extraction(ExtractionError::InvalidAnchor(_))
    ));
}

#[tokio::test]
async fn request_without_documents_is_not_persisted() {
    let mut store = MockRecordStore::new();
    store.expect_find_one().returning(|_| Ok(None));
    store.expect_insert().never();
    let fetcher = listing_fetcher(vec![row("13/1", "Refused")]);
    let packager = MockPackager::new();
    let tmp = tempdir().unwrap();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path());
    let report = scraper.scrape(&adapter()).await.unwrap();
    assert!(matches!(report.failed[0].error, RequestError::NoDocuments));
}

#[tokio::test]
async fn failed_download_aborts_before_packaging() {
    let tmp = tempdir().unwrap();
    let mut fetcher = listing_fetcher(vec![row(
        "13/1",
        r#"<a href="/foi/a.pdf">A</a><a href="/foi/b.pdf">B</a>"#,
    )]);
    fetcher.expect_fetch_bytes().times(2).returning(|url| {
        if url.ends_with("a.pdf") {
            Ok(b"first".to_vec())
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    });
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();
    let packager = MockPackager::new();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path().join("requests"));
    let report = scraper.scrape(&adapter()).await.unwrap();

    assert!(matches!(report.failed[0].error, RequestError::Retrieval(_)));
    assert!(store.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn packaging_failure_discards_request_and_run_continues() {
    let tmp = tempdir().unwrap();
    let mut fetcher = listing_fetcher(vec![
        row("13/1", r#"<a href="/foi/one.pdf">One</a>"#),
        row("13/2", r#"<a href="/foi/two.pdf">Two</a>"#),
    ]);
    fetcher
        .expect_fetch_bytes()
        .times(2)
        .returning(|url| Ok(url.as_bytes().to_vec()));
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();

    let mut packager = MockPackager::new();
    packager.expect_package().times(2).returning(|_, name| {
        if name.starts_with("13/1") {
            Err(PackagingError::EmptyCommand)
        } else {
            Ok(PathBuf::from("torrents/13_2.torrent"))
        }
    });
    packager.expect_announce().times(1).returning(|_, _| Ok(()));

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path().join("requests"));
    let report = scraper.scrape(&adapter()).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].title, "13/1");
    assert!(matches!(report.failed[0].error, RequestError::Packaging(_)));
    assert_eq!(report.persisted.len(), 1);
    assert_eq!(report.persisted[0].archive_name, "13_2.torrent");

    let stored = store.list(None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].reference.as_deref(), Some("13/2"));
}

#[tokio::test]
async fn announce_failure_still_persists() {
    let tmp = tempdir().unwrap();
    let mut fetcher = listing_fetcher(vec![row("13/1", r#"<a href="/foi/one.pdf">One</a>"#)]);
    fetcher
        .expect_fetch_bytes()
        .times(1)
        .returning(|_| Ok(b"bytes".to_vec()));
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();

    let mut packager = MockPackager::new();
    packager
        .expect_package()
        .times(1)
        .returning(|_, _| Ok(PathBuf::from("torrents/13_1.torrent")));
    packager
        .expect_announce()
        .times(1)
        .returning(|_, _| Err(AnnounceError::EmptyCommand));

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path().join("requests"));
    let report = scraper.scrape(&adapter()).await.unwrap();

    assert_eq!(report.persisted.len(), 1);
    assert!(!report.persisted[0].announced);
    let stored = store.list(None).await.unwrap();
    assert_eq!(stored[0].archive_name.as_deref(), Some("13_1.torrent"));
    assert!(stored[0].documents[0].content_hash.is_some());
}

#[tokio::test]
async fn dedup_lookup_failure_aborts_the_run() {
    let fetcher = listing_fetcher(vec![row("13/1", r#"<a href="/foi/one.pdf">One</a>"#)]);
    let mut store = MockRecordStore::new();
    store
        .expect_find_one()
        .returning(|_| Err(foi_torrent::error::StoreError::Poisoned));
    let packager = ok_packager();
    let tmp = tempdir().unwrap();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path());
    let err = scraper.scrape(&adapter()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Discovery(_)));
}

#[tokio::test]
async fn store_insert_failure_only_skips_that_request() {
    let mut fetcher = listing_fetcher(vec![
        row("13/1", r#"<a href="/foi/one.pdf">One</a>"#),
        row("13/2", r#"<a href="/foi/two.pdf">Two</a>"#),
    ]);
    fetcher
        .expect_fetch_bytes()
        .returning(|url| Ok(url.as_bytes().to_vec()));
    let mut store = MockRecordStore::new();
    store.expect_find_one().returning(|_| Ok(None));
    store.expect_insert().times(2).returning(|request| {
        if request.title == "13/1" {
            Err(foi_torrent::error::StoreError::Poisoned)
        } else {
            Ok("id-2".to_string())
        }
    });
    let packager = ok_packager();
    let tmp = tempdir().unwrap();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path());
    let report = scraper.scrape(&adapter()).await.unwrap();
    assert!(matches!(report.failed[0].error, RequestError::Store(_)));
    assert_eq!(report.persisted[0].id, "id-2");
}

#[tokio::test]
async fn encoded_path_in_document_link_discards_the_request() {
    let tmp = tempdir().unwrap();
    // fetch_bytes has no expectation: the filename is refused before download.
    let fetcher = listing_fetcher(vec![row(
        "13/1",
        r#"<a href="/foi/..%2F..%2Fescaped.pdf">Decision</a>"#,
    )]);
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();
    let packager = MockPackager::new();

    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path().join("requests"));
    let report = scraper.scrape(&adapter()).await.unwrap();

    assert!(matches!(
        report.failed[0].error,
        RequestError::Retrieval(RetrievalError::UnsafeFilename { .. })
    ));
    assert!(store.list(None).await.unwrap().is_empty());
    assert!(!tmp.path().join("requests/dfat/2013/escaped.pdf").exists());
}
