use foi_torrent::adapters::DfatAdapter;
use foi_torrent::config::HttpConfig;
use foi_torrent::contract::{MockPackager, RecordStore};
use foi_torrent::fetch::HttpFetcher;
use foi_torrent::paths::sanitize_archive_name;
use foi_torrent::request::{Organisation, RecordFilter};
use foi_torrent::retrieve::content_hash;
use foi_torrent::scrape::Scraper;
use foi_torrent::store::JsonFileStore;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOC_BYTES: &[u8] = b"%PDF-1.4\n% not really a pdf\n";

fn listing() -> String {
    r#"<html><body>
<table id="requests">
  <thead><tr><th>Reference</th><th>Date</th><th>Description</th><th>Documents</th><th>Decision</th></tr></thead>
  <tbody>
    <tr><td>13/12345</td><td>5 July 2013</td><td>Cables concerning a trade delegation</td><td><a href="/foi/doc1.pdf">Decision letter</a></td><td>Released in part</td></tr>
    <tr><td colspan="5">Archived entries</td></tr>
  </tbody>
</table>
</body></html>"#
        .to_string()
}

async fn agency_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foi/disclosure-log.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/foi/doc1.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(DOC_BYTES.to_vec()))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn dfat_row_is_captured_end_to_end_and_not_rediscovered() {
    let server = agency_server().await;
    let tmp = tempdir().unwrap();
    let path_root = tmp.path().join("requests");
    let archive_root = tmp.path().join("torrents");

    let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();
    let adapter = DfatAdapter::with_base_url(server.uri());

    let mut packager = MockPackager::new();
    let torrent_root = archive_root.clone();
    packager
        .expect_package()
        .times(1)
        .returning(move |_dir, name| Ok(torrent_root.join(sanitize_archive_name(name))));
    packager.expect_announce().times(1).returning(|_, _| Ok(()));

    let scraper = Scraper::new(&fetcher, &store, &packager, path_root.clone());
    let report = scraper.scrape(&adapter).await.expect("run should succeed");

    assert_eq!(report.organisation, Organisation::Dfat);
    assert_eq!(report.discovered, 1);
    assert!(report.failed.is_empty(), "unexpected failures: {:?}", report.failed);
    assert_eq!(report.persisted.len(), 1);
    assert!(report.persisted[0].announced);

    let stored = store
        .find_one(&RecordFilter::by_reference("13/12345"))
        .await
        .unwrap()
        .expect("request should be persisted");
    assert_eq!(stored.organisation, Organisation::Dfat);
    assert_eq!(stored.reference.as_deref(), Some("13/12345"));
    assert_eq!(stored.archive_name.as_deref(), Some("13_12345.torrent"));
    assert_eq!(stored.documents.len(), 1);

    let doc = &stored.documents[0];
    assert_eq!(doc.filename, "doc1.pdf");
    assert_eq!(doc.original_url, format!("{}/foi/doc1.pdf", server.uri()));
    assert_eq!(doc.size, Some(DOC_BYTES.len() as u64));

    let on_disk = fs::read(path_root.join("dfat/2013/07/13_12345/doc1.pdf")).unwrap();
    assert_eq!(on_disk, DOC_BYTES);
    assert_eq!(doc.content_hash.as_deref(), Some(content_hash(&on_disk).as_str()));

    // Second pass over the unchanged listing finds nothing new.
    let idle_packager = MockPackager::new();
    let scraper = Scraper::new(&fetcher, &store, &idle_packager, path_root);
    let report = scraper.scrape(&adapter).await.unwrap();
    assert_eq!(report.discovered, 0);
    assert!(report.persisted.is_empty());
    assert_eq!(store.list(Some(Organisation::Dfat)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_start_page_aborts_the_run() {
    let server = MockServer::start().await;
    let tmp = tempdir().unwrap();

    let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
    let store = JsonFileStore::open(tmp.path().join("requests.jsonl")).unwrap();
    let packager = MockPackager::new();
    let scraper = Scraper::new(&fetcher, &store, &packager, tmp.path().join("requests"));

    let err = scraper
        .scrape(&DfatAdapter::with_base_url(server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, foi_torrent::error::ScrapeError::StartPage(_)),
        "got {err:?}"
    );
}
