//! Integration tests for item downloads against a mock HTTP server

use std::path::PathBuf;

use mockito::Server;
use tempfile::TempDir;

use catalog_crawler::{
    DownloadLink, DownloadOptions, DownloadReport, Downloader, ItemDetail, RemoteFile,
};

mod common;
use common::test_settings;

fn doom(server: &Server) -> ItemDetail {
    let mut detail = ItemDetail::new(format!("{}/game/doom", server.url()));
    detail.name = Some("Doom".to_string());
    detail.platform = Some("DOS".to_string());
    detail.year = Some(1993);
    detail.download_links.push(DownloadLink {
        url: RemoteFile::new(format!("{}/download/doom.zip", server.url())),
        platform: Some("DOS".to_string()),
        ..DownloadLink::default()
    });
    detail.screenshots.insert(
        "DOS".to_string(),
        vec![RemoteFile::new(format!("{}/shots/title.png", server.url()))],
    );
    detail
}

#[tokio::test]
async fn test_files_are_downloaded_once_and_paths_recorded() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path());
    let downloader = Downloader::new(&settings).unwrap();
    let mut detail = doom(&server);

    let _page = server
        .mock("GET", "/game/doom")
        .with_status(200)
        .with_header("set-cookie", "session=abc; Path=/")
        .with_body("<html></html>")
        .create_async()
        .await;
    let archive = server
        .mock("GET", "/download/doom.zip")
        .match_header("referer", detail.page_url.as_str())
        .with_status(200)
        .with_body(b"PK-doom")
        .expect(1)
        .create_async()
        .await;
    let screenshot = server
        .mock("GET", "/shots/title.png")
        .with_status(200)
        .with_body(b"PNG-title")
        .expect(1)
        .create_async()
        .await;

    let report = downloader
        .download_item(&mut detail, DownloadOptions::default())
        .await;
    assert_eq!(
        report,
        DownloadReport {
            downloaded: 2,
            skipped: 0,
            failed: 0,
        }
    );

    let out = dir.path().join("out").join("DOS").join("Doom");
    let archive_path = out.join("files").join("doom.zip");
    let screenshot_path = out.join("screens").join("title.png");
    assert_eq!(
        detail.download_links[0].url.local.as_deref().map(PathBuf::from),
        Some(archive_path.clone())
    );
    assert_eq!(
        detail.screenshots["DOS"][0].local.as_deref().map(PathBuf::from),
        Some(screenshot_path.clone())
    );
    assert_eq!(tokio::fs::read(&archive_path).await.unwrap(), b"PK-doom");
    assert_eq!(tokio::fs::read(&screenshot_path).await.unwrap(), b"PNG-title");

    let info = tokio::fs::read_to_string(out.join("info.json")).await.unwrap();
    let written: ItemDetail = serde_json::from_str(&info).unwrap();
    assert_eq!(written, detail);

    // Files with an existing local copy are not requested again
    let again = downloader
        .download_item(&mut detail, DownloadOptions::default())
        .await;
    assert_eq!(again.skipped, 2);
    assert_eq!(again.downloaded, 0);

    archive.assert_async().await;
    screenshot.assert_async().await;
}

#[tokio::test]
async fn test_failed_download_leaves_local_unset() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path());
    let downloader = Downloader::new(&settings).unwrap();
    let mut detail = doom(&server);

    let _missing = server
        .mock("GET", "/download/doom.zip")
        .with_status(404)
        .create_async()
        .await;

    let report = downloader
        .download_item(
            &mut detail,
            DownloadOptions {
                info: false,
                downloads: true,
                screenshots: false,
            },
        )
        .await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.downloaded, 0);
    assert_eq!(detail.download_links[0].url.local, None);
    assert!(!dir.path().join("out").join("DOS").join("Doom").join("info.json").exists());
}

#[tokio::test]
async fn test_existing_file_of_same_name_is_kept() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path());
    let downloader = Downloader::new(&settings).unwrap();

    let target = dir.path().join("target");
    tokio::fs::create_dir_all(&target).await.unwrap();
    tokio::fs::write(target.join("manual.pdf"), b"local copy")
        .await
        .unwrap();

    let _remote = server
        .mock("GET", "/files/manual.pdf")
        .with_status(200)
        .with_body(b"remote copy")
        .create_async()
        .await;

    let path = downloader
        .download_file(&format!("{}/files/manual.pdf", server.url()), &target, None)
        .await
        .unwrap();

    assert_eq!(path, target.join("manual.pdf"));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"local copy");
}
