use assert_matches::assert_matches;

use storysplice_cloud::local::LocalBlobStore;
use storysplice_cloud::{BlobStore, StorageError, StorageErrorCode};

async fn store(dir: &tempfile::TempDir) -> LocalBlobStore {
    LocalBlobStore::new(dir.path().join("blobs"), "http://host/blobs/".into())
        .await
        .unwrap()
}

#[tokio::test]
async fn put_writes_nested_file_and_returns_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir).await;

    let blob = store
        .put("videos/42/1700_cut.mp4", vec![1, 2, 3], "video/mp4")
        .await
        .unwrap();

    assert_eq!(blob.key, "videos/42/1700_cut.mp4");
    assert_eq!(blob.url, "http://host/blobs/videos/42/1700_cut.mp4");
    let written = tokio::fs::read(store.root().join("videos/42/1700_cut.mp4"))
        .await
        .unwrap();
    assert_eq!(written, vec![1, 2, 3]);
}

#[tokio::test]
async fn put_overwrites_existing_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir).await;

    store.put("a.jpg", vec![1], "image/jpeg").await.unwrap();
    store.put("a.jpg", vec![2, 2], "image/jpeg").await.unwrap();

    let written = tokio::fs::read(store.root().join("a.jpg")).await.unwrap();
    assert_eq!(written, vec![2, 2]);
}

#[tokio::test]
async fn delete_removes_blob_then_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir).await;
    store.put("thumbnails/1/9_thumbnail.jpg", vec![0], "image/jpeg").await.unwrap();

    store.delete("thumbnails/1/9_thumbnail.jpg").await.unwrap();
    assert!(!store.root().join("thumbnails/1/9_thumbnail.jpg").exists());

    let err = store.delete("thumbnails/1/9_thumbnail.jpg").await.unwrap_err();
    assert_matches!(err, StorageError { code: StorageErrorCode::NotFound, .. });
}

#[tokio::test]
async fn traversal_keys_never_touch_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir).await;

    let err = store.put("../escape.txt", vec![1], "text/plain").await.unwrap_err();
    assert_eq!(err.code, StorageErrorCode::InvalidKey);
    assert!(!dir.path().join("escape.txt").exists());
}
