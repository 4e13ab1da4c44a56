use super::*;
use crate::notify::NotificationId;
use crate::storage::PendingFile;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(String, NotificationId)>>,
    opened: Mutex<Vec<PathBuf>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }
}

impl Notifier for Recorder {
    fn started(&self, id: NotificationId, _name: &str) {
        self.events.lock().unwrap().push(("started".into(), id));
    }
    fn completed(&self, id: NotificationId, _name: &str, _open: &OpenAction) {
        self.events.lock().unwrap().push(("completed".into(), id));
    }
    fn error(&self, id: NotificationId, _message: &str) {
        self.events.lock().unwrap().push(("error".into(), id));
    }
}

impl FileOpener for Recorder {
    fn open(&self, action: &OpenAction) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(action.path.clone());
        anyhow::bail!("no viewer")
    }
}

/// Fails after the reservation exists, before anything is published.
struct FailingWrites(DownloadsDir);

impl PublicStore for FailingWrites {
    fn reserve(&self, name: &str, size_hint: Option<u64>) -> Result<PendingFile> {
        self.0.reserve(name, size_hint)
    }
    fn write(&self, pending: &mut PendingFile, bytes: &[u8]) -> Result<()> {
        pending.write_all(&bytes[..bytes.len() / 2])?;
        anyhow::bail!("device removed")
    }
}

struct FixedPicker(Option<PathBuf>);

#[async_trait]
impl SaveLocationPicker for FixedPicker {
    async fn pick(&self, _name: &str, _mime: &str) -> anyhow::Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}

struct BrokenPicker;

#[async_trait]
impl SaveLocationPicker for BrokenPicker {
    async fn pick(&self, _name: &str, _mime: &str) -> anyhow::Result<Option<PathBuf>> {
        anyhow::bail!("no window")
    }
}

fn request(name: &str) -> DownloadRequest {
    DownloadRequest::named("https://x.com/f", name, "text/plain", "ua", None)
}

fn finalizer(store: Arc<dyn PublicStore>, rec: &Arc<Recorder>) -> Finalizer {
    Finalizer::new(store, rec.clone(), rec.clone())
}

#[tokio::test]
async fn saves_bytes_and_notifies_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Arc::new(Recorder::default());
    let store = Arc::new(DownloadsDir::new(dir.path()));
    let f = finalizer(store.clone(), &rec);

    let out = f
        .finalize(&request("hello.txt"), Payload::Bytes(b"hello".to_vec()))
        .await
        .unwrap();

    let path = dir.path().join("hello.txt");
    assert_eq!(out, FinalizeOutcome::Saved(path.clone()));
    assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    assert_eq!(rec.kinds(), vec!["started", "completed"]);
    let events = rec.events.lock().unwrap();
    assert_eq!(events[0].1, events[1].1);
    // Opener failure does not turn a saved file into an error.
    assert_eq!(rec.opened.lock().unwrap().as_slice(), &[path]);
    assert_eq!(store.list_finished().unwrap().len(), 1);
}

#[tokio::test]
async fn failure_between_reserve_and_publish_leaves_nothing_visible() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Arc::new(Recorder::default());
    let f = finalizer(Arc::new(FailingWrites(DownloadsDir::new(dir.path()))), &rec);

    let err = f
        .finalize(&request("doc.pdf"), Payload::Bytes(vec![7u8; 4096]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("device removed"));

    assert!(DownloadsDir::new(dir.path()).list_finished().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(rec.kinds(), vec!["started", "error"]);
    assert!(rec.opened.lock().unwrap().is_empty());
}

#[test]
fn failed_preallocation_discards_the_reservation() {
    let dir = tempfile::tempdir().unwrap();
    let store = DownloadsDir::new(dir.path());

    assert!(store.reserve("big.bin", Some(u64::MAX)).is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn staged_file_is_copied_then_removed() {
    let dir = tempfile::tempdir().unwrap();
    let staging_dir = tempfile::tempdir().unwrap();
    let staging = staging_dir.path().join("123.tmp");
    std::fs::write(&staging, vec![1u8; 200_000]).unwrap();

    let rec = Arc::new(Recorder::default());
    let f = finalizer(Arc::new(DownloadsDir::new(dir.path())), &rec);
    let out = f
        .finalize(&request("big.bin"), Payload::Staged(staging.clone()))
        .await
        .unwrap();

    let FinalizeOutcome::Saved(path) = out else {
        panic!("expected saved");
    };
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 200_000);
    assert!(!staging.exists());
}

#[tokio::test]
async fn missing_staging_file_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Arc::new(Recorder::default());
    let f = finalizer(Arc::new(DownloadsDir::new(dir.path())), &rec);

    let err = f
        .finalize(&request("gone.bin"), Payload::Staged(dir.path().join("nope.tmp")))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DownloadError>(),
        Some(DownloadError::StagingMissing(_))
    ));
    assert_eq!(rec.kinds(), vec!["started", "error"]);
    assert!(DownloadsDir::new(dir.path()).list_finished().unwrap().is_empty());
}

#[tokio::test]
async fn same_name_does_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Arc::new(Recorder::default());
    let f = finalizer(Arc::new(DownloadsDir::new(dir.path())), &rec);

    f.finalize(&request("a.txt"), Payload::Bytes(b"one".to_vec())).await.unwrap();
    f.finalize(&request("a.txt"), Payload::Bytes(b"two".to_vec())).await.unwrap();

    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"one");
    assert_eq!(std::fs::read(dir.path().join("a (1).txt")).unwrap(), b"two");
}

#[tokio::test]
async fn user_chosen_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("picked").join("mine.txt");
    let rec = Arc::new(Recorder::default());
    let f = finalizer(Arc::new(DownloadsDir::new(dir.path().join("dl"))), &rec)
        .with_picker(Arc::new(FixedPicker(Some(target.clone()))));

    let out = f
        .finalize(&request("x.txt"), Payload::Bytes(b"data".to_vec()))
        .await
        .unwrap();
    assert_eq!(out, FinalizeOutcome::Saved(target.clone()));
    assert_eq!(std::fs::read(target).unwrap(), b"data");
}

#[tokio::test]
async fn dismissed_or_unavailable_picker_cancels_silently() {
    let dir = tempfile::tempdir().unwrap();
    let rec = Arc::new(Recorder::default());

    let dismissed = finalizer(Arc::new(DownloadsDir::new(dir.path())), &rec)
        .with_picker(Arc::new(FixedPicker(None)));
    let out = dismissed
        .finalize(&request("x.txt"), Payload::Bytes(b"data".to_vec()))
        .await
        .unwrap();
    assert_eq!(out, FinalizeOutcome::Cancelled);

    let broken = finalizer(Arc::new(DownloadsDir::new(dir.path())), &rec)
        .with_picker(Arc::new(BrokenPicker));
    let out = broken
        .finalize(&request("x.txt"), Payload::Bytes(b"data".to_vec()))
        .await
        .unwrap();
    assert_eq!(out, FinalizeOutcome::Cancelled);

    assert!(rec.kinds().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
