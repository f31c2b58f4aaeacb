use super::*;
use crate::dispatcher::{run_on_ui, InlineDispatcher, ThreadDispatcher};
use crate::domain::{ErrorCookie, FetchError, NativeError};
use crate::gesture::{AccelerationSample, ShakeConfig, ShakeDetector};
use crate::ui::{CancelHandle, ClosedCallback, ConsoleRenderer, DevMenuView, ProgressView};
use async_trait::async_trait;
use futures::executor::block_on;
use serde_json::json;
use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::mpsc;
use std::time::Duration;

/// Records every renderer call; surfaces are tracked by a console renderer.
struct RecordingRenderer {
    console: ConsoleRenderer,
    log: Arc<Mutex<Vec<String>>>,
    progress_cancelled: Arc<AtomicUsize>,
}

impl RecordingRenderer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            console: ConsoleRenderer::new(io::sink()),
            log: Arc::new(Mutex::new(Vec::new())),
            progress_cancelled: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn push(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn position(&self, entry: &str) -> usize {
        self.log()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry:?} not in {:?}", self.log()))
    }
}

impl Renderer for RecordingRenderer {
    fn show_red_box(&self, view: &RedBoxView, on_closed: ClosedCallback) -> CancelHandle {
        self.push(format!("show_red_box {}", view.title));
        self.console.show_red_box(view, on_closed)
    }

    fn update_red_box(&self, view: &RedBoxView) {
        self.push(format!("update_red_box {}", view.title));
        self.console.update_red_box(view);
    }

    fn show_dev_menu(&self, view: &DevMenuView, on_closed: ClosedCallback) -> CancelHandle {
        self.push("show_dev_menu");
        let console_handle = self.console.show_dev_menu(view, on_closed);
        let log = Arc::clone(&self.log);
        CancelHandle::new(move || {
            log.lock().unwrap().push("menu cancelled".to_string());
            console_handle.cancel();
        })
    }

    fn show_progress(&self, view: &ProgressView) -> CancelHandle {
        assert!(!view.cancellable);
        self.push("show_progress");
        let log = Arc::clone(&self.log);
        let cancelled = Arc::clone(&self.progress_cancelled);
        CancelHandle::new(move || {
            cancelled.fetch_add(1, Ordering::SeqCst);
            log.lock().unwrap().push("progress cancelled".to_string());
        })
    }
}

#[derive(Default)]
struct RecordingCommands {
    files: Mutex<Vec<String>>,
}

#[async_trait]
impl DevCommandsHandler for RecordingCommands {
    async fn reload_from_file(&self, bundle_file: &str) -> Result<()> {
        self.files.lock().unwrap().push(bundle_file.to_string());
        Ok(())
    }
}

enum FetchBehavior {
    Succeed,
    Fail(FetchError),
    /// Runs the hook, then never completes on its own.
    Hang,
}

struct RecordingFetcher {
    behavior: FetchBehavior,
    calls: AtomicUsize,
    on_hang: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl RecordingFetcher {
    fn new(behavior: FetchBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            on_hang: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleFetcher for RecordingFetcher {
    async fn fetch_from_server(&self, _bundle_name: Option<&str>, _token: CancellationToken) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            FetchBehavior::Succeed => Ok(()),
            FetchBehavior::Fail(e) => Err(e.clone().into()),
            FetchBehavior::Hang => {
                let hook = self.on_hang.lock().unwrap().take();
                if let Some(hook) = hook {
                    hook();
                }
                futures::future::pending::<Result<()>>().await
            }
        }
    }
}

struct Harness {
    manager: DevSupportManager,
    renderer: Arc<RecordingRenderer>,
    commands: Arc<RecordingCommands>,
    fetcher: Arc<RecordingFetcher>,
}

fn harness(config: Config, behavior: FetchBehavior) -> Harness {
    let renderer = RecordingRenderer::new();
    let commands = Arc::new(RecordingCommands::default());
    let fetcher = RecordingFetcher::new(behavior);
    let manager = DevSupportManager::builder(
        config,
        Arc::new(InlineDispatcher),
        Arc::clone(&renderer) as Arc<dyn Renderer>,
        Arc::clone(&commands) as Arc<dyn DevCommandsHandler>,
    )
    .fetcher(Arc::clone(&fetcher) as Arc<dyn BundleFetcher>)
    .build();

    Harness {
        manager,
        renderer,
        commands,
        fetcher,
    }
}

fn remote_config() -> Config {
    Config {
        remote_bundle_name: Some("index.windows".to_string()),
        ..Config::default()
    }
}

fn local_config() -> Config {
    Config {
        local_bundle_file: Some("ms-appx:///index.windows.bundle".to_string()),
        ..Config::default()
    }
}

fn stack() -> serde_json::Value {
    json!([{ "file": "App.js", "methodName": "render", "lineNumber": 12, "column": 4 }])
}

#[test]
fn first_scripted_report_wins() {
    let h = harness(Config::default(), FetchBehavior::Succeed);

    for (id, title) in [(1, "first"), (2, "second"), (3, "third")] {
        h.manager.report_scripted_error(title, stack(), id).unwrap();
    }

    let red_box = h.manager.red_box().unwrap();
    assert_eq!(red_box.title, "first");
    assert_eq!(red_box.cookie, ErrorCookie::Script(1));
    assert_eq!(red_box.frames[0].method_name, "render");
    assert_eq!(h.renderer.count("show_red_box"), 1);
}

#[test]
fn update_needs_the_owning_report_id() {
    let h = harness(Config::default(), FetchBehavior::Succeed);
    h.manager.report_scripted_error("original", stack(), 5).unwrap();

    h.manager.update_scripted_error("stale", &json!([]), 6);
    let red_box = h.manager.red_box().unwrap();
    assert_eq!(red_box.title, "original");
    assert_eq!(red_box.frames.len(), 1);

    h.manager.update_scripted_error("symbolicated", &json!([]), 5);
    let red_box = h.manager.red_box().unwrap();
    assert_eq!(red_box.title, "symbolicated");
    assert!(red_box.frames.is_empty());
    assert_eq!(h.renderer.count("update_red_box"), 1);
    assert_eq!(h.renderer.count("show_red_box"), 1);
}

#[test]
fn user_dismiss_allows_a_new_report() {
    let h = harness(Config::default(), FetchBehavior::Succeed);
    h.manager.report_scripted_error("one", stack(), 1).unwrap();

    assert!(h.renderer.console.dismiss_red_box());
    assert!(h.manager.red_box().is_none());

    h.manager.update_scripted_error("late", &stack(), 1);
    assert!(h.manager.red_box().is_none());

    h.manager.report_scripted_error("two", stack(), 2).unwrap();
    let red_box = h.manager.red_box().unwrap();
    assert_eq!(red_box.cookie, ErrorCookie::Script(2));
    assert_eq!(red_box.title, "two");
}

#[test]
fn native_errors_use_the_native_cookie() {
    let h = harness(Config::default(), FetchBehavior::Succeed);

    let error = io::Error::new(io::ErrorKind::NotFound, "module not registered");
    h.manager.handle_exception(error).unwrap();
    h.manager
        .report_native_error("second", NativeError::new("ignored"))
        .unwrap();

    let red_box = h.manager.red_box().unwrap();
    assert_eq!(red_box.cookie, ErrorCookie::Native);
    assert_eq!(red_box.title, "module not registered");
    assert!(!red_box.frames.is_empty());
}

#[test]
fn disabled_manager_hands_errors_back_unchanged() {
    let h = harness(Config::default(), FetchBehavior::Succeed);
    h.manager.set_enabled(false);

    let error = NativeError::new(io::Error::other("X"));
    let returned = h.manager.report_native_error("X", error).unwrap_err();
    let inner = returned.into_inner().downcast::<io::Error>().unwrap();
    assert_eq!(inner.kind(), io::ErrorKind::Other);
    assert_eq!(inner.to_string(), "X");

    let returned = h
        .manager
        .handle_exception(io::Error::new(io::ErrorKind::InvalidData, "bad frame"))
        .unwrap_err();
    assert_eq!(returned.kind(), io::ErrorKind::InvalidData);

    let script = h.manager.report_scripted_error("oops", stack(), 4).unwrap_err();
    assert_eq!(script.id, 4);
    assert_eq!(script.stack, stack());

    assert!(h.manager.red_box().is_none());
    assert_eq!(h.renderer.count("show_red_box"), 0);
}

#[test]
fn dev_menu_opens_once() {
    let h = harness(Config::default(), FetchBehavior::Succeed);

    h.manager.show_dev_menu();
    h.manager.show_dev_menu();

    assert!(h.manager.is_dev_menu_open());
    assert_eq!(h.renderer.count("show_dev_menu"), 1);

    assert!(h.renderer.console.close_menu());
    assert!(!h.manager.is_dev_menu_open());

    h.manager.show_dev_menu();
    assert_eq!(h.renderer.count("show_dev_menu"), 2);
}

#[test]
fn disabled_manager_does_not_show_menu() {
    let config = Config {
        enabled: false,
        ..Config::default()
    };
    let h = harness(config, FetchBehavior::Succeed);

    h.manager.show_dev_menu();

    assert!(!h.manager.is_dev_menu_open());
    assert_eq!(h.renderer.count("show_dev_menu"), 0);
}

#[test]
fn local_bundle_reload_never_fetches() {
    let h = harness(local_config(), FetchBehavior::Succeed);

    block_on(h.manager.reload());

    assert_eq!(*h.commands.files.lock().unwrap(), vec!["ms-appx:///index.windows.bundle"]);
    assert_eq!(h.fetcher.calls(), 0);
    assert!(h.renderer.position("show_progress") < h.renderer.position("progress cancelled"));
    assert_eq!(h.renderer.progress_cancelled.load(Ordering::SeqCst), 1);
    assert!(h.manager.red_box().is_none());
}

#[test]
fn reload_dismisses_the_open_red_box() {
    let h = harness(remote_config(), FetchBehavior::Succeed);
    h.manager.report_scripted_error("boom", stack(), 1).unwrap();
    assert!(h.renderer.console.is_red_box_shown());

    block_on(h.manager.reload());

    assert!(h.manager.red_box().is_none());
    assert!(!h.renderer.console.is_red_box_shown());
    assert_eq!(h.fetcher.calls(), 1);
}

#[test]
fn failed_fetch_closes_progress_once_and_reports() {
    let h = harness(remote_config(), FetchBehavior::Fail(FetchError::Timeout { after_ms: 30_000 }));
    h.manager.report_scripted_error("previous", stack(), 1).unwrap();

    block_on(h.manager.reload());

    assert_eq!(h.renderer.progress_cancelled.load(Ordering::SeqCst), 1);
    let red_box = h.manager.red_box().unwrap();
    assert!(matches!(red_box.cookie, ErrorCookie::Internal(_)));
    assert!(red_box.title.contains("timed out after 30000 ms"), "{}", red_box.title);
    let log = h.renderer.log();
    assert!(log[log.len() - 1].starts_with("show_red_box Unable to reload JavaScript"));
    assert_eq!(log[log.len() - 2], "progress cancelled");

    // Each failure gets its own cookie.
    block_on(h.manager.reload());
    let second = h.manager.red_box().unwrap();
    assert_ne!(second.cookie, red_box.cookie);
    assert_eq!(h.renderer.progress_cancelled.load(Ordering::SeqCst), 2);
}

#[test]
fn default_fetcher_reports_unavailable() {
    let renderer = RecordingRenderer::new();
    let manager = DevSupportManager::builder(
        remote_config(),
        Arc::new(InlineDispatcher),
        Arc::clone(&renderer) as Arc<dyn Renderer>,
        Arc::new(RecordingCommands::default()),
    )
    .build();

    block_on(manager.reload());

    let red_box = manager.red_box().unwrap();
    assert!(red_box.title.contains("Not available"), "{}", red_box.title);
    assert_eq!(renderer.progress_cancelled.load(Ordering::SeqCst), 1);
}

#[test]
fn reload_failure_while_disabled_is_only_logged() {
    let h = harness(remote_config(), FetchBehavior::Fail(FetchError::Network("refused".to_string())));
    h.manager.set_enabled(false);

    block_on(h.manager.reload());

    assert!(h.manager.red_box().is_none());
    assert_eq!(h.renderer.progress_cancelled.load(Ordering::SeqCst), 1);
}

#[test]
fn menu_entry_closes_menu_before_reloading() {
    let h = harness(local_config(), FetchBehavior::Succeed);
    h.manager.show_dev_menu();

    assert!(h.renderer.console.select_menu_entry(0));

    assert!(!h.manager.is_dev_menu_open());
    assert!(h.renderer.position("menu cancelled") < h.renderer.position("show_progress"));
    assert_eq!(h.commands.files.lock().unwrap().len(), 1);

    // The entry is dead once its menu closed.
    assert!(!h.renderer.console.select_menu_entry(0));
    assert_eq!(h.commands.files.lock().unwrap().len(), 1);
}

#[test]
fn shutdown_abandons_in_flight_fetch() {
    let h = harness(remote_config(), FetchBehavior::Hang);
    let manager = h.manager.clone();
    *h.fetcher.on_hang.lock().unwrap() = Some(Box::new(move || manager.shutdown()));

    block_on(h.manager.reload());

    assert_eq!(h.fetcher.calls(), 1);
    assert_eq!(h.renderer.progress_cancelled.load(Ordering::SeqCst), 1);
    assert!(h.manager.red_box().is_none());
}

#[test]
fn reload_after_shutdown_does_nothing() {
    let h = harness(local_config(), FetchBehavior::Succeed);
    h.manager.report_scripted_error("kept", stack(), 2).unwrap();
    h.manager.shutdown();

    block_on(h.manager.reload());

    assert!(h.commands.files.lock().unwrap().is_empty());
    assert_eq!(h.renderer.count("show_progress"), 0);
    assert_eq!(h.manager.red_box().map(|view| view.title), Some("kept".to_string()));
}

#[test]
fn shake_opens_menu_until_shutdown() {
    let detector = ShakeDetector::new(ShakeConfig {
        min_jolts: 1,
        ..ShakeConfig::default()
    });
    let renderer = RecordingRenderer::new();
    let manager = DevSupportManager::builder(
        Config::default(),
        Arc::new(InlineDispatcher),
        Arc::clone(&renderer) as Arc<dyn Renderer>,
        Arc::new(RecordingCommands::default()),
    )
    .gesture(detector.clone())
    .build();
    let jolt = |ms| AccelerationSample {
        x: 0.0,
        y: 4.0,
        z: 0.0,
        timestamp: Duration::from_millis(ms),
    };

    assert!(detector.on_sample(jolt(0)));
    assert!(manager.is_dev_menu_open());

    manager.shutdown();
    assert_eq!(detector.subscriber_count(), 0);
}

#[test]
fn source_urls_follow_configuration() {
    let h = harness(Config::default(), FetchBehavior::Succeed);
    assert_eq!(h.manager.source_url().unwrap(), "");
    assert_eq!(h.manager.source_map_url().unwrap(), "");
    assert!(matches!(h.manager.cached_bundle_file(), Err(DevSupportError::Unavailable(_))));

    let h = harness(remote_config(), FetchBehavior::Succeed);
    assert!(matches!(h.manager.source_url(), Err(DevSupportError::Unavailable(_))));

    let h = harness(
        Config {
            dev_server_host: Some("localhost:8081".to_string()),
            ..remote_config()
        },
        FetchBehavior::Succeed,
    );
    assert_eq!(
        h.manager.source_url().unwrap(),
        "http://localhost:8081/index.windows.bundle?platform=windows&dev=true"
    );
    assert_eq!(
        h.manager.source_map_url().unwrap(),
        "http://localhost:8081/index.windows.map?platform=windows&dev=true"
    );
}

#[test]
fn reports_from_other_threads_land_on_the_ui_thread() {
    let dispatcher: Arc<dyn UiDispatcher> = Arc::new(ThreadDispatcher::spawn("ui-manager-test").unwrap());
    let manager = DevSupportManager::builder(
        Config::default(),
        Arc::clone(&dispatcher),
        RecordingRenderer::new(),
        Arc::new(RecordingCommands::default()),
    )
    .build();

    let reporter = manager.clone();
    std::thread::spawn(move || reporter.report_scripted_error("from worker", stack(), 9).unwrap())
        .join()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    let query = manager.clone();
    run_on_ui(dispatcher.as_ref(), move || {
        tx.send(query.red_box()).unwrap();
    });

    let red_box = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(red_box.cookie, ErrorCookie::Script(9));
}

#[test]
#[should_panic(expected = "off the UI context")]
fn reload_off_the_ui_context_fails_fast() {
    let manager = DevSupportManager::builder(
        local_config(),
        Arc::new(ThreadDispatcher::spawn("ui-reload-test").unwrap()),
        RecordingRenderer::new(),
        Arc::new(RecordingCommands::default()),
    )
    .build();

    let _ = manager.reload();
}

#[tokio::test]
async fn requested_reload_on_ui_thread_reports_failed_fetch() {
    let dispatcher: Arc<dyn UiDispatcher> = Arc::new(ThreadDispatcher::spawn("ui-reload-thread-test").unwrap());
    let renderer = RecordingRenderer::new();
    let fetcher = RecordingFetcher::new(FetchBehavior::Fail(FetchError::Timeout { after_ms: 1 }));
    let manager = DevSupportManager::builder(
        remote_config(),
        Arc::clone(&dispatcher),
        Arc::clone(&renderer) as Arc<dyn Renderer>,
        Arc::new(RecordingCommands::default()),
    )
    .fetcher(Arc::clone(&fetcher) as Arc<dyn BundleFetcher>)
    .build();

    manager.report_scripted_error("before", stack(), 1).unwrap();
    manager.request_reload();

    tokio::time::timeout(Duration::from_secs(5), async {
        while renderer.count("show_red_box Unable to reload JavaScript") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("reload failure was never reported");

    let (tx, rx) = tokio::sync::oneshot::channel();
    let query = manager.clone();
    run_on_ui(dispatcher.as_ref(), move || {
        let _ = tx.send(query.red_box());
    });
    let red_box = rx.await.unwrap().unwrap();

    assert_eq!(red_box.cookie, ErrorCookie::Internal(1));
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(renderer.progress_cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(
        renderer.log(),
        vec![
            "show_red_box before".to_string(),
            "show_progress".to_string(),
            "progress cancelled".to_string(),
            format!("show_red_box {}", red_box.title),
        ]
    );
    assert!(red_box.title.starts_with("Unable to reload JavaScript: "));
}
