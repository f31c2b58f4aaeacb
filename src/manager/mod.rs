//! The developer-support controller.
//!
//! [`DevSupportManager`] is the facade hosts talk to. Its operations are split
//! by concern across three files:
//!
//! - `errors`: native and scripted error reports, red box updates
//! - `reload`: dismiss, progress indicator, local or remote reload
//! - `menu`: the shake-triggered debug menu
//!
//! All of them funnel state changes through one path: an [`Event`] is applied
//! to [`DevSupportState`] on the UI-affine context, and the resulting
//! [`Action`]s are executed with the state lock released.

mod errors;
mod menu;
mod reload;

#[cfg(test)]
mod tests;

use crate::app::{handle_event, Action, DevSupportState, Event};
use crate::bundle::{BundleFetcher, DevCommandsHandler, DevServerHelper, UnavailableBundleFetcher};
use crate::dispatcher::{assert_on_ui_context, run_on_ui, UiDispatcher};
use crate::domain::error::{DevSupportError, Result};
use crate::domain::{DefaultStackTraceFormatter, StackTraceFormatter};
use crate::gesture::{GestureSource, Subscription};
use crate::ui::{RedBoxView, Renderer};
use crate::Config;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio_util::sync::CancellationToken;

/// Shared core behind every [`DevSupportManager`] clone.
///
/// Renderer callbacks and menu entries hold it weakly so shown artifacts never
/// keep the controller alive.
struct Inner {
    config: Config,
    enabled: AtomicBool,
    dispatcher: Arc<dyn UiDispatcher>,
    renderer: Arc<dyn Renderer>,
    formatter: Arc<dyn StackTraceFormatter>,
    commands: Arc<dyn DevCommandsHandler>,
    fetcher: Arc<dyn BundleFetcher>,
    server: DevServerHelper,
    state: Mutex<DevSupportState>,
    shutdown: CancellationToken,
    next_internal_cookie: AtomicU64,
    gesture: Mutex<Option<Subscription>>,
}

impl Inner {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> MutexGuard<'_, DevSupportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `event` and executes the resulting actions.
    ///
    /// Panics off the UI context. The state lock is released before any action
    /// runs, so renderers may call back in synchronously.
    fn apply(self: &Arc<Self>, event: Event) {
        assert_on_ui_context(self.dispatcher.as_ref());

        let actions = handle_event(&mut self.lock_state(), event);
        for action in actions {
            self.execute(action);
        }
    }

    /// Applies `event` on the UI context, from any thread.
    fn post(self: &Arc<Self>, event: Event) {
        let inner = Arc::clone(self);
        run_on_ui(self.dispatcher.as_ref(), move || inner.apply(event));
    }

    /// Like [`Inner::post`] for callbacks that only hold a weak reference.
    fn post_weak(weak: &Weak<Self>, event: Event) {
        match weak.upgrade() {
            Some(inner) => inner.post(event),
            None => tracing::trace!("controller gone, dropping renderer notification"),
        }
    }

    fn execute(self: &Arc<Self>, action: Action) {
        match action {
            Action::ShowRedBox { generation, view } => {
                let weak = Arc::downgrade(self);
                let handle = self.renderer.show_red_box(
                    &view,
                    Box::new(move || Self::post_weak(&weak, Event::RedBoxClosed { generation })),
                );
                self.apply(Event::RedBoxShown { generation, handle });
            }
            Action::UpdateRedBox(view) => self.renderer.update_red_box(&view),
            Action::ShowDevMenu { generation } => self.open_menu(generation),
            Action::Cancel(handle) => {
                handle.cancel();
            }
        }
    }
}

/// Developer-support controller: red box, debug menu, and reload.
///
/// Cheap to clone; all clones share one controller. Public operations may be
/// called from any thread unless documented otherwise: they are redirected
/// onto the UI-affine context before touching state.
#[derive(Clone)]
pub struct DevSupportManager {
    inner: Arc<Inner>,
}

impl DevSupportManager {
    /// Starts building a controller.
    pub fn builder(
        config: Config,
        dispatcher: Arc<dyn UiDispatcher>,
        renderer: Arc<dyn Renderer>,
        commands: Arc<dyn DevCommandsHandler>,
    ) -> DevSupportManagerBuilder {
        DevSupportManagerBuilder {
            config,
            dispatcher,
            renderer,
            commands,
            formatter: None,
            fetcher: None,
            gesture: None,
        }
    }

    /// Whether errors are captured and the menu can be shown.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Turns developer support on or off at runtime.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.inner.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::info!(enabled, "developer support toggled");
        }
    }

    /// Snapshot of the open red box.
    ///
    /// Must be called on the UI context.
    pub fn red_box(&self) -> Option<RedBoxView> {
        assert_on_ui_context(self.inner.dispatcher.as_ref());
        self.inner.lock_state().overlay.view()
    }

    /// Whether the debug menu is open.
    ///
    /// Must be called on the UI context.
    pub fn is_dev_menu_open(&self) -> bool {
        assert_on_ui_context(self.inner.dispatcher.as_ref());
        self.inner.lock_state().menu.is_open
    }

    /// URL the bundle is loaded from.
    ///
    /// Empty when no remote bundle name is configured.
    ///
    /// # Errors
    ///
    /// [`DevSupportError::Unavailable`] when the development server cannot be
    /// resolved.
    pub fn source_url(&self) -> Result<String> {
        self.inner
            .config
            .remote_bundle_name
            .as_deref()
            .map_or_else(|| Ok(String::new()), |name| self.inner.server.bundle_url(name))
    }

    /// URL of the bundle's source map.
    ///
    /// Empty when no remote bundle name is configured.
    ///
    /// # Errors
    ///
    /// [`DevSupportError::Unavailable`] when the development server cannot be
    /// resolved.
    pub fn source_map_url(&self) -> Result<String> {
        self.inner
            .config
            .remote_bundle_name
            .as_deref()
            .map_or_else(|| Ok(String::new()), |name| self.inner.server.source_map_url(name))
    }

    /// Local file a downloaded bundle would be cached in.
    ///
    /// # Errors
    ///
    /// Always [`DevSupportError::Unavailable`]: bundle caching is not provided.
    pub fn cached_bundle_file(&self) -> Result<String> {
        Err(DevSupportError::Unavailable("cached bundle file selection"))
    }

    /// Abandons any in-flight reload and stops listening for gestures.
    ///
    /// Idempotent. The red box and menu are left as they are.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            tracing::info!("shutting down developer support");
        }
        self.inner.shutdown.cancel();

        let subscription = self
            .inner
            .gesture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(subscription);
    }
}

/// Builder for [`DevSupportManager`].
pub struct DevSupportManagerBuilder {
    config: Config,
    dispatcher: Arc<dyn UiDispatcher>,
    renderer: Arc<dyn Renderer>,
    commands: Arc<dyn DevCommandsHandler>,
    formatter: Option<Arc<dyn StackTraceFormatter>>,
    fetcher: Option<Arc<dyn BundleFetcher>>,
    gesture: Option<Box<dyn GestureSource>>,
}

impl DevSupportManagerBuilder {
    /// Stack formatter. Defaults to [`DefaultStackTraceFormatter`].
    #[must_use]
    pub fn formatter(mut self, formatter: Arc<dyn StackTraceFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Remote bundle fetcher. Defaults to [`UnavailableBundleFetcher`].
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn BundleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Gesture that opens the debug menu. Without one, the menu only opens
    /// through [`DevSupportManager::show_dev_menu`].
    #[must_use]
    pub fn gesture(mut self, source: impl GestureSource + 'static) -> Self {
        self.gesture = Some(Box::new(source));
        self
    }

    /// Creates the controller and subscribes to the gesture source.
    pub fn build(self) -> DevSupportManager {
        let server = DevServerHelper::new(self.config.dev_server_host.clone());
        let inner = Arc::new(Inner {
            enabled: AtomicBool::new(self.config.enabled),
            config: self.config,
            dispatcher: self.dispatcher,
            renderer: self.renderer,
            formatter: self.formatter.unwrap_or_else(|| Arc::new(DefaultStackTraceFormatter)),
            commands: self.commands,
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(UnavailableBundleFetcher)),
            server,
            state: Mutex::new(DevSupportState::new()),
            shutdown: CancellationToken::new(),
            next_internal_cookie: AtomicU64::new(1),
            gesture: Mutex::new(None),
        });

        if let Some(source) = self.gesture {
            let weak = Arc::downgrade(&inner);
            let subscription = source.subscribe(Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.show_dev_menu();
                }
            }));
            if subscription.is_none() {
                tracing::debug!("gesture source unsupported, debug menu is manual only");
            }
            *inner.gesture.lock().unwrap_or_else(PoisonError::into_inner) = subscription;
        }

        tracing::debug!(
            enabled = inner.is_enabled(),
            local_bundle = inner.config.local_bundle_file.is_some(),
            remote_bundle = ?inner.config.remote_bundle_name,
            "developer support manager created"
        );

        DevSupportManager { inner }
    }
}
