//! Reload coordination.
//!
//! A reload closes any open red box, shows a progress indicator, and hands
//! off to either the local bundle file or the development server. The
//! indicator is owned by a [`ReloadSession`] and closed when the session is
//! dropped, so it goes away on every exit path.

use super::{DevSupportManager, Inner};
use crate::app::Event;
use crate::dispatcher::{assert_on_ui_context, spawn_on_ui};
use crate::domain::error::{DevSupportError, Result};
use crate::domain::{ErrorCookie, ErrorReport, NativeError};
use crate::ui::{CancelHandle, ProgressView};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Resources held for the duration of one reload.
struct ReloadSession {
    progress: CancelHandle,
    token: CancellationToken,
}

impl ReloadSession {
    fn start(inner: &Inner) -> Self {
        Self {
            progress: inner.renderer.show_progress(&ProgressView::reloading()),
            token: inner.shutdown.child_token(),
        }
    }
}

impl Drop for ReloadSession {
    fn drop(&mut self) {
        self.token.cancel();
        self.progress.cancel();
    }
}

impl Inner {
    pub(super) fn request_reload(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        spawn_on_ui(self.dispatcher.as_ref(), async move { inner.reload().await });
    }

    async fn reload(self: Arc<Self>) {
        let source = if self.config.local_bundle_file.is_some() { "file" } else { "server" };
        let span = tracing::info_span!("reload", source);

        async {
            if self.shutdown.is_cancelled() {
                tracing::debug!("controller shut down, skipping reload");
                return;
            }

            self.apply(Event::DismissRedBox);

            let outcome = {
                let session = ReloadSession::start(&self);
                match self.config.local_bundle_file.as_deref() {
                    Some(file) => self.commands.reload_from_file(file).await,
                    None => self.fetch_from_server(&session.token).await,
                }
            };

            match outcome {
                Ok(()) => tracing::info!("reload complete"),
                Err(DevSupportError::Cancelled) => tracing::debug!("reload abandoned"),
                Err(e) => self.report_reload_failure(e),
            }
        }
        .instrument(span)
        .await;
    }

    async fn fetch_from_server(&self, token: &CancellationToken) -> Result<()> {
        let bundle_name = self.config.remote_bundle_name.as_deref();
        tokio::select! {
            biased;
            () = token.cancelled() => Err(DevSupportError::Cancelled),
            result = self.fetcher.fetch_from_server(bundle_name, token.clone()) => result,
        }
    }

    fn report_reload_failure(self: &Arc<Self>, error: DevSupportError) {
        tracing::error!(error = %error, "reload failed");
        if !self.is_enabled() {
            return;
        }

        let cookie = ErrorCookie::Internal(self.next_internal_cookie.fetch_add(1, Ordering::Relaxed));
        let title = format!("Unable to reload JavaScript: {error}");
        let frames = self.formatter.format_native(&NativeError::new(error));
        self.apply(Event::ReportError(ErrorReport::new(cookie, title, frames)));
    }
}

impl DevSupportManager {
    /// Reloads the application bundle.
    ///
    /// 1. Closes the red box, if open.
    /// 2. Shows a non-cancellable progress indicator.
    /// 3. Reloads from the configured local bundle file, or else fetches from
    ///    the development server.
    /// 4. Closes the progress indicator, whatever the outcome.
    ///
    /// A failed reload opens a red box describing the failure. A reload
    /// abandoned by [`shutdown`](Self::shutdown) is not reported, and after
    /// shutdown a reload does nothing.
    ///
    /// # Panics
    ///
    /// Panics when called off the UI context. Use
    /// [`request_reload`](Self::request_reload) from other threads.
    #[track_caller]
    pub fn reload(&self) -> impl Future<Output = ()> + Send + 'static {
        assert_on_ui_context(self.inner.dispatcher.as_ref());
        Arc::clone(&self.inner).reload()
    }

    /// Schedules [`reload`](Self::reload) on the UI context. Callable from
    /// any thread.
    pub fn request_reload(&self) {
        self.inner.request_reload();
    }
}
