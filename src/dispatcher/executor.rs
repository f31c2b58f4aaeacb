//! UI-affine executors.
//!
//! All controller state lives on one logical UI context. A [`UiDispatcher`]
//! is the injected capability that knows whether the caller is already on it
//! and how to post work there.
//!
//! Two implementations are provided:
//!
//! - [`InlineDispatcher`]: every caller counts as "on" the UI context; tasks
//!   run immediately and futures are driven to completion in place. Meant for
//!   tests and single-threaded hosts.
//! - [`ThreadDispatcher`]: a dedicated thread running a current-thread tokio
//!   runtime. Tasks and futures posted from anywhere execute on that thread,
//!   in posting order.

use crate::dispatcher::messages::{TraceContext, UiJob};
use crate::domain::error::{DevSupportError, Result};
use std::future::Future;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc;
use tracing::Instrument;

/// Capability to run work on the UI-affine context.
pub trait UiDispatcher: Send + Sync + 'static {
    /// Whether the calling thread is the UI context.
    fn is_ui_context(&self) -> bool;

    /// Enqueues `job` for execution on the UI context.
    ///
    /// # Errors
    ///
    /// Returns [`DevSupportError::Dispatcher`] if the UI context has stopped.
    fn dispatch(&self, job: UiJob) -> Result<()>;
}

/// Runs `task` now if already on the UI context, otherwise enqueues it.
///
/// A stopped UI context is logged and the task dropped: there is nowhere left
/// to show anything.
pub fn run_on_ui(dispatcher: &dyn UiDispatcher, task: impl FnOnce() + Send + 'static) {
    if dispatcher.is_ui_context() {
        task();
        return;
    }

    if let Err(e) = dispatcher.dispatch(UiJob::task(task)) {
        tracing::warn!(error = %e, "dropping UI task");
    }
}

/// Enqueues `future` to be polled on the UI context.
pub fn spawn_on_ui(dispatcher: &dyn UiDispatcher, future: impl Future<Output = ()> + Send + 'static) {
    if let Err(e) = dispatcher.dispatch(UiJob::future(future)) {
        tracing::warn!(error = %e, "dropping UI future");
    }
}

/// Panics unless called on the UI context.
///
/// Touching controller state from another thread is a programming error, not
/// a recoverable condition.
#[track_caller]
pub fn assert_on_ui_context(dispatcher: &dyn UiDispatcher) {
    assert!(
        dispatcher.is_ui_context(),
        "developer support state accessed off the UI context (thread {:?})",
        thread::current().name().unwrap_or("<unnamed>")
    );
}

/// Synchronous executor: the caller is always the UI context.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn is_ui_context(&self) -> bool {
        true
    }

    fn dispatch(&self, job: UiJob) -> Result<()> {
        match job {
            UiJob::Task { task, trace_context } => {
                TraceContext::job_span(trace_context.as_ref(), "task").in_scope(task);
            }
            UiJob::Future { future, trace_context } => {
                let span = TraceContext::job_span(trace_context.as_ref(), "future");
                futures::executor::block_on(future.instrument(span));
            }
        }
        Ok(())
    }
}

/// Executor backed by a dedicated UI thread.
///
/// Dropping the dispatcher closes its queue; the thread finishes the job it
/// is running and exits, abandoning futures that have not completed.
#[derive(Debug)]
pub struct ThreadDispatcher {
    sender: mpsc::UnboundedSender<UiJob>,
    thread_id: ThreadId,
}

impl ThreadDispatcher {
    /// Starts the UI thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or the thread cannot be created.
    pub fn spawn(name: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (sender, mut receiver) = mpsc::unbounded_channel::<UiJob>();
        let (id_tx, id_rx) = std::sync::mpsc::channel();

        thread::Builder::new().name(name.to_string()).spawn(move || {
            // Receiver may be gone if `spawn` already failed; nothing to report to.
            let _ = id_tx.send(thread::current().id());

            runtime.block_on(async move {
                while let Some(job) = receiver.recv().await {
                    match job {
                        UiJob::Task { task, trace_context } => {
                            TraceContext::job_span(trace_context.as_ref(), "task").in_scope(task);
                        }
                        UiJob::Future { future, trace_context } => {
                            let span = TraceContext::job_span(trace_context.as_ref(), "future");
                            tokio::spawn(future.instrument(span));
                        }
                    }
                }
                tracing::debug!("UI queue closed, stopping dispatcher thread");
            });
        })?;

        let thread_id = id_rx
            .recv()
            .map_err(|e| DevSupportError::Dispatcher(format!("UI thread failed to start: {e}")))?;

        tracing::debug!(thread = name, "UI dispatcher started");
        Ok(Self { sender, thread_id })
    }
}

impl UiDispatcher for ThreadDispatcher {
    fn is_ui_context(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn dispatch(&self, job: UiJob) -> Result<()> {
        self.sender
            .send(job)
            .map_err(|_| DevSupportError::Dispatcher("UI thread has stopped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc as std_mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn inline_runs_tasks_and_futures_in_place() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        run_on_ui(&InlineDispatcher, move || flag.store(true, Ordering::SeqCst));
        assert!(ran.load(Ordering::SeqCst));

        let polled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&polled);
        spawn_on_ui(&InlineDispatcher, async move { flag.store(true, Ordering::SeqCst) });
        assert!(polled.load(Ordering::SeqCst));
    }

    #[test]
    fn thread_dispatcher_runs_jobs_on_its_thread_in_order() {
        let dispatcher = Arc::new(ThreadDispatcher::spawn("ui-test").unwrap());
        assert!(!dispatcher.is_ui_context());

        let (tx, rx) = std_mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            let d = Arc::clone(&dispatcher);
            run_on_ui(dispatcher.as_ref(), move || {
                tx.send((i, d.is_ui_context())).unwrap();
            });
        }

        let results: Vec<(i32, bool)> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(results, (0..5).map(|i| (i, true)).collect::<Vec<_>>());
    }

    #[test]
    fn thread_dispatcher_polls_futures_on_its_thread() {
        let dispatcher = Arc::new(ThreadDispatcher::spawn("ui-future-test").unwrap());
        let (tx, rx) = std_mpsc::channel();

        let d = Arc::clone(&dispatcher);
        spawn_on_ui(dispatcher.as_ref(), async move {
            tokio::task::yield_now().await;
            tx.send(d.is_ui_context()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    #[should_panic(expected = "off the UI context")]
    fn affinity_assertion_fails_off_thread() {
        let dispatcher = ThreadDispatcher::spawn("ui-assert-test").unwrap();
        assert_on_ui_context(&dispatcher);
    }
}
