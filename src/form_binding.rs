//! Form-side observer of upload events.
//!
//! Mirrors what the profile form shows: an image preview, a hidden input
//! carrying the public URL for the later form submit, and an alert line.
//! The binding subscribes when attached and unsubscribes when detached or
//! dropped.

use crate::config::UploaderConfig;
use crate::services::UploadCoordinator;
use crate::types::{UploadEvent, UploadOutcome};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenInput {
    pub name: String,
    pub value: Option<String>,
}

/// What the form currently displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub preview_src: Option<String>,
    pub url_input: HiddenInput,
    pub alert: Option<String>,
    latest_attempt: u64,
}

impl FormView {
    pub fn new(url_input_name: &str) -> Self {
        Self {
            preview_src: None,
            url_input: HiddenInput {
                name: url_input_name.to_string(),
                value: None,
            },
            alert: None,
            latest_attempt: 0,
        }
    }

    /// Apply an event. Events from attempts older than the newest one seen
    /// are ignored and `false` is returned.
    pub fn apply(&mut self, event: &UploadEvent) -> bool {
        if event.attempt() < self.latest_attempt {
            return false;
        }
        self.latest_attempt = event.attempt();

        match event {
            UploadEvent::Started { .. } => {
                self.alert = None;
            }
            UploadEvent::Finished { outcome, message, .. } => match outcome {
                UploadOutcome::Success { public_url } => {
                    self.preview_src = Some(public_url.clone());
                    self.url_input.value = Some(public_url.clone());
                    self.alert = None;
                }
                UploadOutcome::Rejected { reason } | UploadOutcome::Failed { reason } => {
                    self.alert = Some(message.clone().unwrap_or_else(|| reason.clone()));
                }
            },
        }
        true
    }
}

/// A `FormView` kept up to date by a background task
pub struct FormBinding {
    view: Arc<Mutex<FormView>>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FormBinding {
    /// Subscribe to `coordinator` and start applying its events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(coordinator: &UploadCoordinator, url_input_name: &str) -> Self {
        let mut events = coordinator.subscribe();
        let view = Arc::new(Mutex::new(FormView::new(url_input_name)));
        let task_view = Arc::clone(&view);
        let (stop, mut stop_rx) = oneshot::channel::<()>();

        let apply = move |event: &UploadEvent| {
            let mut view = task_view.lock().unwrap_or_else(|e| e.into_inner());
            view.apply(event);
        };

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    received = events.recv() => match received {
                        Ok(event) => apply(&event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Form binding lagged behind upload events");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = &mut stop_rx => {
                        // Events already broadcast still reach the view
                        while let Ok(event) = events.try_recv() {
                            apply(&event);
                        }
                        break;
                    }
                }
            }
        });

        Self {
            view,
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Attach using the hidden input name from `config`
    pub fn from_config(coordinator: &UploadCoordinator, config: &UploaderConfig) -> Self {
        Self::attach(coordinator, &config.url_input_name)
    }

    pub fn view(&self) -> FormView {
        self.view.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop receiving events and wait for the task to wind down.
    ///
    /// Events broadcast before the call are applied first.
    pub async fn detach(mut self) -> FormView {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.view()
    }
}

impl Drop for FormBinding {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
