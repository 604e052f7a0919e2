// src/notification/presenter.rs
use super::builder::{build, NotificationDescriptor, NOTIFICATION_ID};
use crate::audio::INITIAL_ELAPSED;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

const LOG_TARGET: &str = "timeplayer::notification";

/// Something that can display the playback notification.
pub trait NotificationSink: Send {
    /// Posts or replaces the notification with `descriptor.id`.
    fn post(&mut self, descriptor: &NotificationDescriptor);
    /// Promotes the notification to foreground, or demotes it while leaving it visible.
    fn set_foreground(&mut self, id: u32, foreground: bool);
    /// Removes the notification.
    fn cancel(&mut self, id: u32);
}

/// Keeps the controller's notification in sync with its state.
pub struct NotificationPresenter {
    sink: Box<dyn NotificationSink>,
    foreground: bool,
    posted: bool,
}

impl NotificationPresenter {
    pub fn new(sink: Box<dyn NotificationSink>) -> Self {
        NotificationPresenter {
            sink,
            foreground: false,
            posted: false,
        }
    }

    /// Posts the initial notification and promotes it to foreground.
    pub fn show_foreground(&mut self) {
        self.post(&build(INITIAL_ELAPSED, false));
        if !self.foreground {
            debug!(target: LOG_TARGET, "Promoting notification to foreground.");
            self.sink.set_foreground(NOTIFICATION_ID, true);
            self.foreground = true;
        }
    }

    pub fn update(&mut self, current_time: &str, is_playing: bool) {
        self.post(&build(current_time, is_playing));
    }

    /// Leaves foreground; the notification stays visible.
    pub fn demote(&mut self) {
        if self.foreground {
            debug!(target: LOG_TARGET, "Demoting notification from foreground.");
            self.sink.set_foreground(NOTIFICATION_ID, false);
            self.foreground = false;
        }
    }

    pub fn clear(&mut self) {
        self.demote();
        if self.posted {
            debug!(target: LOG_TARGET, "Cancelling notification.");
            self.sink.cancel(NOTIFICATION_ID);
            self.posted = false;
        }
    }

    fn post(&mut self, descriptor: &NotificationDescriptor) {
        trace!(target: LOG_TARGET, "Posting notification: {:?}", descriptor);
        self.sink.post(descriptor);
        self.posted = true;
    }
}

/// What the shade currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadeState {
    pub current: Option<NotificationDescriptor>,
    pub foreground: bool,
    pub posts: u64,
}

/// In-process notification area.
///
/// Cheap to clone; every clone sees the same state. The terminal front end
/// renders it and invokes its action, tests inspect it.
#[derive(Debug, Clone, Default)]
pub struct NotificationShade {
    state: Arc<Mutex<ShadeState>>,
}

impl NotificationShade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ShadeState {
        self.lock().clone()
    }

    /// The notification currently on display, if any.
    pub fn current(&self) -> Option<NotificationDescriptor> {
        self.lock().current.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ShadeState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for NotificationShade {
    fn post(&mut self, descriptor: &NotificationDescriptor) {
        debug!(
            target: LOG_TARGET,
            id = descriptor.id,
            channel = descriptor.channel.id,
            "[{}] {} ({})",
            descriptor.channel.name,
            descriptor.text,
            descriptor.action.label
        );
        let mut state = self.lock();
        state.current = Some(descriptor.clone());
        state.posts += 1;
    }

    fn set_foreground(&mut self, id: u32, foreground: bool) {
        debug!(target: LOG_TARGET, id, foreground, "Notification foreground state changed.");
        self.lock().foreground = foreground;
    }

    fn cancel(&mut self, id: u32) {
        debug!(target: LOG_TARGET, id, "Notification cancelled.");
        let mut state = self.lock();
        if state.current.as_ref().map_or(false, |d| d.id == id) {
            state.current = None;
        }
        state.foreground = false;
    }
}
