use crate::audio::INITIAL_ELAPSED;
use crate::notification::NotificationDescriptor;
use crate::player::StateChange;

/// Icon on the surface's single button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonIcon {
    /// Nothing played yet, or the track ended.
    Start,
    Pause,
    Resume,
}

impl ButtonIcon {
    pub fn label(&self) -> &'static str {
        match self {
            ButtonIcon::Start => "[> start]",
            ButtonIcon::Pause => "[|| pause]",
            ButtonIcon::Resume => "[> resume]",
        }
    }
}

/// The in-app view: a time label and a play/pause button.
///
/// Holds no playback state of its own beyond what the last events said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundSurface {
    icon: ButtonIcon,
    time_label: String,
    last_error: Option<String>,
}

impl Default for ForegroundSurface {
    fn default() -> Self {
        ForegroundSurface {
            icon: ButtonIcon::Start,
            time_label: INITIAL_ELAPSED.to_string(),
            last_error: None,
        }
    }
}

impl ForegroundSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, change: &StateChange) {
        match change {
            StateChange::Elapsed(time) => self.time_label = time.clone(),
            StateChange::Finished => self.icon = ButtonIcon::Start,
            StateChange::PlayState(true) => {
                self.icon = ButtonIcon::Pause;
                self.last_error = None;
            }
            StateChange::PlayState(false) => self.icon = ButtonIcon::Resume,
            StateChange::Failed(message) => {
                self.icon = ButtonIcon::Start;
                self.last_error = Some(message.clone());
            }
        }
    }

    pub fn icon(&self) -> ButtonIcon {
        self.icon
    }

    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// One status line: button, time and, when shown, the notification.
    pub fn render(&self, notification: Option<&NotificationDescriptor>) -> String {
        let mut line = format!("{} {}", self.icon.label(), self.time_label);
        if let Some(descriptor) = notification {
            line.push_str(&format!(
                "   | {}: {} ({})",
                descriptor.channel.name, descriptor.text, descriptor.action.label
            ));
        }
        if let Some(error) = &self.last_error {
            line.push_str(&format!("   ! {}", error));
        }
        line
    }
}
