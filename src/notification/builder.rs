// src/notification/builder.rs

/// Fixed id of the single playback notification.
pub const NOTIFICATION_ID: u32 = 100;
pub const CHANNEL_ID: &str = "channel_timer";
pub const CHANNEL_NAME: &str = "TimePlayer";
pub const SMALL_ICON: &str = "ic_notification_music";

/// Where a tap on the notification body leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTarget {
    /// Brings the foreground surface back.
    ForegroundSurface,
}

/// Command carried by a notification action back into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCommand {
    TogglePlayPause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub label: &'static str,
    pub command: ActionCommand,
}

/// Channel the notification is posted on. Silent and without a badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: &'static str,
    pub name: &'static str,
    pub show_badge: bool,
    pub sound: bool,
}

/// Everything a sink needs to render the playback notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDescriptor {
    pub id: u32,
    pub channel: NotificationChannel,
    pub small_icon: &'static str,
    pub text: String,
    pub content_target: TapTarget,
    pub action: NotificationAction,
    pub ongoing: bool,
}

/// Builds the notification for the given elapsed time and play state.
pub fn build(current_time: &str, is_playing: bool) -> NotificationDescriptor {
    let label = if is_playing { "Pause" } else { "Resume" };
    NotificationDescriptor {
        id: NOTIFICATION_ID,
        channel: NotificationChannel {
            id: CHANNEL_ID,
            name: CHANNEL_NAME,
            show_badge: false,
            sound: false,
        },
        small_icon: SMALL_ICON,
        text: current_time.to_string(),
        content_target: TapTarget::ForegroundSurface,
        action: NotificationAction {
            label,
            command: ActionCommand::TogglePlayPause,
        },
        ongoing: true,
    }
}
