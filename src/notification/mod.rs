//! The persistent playback notification: a pure builder plus the presenter
//! that pushes it to a sink.

mod builder;
mod presenter;

pub use builder::{
    build, ActionCommand, NotificationAction, NotificationChannel, NotificationDescriptor, TapTarget, CHANNEL_ID,
    CHANNEL_NAME, NOTIFICATION_ID, SMALL_ICON,
};
pub use presenter::{NotificationPresenter, NotificationShade, NotificationSink, ShadeState};
