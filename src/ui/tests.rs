//! Tests for the surface and the command-line interface

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::notification::{build, NotificationShade};
    use crate::player::StateChange;
    use clap::Parser;

    #[test]
    fn test_args_parsing() {
        use clap::CommandFactory;
        let app = Args::command();
        app.debug_assert();
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from(["timeplayer", "-d", "hw:0", "--refresh-ms", "500", "-l", "timeplayer=debug"]);
        assert_eq!(args.alsa_device.as_deref(), Some("hw:0"));
        assert_eq!(args.refresh_ms, Some(500));
        assert_eq!(args.log_level.as_deref(), Some("timeplayer=debug"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(""), UserInput::TapButton);
        assert_eq!(parse_input(" P \n"), UserInput::TapButton);
        assert_eq!(parse_input("n"), UserInput::TapNotificationAction);
        assert_eq!(parse_input("o"), UserInput::TapNotificationBody);
        assert_eq!(parse_input("s"), UserInput::ShowState);
        assert_eq!(parse_input("quit"), UserInput::Quit);
        assert_eq!(parse_input("xyz"), UserInput::Unknown);
    }

    #[test]
    fn test_surface_initial_state() {
        let surface = ForegroundSurface::new();
        assert_eq!(surface.icon(), ButtonIcon::Start);
        assert_eq!(surface.time_label(), "00:00:00");
        assert!(surface.last_error().is_none());
    }

    #[test]
    fn test_surface_follows_events() {
        let mut surface = ForegroundSurface::new();

        surface.apply(&StateChange::PlayState(true));
        assert_eq!(surface.icon(), ButtonIcon::Pause);

        surface.apply(&StateChange::Elapsed("00:00:07".to_string()));
        assert_eq!(surface.time_label(), "00:00:07");
        assert_eq!(surface.icon(), ButtonIcon::Pause);

        surface.apply(&StateChange::PlayState(false));
        assert_eq!(surface.icon(), ButtonIcon::Resume);

        surface.apply(&StateChange::Finished);
        assert_eq!(surface.icon(), ButtonIcon::Start);
        // The label keeps the last reported time.
        assert_eq!(surface.time_label(), "00:00:07");
    }

    #[test]
    fn test_surface_failure_resets_button() {
        let mut surface = ForegroundSurface::new();
        surface.apply(&StateChange::PlayState(true));
        surface.apply(&StateChange::Failed("no device".to_string()));

        assert_eq!(surface.icon(), ButtonIcon::Start);
        assert_eq!(surface.last_error(), Some("no device"));
        assert!(surface.render(None).contains("no device"));

        surface.apply(&StateChange::PlayState(true));
        assert!(surface.last_error().is_none());
    }

    #[test]
    fn test_surface_render() {
        let mut surface = ForegroundSurface::new();
        assert_eq!(surface.render(None), "[> start] 00:00:00");

        surface.apply(&StateChange::PlayState(true));
        surface.apply(&StateChange::Elapsed("00:01:02".to_string()));
        let descriptor = build("00:01:02", true);
        assert_eq!(
            surface.render(Some(&descriptor)),
            "[|| pause] 00:01:02   | TimePlayer: 00:01:02 (Pause)"
        );
    }

    #[test]
    fn test_cli_starts_with_idle_surface() {
        let cli = Cli::new(NotificationShade::new());
        assert_eq!(cli.surface(), &ForegroundSurface::new());
    }
}
