//! End-to-end tests: service, controller, notification and surface together,
//! with a scripted engine and paused time.

use crate::test_utils::{drain, next_transition, EngineScript};
use std::error::Error;
use std::time::Duration;
use timeplayer::config::Settings;
use timeplayer::notification::NotificationShade;
use timeplayer::player::StateChange;
use timeplayer::service::PlaybackService;
use timeplayer::ui::{ButtonIcon, ForegroundSurface};

#[cfg(test)]
mod service_integration_tests {
    use super::*;

    async fn start(script: &EngineScript, shade: &NotificationShade) -> Result<PlaybackService, Box<dyn Error>> {
        let service = PlaybackService::start(&Settings::default(), script.factory(), Box::new(shade.clone())).await?;
        Ok(service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_prepare_play_pause() -> Result<(), Box<dyn Error>> {
        let script = EngineScript::new();
        let shade = NotificationShade::new();
        let service = start(&script, &shade).await?;
        let mut rx = service.subscribe();
        let control = service.bind()?;

        let initial = control.state().await?;
        assert!(!initial.is_ready);
        assert_eq!(initial.elapsed, "00:00:00");
        assert_eq!(script.engines_created(), 1);

        // First tap only prepares.
        control.toggle().await?;
        assert!(control.state().await?.is_preparing);
        assert_eq!(script.count("start"), 0);

        script.prepared().await;
        assert_eq!(next_transition(&mut rx).await, StateChange::PlayState(true));
        let playing = control.state().await?;
        assert!(playing.is_ready);
        assert!(playing.is_playing);
        assert!(playing.timer_active);
        assert_eq!(shade.current().map(|d| d.action.label), Some("Pause"));
        assert!(shade.snapshot().foreground);

        control.toggle().await?;
        assert_eq!(next_transition(&mut rx).await, StateChange::PlayState(false));
        let paused = control.state().await?;
        assert!(!paused.is_playing);
        assert!(!paused.timer_active);
        assert_eq!(shade.current().map(|d| d.action.label), Some("Resume"));

        assert_eq!(script.count("start"), 1);
        assert_eq!(script.count("pause"), 1);

        service.stop().await;
        assert_eq!(script.count("release"), 1);
        assert!(shade.current().is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_reaches_surface_and_notification() -> Result<(), Box<dyn Error>> {
        let script = EngineScript::auto_preparing();
        let shade = NotificationShade::new();
        let service = start(&script, &shade).await?;
        let mut rx = service.subscribe();
        let mut surface = ForegroundSurface::new();

        service.bind()?.toggle().await?;
        let change = rx.recv().await?;
        surface.apply(&change);
        assert_eq!(surface.icon(), ButtonIcon::Pause);

        script.set_position_ms(65_000);
        loop {
            let change = rx.recv().await?;
            surface.apply(&change);
            if change == StateChange::Elapsed("00:01:05".to_string()) {
                break;
            }
        }
        assert_eq!(surface.time_label(), "00:01:05");
        assert_eq!(shade.current().map(|d| d.text), Some("00:01:05".to_string()));

        service.stop().await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_stops_ticks_and_replays() -> Result<(), Box<dyn Error>> {
        let script = EngineScript::auto_preparing();
        let shade = NotificationShade::new();
        let service = start(&script, &shade).await?;
        let mut rx = service.subscribe();
        let control = service.bind()?;
        let mut surface = ForegroundSurface::new();

        control.toggle().await?;
        assert_eq!(next_transition(&mut rx).await, StateChange::PlayState(true));
        tokio::time::sleep(Duration::from_secs(3)).await;

        script.complete().await;
        let finished = next_transition(&mut rx).await;
        assert_eq!(finished, StateChange::Finished);
        surface.apply(&finished);
        assert_eq!(surface.icon(), ButtonIcon::Start);

        // Demoted, still visible, and no more ticks.
        assert!(!shade.snapshot().foreground);
        assert!(shade.current().is_some());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(drain(&mut rx).is_empty());
        assert!(!control.state().await?.timer_active);

        // The next tap plays the track again on the same engine.
        control.toggle().await?;
        assert_eq!(next_transition(&mut rx).await, StateChange::PlayState(true));
        assert_eq!(script.count("start"), 2);
        assert_eq!(script.engines_created(), 1);
        assert!(shade.snapshot().foreground);

        service.stop().await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_failure_is_terminal_and_recoverable() -> Result<(), Box<dyn Error>> {
        let script = EngineScript::auto_preparing();
        let shade = NotificationShade::new();
        let service = start(&script, &shade).await?;
        let mut rx = service.subscribe();
        let control = service.bind()?;
        let mut surface = ForegroundSurface::new();

        control.toggle().await?;
        surface.apply(&next_transition(&mut rx).await);
        assert_eq!(surface.icon(), ButtonIcon::Pause);

        script.fail("device lost").await;
        let failed = next_transition(&mut rx).await;
        assert_eq!(failed, StateChange::Failed("device lost".to_string()));
        surface.apply(&failed);
        assert_eq!(surface.icon(), ButtonIcon::Start);
        assert_eq!(surface.last_error(), Some("device lost"));

        let state = control.state().await?;
        assert!(!state.is_ready);
        assert!(!state.is_playing);
        assert_eq!(script.count("release"), 1);

        // A fresh engine is built on the next tap.
        control.toggle().await?;
        assert_eq!(next_transition(&mut rx).await, StateChange::PlayState(true));
        assert_eq!(script.engines_created(), 2);

        service.stop().await;
        Ok(())
    }
}
