#[cfg(test)]
mod error_flow_tests {
    use crate::common::TestHarness;
    use std::sync::{Arc, Mutex};
    use vidlay::{PlaybackState, SourceKind, VideoError, VideoEventKind, WidgetSignal};

    #[tokio::test]
    async fn test_unhandled_error_shows_notice_and_ack_reports_completion() {
        let mut harness = TestHarness::spawn();
        let id = harness.bridge.create_widget();
        harness.bridge.set_source(id, SourceKind::FileAsset, "clip.mp4");

        let session = harness.player_session(0).await;
        session.signals.send(WidgetSignal::PlaybackError(VideoError::Playback {
            code: -110,
        }));
        harness.flush().await;
        assert_eq!(
            harness.bridge.playback_state(id).await.unwrap(),
            Some(PlaybackState::Error)
        );

        let surface = harness.surface_session(0).await;
        assert_eq!(
            surface.probe.notices(),
            vec![VideoError::Playback { code: -110 }]
        );

        // Dismissing the notice is the only remaining signal that playback
        // is over, so it is reported as a completion. Exactly once.
        surface.signals.send(WidgetSignal::ErrorNoticeAcknowledged);
        harness.expect_event(id, VideoEventKind::Completed).await;
        surface.signals.send(WidgetSignal::ErrorNoticeAcknowledged);
        harness.assert_no_events().await;
    }

    #[tokio::test]
    async fn test_error_handler_can_consume_errors() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        let mut harness = TestHarness::spawn_with_error_handler(Box::new(move |id, error| {
            recorded.lock().unwrap().push((id, error.clone()));
            true
        }));

        let id = harness.bridge.create_widget();
        harness.bridge.set_source(id, SourceKind::FileAsset, "clip.mp4");
        let session = harness.player_session(0).await;
        session.signals.send(WidgetSignal::PlaybackError(VideoError::Playback {
            code: 100,
        }));
        harness.flush().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(id, VideoError::Playback { code: 100 })]
        );
        // A consumed error never reaches the user.
        let surface = harness.surface_session(0).await;
        assert!(surface.probe.notices().is_empty());
        assert_eq!(
            harness.bridge.playback_state(id).await.unwrap(),
            Some(PlaybackState::Error)
        );
        harness.assert_no_events().await;
    }

    #[tokio::test]
    async fn test_declined_error_still_surfaces_a_notice() {
        let mut harness = TestHarness::spawn_with_error_handler(Box::new(|_, _| false));
        let id = harness.bridge.create_widget();
        harness.bridge.set_source(id, SourceKind::FileAsset, "clip.mp4");

        let session = harness.player_session(0).await;
        session.signals.send(WidgetSignal::PlaybackError(VideoError::Playback {
            code: 1,
        }));
        harness.flush().await;

        let surface = harness.surface_session(0).await;
        assert_eq!(surface.probe.notices().len(), 1);
        harness.assert_no_events().await;
    }

    #[tokio::test]
    async fn test_open_failure_routes_through_the_error_path() {
        let mut harness = TestHarness::spawn();
        harness.factory.fail_next();

        let id = harness.bridge.create_widget();
        harness.bridge.set_source(id, SourceKind::Url, "http://example.com/broken.mp4");
        harness.flush().await;

        assert_eq!(harness.factory.opens(), 0);
        assert_eq!(
            harness.bridge.playback_state(id).await.unwrap(),
            Some(PlaybackState::Error)
        );
        let surface = harness.surface_session(0).await;
        assert_eq!(surface.probe.notices().len(), 1);
        harness.assert_no_events().await;
    }

    #[tokio::test]
    async fn test_errors_after_release_are_discarded() {
        let mut harness = TestHarness::spawn();
        let id = harness.bridge.create_widget();
        harness.bridge.set_source(id, SourceKind::FileAsset, "clip.mp4");
        harness.bridge.start(id);

        let session = harness.player_session(0).await;
        session.signals.send(WidgetSignal::Prepared {
            width: 640,
            height: 360,
        });
        harness.expect_event(id, VideoEventKind::Playing).await;

        harness.bridge.stop(id);
        harness.expect_event(id, VideoEventKind::Stopped).await;
        assert!(session.probe.released());

        // The released player's tail-end error must not flip the widget
        // back into the error state.
        session.signals.send(WidgetSignal::PlaybackError(VideoError::Playback {
            code: -22,
        }));
        harness.flush().await;
        assert_eq!(
            harness.bridge.playback_state(id).await.unwrap(),
            Some(PlaybackState::Idle)
        );
        let surface = harness.surface_session(0).await;
        assert!(surface.probe.notices().is_empty());
        harness.assert_no_events().await;
    }
}
