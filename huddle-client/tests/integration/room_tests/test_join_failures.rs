use huddle_core::RoomId;

use crate::integration::{create_test_room, create_test_room_with_capture, init_tracing};
use crate::utils::{ClientEvent, MockCapture};

#[tokio::test]
async fn test_empty_room_id_is_rejected() {
    init_tracing();

    let room = create_test_room();
    room.handle.join(RoomId::from("   ")).await;

    assert!(
        room.events
            .wait_for(|e| matches!(e, ClientEvent::Error(_)), 2000)
            .await,
        "No error was reported"
    );
    // Nothing was touched: no capture, no relay connection.
    assert!(room.capture.acquired_tracks().await.is_empty());
    assert!(room.connector.connected_rooms().await.is_empty());
}

/// Without microphone permission there is no point joining: the relay is
/// never contacted and the coordinator stays idle.
#[tokio::test]
async fn test_capture_denial_aborts_the_join() {
    init_tracing();

    let room = create_test_room_with_capture(MockCapture::denying());
    room.handle.join(RoomId::from("standup")).await;

    assert!(
        room.events
            .wait_for(|e| matches!(e, ClientEvent::Error(_)), 2000)
            .await,
        "No error was reported"
    );
    assert!(room.connector.connected_rooms().await.is_empty());
    assert!(room.events.joined_id().await.is_none());
}

/// A refused relay connection releases the already-acquired capture.
#[tokio::test]
async fn test_connect_failure_stops_capture() {
    init_tracing();

    let room = create_test_room();
    room.connector.set_failing(true);
    room.handle.join(RoomId::from("standup")).await;

    assert!(
        room.events
            .wait_for(|e| matches!(e, ClientEvent::Error(_)), 2000)
            .await,
        "No error was reported"
    );

    let tracks = room.capture.acquired_tracks().await;
    assert!(!tracks.is_empty());
    for track in tracks {
        assert!(track.is_ended(), "Track {} was not released", track.id);
    }
}
