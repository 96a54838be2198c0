use huddle_core::{ParticipantId, SignalMessage};

use crate::integration::vad_tests::loud_window;
use crate::integration::{announce_peer, create_test_room, init_tracing, join_room};
use crate::utils::ClientEvent;

/// A remote audio track gets its own monitor, attributed to that peer.
#[tokio::test]
async fn test_remote_audio_drives_the_peer_indicator() {
    init_tracing();

    let room = create_test_room();
    join_room(&room, "standup", "peer-a")
        .await
        .expect("Join failed");

    let peer_b = ParticipantId::from("peer-b");
    let transport = announce_peer(&room, &peer_b).await.expect("No session for B");
    let samples = transport.emit_remote_audio("b-mic").await;

    for _ in 0..3 {
        samples.send(loud_window()).await.expect("Monitor is gone");
    }

    assert!(
        room.events
            .wait_for(
                |e| matches!(
                    e,
                    ClientEvent::Speaking { participant, speaking: true } if participant == &peer_b
                ),
                2000
            )
            .await,
        "Remote speaking was never raised"
    );
}

/// The monitor dies with the peer: windows arriving after the departure
/// produce no more readings.
#[tokio::test]
async fn test_departure_stops_the_monitor() {
    init_tracing();

    let room = create_test_room();
    join_room(&room, "standup", "peer-a")
        .await
        .expect("Join failed");

    let peer_b = ParticipantId::from("peer-b");
    let transport = announce_peer(&room, &peer_b).await.expect("No session for B");
    let samples = transport.emit_remote_audio("b-mic").await;

    samples.send(loud_window()).await.expect("Monitor is gone");
    assert!(
        room.events
            .wait_for(
                |e| matches!(e, ClientEvent::Level { participant, .. } if participant == &peer_b),
                2000
            )
            .await,
        "Monitor never produced a reading"
    );

    room.relay
        .send(SignalMessage::PeerLeft { id: peer_b.clone() })
        .await
        .expect("Relay closed");
    assert!(
        room.events
            .wait_for(
                |e| matches!(e, ClientEvent::PeerRemoved(id) if id == &peer_b),
                2000
            )
            .await
    );

    let readings_before = room.events.levels_for(&peer_b).await.len();
    for _ in 0..3 {
        let _ = samples.send(loud_window()).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(room.events.levels_for(&peer_b).await.len(), readings_before);
}
