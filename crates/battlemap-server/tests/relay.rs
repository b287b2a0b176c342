use battlemap_core::broadcast::{ClientMessage, Role, ServerMessage};
use battlemap_core::codec::BroadcastPayload;
use battlemap_core::weather::WeatherKind;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, battlemap_server::app()).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn connect(url: &str) -> Client {
    let (client, _) = connect_async(url).await.unwrap();
    client
}

async fn send(client: &mut Client, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    client.send(Message::Text(json.into())).await.unwrap();
}

async fn recv(client: &mut Client) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for the relay")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn join(client: &mut Client, room: &str, role: Role) -> ServerMessage {
    send(
        client,
        &ClientMessage::Join {
            room: room.to_string(),
            role,
        },
    )
    .await;
    recv(client).await
}

fn payload(weather: WeatherKind) -> BroadcastPayload {
    let mut payload = BroadcastPayload::default();
    payload.canvas_state.weather = weather;
    payload.canvas_state.view.scale = 1.5;
    payload
}

#[tokio::test]
async fn test_presenter_to_viewers() {
    let url = spawn_server().await;

    let mut viewer = connect(&url).await;
    match join(&mut viewer, "table", Role::Viewer).await {
        ServerMessage::Joined {
            viewer_count, latest, ..
        } => {
            assert_eq!(viewer_count, 1);
            assert!(latest.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut presenter = connect(&url).await;
    match join(&mut presenter, "table", Role::Presenter).await {
        ServerMessage::Joined { viewer_count, role, .. } => {
            assert_eq!(viewer_count, 1);
            assert_eq!(role, Role::Presenter);
        }
        other => panic!("unexpected {other:?}"),
    }

    let map = payload(WeatherKind::Rain);
    send(&mut presenter, &ClientMessage::Broadcast(map.clone())).await;
    assert_eq!(recv(&mut viewer).await, ServerMessage::Canvas(map.clone()));

    // Viewers are read-only.
    send(&mut viewer, &ClientMessage::Broadcast(payload(WeatherKind::Snow))).await;
    assert!(matches!(recv(&mut viewer).await, ServerMessage::Error { .. }));

    // Late joiners get the latest map.
    let mut late = connect(&url).await;
    match join(&mut late, "table", Role::Viewer).await {
        ServerMessage::Joined {
            viewer_count, latest, ..
        } => {
            assert_eq!(viewer_count, 2);
            assert_eq!(latest, Some(map));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(recv(&mut presenter).await, ServerMessage::ViewerJoined { viewer_count: 2 });
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let url = spawn_server().await;

    let mut presenter = connect(&url).await;
    join(&mut presenter, "a", Role::Presenter).await;
    let mut other = connect(&url).await;
    join(&mut other, "b", Role::Presenter).await;
    let mut viewer = connect(&url).await;
    join(&mut viewer, "b", Role::Viewer).await;

    send(&mut presenter, &ClientMessage::Broadcast(payload(WeatherKind::Fog))).await;
    send(&mut other, &ClientMessage::Broadcast(payload(WeatherKind::Embers))).await;
    assert_eq!(recv(&mut viewer).await, ServerMessage::Canvas(payload(WeatherKind::Embers)));
}

#[tokio::test]
async fn test_invalid_messages_get_errors() {
    let url = spawn_server().await;
    let mut client = connect(&url).await;

    client.send(Message::Text("{not json".into())).await.unwrap();
    assert!(matches!(recv(&mut client).await, ServerMessage::Error { .. }));

    send(&mut client, &ClientMessage::Broadcast(payload(WeatherKind::Rain))).await;
    match recv(&mut client).await {
        ServerMessage::Error { message } => assert!(message.contains("join")),
        other => panic!("unexpected {other:?}"),
    }
}
