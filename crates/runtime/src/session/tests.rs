use std::collections::HashMap;
use std::time::Duration;

use bpc_protocol::{
	BatteryLevelReading, ClientMessage, DeviceCommand, DeviceInfo, DeviceList, DeviceRemoved,
	ErrorCode, MessageAttributes, RawReading, RequestServerInfo, ServerInfo, ServerMessage, kinds,
};
use tokio::sync::broadcast;

use super::*;
use crate::events::EVENT_CHANNEL_CAPACITY;
use crate::transport::memory::{MemoryPeer, memory};

const CLIENT_NAME: &str = "test-client";

fn server_info(id: u32, max_ping_time: u32) -> ServerMessage {
	ServerMessage::ServerInfo(ServerInfo {
		id,
		server_name: "test-server".to_string(),
		message_version: 2,
		max_ping_time,
	})
}

fn device_info(index: u32, name: &str) -> DeviceInfo {
	DeviceInfo {
		id: 0,
		device_index: index,
		device_name: name.to_string(),
		device_messages: HashMap::from([(
			kinds::VIBRATE_CMD.to_string(),
			MessageAttributes {
				feature_count: Some(2),
				..Default::default()
			},
		)]),
	}
}

struct Harness {
	session: Arc<Session>,
	peer: MemoryPeer,
	events: broadcast::Receiver<SessionEvent>,
}

/// Opens a session against an in-memory server that answers the handshake
/// and device-list requests.
async fn open_with(config: SessionConfig, max_ping_time: u32, devices: Vec<DeviceInfo>) -> Harness {
	let (connector, mut listener) = memory();
	let (events_tx, events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
	let session = Session::new(config, events_tx);

	let opening = tokio::spawn({
		let session = Arc::clone(&session);
		async move { session.open(&connector).await }
	});

	let mut peer = listener.accept().await.unwrap();
	let handshake = peer.recv_message().await.unwrap();
	assert_eq!(
		handshake,
		ClientMessage::RequestServerInfo(RequestServerInfo {
			id: 1,
			client_name: CLIENT_NAME.to_string(),
			message_version: 2,
		})
	);
	peer.send(&[server_info(1, max_ping_time)]).unwrap();

	let list = peer.recv_message().await.unwrap();
	assert!(matches!(list, ClientMessage::RequestDeviceList(_)));
	assert_eq!(list.id(), 2);
	peer.send(&[ServerMessage::DeviceList(DeviceList { id: 2, devices })])
		.unwrap();

	opening.await.unwrap().unwrap();
	Harness {
		session,
		peer,
		events,
	}
}

async fn open(devices: Vec<DeviceInfo>) -> Harness {
	open_with(SessionConfig::new(CLIENT_NAME), 0, devices).await
}

async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
	tokio::time::timeout(Duration::from_secs(5), events.recv())
		.await
		.expect("timed out waiting for an event")
		.expect("event channel closed")
}

#[tokio::test]
async fn test_handshake_reaches_ready_and_loads_devices_silently() {
	let mut h = open(vec![device_info(5, "Toy")]).await;

	assert!(h.session.is_ready());
	let info = h.session.server_info().unwrap();
	assert_eq!(info.server_name, "test-server");

	let device = h.session.registry().get(5).unwrap();
	assert_eq!(device.name, "Toy");
	assert_eq!(device.feature_count(kinds::VIBRATE_CMD), 2);
	assert!(h.events.try_recv().is_err(), "initial devices raise no events");
}

#[tokio::test(start_paused = true)]
async fn test_pings_sent_every_half_max_ping_time() {
	let mut h = open_with(SessionConfig::new(CLIENT_NAME), 1000, Vec::new()).await;
	let start = tokio::time::Instant::now();

	let ping = h.peer.recv_message().await.unwrap();
	assert!(matches!(ping, ClientMessage::Ping(_)));
	assert_eq!(ping.id(), 3);
	assert_eq!(start.elapsed(), Duration::from_millis(500));
	h.peer.send(&[ServerMessage::ok(3)]).unwrap();

	let ping = h.peer.recv_message().await.unwrap();
	assert!(matches!(ping, ClientMessage::Ping(_)));
	assert_eq!(ping.id(), 4);
	assert_eq!(start.elapsed(), Duration::from_millis(1000));
	h.peer.send(&[ServerMessage::ok(4)]).unwrap();

	tokio::task::yield_now().await;
	assert!(h.session.is_ready());
	assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_replies_out_of_order_reach_their_callers() {
	let mut h = open(Vec::new()).await;

	let scan = tokio::spawn({
		let session = Arc::clone(&h.session);
		async move { session.send_request(ClientMessage::start_scanning()).await }
	});
	let list = tokio::spawn({
		let session = Arc::clone(&h.session);
		async move { session.send_request(ClientMessage::request_device_list()).await }
	});

	let mut received = vec![
		h.peer.recv_message().await.unwrap(),
		h.peer.recv_message().await.unwrap(),
	];
	received.sort_by_key(|m| std::cmp::Reverse(m.id()));

	let replies: Vec<ServerMessage> = received
		.iter()
		.map(|m| match m {
			ClientMessage::StartScanning(_) => ServerMessage::ok(m.id()),
			ClientMessage::RequestDeviceList(_) => ServerMessage::DeviceList(DeviceList {
				id: m.id(),
				devices: vec![device_info(9, "Late")],
			}),
			other => panic!("unexpected request {other:?}"),
		})
		.collect();
	h.peer.send(&replies).unwrap();

	assert!(matches!(scan.await.unwrap(), Ok(ServerMessage::Ok(_))));
	match list.await.unwrap() {
		Ok(ServerMessage::DeviceList(list)) => assert_eq!(list.devices[0].device_index, 9),
		other => panic!("unexpected reply {other:?}"),
	}
	assert_eq!(h.session.pending_requests(), 0);
}

#[tokio::test]
async fn test_many_concurrent_replies_in_reverse_order_match_by_id() {
	let mut h = open(Vec::new()).await;

	let requests: Vec<_> = (0..16u32)
		.map(|index| {
			let session = Arc::clone(&h.session);
			let request = tokio::spawn(async move {
				session
					.send_request(ClientMessage::BatteryLevelCmd(DeviceCommand {
						id: 0,
						device_index: index,
					}))
					.await
			});
			(index, request)
		})
		.collect();

	let mut received = Vec::new();
	for _ in 0..16 {
		match h.peer.recv_message().await.unwrap() {
			ClientMessage::BatteryLevelCmd(cmd) => received.push(cmd),
			other => panic!("unexpected request {other:?}"),
		}
	}
	received.sort_by_key(|cmd| std::cmp::Reverse(cmd.id));

	for cmd in received {
		h.peer
			.send(&[ServerMessage::BatteryLevelReading(BatteryLevelReading {
				id: cmd.id,
				device_index: cmd.device_index,
				battery_level: f64::from(cmd.device_index) / 16.0,
			})])
			.unwrap();
	}

	for (index, request) in requests {
		match request.await.unwrap() {
			Ok(ServerMessage::BatteryLevelReading(reading)) => {
				assert_eq!(reading.device_index, index);
			}
			other => panic!("unexpected reply {other:?}"),
		}
	}
	assert_eq!(h.session.pending_requests(), 0);
	assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_server_error_reply_maps_to_error_kind() {
	let mut h = open(Vec::new()).await;

	let request = tokio::spawn({
		let session = Arc::clone(&h.session);
		async move { session.send_request(ClientMessage::stop_all_devices()).await }
	});
	let id = h.peer.recv_message().await.unwrap().id();
	h.peer
		.send(&[ServerMessage::error(id, ErrorCode::Device, "no such device")])
		.unwrap();

	let err = request.await.unwrap().unwrap_err();
	assert_eq!(err, Error::Device("no such device".to_string()));
	assert_eq!(
		next_event(&mut h.events).await,
		SessionEvent::ErrorReceived(err)
	);
}

#[tokio::test]
async fn test_close_fails_every_outstanding_request() {
	let mut h = open(Vec::new()).await;

	let requests: Vec<_> = (0..3)
		.map(|_| {
			let session = Arc::clone(&h.session);
			tokio::spawn(async move { session.send_request(ClientMessage::start_scanning()).await })
		})
		.collect();
	for _ in 0..3 {
		h.peer.recv_message().await.unwrap();
	}
	assert_eq!(h.session.pending_requests(), 3);

	h.session.close().await;

	for request in requests {
		assert!(request.await.unwrap().unwrap_err().is_connector());
	}
	assert_eq!(h.session.pending_requests(), 0);
	assert_eq!(h.session.state(), SessionState::Disconnected);
	assert!(h.events.try_recv().is_err(), "a requested close is not a disconnect event");
	assert_eq!(h.peer.recv().await, None);
}

#[tokio::test]
async fn test_unknown_reply_id_is_reported_and_dispatch_continues() {
	let mut h = open(Vec::new()).await;

	h.peer.send(&[ServerMessage::ok(99)]).unwrap();
	match next_event(&mut h.events).await {
		SessionEvent::ErrorReceived(Error::Message(msg)) => assert!(msg.contains("99")),
		other => panic!("unexpected event {other:?}"),
	}

	let request = tokio::spawn({
		let session = Arc::clone(&h.session);
		async move { session.send_request(ClientMessage::stop_scanning()).await }
	});
	let id = h.peer.recv_message().await.unwrap().id();
	h.peer.send(&[ServerMessage::ok(id)]).unwrap();
	assert!(request.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_garbage_frames_are_reported() {
	let mut h = open(Vec::new()).await;

	h.peer.send_raw("not json").unwrap();
	assert!(matches!(
		next_event(&mut h.events).await,
		SessionEvent::ErrorReceived(Error::Message(_))
	));

	h.peer.send_raw(r#"[{"Bogus":{"Id":0}}]"#).unwrap();
	assert!(matches!(
		next_event(&mut h.events).await,
		SessionEvent::ErrorReceived(Error::Message(_))
	));

	h.peer.send(&[ServerMessage::ScanningFinished(Default::default())]).unwrap();
	assert_eq!(next_event(&mut h.events).await, SessionEvent::ScanningFinished);
	assert!(h.session.is_ready());
}

#[tokio::test]
async fn test_device_pushes_update_registry() {
	let mut h = open(vec![device_info(5, "Toy")]).await;

	h.peer
		.send(&[ServerMessage::DeviceAdded(device_info(5, "Impostor"))])
		.unwrap();
	assert!(matches!(
		next_event(&mut h.events).await,
		SessionEvent::ErrorReceived(Error::Device(_))
	));
	assert_eq!(h.session.registry().get(5).unwrap().name, "Toy");

	h.peer
		.send(&[ServerMessage::DeviceAdded(device_info(6, "Other"))])
		.unwrap();
	match next_event(&mut h.events).await {
		SessionEvent::DeviceAdded(device) => assert_eq!(device.index, 6),
		other => panic!("unexpected event {other:?}"),
	}
	assert!(h.session.registry().contains(6));

	let removed = ServerMessage::DeviceRemoved(DeviceRemoved {
		id: 0,
		device_index: 6,
	});
	h.peer.send(&[removed.clone()]).unwrap();
	match next_event(&mut h.events).await {
		SessionEvent::DeviceRemoved(device) => assert_eq!(device.name, "Other"),
		other => panic!("unexpected event {other:?}"),
	}
	assert!(!h.session.registry().contains(6));

	h.peer.send(&[removed]).unwrap();
	assert!(matches!(
		next_event(&mut h.events).await,
		SessionEvent::ErrorReceived(Error::Device(_))
	));
}

#[tokio::test]
async fn test_ping_error_push_raises_timeout_without_disconnect() {
	let mut h = open(Vec::new()).await;

	h.peer
		.send(&[ServerMessage::error(0, ErrorCode::Ping, "ping timed out")])
		.unwrap();

	assert_eq!(next_event(&mut h.events).await, SessionEvent::PingTimeout);
	assert_eq!(
		next_event(&mut h.events).await,
		SessionEvent::ErrorReceived(Error::Ping("ping timed out".to_string()))
	);
	assert!(h.session.is_ready());
}

#[tokio::test]
async fn test_raw_reading_push_is_forwarded() {
	let mut h = open(vec![device_info(5, "Toy")]).await;

	h.peer
		.send(&[ServerMessage::RawReading(RawReading {
			id: 0,
			device_index: 5,
			endpoint: "rx".to_string(),
			data: vec![1, 2, 3],
		})])
		.unwrap();

	assert_eq!(
		next_event(&mut h.events).await,
		SessionEvent::RawReading {
			device_index: 5,
			endpoint: "rx".to_string(),
			data: vec![1, 2, 3],
		}
	);
}

#[tokio::test]
async fn test_handshake_error_faults_session() {
	let (connector, mut listener) = memory();
	let (events_tx, _events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
	let session = Session::new(SessionConfig::new(CLIENT_NAME), events_tx);

	let opening = tokio::spawn({
		let session = Arc::clone(&session);
		async move { session.open(&connector).await }
	});
	let mut peer = listener.accept().await.unwrap();
	let id = peer.recv_message().await.unwrap().id();
	peer.send(&[ServerMessage::error(id, ErrorCode::Init, "version mismatch")])
		.unwrap();

	let err = opening.await.unwrap().unwrap_err();
	assert!(err.is_connector());
	assert!(err.to_string().contains("version mismatch"));
	assert_eq!(session.state(), SessionState::Faulted);
}

#[tokio::test]
async fn test_transport_closed_during_handshake() {
	let (connector, mut listener) = memory();
	let (events_tx, mut events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
	let session = Session::new(SessionConfig::new(CLIENT_NAME), events_tx);

	let opening = tokio::spawn({
		let session = Arc::clone(&session);
		async move { session.open(&connector).await }
	});
	let mut peer = listener.accept().await.unwrap();
	peer.recv_message().await.unwrap();
	peer.close();

	assert!(opening.await.unwrap().unwrap_err().is_connector());
	session.closed().await;
	assert_eq!(session.state(), SessionState::Faulted);
	assert!(events.try_recv().is_err(), "never ready, so no disconnect event");
}

#[tokio::test]
async fn test_open_fails_without_server() {
	let (connector, listener) = memory();
	drop(listener);
	let (events_tx, _events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
	let session = Session::new(SessionConfig::default(), events_tx);

	assert!(session.open(&connector).await.unwrap_err().is_connector());
	assert_eq!(session.state(), SessionState::Faulted);
	assert!(session.open(&connector).await.unwrap_err().is_connector());
}

#[tokio::test]
async fn test_server_close_while_ready_disconnects() {
	let mut h = open(Vec::new()).await;

	let pending = tokio::spawn({
		let session = Arc::clone(&h.session);
		async move { session.send_request(ClientMessage::start_scanning()).await }
	});
	h.peer.recv_message().await.unwrap();
	h.peer.close();

	assert_eq!(next_event(&mut h.events).await, SessionEvent::ServerDisconnected);
	h.session.closed().await;
	assert_eq!(h.session.state(), SessionState::Faulted);
	assert!(pending.await.unwrap().unwrap_err().is_connector());

	let err = h
		.session
		.send_request(ClientMessage::stop_scanning())
		.await
		.unwrap_err();
	assert!(err.is_connector());
}

#[tokio::test]
async fn test_transport_failure_faults_session() {
	let mut h = open(Vec::new()).await;

	h.peer.fail("connection reset");

	assert_eq!(next_event(&mut h.events).await, SessionEvent::ServerDisconnected);
	assert_eq!(h.session.state(), SessionState::Faulted);
}

#[tokio::test(start_paused = true)]
async fn test_stall_detected_when_probes_unanswered() {
	let config = SessionConfig::new(CLIENT_NAME).with_stall_interval(Duration::from_secs(2));
	let mut h = open_with(config, 0, Vec::new()).await;
	h.peer.stop_answering_probes();
	let start = tokio::time::Instant::now();

	assert_eq!(next_event(&mut h.events).await, SessionEvent::ServerDisconnected);
	assert_eq!(h.session.state(), SessionState::Faulted);
	assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_answered_probes_keep_session_alive() {
	let config = SessionConfig::new(CLIENT_NAME).with_stall_interval(Duration::from_secs(2));
	let mut h = open_with(config, 0, Vec::new()).await;

	tokio::time::sleep(Duration::from_secs(30)).await;

	assert!(h.session.is_ready());
	assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_close_is_idempotent() {
	let h = open(Vec::new()).await;

	h.session.close().await;
	h.session.close().await;
	assert_eq!(h.session.state(), SessionState::Disconnected);

	let err = h
		.session
		.send_request(ClientMessage::ping())
		.await
		.unwrap_err();
	assert!(err.is_connector());
}

#[tokio::test]
async fn test_ids_increase_from_one() {
	let mut h = open(Vec::new()).await;

	for expected in 3..6 {
		let request = tokio::spawn({
			let session = Arc::clone(&h.session);
			async move { session.send_request(ClientMessage::stop_scanning()).await }
		});
		let id = h.peer.recv_message().await.unwrap().id();
		assert_eq!(id, expected);
		h.peer.send(&[ServerMessage::ok(id)]).unwrap();
		request.await.unwrap().unwrap();
	}
}

#[tokio::test]
async fn test_failed_send_faults_session() {
	let mut h = open(Vec::new()).await;
	h.peer.refuse_frames();

	let err = h
		.session
		.send_request(ClientMessage::start_scanning())
		.await
		.unwrap_err();
	assert!(err.is_connector());

	assert_eq!(next_event(&mut h.events).await, SessionEvent::ServerDisconnected);
	h.session.closed().await;
	assert_eq!(h.session.state(), SessionState::Faulted);
	assert_eq!(h.session.pending_requests(), 0);
}

#[tokio::test]
async fn test_failed_device_list_send_fails_open() {
	let (connector, mut listener) = memory();
	let (events_tx, _events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
	let session = Session::new(SessionConfig::new(CLIENT_NAME), events_tx);

	let opening = tokio::spawn({
		let session = Arc::clone(&session);
		async move { session.open(&connector).await }
	});
	let mut peer = listener.accept().await.unwrap();
	let id = peer.recv_message().await.unwrap().id();
	peer.refuse_frames();
	peer.send(&[server_info(id, 0)]).unwrap();

	assert!(opening.await.unwrap().unwrap_err().is_connector());
	assert_eq!(session.state(), SessionState::Faulted);
	assert!(!session.is_ready());
}

#[tokio::test]
async fn test_abort_fails_outstanding_requests_immediately() {
	let mut h = open(Vec::new()).await;

	let request = tokio::spawn({
		let session = Arc::clone(&h.session);
		async move { session.send_request(ClientMessage::start_scanning()).await }
	});
	h.peer.recv_message().await.unwrap();
	assert_eq!(h.session.pending_requests(), 1);

	h.session.abort();

	assert_eq!(h.session.state(), SessionState::Disconnected);
	assert_eq!(h.session.pending_requests(), 0);
	let err = tokio::time::timeout(Duration::from_secs(5), request)
		.await
		.expect("request still waiting after abort")
		.unwrap()
		.unwrap_err();
	assert!(err.is_connector());
	assert!(
		h.session
			.send_request(ClientMessage::stop_scanning())
			.await
			.unwrap_err()
			.is_connector()
	);
	assert_eq!(h.peer.recv().await, None);
	assert!(h.events.try_recv().is_err(), "an abort is not a disconnect event");

	h.session.abort();
	h.session.close().await;
	assert_eq!(h.session.state(), SessionState::Disconnected);
}
