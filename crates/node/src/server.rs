//! Unix socket IPC server.

use std::path::Path;
use std::sync::Arc;

use filmreg_proto::{Event, Frame, Request, RequestPayload, Response, ResponsePayload, read_frame, write_frame};
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::net::UnixListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::RegistryService;

/// Outbound frames queued per connection. A subscriber that lets this fill up
/// is disconnected.
const OUTBOUND_CAPACITY: usize = 64;

/// Serves `service` on a Unix domain socket until `shutdown` fires.
///
/// A stale socket file at `socket_path` is removed first, and the socket file
/// is removed again on shutdown.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or if filesystem operations
/// on the socket path fail.
pub async fn serve(
	socket_path: impl AsRef<Path>,
	service: Arc<RegistryService>,
	shutdown: CancellationToken,
) -> std::io::Result<()> {
	let path = socket_path.as_ref();
	if path.exists() {
		tokio::fs::remove_file(path).await?;
	}
	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		tokio::fs::create_dir_all(parent).await?;
	}

	let listener = UnixListener::bind(path)?;
	info!(path = %path.display(), deployment = %service.deployment().id(), "node listening");

	loop {
		tokio::select! {
			_ = shutdown.cancelled() => {
				info!("node shutting down");
				break;
			}
			res = listener.accept() => {
				match res {
					Ok((stream, _addr)) => {
						tokio::spawn(handle_connection(stream, service.clone()));
					}
					Err(e) => {
						warn!(error = %e, "failed to accept connection");
					}
				}
			}
		}
	}

	if let Err(e) = tokio::fs::remove_file(path).await {
		debug!(error = %e, "socket file already gone");
	}
	Ok(())
}

/// Handles a single client connection.
///
/// Requests are answered in arrival order. Outbound frames (responses and,
/// after `Subscribe`, events) are funnelled through one writer task so they
/// never interleave on the stream. Responses wait for queue space; events
/// never do, and a full queue closes the connection.
pub async fn handle_connection<S>(stream: S, service: Arc<RegistryService>)
where
	S: AsyncRead + AsyncWrite + Send + 'static,
{
	debug!("client connected");
	let (mut reader, writer) = tokio::io::split(stream);
	let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);
	let writer_task = tokio::spawn(write_loop(writer, out_rx));
	let overflow = CancellationToken::new();
	let mut forwarder: Option<JoinHandle<()>> = None;

	loop {
		let read = tokio::select! {
			_ = overflow.cancelled() => break,
			read = read_frame(&mut reader) => read,
		};
		let frame = match read {
			Ok(Some(frame)) => frame,
			Ok(None) => break,
			Err(e) => {
				warn!(error = %e, "dropping connection after bad frame");
				break;
			}
		};
		let Frame::Request(Request { id, payload }) = frame else {
			warn!("ignoring non-request frame from client");
			continue;
		};

		if matches!(payload, RequestPayload::Subscribe) {
			let events = service.subscribe();
			if out_tx
				.send(Frame::Response(Response::ok(id, ResponsePayload::Subscribed)))
				.await
				.is_err()
			{
				break;
			}
			if forwarder.is_none() {
				forwarder = Some(tokio::spawn(forward_events(events, out_tx.clone(), overflow.clone())));
			}
			continue;
		}

		let response = match service.handle(payload).await {
			Ok(payload) => Response::ok(id, payload),
			Err(error) => Response::err(id, error),
		};
		if out_tx.send(Frame::Response(response)).await.is_err() {
			break;
		}
	}

	if let Some(forwarder) = forwarder {
		forwarder.abort();
	}
	drop(out_tx);
	if overflow.is_cancelled() {
		writer_task.abort();
	}
	let _ = writer_task.await;
	debug!("client disconnected");
}

async fn write_loop<S>(mut writer: WriteHalf<S>, mut frames: mpsc::Receiver<Frame>)
where
	S: AsyncWrite,
{
	while let Some(frame) = frames.recv().await {
		if let Err(e) = write_frame(&mut writer, &frame).await {
			debug!(error = %e, "client write failed");
			break;
		}
	}
}

async fn forward_events(mut events: broadcast::Receiver<Event>, out: mpsc::Sender<Frame>, overflow: CancellationToken) {
	loop {
		match events.recv().await {
			Ok(event) => match out.try_send(Frame::Event(event)) {
				Ok(()) => {}
				Err(mpsc::error::TrySendError::Full(_)) => {
					warn!(capacity = OUTBOUND_CAPACITY, "subscriber not reading, disconnecting");
					overflow.cancel();
					break;
				}
				Err(mpsc::error::TrySendError::Closed(_)) => break,
			},
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				warn!(skipped, "subscriber lagged, events dropped");
			}
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use filmreg_contract::ReadMode;
	use filmreg_proto::RequestId;

	use super::*;
	use crate::deployment::Deployment;

	fn add_film(service: &RegistryService, name: String) -> RequestPayload {
		RequestPayload::AddFilm {
			deployment: service.deployment().id(),
			sender: "alice".into(),
			name,
			rating: 3,
			review: String::new(),
		}
	}

	#[tokio::test]
	async fn answers_requests_on_a_duplex_stream() {
		let (service, _executor) = RegistryService::new(Deployment::ephemeral(ReadMode::Strict), 4);
		let (mut client, server) = tokio::io::duplex(4096);
		let conn = tokio::spawn(handle_connection(server, service.clone()));

		let request = Frame::Request(Request {
			id: RequestId(7),
			payload: add_film(&service, "Heat".into()),
		});
		write_frame(&mut client, &request).await.unwrap();
		let Some(Frame::Response(response)) = read_frame(&mut client).await.unwrap() else {
			panic!("expected response");
		};
		assert_eq!(response.request_id, RequestId(7));
		assert!(matches!(response.into_result(), Ok(ResponsePayload::Receipt(_))));

		drop(client);
		tokio::time::timeout(Duration::from_secs(5), conn).await.unwrap().unwrap();
	}

	#[tokio::test]
	async fn subscriber_that_stops_reading_is_disconnected() {
		let (service, _executor) = RegistryService::new(Deployment::ephemeral(ReadMode::Strict), 4);
		let (mut client, server) = tokio::io::duplex(256);
		let conn = tokio::spawn(handle_connection(server, service.clone()));

		let subscribe = Frame::Request(Request {
			id: RequestId(1),
			payload: RequestPayload::Subscribe,
		});
		write_frame(&mut client, &subscribe).await.unwrap();
		assert!(matches!(read_frame(&mut client).await.unwrap(), Some(Frame::Response(_))));

		for i in 0..(OUTBOUND_CAPACITY * 3) {
			service.handle(add_film(&service, format!("film {i}"))).await.unwrap();
		}

		tokio::time::timeout(Duration::from_secs(5), conn)
			.await
			.expect("slow subscriber should be disconnected")
			.unwrap();
		assert_eq!(service.deployment().registry().film_count(), (OUTBOUND_CAPACITY * 3) as u64);
		drop(client);
	}
}
