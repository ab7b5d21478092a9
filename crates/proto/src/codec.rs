//! Length-prefixed postcard framing.

use std::io::{Error as IoError, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::Frame;

/// Largest accepted frame body, in bytes.
pub const MAX_FRAME_LEN: u32 = 1 << 20;

/// Encodes `frame` and writes it with a `u32` little-endian length prefix.
///
/// # Errors
///
/// Fails on encoding errors, on frames larger than [`MAX_FRAME_LEN`], and on
/// I/O errors from `writer`.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> std::io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	let buf = postcard::to_allocvec(frame).map_err(|e| IoError::new(ErrorKind::InvalidData, e.to_string()))?;
	let len = u32::try_from(buf.len())
		.ok()
		.filter(|len| *len <= MAX_FRAME_LEN)
		.ok_or_else(|| IoError::new(ErrorKind::InvalidData, format!("frame of {} bytes exceeds limit", buf.len())))?;
	writer.write_u32_le(len).await?;
	writer.write_all(&buf).await?;
	writer.flush().await?;
	Ok(())
}

/// Reads one frame.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly between frames.
///
/// # Errors
///
/// Fails with [`ErrorKind::InvalidData`] on oversized or undecodable frames,
/// and with [`ErrorKind::UnexpectedEof`] if the stream ends mid-frame.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<Frame>>
where
	R: AsyncRead + Unpin,
{
	let len = match reader.read_u32_le().await {
		Ok(len) => len,
		Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
		Err(e) => return Err(e),
	};
	if len > MAX_FRAME_LEN {
		return Err(IoError::new(ErrorKind::InvalidData, format!("frame of {len} bytes exceeds limit")));
	}
	let mut buf = vec![0u8; len as usize];
	reader.read_exact(&mut buf).await?;
	postcard::from_bytes(&buf)
		.map(Some)
		.map_err(|e| IoError::new(ErrorKind::InvalidData, e.to_string()))
}
