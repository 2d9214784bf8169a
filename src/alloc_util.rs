use alloc::vec::Vec;

use crate::limits::MAX_BUFFER_LEN;
use crate::{CborError, ErrorCode};

/// Zeroed output storage of exactly `len` bytes for the second encode pass.
///
/// Heap exhaustion is reported as `BufferTooSmall` rather than aborting.
pub fn output_storage(len: usize) -> Result<Vec<u8>, CborError> {
    if len > MAX_BUFFER_LEN {
        return Err(CborError::encode(ErrorCode::BufferTooLarge, 0));
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| {
        cbor_debug!("cannot allocate {} bytes of encoder output", len);
        CborError::encode(ErrorCode::BufferTooSmall, 0)
    })?;
    buf.resize(len, 0);
    Ok(buf)
}
