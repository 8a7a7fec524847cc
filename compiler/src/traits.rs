use msgwire_schema::{alloc_vec, ByteBuffer, ByteBufferMut, WireError};

/// Implemented by every generated message struct.
///
/// `encode_bb`/`decode_bb` work on a shared cursor so nested messages can be
/// written in place; `encode`/`decode` are the whole-buffer entry points.
pub trait WireMessage: Sized {
    /// Qualified type name, e.g. `geometry_msgs/msg/Twist`.
    const TYPE_NAME: &'static str;

    /// Smallest possible encoding: empty text and dynamic arrays.
    const MIN_SIZE: usize;

    fn encode_bb(&self, bb: &mut ByteBufferMut) -> Result<(), WireError>;

    fn decode_bb(bb: &mut ByteBuffer) -> Result<Self, WireError>;

    /// Exact number of bytes `encode` writes.
    fn encoded_len(&self) -> usize;

    /// Writes `self` at the start of `buffer` and returns the bytes written.
    /// On failure the buffer content is unspecified.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, WireError> {
        let mut bb = ByteBufferMut::new(buffer);
        self.encode_bb(&mut bb)?;
        Ok(bb.len())
    }

    fn encode_to_vec(&self) -> Result<Vec<u8>, WireError> {
        let mut buffer = vec![0u8; self.encoded_len()];
        let written = self.encode(&mut buffer)?;
        buffer.truncate(written);
        Ok(buffer)
    }

    /// Reads one message from the start of `buffer`, returning it with the
    /// number of bytes consumed.
    fn decode(buffer: &[u8]) -> Result<(Self, usize), WireError> {
        let mut bb = ByteBuffer::new(buffer);
        let message = Self::decode_bb(&mut bb)?;
        Ok((message, bb.index()))
    }
}

/// Reads a count-prefixed array. Counts that cannot fit in the remaining
/// input, at `min_size` bytes per element (at least one), fail before
/// anything is reserved.
pub fn read_vec<T>(
    bb: &mut ByteBuffer,
    min_size: usize,
    mut read: impl FnMut(&mut ByteBuffer) -> Result<T, WireError>,
) -> Result<Vec<T>, WireError> {
    let count = bb.read_count()?;
    bb.ensure(count.saturating_mul(min_size.max(1)))?;
    let mut items = alloc_vec(count)?;
    for _ in 0..count {
        items.push(read(bb)?);
    }
    Ok(items)
}

/// Reads `N` elements back to back into an array.
pub fn read_array<T: Default, const N: usize>(
    bb: &mut ByteBuffer,
    mut read: impl FnMut(&mut ByteBuffer) -> Result<T, WireError>,
) -> Result<[T; N], WireError> {
    let mut failure = None;
    let items = std::array::from_fn(|_| {
        if failure.is_some() {
            return T::default();
        }
        read(bb).unwrap_or_else(|err| {
            failure = Some(err);
            T::default()
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(items),
    }
}
