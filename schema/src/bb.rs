use crate::error::WireError;

/// Write the low `width` bytes of `value` to the front of `dst`, most
/// significant byte first. `width` is one of 1, 2, 4 or 8.
pub fn write_be(dst: &mut [u8], width: usize, value: u64) {
    debug_assert!(matches!(width, 1 | 2 | 4 | 8));
    for i in 0..width {
        dst[i] = (value >> (8 * (width - 1 - i))) as u8;
    }
}

/// Read `width` bytes from the front of `src` as a big-endian unsigned value.
pub fn read_be(src: &[u8], width: usize) -> u64 {
    debug_assert!(matches!(width, 1 | 2 | 4 | 8));
    src[..width]
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

/// Bulk copy of `src` to the front of `dst`.
pub fn copy_bytes(dst: &mut [u8], src: &[u8]) {
    dst[..src.len()].copy_from_slice(src);
}

/// Reserve room for exactly `count` elements, reporting failure instead of
/// aborting the process.
pub fn alloc_vec<T>(count: usize) -> Result<Vec<T>, WireError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(count)
        .map_err(|_| WireError::AllocationFailure { requested: count })?;
    Ok(vec)
}

/// A read cursor over an encoded message.
///
/// Example usage:
///
/// ```
/// let mut bb = msgwire_schema::ByteBuffer::new(&[0, 0, 0, 3, 104, 105, 0, 0, 42]);
/// assert_eq!(bb.read_string().as_deref(), Ok("hi"));
/// assert_eq!(bb.read_u16(), Ok(42));
/// assert_eq!(bb.index(), 9);
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as the number of bytes consumed.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Fails with `BufferTooSmall` unless `len` more bytes can be read.
    pub fn ensure(&self, len: usize) -> Result<(), WireError> {
        if len > self.remaining() {
            Err(WireError::BufferTooSmall {
                needed:    len,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Read a big-endian unsigned value of `width` bytes.
    pub fn read_uint(&mut self, width: usize) -> Result<u64, WireError> {
        self.ensure(width)?;
        let value = read_be(&self.data[self.index..], width);
        self.index += width;
        Ok(value)
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, WireError> {
        Ok(self.read_uint(1)? as u8)
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        Ok(self.read_uint(2)? as u16)
    }

    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        Ok(self.read_uint(2)? as u16 as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(self.read_uint(4)? as u32)
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(self.read_uint(4)? as u32 as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        self.read_uint(8)
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok(self.read_uint(8)? as i64)
    }

    /// Read an IEEE-754 single from its big-endian bit pattern.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read an IEEE-754 double from its big-endian bit pattern.
    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        self.ensure(len)?;
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    /// Read the 4-byte element count that precedes a dynamic array.
    pub fn read_count(&mut self) -> Result<usize, WireError> {
        Ok(self.read_u32()? as usize)
    }

    /// Read a length-prefixed, null-terminated text field.
    ///
    /// The prefix counts the terminator. The payload is copied into a fresh
    /// allocation of exactly that many bytes, which the returned string owns.
    /// A zero prefix reads as the empty string. A payload that is not UTF-8 or
    /// whose last byte is not `0x00` is rejected rather than repaired.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len_with_null = self.read_count()?;
        if len_with_null == 0 {
            return Ok(String::new());
        }
        let payload = self.read_bytes(len_with_null)?;
        if payload[len_with_null - 1] != 0 {
            return Err(WireError::MissingTerminator { len_with_null });
        }

        let mut bytes: Vec<u8> = alloc_vec(len_with_null)?;
        bytes.extend_from_slice(&payload[..len_with_null - 1]);
        String::from_utf8(bytes).map_err(|err| WireError::InvalidUtf8 {
            valid_up_to: err.utf8_error().valid_up_to(),
        })
    }
}

#[test]
fn read_be_widths() {
    assert_eq!(read_be(&[0x2A], 1), 0x2A);
    assert_eq!(read_be(&[0x12, 0x34], 2), 0x1234);
    assert_eq!(read_be(&[0, 0, 0, 42], 4), 42);
    assert_eq!(read_be(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 8), 0x0102_0304_0506_0708);
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(
        read(&[]),
        Err(WireError::BufferTooSmall { needed: 1, available: 0 })
    );
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bool() {
    let read = |bytes| ByteBuffer::new(bytes).read_bool();
    assert!(read(&[]).is_err());
    assert_eq!(read(&[0]), Ok(false));
    assert_eq!(read(&[1]), Ok(true));
    assert_eq!(read(&[2]), Ok(true));
}

#[test]
fn read_integers() {
    assert_eq!(ByteBuffer::new(&[0xFF, 0xFE]).read_i16(), Ok(-2));
    assert_eq!(ByteBuffer::new(&[0, 0, 0, 0x2A]).read_u32(), Ok(42));
    assert_eq!(ByteBuffer::new(&[0xFF, 0xFF, 0xFF, 0xFF]).read_i32(), Ok(-1));
    assert_eq!(
        ByteBuffer::new(&[0x80, 0, 0, 0, 0, 0, 0, 0]).read_i64(),
        Ok(i64::MIN)
    );
    assert_eq!(
        ByteBuffer::new(&[0, 0, 0]).read_u32(),
        Err(WireError::BufferTooSmall { needed: 4, available: 3 })
    );
}

#[test]
fn read_floats() {
    assert_eq!(ByteBuffer::new(&[0x3F, 0x80, 0, 0]).read_f32(), Ok(1.0));
    assert_eq!(
        ByteBuffer::new(&[0xC0, 0, 0, 0, 0, 0, 0, 0]).read_f64(),
        Ok(-2.0)
    );
}

#[test]
fn read_bytes() {
    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok([1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(2), Ok([4, 5].as_slice()));
    assert!(bb.read_bytes(1).is_err());
    assert_eq!(bb.index(), 5);
}

#[test]
fn read_string() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(read(&[0, 0, 0, 3, 104, 105, 0]), Ok("hi".to_owned()));
    assert_eq!(read(&[0, 0, 0, 1, 0]), Ok(String::new()));
    assert_eq!(read(&[0, 0, 0, 0]), Ok(String::new()));
    assert_eq!(
        read(&[0, 0, 0, 4, 104, 105, 0]),
        Err(WireError::BufferTooSmall { needed: 4, available: 3 })
    );
}

#[test]
fn read_string_rejects_bad_payloads() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(
        read(&[0, 0, 0, 2, 0xFF, 0]),
        Err(WireError::InvalidUtf8 { valid_up_to: 0 })
    );
    assert_eq!(
        read(&[0, 0, 0, 4, b'o', b'k', 0xC3, 0]),
        Err(WireError::InvalidUtf8 { valid_up_to: 2 })
    );
    assert_eq!(
        read(&[0, 0, 0, 3, b'h', b'i', b'!']),
        Err(WireError::MissingTerminator { len_with_null: 3 })
    );
}

#[test]
fn read_string_capacity_is_exact() {
    let mut bb = ByteBuffer::new(&[0, 0, 0, 6, b'f', b'r', b'a', b'm', b'e', 0]);
    let text = bb.read_string().unwrap();
    assert_eq!(text, "frame");
    assert_eq!(text.capacity(), 6);
}

/// A fixed-capacity write cursor over a caller-supplied buffer.
///
/// Every write checks that the whole value fits before touching the buffer.
/// Earlier writes are never rolled back when a later one fails.
///
/// Example usage:
///
/// ```
/// let mut storage = [0u8; 8];
/// let mut bb = msgwire_schema::ByteBufferMut::new(&mut storage);
/// bb.write_string("hi").unwrap();
/// assert_eq!(bb.len(), 7);
/// assert_eq!(bb.written(), [0, 0, 0, 3, 104, 105, 0]);
/// assert!(bb.write_u32(1).is_err());
/// ```
///
pub struct ByteBufferMut<'a> {
    data: &'a mut [u8],
    index: usize,
}

impl<'a> ByteBufferMut<'a> {
    /// Wraps `data`; its length is the capacity.
    pub fn new(data: &'a mut [u8]) -> ByteBufferMut<'a> {
        ByteBufferMut { data, index: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// The prefix of the buffer written so far.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.index]
    }

    /// Fails with `BufferTooSmall` unless `len` more bytes fit.
    pub fn ensure(&self, len: usize) -> Result<(), WireError> {
        if len > self.remaining() {
            Err(WireError::BufferTooSmall {
                needed:    len,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Write the low `width` bytes of `value`, big-endian.
    pub fn write_uint(&mut self, width: usize, value: u64) -> Result<(), WireError> {
        self.ensure(width)?;
        write_be(&mut self.data[self.index..], width, value);
        self.index += width;
        Ok(())
    }

    pub fn write_byte(&mut self, value: u8) -> Result<(), WireError> {
        self.write_uint(1, value as u64)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), WireError> {
        self.write_byte(if value { 1 } else { 0 })
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), WireError> {
        self.write_byte(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), WireError> {
        self.write_uint(2, value as u64)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), WireError> {
        self.write_uint(2, value as u16 as u64)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.write_uint(4, value as u64)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), WireError> {
        self.write_uint(4, value as u32 as u64)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), WireError> {
        self.write_uint(8, value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), WireError> {
        self.write_uint(8, value as u64)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), WireError> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), WireError> {
        self.write_u64(value.to_bits())
    }

    /// Write a raw byte slice.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), WireError> {
        self.ensure(value.len())?;
        copy_bytes(&mut self.data[self.index..], value);
        self.index += value.len();
        Ok(())
    }

    /// Write the 4-byte element count of a dynamic array.
    pub fn write_count(&mut self, count: usize) -> Result<(), WireError> {
        let count = u32::try_from(count).map_err(|_| WireError::LengthOverflow(count))?;
        self.write_u32(count)
    }

    /// Write a length-prefixed, null-terminated text field. The prefix counts
    /// the terminator, and the whole field is bounds-checked up front.
    pub fn write_string(&mut self, value: &str) -> Result<(), WireError> {
        let bytes = value.as_bytes();
        let len_with_null = bytes.len() + 1;
        let prefix =
            u32::try_from(len_with_null).map_err(|_| WireError::LengthOverflow(bytes.len()))?;

        self.ensure(4 + len_with_null)?;
        self.write_u32(prefix)?;
        self.write_bytes(bytes)?;
        self.write_byte(0)
    }
}

#[cfg(test)]
fn write_once(capacity: usize, cb: fn(&mut ByteBufferMut) -> Result<(), WireError>) -> Result<Vec<u8>, WireError> {
    let mut storage = vec![0u8; capacity];
    let mut bb = ByteBufferMut::new(&mut storage);
    cb(&mut bb)?;
    Ok(bb.written().to_vec())
}

#[test]
fn write_be_widths() {
    let mut buf = [0u8; 8];
    write_be(&mut buf, 4, 42);
    assert_eq!(buf[..4], [0, 0, 0, 0x2A]);
    write_be(&mut buf, 8, 0x0102_0304_0506_0708);
    assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
    write_be(&mut buf, 2, 0xABCD);
    assert_eq!(buf[..2], [0xAB, 0xCD]);
}

#[test]
fn write_scalars() {
    assert_eq!(write_once(4, |bb| bb.write_u32(42)), Ok(vec![0, 0, 0, 0x2A]));
    assert_eq!(write_once(2, |bb| bb.write_i16(-2)), Ok(vec![0xFF, 0xFE]));
    assert_eq!(write_once(1, |bb| bb.write_bool(true)), Ok(vec![1]));
    assert_eq!(write_once(4, |bb| bb.write_f32(1.0)), Ok(vec![0x3F, 0x80, 0, 0]));
    assert_eq!(
        write_once(8, |bb| bb.write_f64(-2.0)),
        Ok(vec![0xC0, 0, 0, 0, 0, 0, 0, 0])
    );
}

#[test]
fn write_bounds() {
    assert_eq!(
        write_once(3, |bb| bb.write_u32(1)),
        Err(WireError::BufferTooSmall { needed: 4, available: 3 })
    );
    assert_eq!(
        write_once(0, |bb| bb.write_byte(1)),
        Err(WireError::BufferTooSmall { needed: 1, available: 0 })
    );
}

#[test]
fn write_string() {
    assert_eq!(
        write_once(7, |bb| bb.write_string("hi")),
        Ok(vec![0, 0, 0, 3, 0x68, 0x69, 0])
    );
    assert_eq!(write_once(5, |bb| bb.write_string("")), Ok(vec![0, 0, 0, 1, 0]));
}

#[test]
fn write_string_checks_whole_field_first() {
    let mut storage = [0xEEu8; 6];
    let mut bb = ByteBufferMut::new(&mut storage);
    assert_eq!(
        bb.write_string("hi"),
        Err(WireError::BufferTooSmall { needed: 7, available: 6 })
    );
    assert_eq!(bb.len(), 0);
    assert_eq!(storage, [0xEE; 6]);
}

#[test]
fn write_sequence() {
    let mut storage = [0u8; 16];
    let mut bb = ByteBufferMut::new(&mut storage);
    bb.write_count(3).unwrap();
    bb.write_bytes(&[1, 2, 3]).unwrap();
    bb.write_u16(0x0102).unwrap();
    assert_eq!(bb.written(), [0, 0, 0, 3, 1, 2, 3, 1, 2]);
    assert_eq!(bb.remaining(), 7);
}

#[test]
fn alloc_vec_reserves_exactly() {
    let vec: Vec<u64> = alloc_vec(5).unwrap();
    assert_eq!(vec.capacity(), 5);
    assert!(vec.is_empty());
    assert_eq!(
        alloc_vec::<u64>(usize::MAX).unwrap_err(),
        WireError::AllocationFailure { requested: usize::MAX }
    );
}
