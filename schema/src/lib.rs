//! Runtime pieces shared by the msgwire compiler and the code it generates.
//!
//! The wire format is deliberately plain: big-endian scalars of fixed width,
//! a 4-byte length prefix for text (counting a trailing null) and dynamic
//! arrays, no prefix for fixed arrays, and no framing at all around nested
//! messages.
//!
//! ```
//! use msgwire_schema::*;
//!
//! let mut storage = [0u8; 16];
//! let mut bb = ByteBufferMut::new(&mut storage);
//! bb.write_u32(42).unwrap();
//! bb.write_string("hi").unwrap();
//! assert_eq!(bb.written(), [0, 0, 0, 42, 0, 0, 0, 3, 104, 105, 0]);
//!
//! let mut rd = ByteBuffer::new(&storage[..11]);
//! assert_eq!(rd.read_u32(), Ok(42));
//! assert_eq!(rd.read_string().as_deref(), Ok("hi"));
//! ```

pub mod bb;
pub mod error;
pub mod schema;
pub mod value;

pub use bb::*;
pub use error::*;
pub use schema::*;
pub use value::*;
