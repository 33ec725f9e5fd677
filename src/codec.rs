//! Conversion between typed values and the raw byte buffers the engine
//! stores. Every encoding is fixed-layout and little-endian so that data
//! written on one machine reads back identically on another.

use std::borrow::Cow;
use std::mem;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Values that can be encoded into a byte buffer for storage.
pub trait ToBytes {
    /// Encode the value. Borrowed where the in-memory representation is
    /// already the stored representation, owned otherwise.
    fn to_bytes(&self) -> Cow<'_, [u8]>;
}

/// Values that can be decoded back out of a stored byte buffer.
///
/// Decoding must reject buffers that cannot have been produced by the
/// matching [`ToBytes`] implementation: a fixed-width kind fails with
/// [`Error::DecodeSize`] on any length mismatch.
pub trait FromBytes: Sized {
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

fn check_width(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(Error::DecodeSize {
            expected,
            found: bytes.len(),
        });
    }
    Ok(())
}

impl ToBytes for bool {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(vec![u8::from(*self)])
    }
}

impl FromBytes for bool {
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        check_width(bytes, 1)?;
        Ok(bytes[0] != 0)
    }
}

// Fixed-width numbers share one layout: little-endian, exactly
// size_of::<T>() bytes.
macro_rules! number_codec {
    ($($t:ty),* $(,)?) => {$(
        impl ToBytes for $t {
            fn to_bytes(&self) -> Cow<'_, [u8]> {
                Cow::Owned(self.to_le_bytes().to_vec())
            }
        }

        impl FromBytes for $t {
            fn from_bytes(bytes: &[u8]) -> Result<Self> {
                check_width(bytes, mem::size_of::<$t>())?;
                let mut buf = [0u8; mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                Ok(<$t>::from_le_bytes(buf))
            }
        }
    )*};
}

number_codec!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ToBytes for str {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl ToBytes for String {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl FromBytes for String {
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(_) => Err(Error::DecodeUtf8),
        }
    }
}

impl ToBytes for [u8] {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl FromBytes for Vec<u8> {
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

// Timestamps are stored as signed nanoseconds relative to the Unix epoch,
// negative for instants before it. Eight bytes covers 1677..2262, and the
// full nanosecond precision of SystemTime round-trips.
impl ToBytes for SystemTime {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        let nanos = match self.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_nanos() as i64,
            Err(before) => -(before.duration().as_nanos() as i64),
        };
        Cow::Owned(nanos.to_le_bytes().to_vec())
    }
}

impl FromBytes for SystemTime {
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let nanos = i64::from_bytes(bytes)?;
        if nanos >= 0 {
            Ok(UNIX_EPOCH + Duration::from_nanos(nanos as u64))
        } else {
            Ok(UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs()))
        }
    }
}
