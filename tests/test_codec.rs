use std::fmt::Debug;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lmdb_typed::{Error, FromBytes, ToBytes};

fn round_trip<V>(value: V)
where
    V: ToBytes + FromBytes + PartialEq + Debug,
{
    let bytes = value.to_bytes();
    let decoded = V::from_bytes(&bytes).unwrap();
    assert_eq!(value, decoded, "value did not survive the encoding");
}

#[test]
fn test_bool_round_trip() {
    round_trip(true);
    round_trip(false);

    assert_eq!(true.to_bytes().as_ref(), &[1]);
    assert_eq!(false.to_bytes().as_ref(), &[0]);
}

#[test]
fn test_integer_round_trips_at_extremes() {
    round_trip(i8::MIN);
    round_trip(i8::MAX);
    round_trip(i16::MIN);
    round_trip(i16::MAX);
    round_trip(i32::MIN);
    round_trip(i32::MAX);
    round_trip(i64::MIN);
    round_trip(i64::MAX);

    round_trip(u8::MIN);
    round_trip(u8::MAX);
    round_trip(u16::MAX);
    round_trip(u32::MAX);
    round_trip(u64::MAX);

    round_trip(0i64);
    round_trip(-1i64);
}

#[test]
fn test_integer_widths_are_fixed() {
    assert_eq!(1u8.to_bytes().len(), 1);
    assert_eq!(1u16.to_bytes().len(), 2);
    assert_eq!(1u32.to_bytes().len(), 4);
    assert_eq!(1u64.to_bytes().len(), 8);
    assert_eq!(1i64.to_bytes().len(), 8);
}

#[test]
fn test_integers_are_little_endian() {
    assert_eq!(0x0102_0304u32.to_bytes().as_ref(), &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!((-2i16).to_bytes().as_ref(), &[0xfe, 0xff]);
}

#[test]
fn test_float_round_trips() {
    round_trip(f32::MIN);
    round_trip(f32::MAX);
    round_trip(f32::MIN_POSITIVE);
    round_trip(f64::MIN);
    round_trip(f64::MAX);
    round_trip(f64::MIN_POSITIVE);
    round_trip(std::f64::consts::PI);
    round_trip(0.0f64);
}

#[test]
fn test_text_round_trips() {
    round_trip(String::new());
    round_trip("plain ascii".to_owned());
    round_trip("ÆØÅ".to_owned());
    round_trip("Hello world! 👋🏼".to_owned());
    round_trip("数据库".to_owned());
}

#[test]
fn test_raw_bytes_pass_through() {
    round_trip(Vec::<u8>::new());
    round_trip(vec![0u8, 1, 2, 254, 255]);

    let bytes = [0xde, 0xad, 0xbe, 0xef];
    assert_eq!(bytes[..].to_bytes().as_ref(), &bytes);
}

#[test]
fn test_timestamp_round_trips() {
    round_trip(UNIX_EPOCH);
    round_trip(UNIX_EPOCH + Duration::new(1_600_000_000, 123_456_789));
    // Instants before the epoch encode as negative offsets
    round_trip(UNIX_EPOCH - Duration::new(1_000, 42));
    round_trip(SystemTime::now());

    assert_eq!(UNIX_EPOCH.to_bytes().len(), 8);
}

#[test]
fn test_fixed_width_decode_rejects_wrong_length() {
    assert_eq!(
        i32::from_bytes(&[1, 2, 3]),
        Err(Error::DecodeSize { expected: 4, found: 3 })
    );
    assert_eq!(
        u64::from_bytes(&[0; 9]),
        Err(Error::DecodeSize { expected: 8, found: 9 })
    );
    assert_eq!(
        bool::from_bytes(&[]),
        Err(Error::DecodeSize { expected: 1, found: 0 })
    );
    assert_eq!(
        SystemTime::from_bytes(&[0; 4]),
        Err(Error::DecodeSize { expected: 8, found: 4 })
    );
}

#[test]
fn test_text_decode_rejects_invalid_utf8() {
    assert_eq!(String::from_bytes(&[0xff, 0xfe, 0xfd]), Err(Error::DecodeUtf8));
    // A truncated multibyte sequence is invalid too
    let mut truncated = "数".as_bytes().to_vec();
    truncated.pop();
    assert_eq!(String::from_bytes(&truncated), Err(Error::DecodeUtf8));
}
