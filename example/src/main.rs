// example/src/main.rs

mod generated;

use msgwire::*;
use serde_json::json;

// Bring the generated types into scope:
use generated::builtin_interfaces::Time;
use generated::sensor_msgs::LaserScan;
use generated::std_msgs::Header;

/// A short scan: five rays, no intensities.
fn sample_scan() -> LaserScan {
    LaserScan {
        header: Header {
            stamp:    Time { sec: 1_700_000_000, nanosec: 250_000_000 },
            frame_id: "laser".to_string(),
        },
        angle_min:       -0.5,
        angle_max:       0.5,
        angle_increment: 0.25,
        range_min:       0.1,
        range_max:       30.0,
        ranges:          vec![1.5, 1.25, 1.0, 1.25, 1.5],
        ..Default::default()
    }
}

fn main() -> Result<(), WireError> {
    let scan = sample_scan();

    // 1) Encode into a fixed buffer sized by `encoded_len`.
    let mut buffer = vec![0u8; scan.encoded_len()];
    let written = scan.encode(&mut buffer)?;
    println!("encoded {} bytes (minimum for this type: {})", written, LaserScan::MIN_SIZE);

    // 2) A buffer one byte short is rejected, not overrun.
    let mut short = vec![0u8; written - 1];
    match scan.encode(&mut short) {
        Err(err) => println!("short buffer: {}", err),
        Ok(n) => println!("unexpectedly wrote {} bytes", n),
    }

    // 3) Decode it back.
    let (decoded, consumed) = LaserScan::decode(&buffer[..written])?;
    assert_eq!(decoded, scan);

    let summary = json!({
        "type": LaserScan::TYPE_NAME,
        "consumed": consumed,
        "frame_id": decoded.header.frame_id,
        "stamp": { "sec": decoded.header.stamp.sec, "nanosec": decoded.header.stamp.nanosec },
        "ranges": decoded.ranges,
    });
    println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_with_intensities() -> LaserScan {
        LaserScan { intensities: vec![7.0, 8.5], ..sample_scan() }
    }

    #[test]
    fn laser_scan_round_trips() {
        let scan = scan_with_intensities();
        let bytes = scan.encode_to_vec().unwrap();
        // header 18, seven floats 28, ranges 4 + 20, intensities 4 + 8
        assert_eq!(bytes.len(), 82);
        assert_eq!(scan.encoded_len(), 82);

        let (decoded, consumed) = LaserScan::decode(&bytes).unwrap();
        assert_eq!(consumed, 82);
        assert_eq!(decoded, scan);

        let empty = LaserScan::default();
        let bytes = empty.encode_to_vec().unwrap();
        assert_eq!(bytes.len(), LaserScan::MIN_SIZE);
        assert_eq!(LaserScan::decode(&bytes).unwrap(), (empty, LaserScan::MIN_SIZE));
    }

    #[test]
    fn laser_scan_wire_layout() {
        let bytes = scan_with_intensities().encode_to_vec().unwrap();
        assert_eq!(&bytes[..4], &1_700_000_000i32.to_be_bytes());
        assert_eq!(&bytes[4..8], &250_000_000u32.to_be_bytes());
        assert_eq!(&bytes[8..18], &[0, 0, 0, 6, b'l', b'a', b's', b'e', b'r', 0]);
        assert_eq!(&bytes[18..22], &(-0.5f32).to_be_bytes());
        assert_eq!(&bytes[46..50], &[0, 0, 0, 5]);
        assert_eq!(&bytes[70..74], &[0, 0, 0, 2]);
        assert_eq!(&bytes[78..], &8.5f32.to_be_bytes());
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let scan = scan_with_intensities();
        let bytes = scan.encode_to_vec().unwrap();

        for len in 0..bytes.len() {
            let mut short = vec![0u8; len];
            assert!(
                matches!(scan.encode(&mut short), Err(WireError::BufferTooSmall { .. })),
                "encode into {} bytes",
                len
            );
            assert!(
                matches!(LaserScan::decode(&bytes[..len]), Err(WireError::BufferTooSmall { .. })),
                "decode of a {} byte prefix",
                len
            );
        }
    }

    #[test]
    fn hostile_counts_fail_before_allocating() {
        let mut bytes = scan_with_intensities().encode_to_vec().unwrap();
        bytes[46..50].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            LaserScan::decode(&bytes),
            Err(WireError::BufferTooSmall { needed: 0xFFFF_FFFF * 4, available: 32 })
        );
    }

    #[test]
    fn frame_ids_must_be_utf8() {
        let mut bytes = scan_with_intensities().encode_to_vec().unwrap();
        bytes[12] = 0xFF;
        assert_eq!(LaserScan::decode(&bytes), Err(WireError::InvalidUtf8 { valid_up_to: 0 }));

        let mut bytes = scan_with_intensities().encode_to_vec().unwrap();
        bytes[17] = b'!';
        assert_eq!(LaserScan::decode(&bytes), Err(WireError::MissingTerminator { len_with_null: 6 }));
    }
}
