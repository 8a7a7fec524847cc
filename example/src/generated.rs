// Generated by msgwire. Do not edit.

pub mod builtin_interfaces {
    #[allow(unused_imports)]
    use msgwire::{read_array, read_vec, ByteBuffer, ByteBufferMut, WireError, WireMessage};

    /// `builtin_interfaces/msg/Time`
    #[derive(Debug, Clone, PartialEq)]
    pub struct Time {
        pub sec: i32,
        pub nanosec: u32,
    }

    impl Default for Time {
        fn default() -> Self {
            Time {
                sec: Default::default(),
                nanosec: Default::default(),
            }
        }
    }

    impl WireMessage for Time {
        const TYPE_NAME: &'static str = "builtin_interfaces/msg/Time";
        const MIN_SIZE: usize = 8;

        fn encode_bb(&self, bb: &mut ByteBufferMut) -> Result<(), WireError> {
            bb.write_i32(self.sec)?;
            bb.write_u32(self.nanosec)?;
            Ok(())
        }

        fn decode_bb(bb: &mut ByteBuffer) -> Result<Self, WireError> {
            let f_sec = bb.read_i32()?;
            let f_nanosec = bb.read_u32()?;
            Ok(Time {
                sec: f_sec,
                nanosec: f_nanosec,
            })
        }

        fn encoded_len(&self) -> usize {
            4
                + 4
        }
    }
}

pub mod std_msgs {
    #[allow(unused_imports)]
    use msgwire::{read_array, read_vec, ByteBuffer, ByteBufferMut, WireError, WireMessage};

    /// `std_msgs/msg/Header`
    #[derive(Debug, Clone, PartialEq)]
    pub struct Header {
        pub stamp: super::builtin_interfaces::Time,
        pub frame_id: String,
    }

    impl Default for Header {
        fn default() -> Self {
            Header {
                stamp: Default::default(),
                frame_id: Default::default(),
            }
        }
    }

    impl WireMessage for Header {
        const TYPE_NAME: &'static str = "std_msgs/msg/Header";
        const MIN_SIZE: usize = 12;

        fn encode_bb(&self, bb: &mut ByteBufferMut) -> Result<(), WireError> {
            self.stamp.encode_bb(bb)?;
            bb.write_string(&self.frame_id)?;
            Ok(())
        }

        fn decode_bb(bb: &mut ByteBuffer) -> Result<Self, WireError> {
            let f_stamp = super::builtin_interfaces::Time::decode_bb(bb)?;
            let f_frame_id = bb.read_string()?;
            Ok(Header {
                stamp: f_stamp,
                frame_id: f_frame_id,
            })
        }

        fn encoded_len(&self) -> usize {
            self.stamp.encoded_len()
                + 4 + self.frame_id.len() + 1
        }
    }
}

pub mod sensor_msgs {
    #[allow(unused_imports)]
    use msgwire::{read_array, read_vec, ByteBuffer, ByteBufferMut, WireError, WireMessage};

    /// `sensor_msgs/msg/LaserScan`
    #[derive(Debug, Clone, PartialEq)]
    pub struct LaserScan {
        pub header: super::std_msgs::Header,
        pub angle_min: f32,
        pub angle_max: f32,
        pub angle_increment: f32,
        pub time_increment: f32,
        pub scan_time: f32,
        pub range_min: f32,
        pub range_max: f32,
        pub ranges: Vec<f32>,
        pub intensities: Vec<f32>,
    }

    impl Default for LaserScan {
        fn default() -> Self {
            LaserScan {
                header: Default::default(),
                angle_min: Default::default(),
                angle_max: Default::default(),
                angle_increment: Default::default(),
                time_increment: Default::default(),
                scan_time: Default::default(),
                range_min: Default::default(),
                range_max: Default::default(),
                ranges: Default::default(),
                intensities: Default::default(),
            }
        }
    }

    impl WireMessage for LaserScan {
        const TYPE_NAME: &'static str = "sensor_msgs/msg/LaserScan";
        const MIN_SIZE: usize = 48;

        fn encode_bb(&self, bb: &mut ByteBufferMut) -> Result<(), WireError> {
            self.header.encode_bb(bb)?;
            bb.write_f32(self.angle_min)?;
            bb.write_f32(self.angle_max)?;
            bb.write_f32(self.angle_increment)?;
            bb.write_f32(self.time_increment)?;
            bb.write_f32(self.scan_time)?;
            bb.write_f32(self.range_min)?;
            bb.write_f32(self.range_max)?;
            bb.write_count(self.ranges.len())?;
            for item in &self.ranges {
                bb.write_f32(*item)?;
            }
            bb.write_count(self.intensities.len())?;
            for item in &self.intensities {
                bb.write_f32(*item)?;
            }
            Ok(())
        }

        fn decode_bb(bb: &mut ByteBuffer) -> Result<Self, WireError> {
            let f_header = super::std_msgs::Header::decode_bb(bb)?;
            let f_angle_min = bb.read_f32()?;
            let f_angle_max = bb.read_f32()?;
            let f_angle_increment = bb.read_f32()?;
            let f_time_increment = bb.read_f32()?;
            let f_scan_time = bb.read_f32()?;
            let f_range_min = bb.read_f32()?;
            let f_range_max = bb.read_f32()?;
            let f_ranges = read_vec(bb, 4, |bb| bb.read_f32())?;
            let f_intensities = read_vec(bb, 4, |bb| bb.read_f32())?;
            Ok(LaserScan {
                header: f_header,
                angle_min: f_angle_min,
                angle_max: f_angle_max,
                angle_increment: f_angle_increment,
                time_increment: f_time_increment,
                scan_time: f_scan_time,
                range_min: f_range_min,
                range_max: f_range_max,
                ranges: f_ranges,
                intensities: f_intensities,
            })
        }

        fn encoded_len(&self) -> usize {
            self.header.encoded_len()
                + 4
                + 4
                + 4
                + 4
                + 4
                + 4
                + 4
                + 4 + self.ranges.len() * 4
                + 4 + self.intensities.len() * 4
        }
    }
}
