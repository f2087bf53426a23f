use foundation::time::Time;

/// Metadata for one host animation frame.
///
/// Frames are numbered from 0; `dt_s` is the time since the previous frame
/// (0 for the first frame) and `time` is the host timestamp.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time (seconds).
    pub dt_s: f64,
    /// Host time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn first(time: Time) -> Self {
        Self {
            index: 0,
            dt_s: 0.0,
            time,
        }
    }

    pub fn next(self, time: Time) -> Self {
        Self {
            index: self.index + 1,
            dt_s: time.since(self.time),
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn first_frame_has_zero_dt() {
        let f = Frame::first(Time(3.0));
        assert_eq!(f.index, 0);
        assert_eq!(f.dt_s, 0.0);
    }

    #[test]
    fn next_advances_index_and_dt() {
        let f0 = Frame::first(Time(1.0));
        let f1 = f0.next(Time(1.5));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.dt_s, 0.5);
        assert_eq!(f1.time, Time(1.5));
    }

    #[test]
    fn clock_going_backwards_clamps_dt() {
        let f1 = Frame::first(Time(2.0)).next(Time(1.0));
        assert_eq!(f1.dt_s, 0.0);
    }
}
