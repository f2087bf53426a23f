/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn from_millis(ms: f64) -> Self {
        Time(ms / 1000.0)
    }

    pub fn as_millis(self) -> f64 {
        self.0 * 1000.0
    }

    /// Seconds elapsed since `earlier`; never negative.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn millis_round_trip_and_since() {
        let a = Time::from_millis(1500.0);
        assert_eq!(a, Time(1.5));
        assert_eq!(a.as_millis(), 1500.0);
        assert_eq!(Time(2.0).since(a), 0.5);
        assert_eq!(a.since(Time(2.0)), 0.0);
    }
}
