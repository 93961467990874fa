/// Абсолютная метка времени по часам устройства, в секундах.
///
/// Дробная часть значима: при типичных частотах дискретизации одна
/// выборка — доли микросекунды.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct TimeSpec(f64);

impl TimeSpec {
    pub const ZERO: TimeSpec = TimeSpec(0.0);

    pub const fn from_secs(secs: f64) -> Self {
        TimeSpec(secs)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

impl std::ops::Add for TimeSpec {
    type Output = TimeSpec;

    fn add(
        self,
        rhs: TimeSpec,
    ) -> TimeSpec {
        TimeSpec(self.0 + rhs.0)
    }
}

impl std::fmt::Display for TimeSpec {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:.6}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_spec_add() {
        let t = TimeSpec::from_secs(1.5) + TimeSpec::from_secs(0.1);
        assert!((t.as_secs() - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_time_spec_zero() {
        assert_eq!(TimeSpec::ZERO.as_secs(), 0.0);
    }

    #[test]
    fn test_time_spec_display() {
        assert_eq!(TimeSpec::from_secs(0.1).to_string(), "0.100000s");
        assert_eq!(TimeSpec::ZERO.to_string(), "0.000000s");
    }
}
