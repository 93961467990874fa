/// Стратегия выравнивания часов перед стартом burst-а (опция `--pps`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Без внешнего источника времени
    None,
    /// Внутренний генератор PPS
    InternalPps,
    /// Внешний вход PPS
    ExternalPps,
    /// PPS от GPSDO модуля
    GpsdoPps,
    /// MIMO-кабель между двумя платами (master/slave)
    MimoCable,
}

impl SyncMode {
    /// Имя источника времени для устройства. `None` — сеттер не вызывается.
    pub fn time_source(&self) -> Option<&'static str> {
        match self {
            SyncMode::None => None,
            SyncMode::InternalPps => Some("internal"),
            SyncMode::ExternalPps => Some("external"),
            SyncMode::GpsdoPps => Some("gpsdo"),
            SyncMode::MimoCable => Some("mimo"),
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.time_source().unwrap_or("none"))
    }
}

impl std::str::FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(SyncMode::None),
            "internal" => Ok(SyncMode::InternalPps),
            "external" => Ok(SyncMode::ExternalPps),
            "gpsdo" => Ok(SyncMode::GpsdoPps),
            "mimo" => Ok(SyncMode::MimoCable),
            _ => Err(format!(
                "Unknown PPS source '{s}'. Use: none, internal, external, gpsdo, mimo"
            )),
        }
    }
}

/// Опорный генератор устройства (опция `--ref`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockRef {
    Internal,
    External,
    Mimo,
    Gpsdo,
}

impl ClockRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockRef::Internal => "internal",
            ClockRef::External => "external",
            ClockRef::Mimo => "mimo",
            ClockRef::Gpsdo => "gpsdo",
        }
    }
}

impl std::fmt::Display for ClockRef {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClockRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "internal" => Ok(ClockRef::Internal),
            "external" => Ok(ClockRef::External),
            "mimo" => Ok(ClockRef::Mimo),
            "gpsdo" => Ok(ClockRef::Gpsdo),
            _ => Err(format!(
                "Unknown clock reference '{s}'. Use: internal, external, mimo, gpsdo"
            )),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
