/// Формат комплексных выборок входного файла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SampleFormat {
    /// 16-битные целые числа (I16, Q16) — компактно, родной формат ЦАП
    Int16 = 0,
    /// 32-битные числа с плавающей точкой (F32, F32)
    Float32 = 1,
    /// 64-битные числа с плавающей точкой (F64, F64) — полная точность
    Float64 = 2,
}

impl SampleFormat {
    /// Размер одной комплексной пары в байтах
    pub fn sample_size(&self) -> usize {
        match self {
            SampleFormat::Int16 => 4,    // 2 байта I + 2 байта Q
            SampleFormat::Float32 => 8,  // 4 байта I + 4 байта Q
            SampleFormat::Float64 => 16, // 8 байт I + 8 байт Q
        }
    }

    /// Имя CPU-формата для дескриптора потока
    pub fn cpu_format(&self) -> &'static str {
        match self {
            SampleFormat::Int16 => "sc16",
            SampleFormat::Float32 => "fc32",
            SampleFormat::Float64 => "fc64",
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SampleFormat::Int16 => write!(f, "short"),
            SampleFormat::Float32 => write!(f, "float"),
            SampleFormat::Float64 => write!(f, "double"),
        }
    }
}

impl std::str::FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" | "sc16" | "i16" => Ok(SampleFormat::Int16),
            "float" | "fc32" | "f32" => Ok(SampleFormat::Float32),
            "double" | "fc64" | "f64" => Ok(SampleFormat::Float64),
            _ => Err(format!(
                "Unknown sample type '{s}'. Use: short, float, double"
            )),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
