use std::{fs::File, io::Read, path::Path};

use utx_types::{SampleFormat, TxError, TxResult};

/// Один переиспользуемый буфер выборок.
///
/// Выделяется один раз до входа в горячий цикл и дальше перезаписывается
/// на месте: внутри цикла аллокаций нет.
#[derive(Debug)]
pub struct SampleBlock {
    data: Vec<u8>,
    sample_size: usize,
}

impl SampleBlock {
    pub fn new(
        samples_per_buffer: usize,
        format: SampleFormat,
    ) -> Self {
        let sample_size = format.sample_size();

        Self {
            data: vec![0u8; samples_per_buffer * sample_size],
            sample_size,
        }
    }

    /// Кол-во комплексных выборок в буфере
    pub fn num_samps(&self) -> usize {
        self.data.len() / self.sample_size
    }

    /// Размер буфера в байтах
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Последовательный читатель сырого файла выборок.
///
/// Файл без заголовка и без длины: плоский поток комплексных пар.
/// Никакого упреждающего чтения — один вызов `fill` это ровно один read.
#[derive(Debug)]
pub struct SampleSource {
    file: File,
}

impl SampleSource {
    /// Открывает входной файл. Неоткрывшийся файл — фатально на старте.
    pub fn open<P: AsRef<Path>>(path: P) -> TxResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TxError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { file })
    }

    /// Перезаписывает буфер следующими байтами файла. Возвращает сколько
    /// байт реально прочитано.
    ///
    /// Короткое чтение и EOF — НЕ ошибка: хвост буфера остаётся от
    /// предыдущей итерации, вызывающий обязан это терпеть. Ровно один
    /// системный read на вызов.
    pub fn fill(
        &mut self,
        block: &mut SampleBlock,
    ) -> TxResult<usize> {
        let n = self.file.read(block.as_mut_bytes())?;

        Ok(n)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
