use std::io::{self, BufWriter, Write};

use crate::demux::Segment;

/// Размер буфера выходного потока.
pub const OUTPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Владеющая копия сегмента для передачи в поток записи.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub frequency: u64,
    pub tagged: bool,
    pub payload: Vec<u8>,
}

/// Текстовый вывод IQ выборок.
///
/// ```text
/// freq=2407500000
/// -3 12
/// 5 -7
/// ```
///
/// Строка `freq=` пишется перед каждым блоком с маркером, затем по одной
/// строке на пару int8 I/Q.
pub struct OutputSink<W: Write> {
    writer: BufWriter<W>,
    samples_written: u64,
    tags_written: u64,
}

impl OutputChunk {
    pub fn as_segment(&self) -> Segment<'_> {
        Segment {
            frequency: self.frequency,
            tagged: self.tagged,
            payload: &self.payload,
        }
    }
}

impl From<Segment<'_>> for OutputChunk {
    fn from(s: Segment<'_>) -> Self {
        Self {
            frequency: s.frequency,
            tagged: s.tagged,
            payload: s.payload.to_vec(),
        }
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, inner),
            samples_written: 0,
            tags_written: 0,
        }
    }

    /// Записывает один сегмент. Нечётный последний байт игнорируется.
    pub fn write_segment(
        &mut self,
        segment: &Segment<'_>,
    ) -> io::Result<()> {
        if segment.tagged {
            writeln!(self.writer, "freq={}", segment.frequency)?;
            self.tags_written += 1;
        }

        for pair in segment.payload.chunks_exact(2) {
            writeln!(self.writer, "{} {}", pair[0] as i8, pair[1] as i8)?;
        }

        self.samples_written += (segment.payload.len() / 2) as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn tags_written(&self) -> u64 {
        self.tags_written
    }

    /// Сбрасывает буфер и возвращает внутренний writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(segments: &[Segment<'_>]) -> String {
        let mut sink = OutputSink::new(Vec::new());
        for s in segments {
            sink.write_segment(s).unwrap();
        }
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_tagged_segment_writes_freq_line_first() {
        let payload = [0x01, 0xFF, 0x80, 0x7F];
        let out = render(&[Segment {
            frequency: 7_500_000,
            tagged: true,
            payload: &payload,
        }]);

        assert_eq!(out, "freq=7500000\n1 -1\n-128 127\n");
    }

    #[test]
    fn test_untagged_segment_has_no_freq_line() {
        let payload = [0x02, 0x03];
        let out = render(&[Segment {
            frequency: 7_500_000,
            tagged: false,
            payload: &payload,
        }]);

        assert_eq!(out, "2 3\n");
    }

    #[test]
    fn test_order_preserved_and_counters() {
        let a = [1u8, 2];
        let b = [3u8, 4, 5, 6];
        let mut sink = OutputSink::new(Vec::new());

        sink.write_segment(&Segment {
            frequency: 1,
            tagged: true,
            payload: &a,
        })
        .unwrap();
        sink.write_segment(&Segment {
            frequency: 1,
            tagged: false,
            payload: &b,
        })
        .unwrap();

        assert_eq!(sink.samples_written(), 3);
        assert_eq!(sink.tags_written(), 1);

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "freq=1\n1 2\n3 4\n5 6\n");
    }

    #[test]
    fn test_chunk_round_trips_to_segment() {
        let payload = [9u8, 8];
        let seg = Segment {
            frequency: 42,
            tagged: true,
            payload: &payload,
        };
        let chunk = OutputChunk::from(seg);

        assert_eq!(chunk.as_segment(), seg);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(
            &mut self,
            _buf: &[u8],
        ) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let payload = vec![0u8; 2 * OUTPUT_BUFFER_SIZE];
        let mut sink = OutputSink::new(BrokenPipe);

        let err = sink
            .write_segment(&Segment {
                frequency: 1,
                tagged: true,
                payload: &payload,
            })
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
