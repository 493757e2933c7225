//! Shared output sink for resolved records
//!
//! Resolvers write `hostname,ip` lines through one `OutputSink`. The sink has
//! its own lock, separate from the queue monitor, and each record is
//! formatted in full before a single `write_all`, so lines from different
//! resolvers never interleave.

use parking_lot::Mutex;
use std::io::{self, BufWriter, Write};

/// Append-only, line-atomic writer shared by all resolvers
pub struct OutputSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

impl OutputSink {
    /// Wrap any writer (file, socket, in-memory buffer)
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Wrap a writer with an explicit buffer size; 0 writes every record through
    pub fn with_buffer_capacity(capacity: usize, writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::with_capacity(capacity, writer)),
        }
    }

    /// Write one record; `ip` is `None` when resolution failed
    pub fn write_record(&self, hostname: &str, ip: Option<&str>) -> io::Result<()> {
        let line = format_record(hostname, ip);
        self.writer.lock().write_all(line.as_bytes())
    }

    /// Flush buffered records to the underlying writer
    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

/// Format one output line, including the trailing newline
pub fn format_record(hostname: &str, ip: Option<&str>) -> String {
    format!("{},{}\n", hostname, ip.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Writer that appends into a shared buffer
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_format_record() {
        assert_eq!(format_record("example.com", Some("1.2.3.4")), "example.com,1.2.3.4\n");
        assert_eq!(format_record("bogus.invalid", None), "bogus.invalid,\n");
    }

    #[test]
    fn test_concurrent_records_stay_whole() {
        let buf = SharedBuf::default();
        let sink = Arc::new(OutputSink::new(Box::new(buf.clone())));

        thread::scope(|s| {
            for t in 0..4 {
                let sink = Arc::clone(&sink);
                s.spawn(move || {
                    for i in 0..250 {
                        let host = format!("host-{}-{}.test", t, i);
                        sink.write_record(&host, Some("10.0.0.1")).unwrap();
                    }
                });
            }
        });
        sink.flush().unwrap();

        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1000);
        for line in lines {
            let (host, ip) = line.split_once(',').unwrap();
            assert!(host.starts_with("host-") && host.ends_with(".test"));
            assert_eq!(ip, "10.0.0.1");
        }
    }
}
