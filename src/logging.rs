use crate::common::*;

/// Sink for the line-based trace written by the analyzer and the evaluator.
/// `line_writer` returns `None` when the logger discards everything.
pub trait Logger: Debug {
    fn line_writer(&mut self) -> Option<&mut dyn Write>;
    fn dump_log(&self, w: &mut dyn Write);
}

#[derive(Debug, Default)]
pub struct DummyLogger;

/// Keeps every line in memory, prefixed by a label and a timestamp.
#[derive(Debug)]
pub struct VecLogger(String, Vec<u8>);

#[derive(Debug)]
pub struct FileLogger(String, std::fs::File);

fn secs_since_unix_epoch() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or(0.)
}
impl FileLogger {
    pub fn new<S: ToString>(label: S, file: std::fs::File) -> Self {
        Self(label.to_string(), file)
    }
}
impl VecLogger {
    pub fn new<S: ToString>(label: S) -> Self {
        Self(label.to_string(), Default::default())
    }
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.1).to_string()
    }
}
/////////////////
impl Logger for DummyLogger {
    fn line_writer(&mut self) -> Option<&mut dyn Write> {
        None
    }
    fn dump_log(&self, _: &mut dyn Write) {}
}

impl Logger for VecLogger {
    fn line_writer(&mut self) -> Option<&mut dyn Write> {
        let _ = write!(&mut self.1, "{} at {:.6} ", self.0, secs_since_unix_epoch());
        Some(self)
    }
    fn dump_log(&self, w: &mut dyn Write) {
        let _ = w.write_all(&self.1);
    }
}
impl Logger for FileLogger {
    fn line_writer(&mut self) -> Option<&mut dyn Write> {
        let _ = write!(&mut self.1, "{} at {:.6} ", self.0, secs_since_unix_epoch());
        Some(&mut self.1)
    }
    fn dump_log(&self, _: &mut dyn Write) {}
}
///////////////////
impl Write for VecLogger {
    fn flush(&mut self) -> Result<(), std::io::Error> {
        Ok(())
    }
    fn write(&mut self, data: &[u8]) -> Result<usize, std::io::Error> {
        self.1.extend_from_slice(data);
        Ok(data.len())
    }
}
