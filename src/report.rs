//! Result sinks for benchmark measurements

use log::info;

/// One named numeric result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement<'a> {
    pub name: &'a str,
    pub value: f64,
    pub unit: &'a str,
    /// Sink-defined flag word, 0 for plain results
    pub flag: u32,
}

impl<'a> Measurement<'a> {
    pub fn new(name: &'a str, value: f64, unit: &'a str) -> Self {
        Self {
            name,
            value,
            unit,
            flag: 0,
        }
    }
}

/// Receiver of benchmark results
pub trait ResultSink {
    fn report(&mut self, measurement: &Measurement<'_>);
}

/// Writes every measurement to the log at info level
#[derive(Debug, Default)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn report(&mut self, m: &Measurement<'_>) {
        info!("result: {} = {:.2} {} (flag {})", m.name, m.value, m.unit, m.flag);
    }
}

/// Owned copy of a reported measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub flag: u32,
}

/// Keeps every measurement in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<Record>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the last measurement called `name`
    pub fn value(&self, name: &str) -> Option<f64> {
        self.records
            .iter()
            .rev()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }
}

impl ResultSink for MemorySink {
    fn report(&mut self, m: &Measurement<'_>) {
        self.records.push(Record {
            name: m.name.to_string(),
            value: m.value,
            unit: m.unit.to_string(),
            flag: m.flag,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order_and_latest() {
        let mut sink = MemorySink::new();
        sink.report(&Measurement::new("framerate", 59.5, "1/s"));
        sink.report(&Measurement::new("frames_rendered", 595.0, "frames"));
        sink.report(&Measurement::new("framerate", 60.0, "1/s"));

        assert_eq!(sink.records.len(), 3);
        assert_eq!(sink.records[1].unit, "frames");
        assert_eq!(sink.records[0].flag, 0);
        assert_eq!(sink.value("framerate"), Some(60.0));
        assert_eq!(sink.value("missing"), None);
    }

    #[test]
    fn test_log_sink_accepts_measurements() {
        let mut sink = LogSink;
        sink.report(&Measurement {
            name: "cpu_use_test_process",
            value: 12.5,
            unit: "%",
            flag: 1,
        });
    }
}
