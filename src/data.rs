use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::axis::Axis;
use crate::error::ReplayError;

pub trait SampleSource {
    /// Next sample, or `None` once the source is exhausted or gone.
    fn next_sample(&mut self) -> Option<Sample>;
}

/// One line of a sensor log: `{"dt": 2.5, "accel": [..], "gyro": [..], "mag": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Sample {
    /// Milliseconds since the previous sample.
    #[serde(default)]
    pub dt: Option<f32>,
    /// Free-running microsecond timestamp; preferred over `dt` when present.
    #[serde(default)]
    pub t_us: Option<u32>,
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    #[serde(default)]
    pub mag: Option<[f32; 3]>,
}

impl Sample {
    pub fn parse(line: &str, line_no: usize) -> Result<Sample, ReplayError> {
        serde_json::from_str(line).map_err(|source| ReplayError::Parse {
            line: line_no,
            source,
        })
    }

    pub fn accel(&self) -> Axis {
        self.accel.into()
    }

    pub fn gyro(&self) -> Axis {
        self.gyro.into()
    }

    pub fn mag(&self) -> Option<Axis> {
        self.mag.map(Axis::from)
    }
}

pub struct FileData {
    pub samples: Vec<Sample>,
    pub frame: usize,
}

impl FileData {
    /// Loads every parseable line; blank and malformed lines are skipped.
    pub fn load(name: &str) -> Result<FileData, ReplayError> {
        let f = std::io::BufReader::new(std::fs::File::open(name)?);
        let mut v = Vec::new();
        for (i, l) in f.lines().enumerate() {
            let l = l?;
            if l.trim().is_empty() {
                continue;
            }
            match Sample::parse(&l, i + 1) {
                Ok(s) => v.push(s),
                Err(e) => warn!("{}: {}", name, e),
            }
        }

        if v.is_empty() {
            return Err(ReplayError::Empty(name.to_string()));
        }
        Ok(FileData {
            samples: v,
            frame: 0,
        })
    }
}

impl SampleSource for FileData {
    fn next_sample(&mut self) -> Option<Sample> {
        let s = self.samples.get(self.frame).cloned();
        if s.is_some() {
            self.frame += 1;
        }
        s
    }
}

/// Live samples from a serial port, read on a background thread.
pub struct Stream {
    rx: mpsc::Receiver<Sample>,
}

impl Stream {
    pub fn start(name: &str, baud: u32) -> Stream {
        // bounded so a stalled consumer cannot grow memory without limit
        let (tx, rx) = mpsc::sync_channel(256);
        let name = name.to_string();
        thread::spawn(move || read_forever(&name, baud, tx));
        Stream { rx }
    }
}

fn read_forever(name: &str, baud: u32, tx: mpsc::SyncSender<Sample>) {
    loop {
        let f = loop {
            match serialport::new(name, baud)
                .timeout(Duration::new(60, 0))
                .open()
            {
                Ok(f) => break f,
                Err(e) => {
                    warn!("{}: {}", name, e);
                    thread::sleep(Duration::from_millis(100));
                }
            }
        };
        let f = std::io::BufReader::new(f);
        info!("{}: connected", name);
        for (i, l) in f.lines().enumerate() {
            let l = match l {
                Ok(l) => l,
                Err(e) => {
                    use std::io::ErrorKind::*;
                    match e.kind() {
                        BrokenPipe | TimedOut | UnexpectedEof => break,
                        _ => continue,
                    }
                }
            };
            let s = match Sample::parse(&l, i + 1) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if tx.send(s).is_err() {
                // consumer gone
                return;
            }
        }
        warn!("{}: disconnected", name);
    }
}

impl SampleSource for Stream {
    fn next_sample(&mut self) -> Option<Sample> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optional_fields() {
        let line = r#"{"dt": 2.5, "accel": [0, 0, 1], "gyro": [0.1, 0, 0]}"#;
        let s = Sample::parse(line, 1).unwrap();
        assert_eq!(s.dt, Some(2.5));
        assert_eq!(s.t_us, None);
        assert_eq!(s.mag(), None);
        assert_eq!(s.accel(), Axis::new(0.0, 0.0, 1.0));

        let s = Sample::parse(
            r#"{"t_us": 4294967200, "accel": [0, 0, 1], "gyro": [0, 0, 0], "mag": [0.3, 0, 0.5]}"#,
            2,
        )
        .unwrap();
        assert_eq!(s.t_us, Some(4_294_967_200));
        assert_eq!(s.mag(), Some(Axis::new(0.3, 0.0, 0.5)));
    }

    #[test]
    fn parse_error_carries_line() {
        match Sample::parse("{\"dt\": 1}", 7) {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 7),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn file_source_runs_out() {
        let mut data = FileData {
            samples: vec![Sample::default(), Sample::default()],
            frame: 0,
        };
        assert!(data.next_sample().is_some());
        assert!(data.next_sample().is_some());
        assert!(data.next_sample().is_none());
        assert_eq!(data.frame, 2);
    }
}
