// EDF (European Data Format) file reader/writer implementation
// Specification: https://www.edfplus.info/specs/edf.html

use super::RecordingSource;
use crate::error::{QeegError, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Label of the EDF+ signal that carries annotations instead of samples
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

const NUM_DATA_RECORDS_OFFSET: u64 = 236;

#[derive(Debug, Clone)]
pub struct EdfHeader {
    pub version: String,              // 8 bytes: version of this data format (0)
    pub patient_id: String,           // 80 bytes: local patient identification
    pub recording_id: String,         // 80 bytes: local recording identification
    pub start_date: String,           // 8 bytes: startdate of recording (dd.mm.yy)
    pub start_time: String,           // 8 bytes: starttime of recording (hh.mm.ss)
    pub header_bytes: usize,          // 8 bytes: number of bytes in header record
    pub reserved: String,             // 44 bytes: reserved ("EDF+C"/"EDF+D" for EDF+)
    pub num_data_records: i64,        // 8 bytes: number of data records (-1 if unknown)
    pub duration_of_data_record: f64, // 8 bytes: duration of a data record, in seconds
    pub num_signals: usize,           // 4 bytes: number of signals (channels)
}

#[derive(Debug, Clone)]
pub struct EdfSignalHeader {
    pub label: String,                 // 16 bytes: label (e.g. EEG Fpz-Cz)
    pub transducer_type: String,       // 80 bytes: transducer type (e.g. AgAgCl electrode)
    pub physical_dimension: String,    // 8 bytes: physical dimension (e.g. uV)
    pub physical_minimum: f64,         // 8 bytes: physical minimum
    pub physical_maximum: f64,         // 8 bytes: physical maximum
    pub digital_minimum: i64,          // 8 bytes: digital minimum
    pub digital_maximum: i64,          // 8 bytes: digital maximum
    pub prefiltering: String,          // 80 bytes: prefiltering
    pub num_samples_per_record: usize, // 8 bytes: number of samples in each data record
    pub reserved: String,              // 32 bytes: reserved
}

impl EdfSignalHeader {
    pub fn sample_frequency(&self, record_duration: f64) -> f64 {
        self.num_samples_per_record as f64 / record_duration
    }

    pub fn gain(&self) -> f64 {
        (self.physical_maximum - self.physical_minimum)
            / (self.digital_maximum - self.digital_minimum) as f64
    }

    pub fn offset(&self) -> f64 {
        self.physical_maximum - self.gain() * self.digital_maximum as f64
    }

    pub fn is_annotation(&self) -> bool {
        self.label == ANNOTATION_LABEL
    }
}

/// An EDF/EDF+ file opened for channel-wise reading
pub struct EdfRecording {
    path: PathBuf,
    file: Option<BufReader<File>>,
    pub header: EdfHeader,
    pub signal_headers: Vec<EdfSignalHeader>,
    /// Indices into `signal_headers` of the signals exposed as channels
    channels: Vec<usize>,
    num_records: usize,
    record_size: usize,
    data_start_offset: u64,
}

impl EdfRecording {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::open_inner(path).map_err(|e| {
            QeegError::UnreadableRecording(format!("{}: {}", path.display(), e))
        })
    }

    fn open_inner(path: &Path) -> std::result::Result<Self, String> {
        let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
        let file_len = file
            .metadata()
            .map_err(|e| format!("Failed to read file metadata: {}", e))?
            .len();
        let mut file = BufReader::new(file);

        // Read main header (256 bytes)
        let header = Self::read_header(&mut file)?;

        // Read signal headers
        let signal_headers = Self::read_signal_headers(&mut file, header.num_signals)?;

        let expected_header_bytes = 256 * (header.num_signals + 1);
        if header.header_bytes != expected_header_bytes {
            return Err(format!(
                "Header declares {} bytes but {} signals need {}",
                header.header_bytes, header.num_signals, expected_header_bytes
            ));
        }
        if !(header.duration_of_data_record > 0.0) {
            return Err(format!(
                "Invalid data record duration {}",
                header.duration_of_data_record
            ));
        }
        for sh in signal_headers.iter().filter(|sh| !sh.is_annotation()) {
            if sh.digital_maximum <= sh.digital_minimum {
                return Err(format!(
                    "Signal '{}' has digital maximum {} <= minimum {}",
                    sh.label, sh.digital_maximum, sh.digital_minimum
                ));
            }
        }

        // Each sample is 2 bytes / 16 bits
        let record_size: usize = signal_headers
            .iter()
            .map(|sh| sh.num_samples_per_record * 2)
            .sum();
        let data_start_offset = header.header_bytes as u64;
        let data_bytes = file_len.saturating_sub(data_start_offset);

        let num_records = if header.num_data_records < 0 {
            let derived = if record_size == 0 {
                0
            } else {
                (data_bytes / record_size as u64) as usize
            };
            log::debug!(
                "EDF record count unknown in header, derived {} from file size",
                derived
            );
            derived
        } else {
            let declared = header.num_data_records as usize;
            let needed = declared as u64 * record_size as u64;
            if needed > data_bytes {
                return Err(format!(
                    "File truncated: {} data records need {} bytes, found {}",
                    declared, needed, data_bytes
                ));
            }
            declared
        };

        let channels: Vec<usize> = signal_headers
            .iter()
            .enumerate()
            .filter(|(_, sh)| !sh.is_annotation())
            .map(|(i, _)| i)
            .collect();

        log::debug!(
            "Opened EDF {}: {} channels ({} signals), {} records of {} s",
            path.display(),
            channels.len(),
            signal_headers.len(),
            num_records,
            header.duration_of_data_record
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            header,
            signal_headers,
            channels,
            num_records,
            record_size,
            data_start_offset,
        })
    }

    fn read_fixed_string<R: Read>(reader: &mut R, size: usize) -> std::result::Result<String, String> {
        let mut buffer = vec![0u8; size];
        reader
            .read_exact(&mut buffer)
            .map_err(|e| format!("Failed to read string: {}", e))?;
        Ok(String::from_utf8_lossy(&buffer).trim().to_string())
    }

    fn read_number<R: Read, T: std::str::FromStr>(
        reader: &mut R,
        size: usize,
        field: &str,
    ) -> std::result::Result<T, String>
    where
        T::Err: std::fmt::Display,
    {
        let s = Self::read_fixed_string(reader, size)?;
        s.parse::<T>()
            .map_err(|e| format!("Invalid {} '{}': {}", field, s, e))
    }

    fn read_header<R: Read>(reader: &mut R) -> std::result::Result<EdfHeader, String> {
        let version = Self::read_fixed_string(reader, 8)?;
        let patient_id = Self::read_fixed_string(reader, 80)?;
        let recording_id = Self::read_fixed_string(reader, 80)?;
        let start_date = Self::read_fixed_string(reader, 8)?;
        let start_time = Self::read_fixed_string(reader, 8)?;
        let header_bytes = Self::read_number(reader, 8, "header bytes")?;
        let reserved = Self::read_fixed_string(reader, 44)?;
        let num_data_records = Self::read_number(reader, 8, "number of data records")?;
        let duration_of_data_record = Self::read_number(reader, 8, "duration")?;
        let num_signals = Self::read_number(reader, 4, "number of signals")?;

        log::debug!(
            "EDF header parsed: num_data_records={}, duration_of_data_record={}, num_signals={}",
            num_data_records,
            duration_of_data_record,
            num_signals
        );

        Ok(EdfHeader {
            version,
            patient_id,
            recording_id,
            start_date,
            start_time,
            header_bytes,
            reserved,
            num_data_records,
            duration_of_data_record,
            num_signals,
        })
    }

    fn read_signal_headers<R: Read>(
        reader: &mut R,
        num_signals: usize,
    ) -> std::result::Result<Vec<EdfSignalHeader>, String> {
        // Fields are stored column-wise: every label, then every transducer, ...
        let labels = Self::read_column(reader, num_signals, |r| Self::read_fixed_string(r, 16))?;
        let transducer_types =
            Self::read_column(reader, num_signals, |r| Self::read_fixed_string(r, 80))?;
        let physical_dimensions =
            Self::read_column(reader, num_signals, |r| Self::read_fixed_string(r, 8))?;
        let physical_minimums = Self::read_column(reader, num_signals, |r| {
            Self::read_number::<_, f64>(r, 8, "physical minimum")
        })?;
        let physical_maximums = Self::read_column(reader, num_signals, |r| {
            Self::read_number::<_, f64>(r, 8, "physical maximum")
        })?;
        let digital_minimums = Self::read_column(reader, num_signals, |r| {
            Self::read_number::<_, i64>(r, 8, "digital minimum")
        })?;
        let digital_maximums = Self::read_column(reader, num_signals, |r| {
            Self::read_number::<_, i64>(r, 8, "digital maximum")
        })?;
        let prefilterings =
            Self::read_column(reader, num_signals, |r| Self::read_fixed_string(r, 80))?;
        let num_samples_per_records = Self::read_column(reader, num_signals, |r| {
            Self::read_number::<_, usize>(r, 8, "number of samples")
        })?;
        let reserveds = Self::read_column(reader, num_signals, |r| Self::read_fixed_string(r, 32))?;

        let signal_headers = (0..num_signals)
            .map(|i| EdfSignalHeader {
                label: labels[i].clone(),
                transducer_type: transducer_types[i].clone(),
                physical_dimension: physical_dimensions[i].clone(),
                physical_minimum: physical_minimums[i],
                physical_maximum: physical_maximums[i],
                digital_minimum: digital_minimums[i],
                digital_maximum: digital_maximums[i],
                prefiltering: prefilterings[i].clone(),
                num_samples_per_record: num_samples_per_records[i],
                reserved: reserveds[i].clone(),
            })
            .collect();

        Ok(signal_headers)
    }

    fn read_column<R: Read, T>(
        reader: &mut R,
        num_signals: usize,
        mut read_field: impl FnMut(&mut R) -> std::result::Result<T, String>,
    ) -> std::result::Result<Vec<T>, String> {
        (0..num_signals).map(|_| read_field(reader)).collect()
    }

    fn signal_index(&self, channel: usize) -> Result<usize> {
        self.channels.get(channel).copied().ok_or_else(|| {
            QeegError::UnreadableRecording(format!(
                "{}: channel index {} out of bounds ({} channels)",
                self.path.display(),
                channel,
                self.channels.len()
            ))
        })
    }

    /// Read every record of one signal and convert to physical units
    fn read_signal(&mut self, signal_index: usize) -> std::result::Result<Vec<f64>, String> {
        let file = self.file.as_mut().ok_or("recording is closed")?;
        let signal_header = &self.signal_headers[signal_index];
        let samples_per_record = signal_header.num_samples_per_record;
        let gain = signal_header.gain();
        let offset = signal_header.offset();

        // Byte offset of this signal inside each record
        let signal_offset: usize = self.signal_headers[..signal_index]
            .iter()
            .map(|sh| sh.num_samples_per_record * 2)
            .sum();

        let mut buf = vec![0u8; samples_per_record * 2];
        let mut result = Vec::with_capacity(samples_per_record * self.num_records);

        for record_idx in 0..self.num_records {
            let position =
                self.data_start_offset + (record_idx * self.record_size + signal_offset) as u64;
            file.seek(SeekFrom::Start(position))
                .map_err(|e| format!("Failed to seek to record {}: {}", record_idx, e))?;
            file.read_exact(&mut buf)
                .map_err(|e| format!("Failed to read record {}: {}", record_idx, e))?;

            result.extend(
                buf.chunks_exact(2)
                    .map(|b| gain * i16::from_le_bytes([b[0], b[1]]) as f64 + offset),
            );
        }

        Ok(result)
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn total_duration(&self) -> f64 {
        self.num_records as f64 * self.header.duration_of_data_record
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordingSource for EdfRecording {
    fn channel_count(&self) -> Result<usize> {
        Ok(self.channels.len())
    }

    fn labels(&self) -> Result<Vec<String>> {
        Ok(self
            .channels
            .iter()
            .map(|&i| self.signal_headers[i].label.clone())
            .collect())
    }

    fn sample_rate(&self, index: usize) -> Result<f64> {
        let signal = self.signal_index(index)?;
        Ok(self.signal_headers[signal].sample_frequency(self.header.duration_of_data_record))
    }

    fn read_samples(&mut self, index: usize) -> Result<Vec<f64>> {
        let signal = self.signal_index(index)?;
        self.read_signal(signal).map_err(|e| {
            QeegError::UnreadableRecording(format!("{}: {}", self.path.display(), e))
        })
    }

    fn close(&mut self) -> Result<()> {
        if self.file.take().is_some() {
            log::debug!("Closed EDF {}", self.path.display());
        }
        Ok(())
    }

    fn format_name(&self) -> &str {
        "EDF"
    }
}

/// One channel to be written by [`EdfWriter::write_recording`]
#[derive(Debug, Clone)]
pub struct EdfChannel {
    pub label: String,
    /// Integer sample rate; one-second records hold exactly this many samples
    pub sample_rate: usize,
    pub samples: Vec<f64>,
    pub physical_dimension: String,
}

impl EdfChannel {
    pub fn new(label: impl Into<String>, sample_rate: usize, samples: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            sample_rate,
            samples,
            physical_dimension: "uV".to_string(),
        }
    }

    /// Signal header with a physical range covering every sample.
    ///
    /// Fails when the range cannot be written in the 8-character header fields.
    pub fn signal_header(&self) -> Result<EdfSignalHeader> {
        let (mut low, mut high) = self
            .samples
            .iter()
            .filter(|x| x.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        if !(low.is_finite() && high.is_finite()) {
            low = -1.0;
            high = 1.0;
        } else if high - low < 1e-6 {
            low -= 1.0;
            high += 1.0;
        } else {
            let margin = (high - low) * 0.01;
            low -= margin;
            high += margin;
        }

        let (physical_minimum, physical_maximum) =
            match (fit_edf_number(low, false), fit_edf_number(high, true)) {
                (Some(min), Some(max)) => (min, max),
                _ => {
                    return Err(QeegError::IoError(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!(
                            "channel '{}' physical range [{}, {}] does not fit an EDF header field",
                            self.label, low, high
                        ),
                    )))
                }
            };

        Ok(EdfSignalHeader {
            label: self.label.clone(),
            transducer_type: String::new(),
            physical_dimension: self.physical_dimension.clone(),
            physical_minimum,
            physical_maximum,
            digital_minimum: i16::MIN as i64,
            digital_maximum: i16::MAX as i64,
            prefiltering: String::new(),
            num_samples_per_record: self.sample_rate,
            reserved: String::new(),
        })
    }
}

/// Round `value` outward to the most precise decimal that fits an 8-byte field;
/// `None` when not even the integer part fits
fn fit_edf_number(value: f64, round_up: bool) -> Option<f64> {
    (0..=6).rev().find_map(|decimals| {
        let factor = 10f64.powi(decimals);
        let rounded = if round_up {
            (value * factor).ceil() / factor
        } else {
            (value * factor).floor() / factor
        };
        let text = format!("{:.*}", decimals as usize, rounded);
        (text.len() <= 8).then(|| text.parse().unwrap_or(rounded))
    })
}

fn format_edf_number(value: f64) -> Option<String> {
    let text = format!("{}", value);
    if text.len() <= 8 {
        return Some(text);
    }
    (0..=6)
        .rev()
        .map(|decimals| format!("{:.*}", decimals, value))
        .find(|text| text.len() <= 8)
}

/// Header field text for a number, or an error naming the field
fn edf_number_field(value: f64, field: &str) -> Result<String> {
    format_edf_number(value).ok_or_else(|| {
        QeegError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} {} does not fit an 8-character EDF header field", field, value),
        ))
    })
}

pub struct EdfWriter {
    file: File,
    header: EdfHeader,
    signal_headers: Vec<EdfSignalHeader>,
}

impl EdfWriter {
    pub fn new<P: AsRef<Path>>(
        path: P,
        patient_id: String,
        recording_id: String,
        start_date: String,
        start_time: String,
        signal_headers: Vec<EdfSignalHeader>,
        record_duration: f64,
    ) -> Result<Self> {
        for sh in &signal_headers {
            edf_number_field(sh.physical_minimum, "physical minimum")?;
            edf_number_field(sh.physical_maximum, "physical maximum")?;
        }
        edf_number_field(record_duration, "record duration")?;

        let num_signals = signal_headers.len();
        let header_bytes = 256 + num_signals * 256;

        let header = EdfHeader {
            version: "0".to_string(),
            patient_id,
            recording_id,
            start_date,
            start_time,
            header_bytes,
            reserved: String::new(),
            num_data_records: -1, // Will be updated when finalized
            duration_of_data_record: record_duration,
            num_signals,
        };

        let file = File::create(path)?;

        let mut writer = Self {
            file,
            header,
            signal_headers,
        };

        writer.write_header()?;
        Ok(writer)
    }

    /// Write a whole recording with one-second records; trailing samples that
    /// do not fill a record are dropped. Returns the number of records written.
    pub fn write_recording<P: AsRef<Path>>(path: P, channels: &[EdfChannel]) -> Result<usize> {
        if let Some(channel) = channels.iter().find(|c| c.sample_rate == 0) {
            return Err(QeegError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("channel '{}' has a zero sample rate", channel.label),
            )));
        }

        let signal_headers = channels
            .iter()
            .map(EdfChannel::signal_header)
            .collect::<Result<Vec<_>>>()?;
        let num_records = channels
            .iter()
            .map(|c| c.samples.len() / c.sample_rate)
            .min()
            .unwrap_or(0);

        let mut writer = Self::new(
            path,
            "X X X X".to_string(),
            "Startdate X X X X".to_string(),
            "01.01.00".to_string(),
            "00.00.00".to_string(),
            signal_headers,
            1.0,
        )?;

        for record_idx in 0..num_records {
            let record: Vec<Vec<f64>> = channels
                .iter()
                .map(|c| {
                    c.samples[record_idx * c.sample_rate..(record_idx + 1) * c.sample_rate].to_vec()
                })
                .collect();
            writer.write_physical_record(&record)?;
        }

        writer.finalize(num_records as i64)?;
        Ok(num_records)
    }

    fn write_fixed_string(&mut self, s: &str, size: usize) -> Result<()> {
        let mut buffer = vec![b' '; size];
        let bytes = s.as_bytes();
        let copy_len = bytes.len().min(size);
        buffer[..copy_len].copy_from_slice(&bytes[..copy_len]);
        self.file.write_all(&buffer)?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let main_fields = [
            (self.header.version.clone(), 8),
            (self.header.patient_id.clone(), 80),
            (self.header.recording_id.clone(), 80),
            (self.header.start_date.clone(), 8),
            (self.header.start_time.clone(), 8),
            (self.header.header_bytes.to_string(), 8),
            (self.header.reserved.clone(), 44),
            (self.header.num_data_records.to_string(), 8),
            (
                edf_number_field(self.header.duration_of_data_record, "record duration")?,
                8,
            ),
            (self.header.num_signals.to_string(), 4),
        ];
        for (value, size) in &main_fields {
            self.write_fixed_string(value, *size)?;
        }

        // Signal headers are written column-wise, 256 bytes per signal in total
        let signal_headers = self.signal_headers.clone();
        let columns: [(fn(&EdfSignalHeader) -> Result<String>, usize); 10] = [
            (|sh| Ok(sh.label.clone()), 16),
            (|sh| Ok(sh.transducer_type.clone()), 80),
            (|sh| Ok(sh.physical_dimension.clone()), 8),
            (|sh| edf_number_field(sh.physical_minimum, "physical minimum"), 8),
            (|sh| edf_number_field(sh.physical_maximum, "physical maximum"), 8),
            (|sh| Ok(sh.digital_minimum.to_string()), 8),
            (|sh| Ok(sh.digital_maximum.to_string()), 8),
            (|sh| Ok(sh.prefiltering.clone()), 80),
            (|sh| Ok(sh.num_samples_per_record.to_string()), 8),
            (|sh| Ok(sh.reserved.clone()), 32),
        ];
        for (field, size) in columns {
            for sh in &signal_headers {
                self.write_fixed_string(&field(sh)?, size)?;
            }
        }

        Ok(())
    }

    pub fn write_physical_record(&mut self, physical_data: &[Vec<f64>]) -> Result<()> {
        if physical_data.len() != self.signal_headers.len() {
            return Err(QeegError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "Expected {} signals, got {}",
                    self.signal_headers.len(),
                    physical_data.len()
                ),
            )));
        }

        // Parallel conversion of physical to digital, then one sequential write
        let digital_data: std::result::Result<Vec<Vec<u8>>, String> = physical_data
            .par_iter()
            .zip(self.signal_headers.par_iter())
            .enumerate()
            .map(|(signal_idx, (physical_samples, signal_header))| {
                if physical_samples.len() != signal_header.num_samples_per_record {
                    return Err(format!(
                        "Signal {} expected {} samples, got {}",
                        signal_idx,
                        signal_header.num_samples_per_record,
                        physical_samples.len()
                    ));
                }

                let gain = signal_header.gain();
                let offset = signal_header.offset();
                let low = signal_header.digital_minimum as f64;
                let high = signal_header.digital_maximum as f64;

                Ok(physical_samples
                    .iter()
                    .flat_map(|&physical| {
                        let digital = ((physical - offset) / gain).round().clamp(low, high);
                        (digital as i16).to_le_bytes()
                    })
                    .collect())
            })
            .collect();

        let digital_data = digital_data.map_err(|e| {
            QeegError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let record: Vec<u8> = digital_data.concat();
        self.file.write_all(&record)?;

        Ok(())
    }

    pub fn finalize(mut self, num_records_written: i64) -> Result<()> {
        // Update the number of data records in the header
        self.file.seek(SeekFrom::Start(NUM_DATA_RECORDS_OFFSET))?;
        self.write_fixed_string(&num_records_written.to_string(), 8)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: usize, seconds: usize) -> Vec<f64> {
        (0..sample_rate * seconds)
            .map(|i| 50.0 * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    #[test]
    fn test_signal_header_calculations() {
        let header = EdfSignalHeader {
            label: "Test".to_string(),
            transducer_type: "".to_string(),
            physical_dimension: "uV".to_string(),
            physical_minimum: -100.0,
            physical_maximum: 100.0,
            digital_minimum: -32768,
            digital_maximum: 32767,
            prefiltering: "".to_string(),
            num_samples_per_record: 256,
            reserved: "".to_string(),
        };

        let sample_freq = header.sample_frequency(1.0);
        assert_eq!(sample_freq, 256.0);

        let gain = header.gain();
        assert!((gain - 0.00305).abs() < 0.001);
        assert!(!header.is_annotation());
    }

    #[test]
    fn test_fit_edf_number() {
        assert_eq!(fit_edf_number(-51.23456789, false), Some(-51.2346));
        assert_eq!(fit_edf_number(51.23456789, true), Some(51.23457));
        assert_eq!(fit_edf_number(1.0, true), Some(1.0));
        let wide = fit_edf_number(-123456.789, false).unwrap();
        assert!(format_edf_number(wide).unwrap().len() <= 8);
        assert_eq!(fit_edf_number(-1.5e8, false), None);
        assert_eq!(format_edf_number(123456789.0), None);
    }

    #[test]
    fn test_oversized_physical_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.edf");
        let channel = EdfChannel::new("Cz", 10, vec![2.0e8, -2.0e8, 0.0, 1.0e8, 5.0, 0.0, 1.0, 2.0, 3.0, 4.0]);

        assert!(channel.signal_header().is_err());
        let err = EdfWriter::write_recording(&path, &[channel]).unwrap_err();
        assert!(err.to_string().contains("does not fit"), "{}", err);
        assert!(!path.exists());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synthetic.edf");
        let fp1 = sine(10.0, 256, 4);
        let o2 = sine(6.0, 128, 4);
        let written = EdfWriter::write_recording(
            &path,
            &[
                EdfChannel::new("Fp1", 256, fp1.clone()),
                EdfChannel::new("O2", 128, o2),
            ],
        )
        .unwrap();
        assert_eq!(written, 4);

        let mut recording = EdfRecording::open(&path).unwrap();
        assert_eq!(recording.num_records(), 4);
        assert_eq!(recording.labels().unwrap(), vec!["Fp1", "O2"]);
        assert_eq!(recording.sample_rate(0).unwrap(), 256.0);
        assert_eq!(recording.sample_rate(1).unwrap(), 128.0);

        let samples = recording.read_samples(0).unwrap();
        assert_eq!(samples.len(), fp1.len());
        let max_err = samples
            .iter()
            .zip(&fp1)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        assert!(max_err < 0.01, "quantization error {}", max_err);
        assert_eq!(recording.read_samples(1).unwrap().len(), 512);
        assert!(recording.read_samples(2).is_err());

        recording.close().unwrap();
        assert!(matches!(
            recording.read_samples(0),
            Err(QeegError::UnreadableRecording(_))
        ));
    }

    #[test]
    fn test_annotation_signal_is_not_a_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edfplus.edf");
        EdfWriter::write_recording(
            &path,
            &[
                EdfChannel::new("C3", 256, sine(10.0, 256, 2)),
                EdfChannel::new(ANNOTATION_LABEL, 60, vec![0.0; 120]),
                EdfChannel::new("C4", 256, sine(10.0, 256, 2)),
            ],
        )
        .unwrap();

        let mut recording = EdfRecording::open(&path).unwrap();
        assert_eq!(recording.channel_count().unwrap(), 2);
        assert_eq!(recording.labels().unwrap(), vec!["C3", "C4"]);
        assert_eq!(recording.read_samples(1).unwrap().len(), 512);
    }

    #[test]
    fn test_unknown_record_count_is_derived() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unfinished.edf");
        let channel = EdfChannel::new("Cz", 100, sine(5.0, 100, 3));
        let mut writer = EdfWriter::new(
            &path,
            "X".to_string(),
            "X".to_string(),
            "01.01.00".to_string(),
            "00.00.00".to_string(),
            vec![channel.signal_header().unwrap()],
            1.0,
        )
        .unwrap();
        for record in channel.samples.chunks(100) {
            writer.write_physical_record(&[record.to_vec()]).unwrap();
        }
        drop(writer);

        let recording = EdfRecording::open(&path).unwrap();
        assert_eq!(recording.header.num_data_records, -1);
        assert_eq!(recording.num_records(), 3);
        assert_eq!(recording.total_duration(), 3.0);
    }

    #[test]
    fn test_truncated_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.edf");
        EdfWriter::write_recording(&path, &[EdfChannel::new("Pz", 256, sine(10.0, 256, 2))])
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 100]).unwrap();

        assert!(matches!(
            EdfRecording::open(&path),
            Err(QeegError::UnreadableRecording(_))
        ));
    }

    #[test]
    fn test_garbage_header_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.edf");
        std::fs::write(&path, vec![b'x'; 600]).unwrap();
        assert!(matches!(
            EdfRecording::open(&path),
            Err(QeegError::UnreadableRecording(_))
        ));
    }
}
