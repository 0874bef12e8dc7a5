use std::io::{BufRead, Write};
use std::path::Path;

use posefuse_3d::transforms::{RigidTransform, TransformError};
use posefuse_sync::{TimedTransform, TransformStream};

/// Header row written before the transforms.
pub const TRANSFORM_CSV_HEADER: [&str; 17] = [
    "timestamp", "m00", "m01", "m02", "m03", "m10", "m11", "m12", "m13", "m20", "m21", "m22",
    "m23", "m30", "m31", "m32", "m33",
];

/// Error types for the transform CSV module.
#[derive(Debug, thiserror::Error)]
pub enum TransformCsvError {
    /// Failed to open the file.
    #[error("Failed to read or write transform CSV. {0}")]
    Io(#[from] std::io::Error),

    /// The CSV itself is malformed or could not be written.
    #[error("Malformed transform CSV. {0}")]
    Csv(#[from] csv::Error),

    /// A row does not hold a timestamp and 16 numbers.
    #[error("Invalid transform row at line {line}: {reason}")]
    InvalidRow {
        /// One-based line number.
        line: u64,
        /// What is wrong with the row.
        reason: String,
    },

    /// A row holds a matrix that is not a rigid transform.
    #[error("Invalid transform at line {line}. {source}")]
    Transform {
        /// One-based line number.
        line: u64,
        /// The rigidity check that failed.
        source: TransformError,
    },
}

fn parse_timestamp(cell: &str) -> Option<i64> {
    // spreadsheet exports may write integral floats
    cell.parse::<i64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Write a transform stream as CSV, one row-major flattened matrix per row.
pub fn write_transform_stream_to<W: Write>(
    writer: W,
    stream: &TransformStream,
) -> Result<(), TransformCsvError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TRANSFORM_CSV_HEADER)?;
    for entry in stream {
        let mut row = Vec::with_capacity(17);
        row.push(entry.timestamp.to_string());
        row.extend(entry.transform.to_row_major().iter().map(f64::to_string));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a transform stream to a CSV file, replacing any existing file.
pub fn write_transform_stream(
    path: impl AsRef<Path>,
    stream: &TransformStream,
) -> Result<(), TransformCsvError> {
    let file = std::fs::File::create(path)?;
    write_transform_stream_to(std::io::BufWriter::new(file), stream)
}

/// Parse a transform stream from CSV.
///
/// The first line is a header and is skipped whatever it holds. Every other
/// non-empty line must be a timestamp followed by 16 row-major matrix values
/// describing a rigid transform.
pub fn parse_transform_stream<R: BufRead>(reader: R) -> Result<TransformStream, TransformCsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());

        if record.len() != 17 {
            return Err(TransformCsvError::InvalidRow {
                line,
                reason: format!("expected 17 cells, got {}", record.len()),
            });
        }

        let timestamp = parse_timestamp(&record[0]).ok_or_else(|| TransformCsvError::InvalidRow {
            line,
            reason: format!("bad timestamp {:?}", &record[0]),
        })?;

        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| TransformCsvError::InvalidRow {
                    line,
                    reason: format!("bad number {cell:?}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let transform = RigidTransform::from_row_major(&values)
            .map_err(|source| TransformCsvError::Transform { line, source })?;

        entries.push(TimedTransform {
            timestamp,
            transform,
        });
    }

    log::debug!("Read {} transforms", entries.len());

    Ok(TransformStream::new(entries))
}

/// Read a transform stream from a CSV file.
///
/// See [`parse_transform_stream`].
pub fn read_transform_stream(path: impl AsRef<Path>) -> Result<TransformStream, TransformCsvError> {
    let file = std::fs::File::open(path)?;
    parse_transform_stream(std::io::BufReader::new(file))
}
