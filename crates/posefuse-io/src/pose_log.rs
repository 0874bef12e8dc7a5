use std::io::BufRead;
use std::path::Path;

use posefuse_sync::{Pose, RawTimestamp};

/// Actual-pose column names written by the robot sensor interface logger.
pub const RSI_COLUMNS: [&str; 7] = [
    "Timestamp", "X_RIst", "Y_RIst", "Z_RIst", "A_RIst", "B_RIst", "C_RIst",
];

/// Generic pose column names.
pub const GENERIC_COLUMNS: [&str; 7] = ["timestamp", "x", "y", "z", "a", "b", "c"];

/// Error types for the pose log module.
#[derive(Debug, thiserror::Error)]
pub enum PoseLogError {
    /// Failed to open the file.
    #[error("Failed to read pose log. {0}")]
    Io(#[from] std::io::Error),

    /// The CSV itself is malformed, e.g. not valid UTF-8.
    #[error("Failed to parse pose log. {0}")]
    Csv(#[from] csv::Error),

    /// The log has no header row.
    #[error("Pose log is empty")]
    MissingHeader,

    /// The header names neither known column set.
    #[error("Pose log header lacks columns {missing:?}")]
    MissingColumns {
        /// Columns of the robot sensor interface set that were not found.
        missing: Vec<String>,
    },
}

/// Pose records read from a log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseLog {
    /// Records in file order.
    pub poses: Vec<Pose>,
    /// Rows dropped because they had too few cells.
    pub skipped_rows: usize,
}

fn locate_columns(header: &[&str]) -> Result<[usize; 7], PoseLogError> {
    let find = |names: &[&str; 7]| -> Option<[usize; 7]> {
        let mut indices = [0; 7];
        for (slot, name) in indices.iter_mut().zip(names.iter()) {
            *slot = header.iter().position(|cell| cell == name)?;
        }
        Some(indices)
    };

    find(&RSI_COLUMNS)
        .or_else(|| find(&GENERIC_COLUMNS))
        .ok_or_else(|| PoseLogError::MissingColumns {
            missing: RSI_COLUMNS
                .iter()
                .filter(|name| !header.contains(*name))
                .map(|name| name.to_string())
                .collect(),
        })
}

/// Parse a comma separated pose log.
///
/// The first non-empty line is the header; columns are located by name so
/// extra columns and any column order are accepted. Quoted cells may hold
/// commas. A numeric cell that does not parse becomes NaN, which later fails
/// pose conversion. Rows with too few cells are skipped and counted.
pub fn parse_pose_log<R: BufRead>(mut reader: R) -> Result<PoseLog, PoseLogError> {
    // spreadsheet exports may start with a UTF-8 byte order mark
    if reader.fill_buf()?.starts_with(b"\xef\xbb\xbf") {
        reader.consume(3);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header_record = rdr.headers()?.clone();
    if header_record.is_empty() {
        return Err(PoseLogError::MissingHeader);
    }
    let header = header_record.iter().collect::<Vec<_>>();
    let columns = locate_columns(&header)?;
    let needed = columns.iter().max().map_or(0, |max| max + 1);

    let mut pose_log = PoseLog::default();
    for record in rdr.records() {
        let record = record?;
        if record.len() < needed {
            log::warn!(
                "Skipping pose log line {}: {} cells, expected at least {needed}",
                record.position().map_or(0, |pos| pos.line()),
                record.len()
            );
            pose_log.skipped_rows += 1;
            continue;
        }

        let number = |idx: usize| record[columns[idx]].parse::<f64>().unwrap_or(f64::NAN);
        pose_log.poses.push(Pose {
            timestamp: RawTimestamp::Text(record[columns[0]].to_string()),
            x: number(1),
            y: number(2),
            z: number(3),
            a: number(4),
            b: number(5),
            c: number(6),
        });
    }

    log::info!(
        "Read {} pose records, skipped {} short rows",
        pose_log.poses.len(),
        pose_log.skipped_rows
    );

    Ok(pose_log)
}

/// Read a comma separated pose log from disk.
///
/// See [`parse_pose_log`].
pub fn read_pose_log(path: impl AsRef<Path>) -> Result<PoseLog, PoseLogError> {
    let file = std::fs::File::open(path)?;
    parse_pose_log(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rsi_columns() -> Result<(), PoseLogError> {
        let text = "\
IPOC,Timestamp,X_RIst,Y_RIst,Z_RIst,A_RIst,B_RIst,C_RIst,X_RSol
1,2024-03-01 12:00:00.125,100.5,200,300,0,90,-45,0
2,1709294400250,101.5,200,300,0,90,-45,0
";
        let log = parse_pose_log(text.as_bytes())?;
        assert_eq!(log.skipped_rows, 0);
        assert_eq!(log.poses.len(), 2);
        assert_eq!(
            log.poses[0].timestamp,
            RawTimestamp::Text("2024-03-01 12:00:00.125".into())
        );
        assert_eq!(log.poses[0].xyzabc(), [100.5, 200.0, 300.0, 0.0, 90.0, -45.0]);
        assert_eq!(log.poses[1].x, 101.5);
        Ok(())
    }

    #[test]
    fn test_parse_generic_columns_any_order() -> Result<(), PoseLogError> {
        let text = "c,b,a,z,y,x,timestamp\n6,5,4,3,2,1,100\n";
        let log = parse_pose_log(text.as_bytes())?;
        assert_eq!(log.poses[0].xyzabc(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(log.poses[0].timestamp, RawTimestamp::Text("100".into()));
        Ok(())
    }

    #[test]
    fn test_bad_cells_and_short_rows() -> Result<(), PoseLogError> {
        let text = "\
timestamp,x,y,z,a,b,c

0,0,0,0,0,0,0
5,oops,0,0,0,0,0
10,1,2
20,1,0,0,0,0,0
";
        let log = parse_pose_log(text.as_bytes())?;
        assert_eq!(log.skipped_rows, 1);
        assert_eq!(log.poses.len(), 3);
        assert!(log.poses[1].x.is_nan());
        assert_eq!(log.poses[2].x, 1.0);
        Ok(())
    }

    #[test]
    fn test_quoted_header_and_bom() -> Result<(), PoseLogError> {
        let text = "\u{feff}\"timestamp\",\"x\",\"y\",\"z\",\"a\",\"b\",\"c\"\n1,1,1,1,1,1,1\n";
        let log = parse_pose_log(text.as_bytes())?;
        assert_eq!(log.poses.len(), 1);
        Ok(())
    }

    #[test]
    fn test_quoted_comma_in_extra_column() -> Result<(), PoseLogError> {
        let text = "note,timestamp,x,y,z,a,b,c\n\"hello, world\",100,1,0,0,0,0,0\n";
        let log = parse_pose_log(text.as_bytes())?;
        assert_eq!(log.skipped_rows, 0);
        assert_eq!(log.poses.len(), 1);
        assert_eq!(log.poses[0].timestamp, RawTimestamp::Text("100".into()));
        assert_eq!(log.poses[0].xyzabc(), [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let stream = posefuse_sync::build_stream(&log.poses);
        assert_eq!(stream.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_columns() {
        let res = parse_pose_log("Timestamp,X_RIst,Y_RIst\n".as_bytes());
        match res {
            Err(PoseLogError::MissingColumns { missing }) => {
                assert_eq!(missing, ["Z_RIst", "A_RIst", "B_RIst", "C_RIst"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_pose_log("".as_bytes()),
            Err(PoseLogError::MissingHeader)
        ));
    }

    #[test]
    fn test_read_pose_log_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("poses.csv");
        std::fs::write(&path, "timestamp,x,y,z,a,b,c\n0,0,0,0,0,0,0\n100,1,0,0,0,0,0\n")?;

        let log = read_pose_log(&path)?;
        let stream = posefuse_sync::build_stream(&log.poses);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.entries()[1].timestamp, 100);
        Ok(())
    }
}
