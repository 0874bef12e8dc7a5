use argh::FromArgs;
use std::path::PathBuf;

use posefuse::io::pose_log::read_pose_log;
use posefuse::io::transform_csv::write_transform_stream;
use posefuse::sync::build_stream_with_summary;

#[derive(FromArgs)]
/// Convert a robot pose log into a stream of transforms relative to its first pose
struct Args {
    /// path to the pose log CSV
    #[argh(option)]
    pose_log: PathBuf,

    /// path of the transform stream CSV to write
    #[argh(option)]
    output: PathBuf,

    /// replace the output file if it already exists
    #[argh(switch)]
    overwrite: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    if args.output.exists() && !args.overwrite {
        return Err(format!(
            "{} already exists, pass --overwrite to replace it",
            args.output.display()
        )
        .into());
    }

    let pose_log = read_pose_log(&args.pose_log)?;
    let (stream, summary) = build_stream_with_summary(&pose_log.poses);

    println!(
        "Read {} pose records ({} short rows dropped)",
        pose_log.poses.len(),
        pose_log.skipped_rows
    );
    println!(
        "Accepted {} records, skipped {} with bad poses and {} with bad timestamps",
        summary.accepted, summary.skipped_conversion, summary.skipped_timestamp
    );

    if stream.is_empty() {
        log::warn!("No usable pose records, writing an empty stream");
    }

    write_transform_stream(&args.output, &stream)?;
    println!("Wrote {} transforms to {}", stream.len(), args.output.display());

    Ok(())
}
