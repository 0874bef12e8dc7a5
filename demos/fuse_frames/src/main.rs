use argh::FromArgs;
use std::path::PathBuf;

use posefuse::fusion::{fuse_with, FusionAccumulator, FusionConfig};
use posefuse::io::frames::FrameStore;
use posefuse::io::intrinsics::read_intrinsics;
use posefuse::io::transform_csv::read_transform_stream;
use posefuse::k3d::io::ply::{write_ply, PlyEncoding};
use posefuse::sync::SortedTransformIndex;

#[derive(FromArgs)]
/// Fuse RGBD frames into one colored point cloud using a transform stream
struct Args {
    /// directory of <timestamp>.png depth images
    #[argh(option)]
    depth_dir: PathBuf,

    /// directory of <timestamp>.jpg color images
    #[argh(option)]
    color_dir: PathBuf,

    /// path to the transform stream CSV
    #[argh(option)]
    transforms: PathBuf,

    /// path to the camera intrinsics JSON
    #[argh(option)]
    intrinsics: PathBuf,

    /// path of the PLY file to write
    #[argh(option, default = "PathBuf::from(\"fused.ply\")")]
    output: PathBuf,

    /// override the depth scale read from the intrinsics
    #[argh(option)]
    depth_scale: Option<f64>,

    /// override the depth truncation distance, in scaled units
    #[argh(option)]
    depth_trunc: Option<f64>,

    /// decode all frames up front and register them in parallel
    #[argh(switch)]
    parallel: bool,

    /// write an ascii PLY instead of binary
    #[argh(switch)]
    ascii: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut intrinsics = read_intrinsics(&args.intrinsics)?.intrinsics;
    if let Some(depth_scale) = args.depth_scale {
        // keep the cutoff at the same raw depth
        let raw_trunc = intrinsics.depth_trunc / intrinsics.depth_scale;
        intrinsics = intrinsics
            .with_depth_scale(depth_scale)
            .with_depth_trunc(raw_trunc * depth_scale);
    }
    if let Some(depth_trunc) = args.depth_trunc {
        intrinsics = intrinsics.with_depth_trunc(depth_trunc);
    }
    log::info!("Camera intrinsics: {intrinsics:?}");

    let stream = read_transform_stream(&args.transforms)?;
    let index = SortedTransformIndex::new(&stream);
    println!("Loaded {} transforms", stream.len());

    let store = FrameStore::open(&args.depth_dir, &args.color_dir)?;
    println!("Found {} frames", store.len());

    let (cloud, summary) = if args.parallel {
        let frames = store.load_all();
        fuse_with(&frames, &index, &intrinsics, &FusionConfig { parallel: true })?
    } else {
        // decode one frame at a time to keep memory flat
        let mut accumulator = FusionAccumulator::new(&index, &intrinsics)?;
        for frame in store.iter_frames() {
            accumulator.add_frame(&frame)?;
        }
        accumulator.finish()
    };

    println!(
        "Fused {} frames into {} points ({} incomplete frames skipped)",
        summary.frames_fused, summary.points, summary.frames_skipped_incomplete
    );

    let encoding = if args.ascii {
        PlyEncoding::Ascii
    } else {
        PlyEncoding::BinaryLittleEndian
    };
    write_ply(&args.output, &cloud, encoding)?;
    println!("Wrote {}", args.output.display());

    Ok(())
}
