use argh::FromArgs;
use std::path::PathBuf;

use posefuse::io::transform_csv::read_transform_stream;
use posefuse::sync::timestamp::format_epoch_ms;
use posefuse::sync::{TimedTransform, TransformStream};

#[derive(FromArgs)]
/// Print every transform of a stream with its XYZABC pose and a reference vector
struct Args {
    /// path to the transform stream CSV
    #[argh(option)]
    transforms: PathBuf,

    /// print only every n-th transform
    #[argh(option, default = "1")]
    step: usize,
}

// a point half a meter ahead of the reference tool frame, in millimeters
const REFERENCE_POINT: [f64; 3] = [500.0, 0.0, 0.0];

/// Cursor over a transform stream.
struct Playback<'a> {
    stream: &'a TransformStream,
    index: usize,
    step: usize,
}

impl<'a> Playback<'a> {
    fn new(stream: &'a TransformStream, step: usize) -> Self {
        Self {
            stream,
            index: 0,
            step: step.max(1),
        }
    }

    fn advance(&mut self) -> Option<(usize, &'a TimedTransform)> {
        let entry = self.stream.entries().get(self.index)?;
        let current = self.index;
        self.index += self.step;
        Some((current, entry))
    }
}

fn render(playback: &Playback, index: usize, entry: &TimedTransform) {
    let time = format_epoch_ms(entry.timestamp).unwrap_or_else(|| entry.timestamp.to_string());
    let [x, y, z, a, b, c] = entry.transform.to_xyzabc();
    let [px, py, pz] = entry.transform.transform_point(&REFERENCE_POINT);

    println!("Time: {time} UTC ({} ms)", entry.timestamp);
    println!("Frame {}/{}", index + 1, playback.stream.len());
    println!("  XYZ: {x:10.3} {y:10.3} {z:10.3}");
    println!("  ABC: {a:10.3} {b:10.3} {c:10.3}");
    println!("  Reference point: {px:10.3} {py:10.3} {pz:10.3}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let stream = read_transform_stream(&args.transforms)?;
    if stream.is_empty() {
        log::warn!("{} holds no transforms", args.transforms.display());
        return Ok(());
    }

    let mut playback = Playback::new(&stream, args.step);
    while let Some((index, entry)) = playback.advance() {
        render(&playback, index, entry);
    }

    Ok(())
}
