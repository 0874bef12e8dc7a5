use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use posefuse_3d::camera::CameraIntrinsics;
use posefuse_3d::image::Image;
use posefuse_3d::transforms::euler_to_matrix;
use posefuse_fusion::{fuse_with, Frame, FusionConfig};
use posefuse_sync::{SortedTransformIndex, TimedTransform, TransformStream};

fn bench_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuse");
    group.sample_size(10);

    let intrinsics = CameraIntrinsics::new(640, 480, 615.0, 615.0, 320.0, 240.0);
    let size = intrinsics.image_size();

    // one second of a 250 Hz pose log
    let stream = (0..250)
        .map(|i| TimedTransform {
            timestamp: i * 4,
            transform: euler_to_matrix(i as f64, 0.0, 0.0, 0.0, 0.0, i as f64 * 0.1).unwrap(),
        })
        .collect::<TransformStream>();
    let index = SortedTransformIndex::new(&stream);

    for num_frames in [1, 8, 30].iter() {
        let frames = (0..*num_frames)
            .map(|i| {
                let depth = (0..size.num_pixels()).map(|p| (p % 900 + 100) as u16).collect();
                Frame::new(
                    i as i64 * 33,
                    Image::new(size, depth).unwrap(),
                    Image::from_size_val(size, [120, 80, 40]),
                )
            })
            .collect::<Vec<_>>();

        for parallel in [false, true] {
            let name = if parallel { "parallel" } else { "sequential" };
            let config = FusionConfig { parallel };
            group.bench_with_input(BenchmarkId::new(name, num_frames), &frames, |b, frames| {
                b.iter(|| black_box(fuse_with(frames, &index, &intrinsics, &config).unwrap()))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_fuse);
criterion_main!(benches);
