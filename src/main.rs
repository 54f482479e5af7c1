use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;
use std::time::Duration;

use splatsort::camera::{look_at_origin, Camera};
use splatsort::centers::CenterPalette;
use splatsort::demo::{generate_demo_scene_table, generate_demo_splats};
use splatsort::loader::load_splat_file;
use splatsort::math::Vec3;
use splatsort::worker::{SceneTable, SortRequest, SortWorker};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

const DEMO_SEED: u64 = 0x5EED;

struct DemoOptions {
    integer_sort: bool,
    dynamic_scenes: bool,
    splat_count: usize,
    distance_map_range: usize,
    frames: usize,
    input_path: Option<String>,
}

fn next_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> AppResult<usize> {
    let Some(value) = iter.next() else {
        return Err(format!("{flag} needs a value").into());
    };
    Ok(value
        .parse::<usize>()
        .map_err(|e| format!("{flag}: {e}"))?)
}

fn parse_args(args: &[String]) -> AppResult<DemoOptions> {
    let mut options = DemoOptions {
        integer_sort: false,
        dynamic_scenes: false,
        splat_count: 45_000,
        distance_map_range: 65_536,
        frames: 240,
        input_path: None,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--int" => options.integer_sort = true,
            "--dynamic" => options.dynamic_scenes = true,
            "--splats" => options.splat_count = next_value(&mut iter, "--splats")?,
            "--range" => options.distance_map_range = next_value(&mut iter, "--range")?,
            "--frames" => options.frames = next_value(&mut iter, "--frames")?,
            other if other.starts_with("--") => {
                return Err(format!("Unknown flag '{other}'. Use --int, --dynamic, --splats N, --range B, --frames N, or a .splat path").into());
            }
            other => options.input_path = Some(other.to_string()),
        }
    }

    if options.distance_map_range == 0 {
        return Err("--range must be at least 1".into());
    }
    if options.frames == 0 {
        return Err("--frames must be at least 1".into());
    }

    Ok(options)
}

fn main() -> AppResult<()> {
    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args)?;

    let splats = match &options.input_path {
        Some(path) => load_splat_file(path)?,
        None => generate_demo_splats(options.splat_count, DEMO_SEED),
    };
    if splats.is_empty() {
        return Err("no splats to sort".into());
    }
    let splat_count = splats.len();

    let centers = Arc::new(if options.integer_sort {
        CenterPalette::pack_integer(&splats)
    } else {
        CenterPalette::pack_float(&splats)
    });

    let scenes = if options.dynamic_scenes {
        let (scene_indexes, transforms) = generate_demo_scene_table(splat_count, 4);
        Some(Arc::new(SceneTable {
            scene_indexes,
            transforms,
        }))
    } else {
        None
    };

    let worker = SortWorker::spawn(centers, scenes, options.distance_map_range);

    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), -FRAC_PI_2, 0.0);
    look_at_origin(&mut camera);

    let mut indexes: Vec<u32> = (0..splat_count as u32).collect();
    let mut total = Duration::ZERO;
    let mut slowest = Duration::ZERO;
    let mut fastest = Duration::MAX;

    for frame in 0..options.frames {
        let angle = frame as f32 / options.frames as f32 * TAU;
        camera.position.x = 5.0 * angle.cos();
        camera.position.z = 5.0 * angle.sin();
        look_at_origin(&mut camera);

        worker.submit(SortRequest {
            view_proj: camera.view_proj(16.0 / 9.0),
            sort_count: splat_count,
            indexes: std::mem::take(&mut indexes),
        })?;
        let response = worker.recv()?;

        indexes = response.indexes;
        total += response.elapsed;
        slowest = slowest.max(response.elapsed);
        fastest = fastest.min(response.elapsed);
    }

    worker.shutdown();

    let mode = match (options.integer_sort, options.dynamic_scenes) {
        (true, true) => "integer, dynamic",
        (true, false) => "integer, static",
        (false, true) => "float, dynamic",
        (false, false) => "float, static",
    };

    println!(
        "sorted {splat_count} splats over {} orbit frames ({mode}, {} buckets)",
        options.frames, options.distance_map_range
    );
    println!(
        "sort time per frame: fastest {fastest:.2?}, average {:.2?}, slowest {slowest:.2?}",
        total / options.frames as u32
    );

    Ok(())
}
