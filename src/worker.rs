use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::centers::CenterPalette;
use crate::sorter::{self, PrecomputedDepths, SceneView, SortError, SortInputs, SortScratch};

/// Scene assignment shared with a worker for dynamic-mode sorts.
#[derive(Debug, Clone)]
pub struct SceneTable {
    pub scene_indexes: Vec<u32>,
    pub transforms: Vec<f32>,
}

impl SceneTable {
    fn view(&self) -> SceneView<'_> {
        SceneView {
            scene_indexes: &self.scene_indexes,
            transforms: &self.transforms,
        }
    }
}

/// One frame's sort job. `indexes` is the render window; its trailing
/// `sort_count` entries get re-sorted, the rest passes through. The
/// buffer comes back in the response, so a caller can ping-pong the
/// same allocation across frames.
#[derive(Debug)]
pub struct SortRequest {
    pub view_proj: [f32; 16],
    pub sort_count: usize,
    pub indexes: Vec<u32>,
}

#[derive(Debug)]
pub struct SortResponse {
    pub indexes: Vec<u32>,
    pub sort_count: usize,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum WorkerError {
    Disconnected,
    Sort(SortError),
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("sort worker is no longer running"),
            Self::Sort(err) => write!(f, "sort failed: {err}"),
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<SortError> for WorkerError {
    fn from(err: SortError) -> Self {
        Self::Sort(err)
    }
}

enum WorkerMessage {
    Sort(SortRequest),
    Shutdown,
}

/// Dedicated sort thread owning the scratch buffers and a shared view
/// of the center palette. One worker per renderer; the caller drives
/// frames by submitting requests and receiving responses in order.
pub struct SortWorker {
    requests: Sender<WorkerMessage>,
    responses: Receiver<Result<SortResponse, SortError>>,
    join: Option<JoinHandle<()>>,
}

impl SortWorker {
    pub fn spawn(
        centers: Arc<CenterPalette>,
        scenes: Option<Arc<SceneTable>>,
        distance_map_range: usize,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();

        let join = std::thread::spawn(move || {
            run_worker(request_rx, response_tx, centers, scenes, distance_map_range);
        });

        Self {
            requests: request_tx,
            responses: response_rx,
            join: Some(join),
        }
    }

    pub fn submit(&self, request: SortRequest) -> Result<(), WorkerError> {
        self.requests
            .send(WorkerMessage::Sort(request))
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Blocks until the next sorted frame arrives.
    pub fn recv(&self) -> Result<SortResponse, WorkerError> {
        match self.responses.recv() {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(WorkerError::Sort(err)),
            Err(_) => Err(WorkerError::Disconnected),
        }
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.requests.send(WorkerMessage::Shutdown);
            let _ = join.join();
        }
    }
}

impl Drop for SortWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    requests: Receiver<WorkerMessage>,
    responses: Sender<Result<SortResponse, SortError>>,
    centers: Arc<CenterPalette>,
    scenes: Option<Arc<SceneTable>>,
    distance_map_range: usize,
) {
    let mut scratch = SortScratch::new(centers.splat_count(), distance_map_range);

    while let Ok(message) = requests.recv() {
        let mut request = match message {
            WorkerMessage::Sort(request) => request,
            WorkerMessage::Shutdown => break,
        };

        let started = Instant::now();
        let render_count = request.indexes.len();

        scratch.reset_frequencies();
        let inputs = SortInputs {
            indexes: &request.indexes,
            centers: centers.view(),
            precomputed: PrecomputedDepths::None,
            view_proj: &request.view_proj,
            scenes: scenes.as_deref().map(SceneTable::view),
            distance_map_range,
            sort_count: request.sort_count,
            render_count,
        };

        let outcome = sorter::sort_indexes(&inputs, &mut scratch).map(|_| {
            request.indexes.copy_from_slice(scratch.sorted(render_count));
            SortResponse {
                indexes: std::mem::take(&mut request.indexes),
                sort_count: request.sort_count,
                elapsed: started.elapsed(),
            }
        });

        if responses.send(outcome).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{generate_demo_scene_table, generate_demo_splats};
    use crate::math::mat4_identity;

    fn demo_palette(count: usize) -> Arc<CenterPalette> {
        let splats = generate_demo_splats(count, 0xBEEF);
        Arc::new(CenterPalette::pack_float(&splats))
    }

    #[test]
    fn test_worker_round_trip() {
        let splat_count = 256usize;
        let centers = demo_palette(splat_count);
        let worker = SortWorker::spawn(centers, None, 1024);

        let indexes: Vec<u32> = (0..splat_count as u32).collect();
        worker
            .submit(SortRequest {
                view_proj: mat4_identity(),
                sort_count: splat_count,
                indexes: indexes.clone(),
            })
            .expect("submit should reach a live worker");

        let response = worker.recv().expect("worker should answer");
        assert_eq!(response.sort_count, splat_count);

        let mut seen = response.indexes.clone();
        seen.sort_unstable();
        assert_eq!(seen, indexes);
        worker.shutdown();
    }

    #[test]
    fn test_worker_matches_direct_kernel_call() {
        let splat_count = 128usize;
        let centers = demo_palette(splat_count);

        let indexes: Vec<u32> = (0..splat_count as u32).collect();
        let view_proj = mat4_identity();

        let mut scratch = SortScratch::new(splat_count, 512);
        let inputs = SortInputs {
            indexes: &indexes,
            centers: centers.view(),
            precomputed: PrecomputedDepths::None,
            view_proj: &view_proj,
            scenes: None,
            distance_map_range: 512,
            sort_count: splat_count,
            render_count: splat_count,
        };
        sorter::sort_indexes(&inputs, &mut scratch).expect("direct sort should succeed");

        let worker = SortWorker::spawn(Arc::clone(&centers), None, 512);
        worker
            .submit(SortRequest {
                view_proj,
                sort_count: splat_count,
                indexes,
            })
            .expect("submit should reach a live worker");
        let response = worker.recv().expect("worker should answer");

        assert_eq!(response.indexes, scratch.sorted(splat_count));
    }

    #[test]
    fn test_worker_passthrough_and_reuse() {
        let splat_count = 64usize;
        let centers = demo_palette(splat_count);
        let worker = SortWorker::spawn(centers, None, 256);

        let indexes: Vec<u32> = (0..splat_count as u32).rev().collect();
        let passthrough: Vec<u32> = indexes[..32].to_vec();

        worker
            .submit(SortRequest {
                view_proj: mat4_identity(),
                sort_count: 32,
                indexes,
            })
            .expect("submit should reach a live worker");
        let first = worker.recv().expect("worker should answer");
        assert_eq!(&first.indexes[..32], &passthrough[..]);

        // Second frame reuses the returned buffer.
        worker
            .submit(SortRequest {
                view_proj: mat4_identity(),
                sort_count: splat_count,
                indexes: first.indexes,
            })
            .expect("submit should reach a live worker");
        let second = worker.recv().expect("worker should answer");

        let mut seen = second.indexes.clone();
        seen.sort_unstable();
        let expected: Vec<u32> = (0..splat_count as u32).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_worker_dynamic_scene_table() {
        let splat_count = 96usize;
        let splats = generate_demo_splats(splat_count, 0xFEED);
        let centers = Arc::new(CenterPalette::pack_float(&splats));
        let (scene_indexes, transforms) = generate_demo_scene_table(splat_count, 3);
        let scenes = Arc::new(SceneTable {
            scene_indexes,
            transforms,
        });

        let worker = SortWorker::spawn(centers, Some(scenes), 256);
        worker
            .submit(SortRequest {
                view_proj: mat4_identity(),
                sort_count: splat_count,
                indexes: (0..splat_count as u32).collect(),
            })
            .expect("submit should reach a live worker");

        let response = worker.recv().expect("worker should answer");
        let mut seen = response.indexes;
        seen.sort_unstable();
        let expected: Vec<u32> = (0..splat_count as u32).collect();
        assert_eq!(seen, expected);
    }
}
