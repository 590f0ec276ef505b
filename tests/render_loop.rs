//! Render loop and scene bookkeeping without a GPU

use std::time::Duration;

use anyhow::{anyhow, Result};
use glesh::constants::{RESULT_CPU_ALL, RESULT_CPU_PROCESS, RESULT_FRAMERATE, RESULT_FRAMES};
use glesh::geometry::{sphere, triangle_strip, Object};
use glesh::pool::BoundedPool;
use glesh::{
    execute_main_loop, CancelToken, GleshError, LoopOptions, LoopTarget, MemorySink, PerfData,
};

/// Scene holder shaped like a rendering context
struct Scene {
    objects: BoundedPool<Object>,
    perf: PerfData,
    pumps: u32,
}

impl Scene {
    fn new() -> Self {
        Self {
            objects: BoundedPool::new("objects", 4),
            perf: PerfData::default(),
            pumps: 0,
        }
    }
}

impl LoopTarget for Scene {
    fn perf_data_mut(&mut self) -> &mut PerfData {
        &mut self.perf
    }

    fn pump_events(&mut self) -> Result<()> {
        self.pumps += 1;
        if self.pumps == 3 {
            return Err(anyhow!("compositor went away"));
        }
        Ok(())
    }

    fn triangle_count(&self) -> u32 {
        self.objects.iter().map(|o| o.num_triangles).sum()
    }
}

#[test]
fn spinning_objects_accumulate_rotation() {
    let mut scene = Scene::new();
    let tri = scene.objects.push(triangle_strip(4.0)).unwrap();
    scene.objects.push(sphere(8, 1.0).unwrap()).unwrap();
    assert_eq!(scene.triangle_count(), 1 + 4 * 8 * 2);

    let mut sink = MemorySink::new();
    let options = LoopOptions::timed(Duration::from_millis(50));
    execute_main_loop(&mut scene, &mut sink, &options, |scene, frame| {
        let obj = scene.objects.get_mut(tri).ok_or_else(|| anyhow!("lost"))?;
        obj.modelview.rotate(30.0 * frame.time_step as f32, 0.0, 1.0, 0.0);
        std::thread::sleep(Duration::from_millis(5));
        Ok(())
    })
    .unwrap();

    assert!(scene.perf.frames_rendered >= 2);
    assert_ne!(
        scene.objects.get(tri).unwrap().modelview,
        glesh::Matrix::identity()
    );
    assert_eq!(
        sink.value(RESULT_FRAMES),
        Some(scene.perf.frames_rendered as f64)
    );
    assert!(sink.value(RESULT_FRAMERATE).unwrap() > 0.0);
    assert!(sink.value(RESULT_CPU_PROCESS).is_some());
    assert!(sink.value(RESULT_CPU_ALL).is_some());
    // Timed runs never touch the event queue
    assert_eq!(scene.pumps, 0);
}

#[test]
fn untimed_run_stops_when_events_fail() {
    let mut scene = Scene::new();
    let mut sink = MemorySink::new();
    let options = LoopOptions::default();

    execute_main_loop(&mut scene, &mut sink, &options, |_, _| Ok(())).unwrap();

    assert_eq!(scene.pumps, 3);
    assert_eq!(scene.perf.frames_rendered, 3);
    assert_eq!(sink.records.len(), 4);
}

#[test]
fn pool_limit_surfaces_as_error() {
    let mut scene = Scene::new();
    for _ in 0..4 {
        scene.objects.push(Object::new()).unwrap();
    }
    let err = scene.objects.push(Object::new()).unwrap_err();
    assert!(matches!(err, GleshError::PoolFull { capacity: 4, .. }));
}

#[test]
fn cancel_from_another_thread() {
    let mut scene = Scene::new();
    let mut sink = MemorySink::new();
    let cancel = CancelToken::new();
    let options = LoopOptions::timed(Duration::from_secs(30)).with_cancel(cancel.clone());

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        cancel.cancel();
    });

    execute_main_loop(&mut scene, &mut sink, &options, |_, _| {
        std::thread::sleep(Duration::from_millis(1));
        Ok(())
    })
    .unwrap();
    handle.join().unwrap();

    assert!(scene.perf.frames_rendered > 0);
    assert!(scene.perf.total_time_elapsed < 30.0);
}
