use ravel_api::{RavelError, RavelResult};

/// Runs drawcall recording for a graphic pass across worker threads. The worker count is read
/// once when the render backend is created and sizes the per-worker command pools.
///
/// `run_workers` must call `job` exactly once for every worker index in `0..worker_count()` and
/// return only after all calls have finished.
pub trait RecordingThreadPool: Send + Sync {
    fn worker_count(&self) -> usize;

    fn run_workers(
        &self,
        job: &(dyn Fn(usize) -> RavelResult<()> + Sync),
    ) -> RavelResult<()>;
}

/// Records on the calling thread with a single worker
#[derive(Clone, Default)]
pub struct RecordingThreadPoolNone {}

impl RecordingThreadPoolNone {
    pub fn new() -> Self {
        Self {}
    }
}

impl RecordingThreadPool for RecordingThreadPoolNone {
    fn worker_count(&self) -> usize {
        1
    }

    fn run_workers(
        &self,
        job: &(dyn Fn(usize) -> RavelResult<()> + Sync),
    ) -> RavelResult<()> {
        job(0)
    }
}

/// Spawns a scoped thread per worker for each parallel pass
#[derive(Clone)]
pub struct RecordingThreadPoolScoped {
    worker_count: usize,
}

impl RecordingThreadPoolScoped {
    pub fn new(worker_count: usize) -> Self {
        assert!(worker_count > 0, "a recording thread pool needs at least one worker");
        RecordingThreadPoolScoped { worker_count }
    }
}

impl RecordingThreadPool for RecordingThreadPoolScoped {
    fn worker_count(&self) -> usize {
        self.worker_count
    }

    fn run_workers(
        &self,
        job: &(dyn Fn(usize) -> RavelResult<()> + Sync),
    ) -> RavelResult<()> {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        std::thread::scope(|scope| {
            for worker_index in 0..self.worker_count {
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    profiling::register_thread!();
                    let result = job(worker_index);
                    // The receiver outlives the scope
                    let _ = result_tx.send((worker_index, result));
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<(usize, RavelResult<()>)> = result_rx.try_iter().collect();
        if results.len() != self.worker_count {
            return Err(RavelError::StringError(format!(
                "{} of {} recording workers finished",
                results.len(),
                self.worker_count
            )));
        }

        // Report the lowest failing worker so errors are deterministic
        results.sort_by_key(|(worker_index, _)| *worker_index);
        for (worker_index, result) in results {
            if let Err(e) = result {
                log::error!("Recording worker {} failed: {}", worker_index, e);
                return Err(e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_none_runs_worker_zero() {
        let seen = Mutex::new(Vec::new());
        RecordingThreadPoolNone::new()
            .run_workers(&|worker_index| {
                seen.lock().unwrap().push(worker_index);
                Ok(())
            })
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_scoped_runs_every_worker_once() {
        let calls = AtomicUsize::new(0);
        let seen = Mutex::new(Vec::new());
        let pool = RecordingThreadPoolScoped::new(4);
        pool.run_workers(&|worker_index| {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(worker_index);
            Ok(())
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_scoped_reports_lowest_failing_worker() {
        let pool = RecordingThreadPoolScoped::new(3);
        let result = pool.run_workers(&|worker_index| {
            if worker_index == 0 {
                Ok(())
            } else {
                Err(RavelError::StringError(format!("worker {}", worker_index)))
            }
        });

        match result {
            Err(RavelError::StringError(message)) => assert_eq!(message, "worker 1"),
            _ => panic!("expected worker 1 to fail"),
        }
    }
}
