use std::sync::atomic::{AtomicUsize, Ordering};

/// Runs `f(0..count)` on a bounded pool of scoped workers and returns the
/// results in index order. Jobs must be independent; each call to `f` builds
/// its own model, so no solver state is shared between workers.
pub(crate) fn parallel_map<T, F>(count: usize, workers: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    if count == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, count);
    if workers == 1 {
        return (0..count).map(f).collect();
    }

    let next = AtomicUsize::new(0);
    let mut results: Vec<Option<T>> = (0..count).map(|_| None).collect();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        if index >= count {
                            break;
                        }
                        done.push((index, f(index)));
                    }
                    done
                })
            })
            .collect();
        for handle in handles {
            for (index, value) in handle.join().expect("solver worker panicked") {
                results[index] = Some(value);
            }
        }
    });
    results
        .into_iter()
        .map(|value| value.expect("worker skipped a job"))
        .collect()
}
