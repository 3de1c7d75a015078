use std::sync::Arc;

use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;
use log::debug;
use log::warn;

/// Apply `func` to every item on a pool of `num_workers` threads, and block
/// until all are done. Every item yields its own result; failures are gathered
/// and the first one is returned, together with a count of how many failed.
/// A panicking worker counts as a failure.
pub fn run_parallel<T, F>(num_workers: usize, items: Vec<T>, func: F) -> anyhow::Result<()>
where
    T: Send + 'static,
    F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let num_items = items.len();
    if num_items == 0 {
        return Ok(());
    }

    let thread_pool = threadpool::ThreadPool::new(num_workers.max(1));
    let func = Arc::new(func);
    let group = TaskGroup::new();

    //All items are submitted up front
    for (idx, item) in items.into_iter().enumerate() {
        let func = Arc::clone(&func);
        let tx = group.sender();
        thread_pool.execute(move || {
            debug!("Task {} started", idx);
            let result = func(item);
            _ = tx.send((idx, result));
        });
    }

    thread_pool.join();
    let panicked = thread_pool.panic_count();
    group.collect(num_items, panicked)
}

/// Gathers one result per submitted task
struct TaskGroup {
    tx_done: Sender<(usize, anyhow::Result<()>)>,
    rx_done: Receiver<(usize, anyhow::Result<()>)>,
}

impl TaskGroup {
    fn new() -> TaskGroup {
        let (tx_done, rx_done) = crossbeam::channel::unbounded();
        TaskGroup { tx_done, rx_done }
    }

    fn sender(&self) -> Sender<(usize, anyhow::Result<()>)> {
        self.tx_done.clone()
    }

    fn collect(self, num_items: usize, panicked: usize) -> anyhow::Result<()> {
        drop(self.tx_done);

        let mut num_reported = 0;
        let mut failures: Vec<(usize, anyhow::Error)> = Vec::new();
        for (idx, result) in self.rx_done.iter() {
            num_reported += 1;
            if let Err(e) = result {
                warn!("Task {} failed: {:#}", idx, e);
                failures.push((idx, e));
            }
        }

        let num_lost = num_items - num_reported;
        if num_lost > 0 || panicked > 0 {
            anyhow::bail!(
                "{} of {} tasks did not complete (worker panicked)",
                num_lost.max(panicked),
                num_items
            );
        }

        let num_failed = failures.len();
        failures.sort_by_key(|(idx, _)| *idx);
        if let Some((idx, first)) = failures.into_iter().next() {
            return Err(first.context(format!(
                "{} of {} tasks failed; first failure in task {}",
                num_failed, num_items, idx
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    #[test]
    fn test_all_items_processed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_w = Arc::clone(&seen);
        run_parallel(3, (0..20).collect(), move |i: usize| {
            seen_w.lock().unwrap().push(i);
            Ok(())
        })
        .unwrap();
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty() {
        run_parallel(2, Vec::<usize>::new(), |_| Ok(())).unwrap();
    }

    #[test]
    fn test_bounded_workers() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        run_parallel(2, (0..8).collect(), move |_: usize| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            a.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_failures_surface() {
        let err = run_parallel(4, (0..10).collect(), |i: usize| {
            if i % 5 == 3 {
                anyhow::bail!("item {} broke", i)
            }
            Ok(())
        })
        .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("2 of 10 tasks failed"), "{}", msg);
        assert!(msg.contains("item 3 broke"), "{}", msg);
    }

    #[test]
    fn test_panic_surfaces() {
        let r = run_parallel(2, (0..4).collect(), |i: usize| {
            if i == 2 {
                panic!("boom");
            }
            Ok(())
        });
        assert!(r.is_err());
    }
}
