//! Distributed execution: a pool of independent workers fed over channels.
//!
//! Work items are self-contained, workers never talk to each other, and the
//! coordinator blocks until every dispatched item has returned before
//! concatenating the partial tables. There is no per-item timeout; a hung
//! model call blocks the whole run (documented limitation).

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::error::Error;
use crate::experiment::preprocess::Preprocessor;
use crate::experiment::WorkItem;
use crate::results::{ResultRow, ResultTable};

/// Partial result of one work item: the rows it produced, or its failure.
pub type WorkResult = Result<Vec<ResultRow>, Error>;

/// Worker loop: evaluate conditions until the work channel closes.
pub fn run(pre: Preprocessor, work_rx: Receiver<WorkItem>, result_tx: Sender<WorkResult>) {
    while let Ok(item) = work_rx.recv() {
        let result = item.evaluate(&pre);
        if result_tx.send(result).is_err() {
            break; // coordinator went away
        }
    }
}

/// Evaluate all items on `workers` threads and concatenate the partial
/// tables in completion order. Any item failure fails the whole run; results
/// from other items are discarded, never corrupted (each worker only ever
/// touches its own rows).
pub fn run_pool(
    pre: Preprocessor,
    items: Vec<WorkItem>,
    workers: usize,
) -> Result<ResultTable, Error> {
    let workers = workers.max(1);
    let n_items = items.len();
    debug!(workers, n_items, "dispatching to worker pool");

    let (work_tx, work_rx) = crossbeam_channel::unbounded::<WorkItem>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<WorkResult>();

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let pre = pre.clone();
        let work_rx = work_rx.clone();
        let result_tx = result_tx.clone();
        handles.push(std::thread::spawn(move || run(pre, work_rx, result_tx)));
    }
    drop(work_rx);
    drop(result_tx);

    for item in items {
        work_tx
            .send(item)
            .map_err(|_| Error::Pool("all workers exited before dispatch finished".into()))?;
    }
    drop(work_tx);

    let mut table = ResultTable::new();
    let mut first_err = None;
    for _ in 0..n_items {
        match result_rx.recv() {
            Ok(Ok(rows)) => table.extend(rows),
            Ok(Err(e)) => {
                first_err.get_or_insert(e);
            }
            Err(_) => {
                first_err.get_or_insert(Error::Pool(
                    "a worker exited before returning its result".into(),
                ));
                break;
            }
        }
    }

    for handle in handles {
        let _ = handle.join();
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(table),
    }
}
