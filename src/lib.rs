use std::sync::Mutex;
use std::time::Instant;

use scoped_pool::Pool;
use tracing::info;

pub mod config;
pub mod error;
pub mod ingest;
pub mod io;
pub mod known;
pub mod matrix;
pub mod record;
pub mod stats;
pub mod types;
pub mod utils;


pub use crate::config::{Config, DecayConfig};
pub use crate::error::{IngestError, IngestResult, RecordError};
pub use crate::ingest::{Delta, IngestionTask};
pub use crate::known::KnownItems;
pub use crate::matrix::DualMatrix;
pub use crate::record::{Batch, Value};
pub use crate::stats::{IdMapping, SharedMapping, StringIdMapping};

/// Reads the inputs of several tasks into one matrix.
///
/// The tasks read their files concurrently on `pool_size` threads, each into its own delta, while
/// inbound ids are resolved through the shared `mapping`. The deltas are then merged one by one in
/// the order of `tasks`, so matrix and known items end up the same as after running the tasks
/// sequentially. That holds when a task fails, too: the deltas of the tasks before it and the
/// interactions it read before the failure are merged (unpruned), nothing after it is.
///
/// The mapping is the one exception. Tasks after a failing one have already read their files,
/// so the mapping can hold ids which a sequential run would not have assigned yet. Mappings only
/// grow, so these ids are never wrong, merely early.
pub fn read_inputs<M>(
    tasks: &[IngestionTask],
    matrix: &mut DualMatrix,
    mut known: Option<&mut KnownItems>,
    mapping: &Mutex<M>,
    pool_size: usize,
) -> IngestResult<()>
    where M: IdMapping + Send {

    let pool = Pool::new(pool_size.max(1));

    let read_start = Instant::now();

    let mut deltas: Vec<Mutex<Option<(Delta, IngestResult<()>)>>> = Vec::with_capacity(tasks.len());

    for _ in 0..tasks.len() {
        deltas.push(Mutex::new(None));
    }

    pool.scoped(|scope| {
        for (task, delta) in tasks.iter().zip(deltas.iter()) {
            scope.execute(move || {
                let read = task.read_delta(&mut SharedMapping::new(mapping));
                *delta.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(read);
            });
        }
    });

    pool.shutdown();

    info!("Read {} inputs in {}ms", tasks.len(), utils::to_millis(read_start.elapsed()));

    let merge_start = Instant::now();

    for (task, delta) in tasks.iter().zip(deltas.into_iter()) {

        let (delta, result) = match delta.into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) {
            Some(read) => read,
            None => return Err(IngestError::Aborted(task.input_dir().to_path_buf())),
        };

        info!("Merging {} interactions from {}", delta.len(), task.input_dir().display());

        delta.merge_into(matrix, known.as_deref_mut());
        result?;
    }

    info!(
        "Merged into {} rows, {} columns and {} entries in {}ms",
        matrix.num_rows(),
        matrix.num_columns(),
        matrix.num_entries(),
        utils::to_millis(merge_start.elapsed()),
    );

    Ok(())
}
