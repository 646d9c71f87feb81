//! Remaps many classes against one shared [`RemapContext`].
//!
//! Items never share mutable state, so every item is handed to rayon on its
//! own and the report keeps input order. A failing item is recorded and the
//! rest of the batch carries on.

mod types;

pub use self::types::*;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::remap::{remap_class, RemapContext};

/// Remaps every input and reports one outcome per input, in input order.
pub fn remap_batch(
    ctx: &RemapContext,
    inputs: &[BatchInput],
    options: &BatchOptions,
) -> BatchReport {
    let run = || {
        inputs
            .par_iter()
            .map(|input| remap_item(ctx, input, &options.cancellation))
            .collect::<Vec<_>>()
    };
    let items = match options.threads {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!(threads, error = %e, "cannot build a dedicated pool, using the global one");
                run()
            }
        },
        None => run(),
    };

    let report = BatchReport { items };
    info!(
        total = inputs.len(),
        remapped = report.success_count(),
        failed = report.failure_count(),
        cancelled = report.cancelled_count(),
        "batch finished"
    );
    report
}

fn remap_item(ctx: &RemapContext, input: &BatchInput, cancel: &CancellationToken) -> ItemReport {
    let outcome = if cancel.is_cancelled() {
        ItemOutcome::Cancelled
    } else {
        match remap_class(&input.bytes, ctx) {
            Ok(class) => {
                debug!(
                    id = %input.id,
                    class = %class.mapped_name,
                    warnings = class.warnings.len(),
                    "remapped"
                );
                ItemOutcome::Remapped(class)
            }
            Err(e) => {
                warn!(id = %input.id, kind = e.kind(), error = %e, "remap failed");
                ItemOutcome::Failed(e)
            }
        }
    };
    ItemReport {
        id: input.id.clone(),
        outcome,
    }
}
