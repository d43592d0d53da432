//! One training pass over the training partition

use crate::config::RunConfig;
use crate::data::DataLoader;
use crate::model::{Net, Reduction};
use crate::optim::Optimizer;
use crate::tracking::{storage::TrackingBackend, ExperimentTracker};
use crate::{Result, Tensor};

/// Train the model for a single epoch
///
/// For each batch: clear gradients, forward, NLL loss, backward, optimizer
/// step. Every `log_interval`-th batch prints progress and emits the batch
/// loss to the tracker; with `dry_run` set, returns right after the first
/// logged batch.
pub fn train_epoch<B: TrackingBackend>(
    model: &Net,
    params: &mut [Tensor],
    optimizer: &mut dyn Optimizer,
    loader: &DataLoader<'_>,
    epoch: usize,
    cfg: &RunConfig,
    tracker: &mut ExperimentTracker<B>,
    run_id: &str,
) -> Result<()> {
    let total = loader.num_samples();
    let num_batches = loader.num_batches();
    let mut processed = 0usize;

    for (batch_idx, batch) in loader.iter().enumerate() {
        optimizer.zero_grad(params);

        let fwd = model.forward(&batch.images, batch.size());
        let loss = Net::nll_loss(&fwd.log_probs, &batch.labels, Reduction::Mean);
        model.backward(&batch.images, &fwd, &batch.labels);
        optimizer.step(params);

        processed += batch.size();

        if batch_idx % cfg.log_interval == 0 {
            if !cfg.quiet {
                println!(
                    "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
                    epoch,
                    processed,
                    total,
                    100.0 * batch_idx as f64 / num_batches as f64,
                    loss
                );
            }
            let step = (epoch * num_batches + batch_idx) as u64;
            tracker.log_metric(run_id, "training_loss", f64::from(loss), step)?;

            if cfg.dry_run {
                break;
            }
        }
    }

    Ok(())
}
