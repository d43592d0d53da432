//! Evaluation over the held-out partition

use crate::data::DataLoader;
use crate::model::{Net, Reduction};
use crate::tracking::{storage::TrackingBackend, ExperimentTracker};
use crate::Result;

/// Aggregate quality metrics from one evaluation pass
#[derive(Debug, Clone, Copy)]
pub struct EvalReport {
    /// Summed NLL loss divided by sample count
    pub avg_loss: f64,
    /// Correct top-1 predictions divided by sample count
    pub accuracy: f64,
    /// Correct top-1 predictions
    pub correct: usize,
    /// Samples evaluated
    pub total: usize,
}

/// Evaluate the model without updating parameters
///
/// Accumulates summed loss and correct top-1 counts across all batches,
/// prints a summary, and emits `test_loss` and `epoch` to the tracker.
/// Returns the report; its average loss is the search objective.
pub fn evaluate<B: TrackingBackend>(
    model: &Net,
    loader: &DataLoader<'_>,
    epoch: usize,
    quiet: bool,
    tracker: &mut ExperimentTracker<B>,
    run_id: &str,
) -> Result<EvalReport> {
    let mut summed_loss = 0.0f64;
    let mut correct = 0usize;
    let total = loader.num_samples();

    for batch in loader.iter() {
        // Inference only: no activations retained, no gradients written.
        let log_probs = model.log_probs(&batch.images, batch.size());
        summed_loss += f64::from(Net::nll_loss(&log_probs, &batch.labels, Reduction::Sum));

        let predictions = Net::predictions(&log_probs);
        correct += predictions.iter().zip(&batch.labels).filter(|(p, y)| p == y).count();
    }

    let avg_loss = summed_loss / total.max(1) as f64;
    let accuracy = correct as f64 / total.max(1) as f64;

    if !quiet {
        println!(
            "\nTest set: Average loss: {:.4}, Accuracy: {}/{} ({:.0}%)\n",
            avg_loss,
            correct,
            total,
            100.0 * accuracy
        );
    }
    tracker.log_metric(run_id, "test_loss", avg_loss, epoch as u64)?;
    tracker.log_metric(run_id, "epoch", epoch as f64, epoch as u64)?;

    Ok(EvalReport { avg_loss, accuracy, correct, total })
}
