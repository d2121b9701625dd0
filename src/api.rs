//! Python binding layer: exposes the core pipeline as a single function,
//! validating input before delegating to the pure-Rust core.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::enumerate::Enumerator;
use crate::pipeline;

/// Reconstructs the exact median triplet tree(s) for `nwks`, one Newick
/// string per tree.
///
/// Args:
///     nwks: Newick strings, one rooted tree each.
///     n_threads: worker thread count (0 lets rayon pick).
///
/// Returns:
///     A tuple `(taxa, optimal_trees)`: the label universe in their
///     first-occurrence order, and every tree achieving the maximum
///     triplet score.
///
/// Raises:
///     ValueError: on malformed input or a label universe over the hard
///     scale ceiling.
#[pyfunction]
#[pyo3(signature = (nwks, n_threads=0))]
fn median_trees(nwks: Vec<String>, n_threads: usize) -> PyResult<(Vec<String>, Vec<String>)> {
    if nwks.is_empty() {
        return Err(PyValueError::new_err("no trees given"));
    }

    let result = pipeline::run(&nwks, n_threads, true).map_err(|e| PyValueError::new_err(e.to_string()))?;

    let enumerator = Enumerator::new(&result.best, result.labels.reverse_labels());
    let optimal_trees: Vec<String> = enumerator.enumerate(result.universe()).collect();

    Ok((result.labels.reverse_labels().to_vec(), optimal_trees))
}

#[pymodule]
fn mtrip(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(median_trees, m)?)?;
    Ok(())
}
