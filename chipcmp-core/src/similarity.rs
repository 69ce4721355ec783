use itertools::Itertools;
use ndarray::{Array2, ArrayView1, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use statrs::statistics::Statistics;

use crate::regions::RegionSet;

/// Pairwise interval-overlap ratio between region sets:
/// `n_overlap(A, B) / min(|A|, |B|)`. Identical sets score 1.0, disjoint
/// sets 0.0; the matrix is symmetric with a unit diagonal.
pub fn overlap_matrix(sets: &[RegionSet]) -> Array2<f64> {
    let n = sets.len();
    let mut mat = Array2::from_diag_elem(n, 1.0);
    (0..n).combinations(2).for_each(|pair| {
        let (i, j) = (pair[0], pair[1]);
        let pairs = sets[i].n_overlap_pairs(&sets[j]) as f64;
        let denom = sets[i].len().min(sets[j].len()) as f64;
        let v = if denom == 0.0 { 0.0 } else { (pairs / denom).min(1.0) };
        mat[[i, j]] = v;
        mat[[j, i]] = v;
    });
    mat
}

fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    let mx = x.iter().mean();
    let my = y.iter().mean();
    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if sx == 0.0 || sy == 0.0 {
        return 0.0;
    }
    let n = x.len() as f64;
    let cov = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| (a - mx) * (b - my))
        .sum::<f64>()
        / (n - 1.0);
    cov / (sx * sy)
}

/// Pearson correlation between the columns of `mat` (one column per
/// sample). Columns with zero variance correlate to 0 with everything but
/// themselves.
pub fn pearson_matrix(mat: &Array2<f64>) -> Array2<f64> {
    let n = mat.ncols();
    let mut res = Array2::from_diag_elem(n, 1.0);
    let pairs: Vec<(usize, usize)> = (0..n).combinations(2).map(|p| (p[0], p[1])).collect();
    let values: Vec<f64> = pairs
        .clone()
        .into_par_iter()
        .map(|(i, j)| pearson(mat.index_axis(Axis(1), i), mat.index_axis(Axis(1), j)))
        .collect();
    pairs.into_iter().zip(values).for_each(|((i, j), v)| {
        res[[i, j]] = v;
        res[[j, i]] = v;
    });
    res
}

/// Leaf order from average-linkage agglomerative clustering on the distance
/// `1 - similarity`. Used to reorder rows/columns of a clustered heatmap.
pub fn cluster_order(similarity: &Array2<f64>) -> Vec<usize> {
    let n = similarity.nrows();
    if n <= 2 {
        return (0..n).collect();
    }
    let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    while clusters.len() > 1 {
        let mut best = (0, 1, f64::INFINITY);
        for (a, b) in (0..clusters.len()).tuple_combinations() {
            let d = clusters[a]
                .iter()
                .cartesian_product(clusters[b].iter())
                .map(|(&i, &j)| 1.0 - similarity[[i, j]])
                .sum::<f64>()
                / (clusters[a].len() * clusters[b].len()) as f64;
            if d < best.2 {
                best = (a, b, d);
            }
        }
        let merged = clusters.remove(best.1);
        clusters[best.0].extend(merged);
    }
    clusters.pop().unwrap()
}
