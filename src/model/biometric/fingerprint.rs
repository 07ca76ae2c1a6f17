use crate::error::Rejection;

/// Reduce a raw biometric sample to a `dim`-dimensional feature vector.
///
/// The sample bytes are split into `dim` buckets, each bucket is averaged,
/// and the mean of the whole vector is subtracted so that overall brightness
/// does not dominate similarity. Deterministic: the same bytes always produce
/// the same vector.
///
/// Samples shorter than `dim` bytes cannot fill every bucket and are rejected
/// as [`Rejection::MalformedSample`].
pub fn extract(sample: &[u8], dim: usize) -> Result<Vec<f64>, Rejection> {
    if dim == 0 {
        return Err(Rejection::MalformedSample(
            "fingerprint dimensionality is zero".to_string(),
        ));
    }
    if sample.len() < dim {
        return Err(Rejection::MalformedSample(format!(
            "sample of {} bytes is shorter than the {dim}-dimensional fingerprint",
            sample.len()
        )));
    }

    let bucket = sample.len() / dim;
    let mut vector = Vec::with_capacity(dim);
    for i in 0..dim {
        let start = i * bucket;
        // The final bucket absorbs the remainder bytes.
        let end = if i == dim - 1 {
            sample.len()
        } else {
            start + bucket
        };
        let sum: u64 = sample[start..end].iter().map(|&b| b as u64).sum();
        vector.push(sum as f64 / (end - start) as f64);
    }

    let mean = vector.iter().sum::<f64>() / dim as f64;
    for value in &mut vector {
        *value -= mean;
    }
    Ok(vector)
}
