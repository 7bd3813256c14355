use crate::error::{MlError, MlResult};
use crate::stat::Instance;

/// The largest label the histogram accepts.
const MAX_LABEL: f64 = 1023.0;

/// Weighted feature statistics and label histogram over a set of instances.
///
/// Partitions are summarized independently and then merged.
#[derive(Debug, Clone, Default)]
pub(crate) struct Summarizer {
    num_features: Option<usize>,
    count: u64,
    weight_sum: f64,
    weight_square_sum: f64,
    weighted_sum: Vec<f64>,
    weighted_square_sum: Vec<f64>,
    histogram: Vec<f64>,
}

impl Summarizer {
    pub fn add(&mut self, instance: &Instance) -> MlResult<()> {
        let label = instance.label;
        if !label.is_finite() || label < 0.0 || label.fract() != 0.0 || label > MAX_LABEL {
            return Err(MlError::invalid(format!(
                "labels must be integers in [0, {MAX_LABEL}] but got {label:?}"
            )));
        }
        let n = self.check_num_features(instance.features.len())?;
        if instance.weight == 0.0 {
            return Ok(());
        }
        let w = instance.weight;
        self.count += 1;
        self.weight_sum += w;
        self.weight_square_sum += w * w;
        for j in 0..n {
            let x = instance.features[j];
            self.weighted_sum[j] += w * x;
            self.weighted_square_sum[j] += w * x * x;
        }
        let class = label as usize;
        if self.histogram.len() <= class {
            self.histogram.resize(class + 1, 0.0);
        }
        self.histogram[class] += w;
        Ok(())
    }

    fn check_num_features(&mut self, n: usize) -> MlResult<usize> {
        match self.num_features {
            Some(expected) if expected != n => Err(MlError::invalid(format!(
                "feature dimension mismatch: expected {expected} but got {n}"
            ))),
            Some(_) => Ok(n),
            None => {
                self.num_features = Some(n);
                self.weighted_sum = vec![0.0; n];
                self.weighted_square_sum = vec![0.0; n];
                Ok(n)
            }
        }
    }

    pub fn merge(mut self, other: Summarizer) -> MlResult<Summarizer> {
        let Some(n) = other.num_features else {
            return Ok(self);
        };
        self.check_num_features(n)?;
        self.count += other.count;
        self.weight_sum += other.weight_sum;
        self.weight_square_sum += other.weight_square_sum;
        for j in 0..n {
            self.weighted_sum[j] += other.weighted_sum[j];
            self.weighted_square_sum[j] += other.weighted_square_sum[j];
        }
        if self.histogram.len() < other.histogram.len() {
            self.histogram.resize(other.histogram.len(), 0.0);
        }
        for (a, b) in self.histogram.iter_mut().zip(other.histogram) {
            *a += b;
        }
        Ok(self)
    }

    pub fn num_features(&self) -> usize {
        self.num_features.unwrap_or(0)
    }

    /// The number of instances with non-zero weight.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// The weighted count of each label value.
    pub fn histogram(&self) -> &[f64] {
        &self.histogram
    }

    pub fn mean(&self) -> Vec<f64> {
        if self.weight_sum == 0.0 {
            return vec![0.0; self.num_features()];
        }
        self.weighted_sum
            .iter()
            .map(|s| s / self.weight_sum)
            .collect()
    }

    /// The unbiased weighted variance of each feature.
    pub fn variance(&self) -> Vec<f64> {
        let denominator = self.weight_sum - self.weight_square_sum / self.weight_sum;
        if self.weight_sum == 0.0 || denominator <= 0.0 {
            return vec![0.0; self.num_features()];
        }
        self.weighted_sum
            .iter()
            .zip(self.weighted_square_sum.iter())
            .map(|(s, sq)| ((sq - s * s / self.weight_sum) / denominator).max(0.0))
            .collect()
    }

    pub fn std(&self) -> Vec<f64> {
        self.variance().into_iter().map(f64::sqrt).collect()
    }
}
