use chrono::Utc;
use settings::{GenerationSettings, StudioConfig};
use std::collections::BTreeMap;
use tracing::info;

use crate::{
    parse_parameter_input_with_limit, MatrixAxis, MatrixError, MatrixJob, ParamValue,
    ParameterRange,
};

/// Swept axes; iteration follows the declared axis order.
pub type MatrixAxes = BTreeMap<MatrixAxis, ParameterRange>;

/// Expands matrix axes into jobs, refusing matrices above `max_jobs`.
#[derive(Debug, Clone, Copy)]
pub struct MatrixGenerator {
    pub max_jobs: usize,
}

impl Default for MatrixGenerator {
    fn default() -> Self {
        Self::from_config(&StudioConfig::default())
    }
}

impl MatrixGenerator {
    pub fn new(max_jobs: usize) -> Self {
        Self { max_jobs }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(config.max_matrix_jobs)
    }

    /// Parse an axis input; a range may span up to `max_jobs` values, since
    /// a wider one could never fit in a matrix.
    pub fn parse_input(&self, raw: &str) -> ParameterRange {
        parse_parameter_input_with_limit(raw, self.max_jobs)
    }

    /// One job per combination of axis values, in nesting order.
    ///
    /// Axes missing from `axes` take their single value from `base`. Every
    /// job runs with `random_seed` off so the matrix is reproducible.
    pub fn generate(
        &self,
        axes: &MatrixAxes,
        base: &GenerationSettings,
    ) -> Result<Vec<MatrixJob>, MatrixError> {
        let mut columns: Vec<(MatrixAxis, Vec<ParamValue>)> = Vec::new();
        for axis in MatrixAxis::ALL {
            let values = match axes.get(&axis) {
                Some(range) => range.values.clone(),
                None => vec![axis.value_of(base)],
            };
            if values.is_empty() {
                return Err(MatrixError::EmptyAxis(axis));
            }
            columns.push((axis, values));
        }

        let count = estimate_job_count(axes);
        if count > self.max_jobs {
            return Err(MatrixError::TooManyJobs {
                count,
                limit: self.max_jobs,
            });
        }

        let lengths: Vec<usize> = columns.iter().map(|(_, values)| values.len()).collect();
        let created_at = Utc::now();
        let mut jobs = Vec::with_capacity(count);

        for (index, combination) in Odometer::new(lengths).enumerate() {
            let mut parameters = base.clone();
            for ((axis, values), &pick) in columns.iter().zip(&combination) {
                axis.assign(&mut parameters, &values[pick])?;
            }
            parameters.random_seed = false;
            jobs.push(MatrixJob::new(index, parameters, created_at));
        }

        info!(jobs = jobs.len(), axes = axes.len(), "generated matrix");
        Ok(jobs)
    }
}

/// [`MatrixGenerator::generate`] with the default job limit.
pub fn generate_jobs(
    axes: &MatrixAxes,
    base: &GenerationSettings,
) -> Result<Vec<MatrixJob>, MatrixError> {
    MatrixGenerator::default().generate(axes, base)
}

/// Number of jobs `axes` would expand to; saturates instead of overflowing.
pub fn estimate_job_count(axes: &MatrixAxes) -> usize {
    axes.values()
        .fold(1usize, |acc, range| acc.saturating_mul(range.len()))
}

/// Index tuples over axes of the given lengths, last axis fastest.
struct Odometer {
    lengths: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl Odometer {
    fn new(lengths: Vec<usize>) -> Self {
        let current = if lengths.iter().any(|&len| len == 0) {
            None
        } else {
            Some(vec![0; lengths.len()])
        };
        Self { lengths, current }
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current.clone()?;
        let mut next = item.clone();
        let mut pos = next.len();
        loop {
            if pos == 0 {
                self.current = None;
                break;
            }
            pos -= 1;
            next[pos] += 1;
            if next[pos] < self.lengths[pos] {
                self.current = Some(next);
                break;
            }
            next[pos] = 0;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_parameter_input;

    fn axes(entries: &[(MatrixAxis, &str)]) -> MatrixAxes {
        entries
            .iter()
            .map(|(axis, input)| (*axis, parse_parameter_input(input)))
            .collect()
    }

    #[test]
    fn test_odometer_order() {
        let combos: Vec<_> = Odometer::new(vec![2, 3]).collect();
        assert_eq!(
            combos,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
        assert_eq!(Odometer::new(vec![]).count(), 1);
        assert_eq!(Odometer::new(vec![3, 0]).count(), 0);
    }

    #[test]
    fn test_no_axes_yields_base_job() {
        let base = GenerationSettings::default();
        let jobs = generate_jobs(&MatrixAxes::new(), &base).unwrap();
        assert_eq!(jobs.len(), 1);
        let expected = GenerationSettings {
            random_seed: false,
            ..base
        };
        assert_eq!(jobs[0].parameters, expected);
    }

    #[test]
    fn test_declared_order_beats_insertion_order() {
        let mut matrix = MatrixAxes::new();
        matrix.insert(MatrixAxis::Width, parse_parameter_input("512,768"));
        matrix.insert(MatrixAxis::Seed, parse_parameter_input("1,2"));
        let jobs = generate_jobs(&matrix, &GenerationSettings::default()).unwrap();
        let cells: Vec<_> = jobs
            .iter()
            .map(|j| (j.parameters.seed, j.parameters.width))
            .collect();
        assert_eq!(cells, vec![(1, 512), (1, 768), (2, 512), (2, 768)]);
    }

    #[test]
    fn test_empty_axis_is_rejected() {
        let err = generate_jobs(
            &axes(&[(MatrixAxis::Steps, "30-10")]),
            &GenerationSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MatrixError::EmptyAxis(MatrixAxis::Steps)));
    }

    #[test]
    fn test_job_limit() {
        let generator = MatrixGenerator::new(10);
        let err = generator
            .generate(
                &axes(&[(MatrixAxis::Seed, "1-4"), (MatrixAxis::Steps, "10-12")]),
                &GenerationSettings::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            MatrixError::TooManyJobs {
                count: 12,
                limit: 10
            }
        ));
    }

    #[test]
    fn test_raised_limit_admits_wide_range() {
        let generator = MatrixGenerator::new(50_000);
        let mut matrix = MatrixAxes::new();
        matrix.insert(MatrixAxis::Seed, generator.parse_input("1-20000"));
        let jobs = generator
            .generate(&matrix, &GenerationSettings::default())
            .unwrap();
        assert_eq!(jobs.len(), 20_000);
        assert_eq!(jobs[19_999].parameters.seed, 20_000);

        assert!(MatrixGenerator::default().parse_input("1-20000").is_empty());
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let err = generate_jobs(
            &axes(&[(MatrixAxis::Width, "512, wide")]),
            &GenerationSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MatrixError::InvalidValue {
                axis: MatrixAxis::Width,
                ..
            }
        ));
    }

    #[test]
    fn test_estimate_saturates() {
        let mut matrix = MatrixAxes::new();
        let huge = ParameterRange::list(vec![ParamValue::Int(1); 1 << 16]);
        for axis in MatrixAxis::ALL {
            matrix.insert(axis, huge.clone());
        }
        assert_eq!(estimate_job_count(&matrix), usize::MAX);
    }
}
