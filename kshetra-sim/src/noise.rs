//! Pluggable noise strategies for simulation.
//!
//! Every noisy quantity in the simulator draws from its own [`NoiseModel`].
//! The default everywhere is [`NoNoise`], which keeps ticks and scans
//! deterministic. Random models share a seedable [`NoiseGenerator`].
//!
//! Any `FnMut() -> f64 + Send` closure is a noise model, so tests and
//! callers can inject their own perturbation:
//!
//! ```
//! use kshetra_sim::noise::NoiseModel;
//!
//! let mut steps = [0.5, -0.5].into_iter().cycle();
//! let mut model = move || steps.next().unwrap_or(0.0);
//! assert_eq!(model.sample(), 0.5);
//! assert_eq!(model.sample(), -0.5);
//! ```

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use serde::{Deserialize, Serialize};

/// Largest uniform half-width whose full interval is representable
pub const MAX_UNIFORM_LIMIT: f64 = f64::MAX / 2.0;

/// A random perturbation source.
pub trait NoiseModel: Send {
    /// Draw one additive perturbation.
    fn sample(&mut self) -> f64;

    /// Apply one perturbation to `value`.
    #[inline]
    fn perturb(&mut self, value: f64) -> f64 {
        value + self.sample()
    }
}

impl<F> NoiseModel for F
where
    F: FnMut() -> f64 + Send,
{
    #[inline]
    fn sample(&mut self) -> f64 {
        self()
    }
}

/// Noise generator with configurable seed for reproducibility
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Create a new noise generator
    ///
    /// If seed is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Derive an independent generator for another noise channel.
    ///
    /// Forked generators are deterministic given the parent's seed.
    pub fn fork(&mut self) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(self.rng.next_u64()),
        }
    }

    /// Gaussian noise with given standard deviation.
    ///
    /// Zero, negative or non-finite `stddev` yields zero.
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if !(stddev.is_finite() && stddev > 0.0) {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Uniform noise in [-limit, limit).
    ///
    /// Zero, negative or non-finite `limit` yields zero; limits beyond
    /// [`MAX_UNIFORM_LIMIT`] are capped so the interval width stays finite.
    #[inline]
    pub fn symmetric_uniform(&mut self, limit: f64) -> f64 {
        if !(limit.is_finite() && limit > 0.0) {
            return 0.0;
        }
        let limit = limit.min(MAX_UNIFORM_LIMIT);
        Uniform::new(-limit, limit).sample(&mut self.rng)
    }
}

/// Always zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNoise;

impl NoiseModel for NoNoise {
    #[inline]
    fn sample(&mut self) -> f64 {
        0.0
    }
}

/// Biased Gaussian noise: `bias + N(0, stddev²)`.
#[derive(Clone, Debug)]
pub struct GaussianNoise {
    bias: f64,
    stddev: f64,
    generator: NoiseGenerator,
}

impl GaussianNoise {
    /// Create a Gaussian noise source
    pub fn new(bias: f64, stddev: f64, generator: NoiseGenerator) -> Self {
        Self {
            bias,
            stddev: stddev.abs(),
            generator,
        }
    }
}

impl NoiseModel for GaussianNoise {
    #[inline]
    fn sample(&mut self) -> f64 {
        self.bias + self.generator.gaussian(self.stddev)
    }
}

/// Uniform noise in [-limit, limit).
#[derive(Clone, Debug)]
pub struct UniformNoise {
    limit: f64,
    generator: NoiseGenerator,
}

impl UniformNoise {
    /// Create a uniform noise source
    pub fn new(limit: f64, generator: NoiseGenerator) -> Self {
        Self {
            limit: limit.abs(),
            generator,
        }
    }
}

impl NoiseModel for UniformNoise {
    #[inline]
    fn sample(&mut self) -> f64 {
        self.generator.symmetric_uniform(self.limit)
    }
}

/// Serializable description of a noise model.
///
/// ```toml
/// [motion.translation_noise]
/// model = "gaussian"
/// stddev = 0.5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum NoiseSpec {
    /// No perturbation
    #[default]
    None,
    /// `bias + N(0, stddev²)`
    Gaussian {
        /// Standard deviation
        stddev: f64,
        /// Constant offset
        #[serde(default)]
        bias: f64,
    },
    /// Uniform in [-limit, limit)
    Uniform {
        /// Half-width of the interval
        limit: f64,
    },
}

impl NoiseSpec {
    /// Never perturbs
    pub fn is_none(&self) -> bool {
        matches!(self, NoiseSpec::None)
    }

    /// Check parameters: finite, non-negative, uniform limit at most
    /// [`MAX_UNIFORM_LIMIT`].
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            NoiseSpec::None => Ok(()),
            NoiseSpec::Gaussian { stddev, bias } => {
                if !(stddev.is_finite() && stddev >= 0.0) {
                    return Err(format!(
                        "gaussian stddev must be finite and non-negative, got {}",
                        stddev
                    ));
                }
                if !bias.is_finite() {
                    return Err(format!("gaussian bias must be finite, got {}", bias));
                }
                Ok(())
            }
            NoiseSpec::Uniform { limit } => {
                if !(limit.is_finite() && (0.0..=MAX_UNIFORM_LIMIT).contains(&limit)) {
                    return Err(format!(
                        "uniform limit must be in [0, {:e}], got {}",
                        MAX_UNIFORM_LIMIT, limit
                    ));
                }
                Ok(())
            }
        }
    }

    /// Build a boxed model, forking `generator` for random variants.
    pub fn build(&self, generator: &mut NoiseGenerator) -> Box<dyn NoiseModel> {
        match *self {
            NoiseSpec::None => Box::new(NoNoise),
            NoiseSpec::Gaussian { stddev, bias } => {
                Box::new(GaussianNoise::new(bias, stddev, generator.fork()))
            }
            NoiseSpec::Uniform { limit } => Box::new(UniformNoise::new(limit, generator.fork())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut noise1 = NoiseGenerator::new(42);
        let mut noise2 = NoiseGenerator::new(42);

        for _ in 0..100 {
            assert_eq!(noise1.gaussian(1.0), noise2.gaussian(1.0));
        }
    }

    #[test]
    fn test_zero_stddev() {
        let mut noise = NoiseGenerator::new(42);
        for _ in 0..10 {
            assert_eq!(noise.gaussian(0.0), 0.0);
            assert_eq!(noise.symmetric_uniform(0.0), 0.0);
        }
    }

    #[test]
    fn test_degenerate_parameters_yield_zero() {
        let mut noise = NoiseGenerator::new(5);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
            assert_eq!(noise.gaussian(bad), 0.0);
            assert_eq!(noise.symmetric_uniform(bad), 0.0);
        }
    }

    #[test]
    fn test_huge_uniform_limit_is_finite() {
        let mut noise = NoiseGenerator::new(5);
        for _ in 0..100 {
            assert!(noise.symmetric_uniform(1e308).is_finite());
            assert!(noise.symmetric_uniform(f64::MAX).is_finite());
        }
    }

    #[test]
    fn test_noise_spec_validation() {
        assert!(NoiseSpec::None.validate().is_ok());
        let gaussian = |stddev, bias| NoiseSpec::Gaussian { stddev, bias };
        assert!(gaussian(0.5, -1.0).validate().is_ok());
        assert!(NoiseSpec::Uniform { limit: 2.0 }.validate().is_ok());

        assert!(gaussian(f64::INFINITY, 0.0).validate().is_err());
        assert!(gaussian(-0.1, 0.0).validate().is_err());
        assert!(gaussian(0.1, f64::NAN).validate().is_err());
        assert!(NoiseSpec::Uniform { limit: f64::NAN }.validate().is_err());
        assert!(NoiseSpec::Uniform { limit: 1e308 }.validate().is_err());
        assert!(NoiseSpec::Uniform { limit: -1.0 }.validate().is_err());
    }

    #[test]
    fn test_uniform_bounds() {
        let mut noise = UniformNoise::new(5.0, NoiseGenerator::new(7));
        for _ in 0..10_000 {
            let v = noise.sample();
            assert!((-5.0..5.0).contains(&v));
        }
    }

    #[test]
    fn test_gaussian_mean_and_bias() {
        let mut noise = GaussianNoise::new(2.0, 0.5, NoiseGenerator::new(11));
        let trials = 20_000;
        let mean = (0..trials).map(|_| noise.sample()).sum::<f64>() / trials as f64;
        assert!((mean - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_fork_is_deterministic() {
        let mut a = NoiseGenerator::new(3);
        let mut b = NoiseGenerator::new(3);
        let mut fa = a.fork();
        let mut fb = b.fork();
        for _ in 0..20 {
            assert_eq!(fa.gaussian(1.0), fb.gaussian(1.0));
        }
    }

    #[test]
    fn test_closure_model() {
        let mut calls = 0;
        let mut model = move || {
            calls += 1;
            calls as f64
        };
        assert_eq!(model.perturb(10.0), 11.0);
        assert_eq!(model.perturb(10.0), 12.0);
    }

    #[test]
    fn test_noise_spec_build() {
        let mut generator = NoiseGenerator::new(1);
        assert_eq!(NoiseSpec::None.build(&mut generator).sample(), 0.0);
        assert!(NoiseSpec::default().is_none());

        let mut uniform = NoiseSpec::Uniform { limit: 0.1 }.build(&mut generator);
        assert!(uniform.sample().abs() <= 0.1);
    }

    #[test]
    fn test_noise_spec_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            noise: NoiseSpec,
        }

        let w: Wrapper = toml::from_str(
            r#"
[noise]
model = "gaussian"
stddev = 0.25
"#,
        )
        .unwrap();
        assert_eq!(
            w.noise,
            NoiseSpec::Gaussian {
                stddev: 0.25,
                bias: 0.0
            }
        );
    }
}
