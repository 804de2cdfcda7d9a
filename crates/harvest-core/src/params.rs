use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_TOTAL_MINUTES: f64 = 5.0;
pub const DEFAULT_TARGET_POSTS: usize = 1000;
pub const DEFAULT_BATCH_MINUTES: f64 = 1.0;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_SCROLL_PX: u32 = 2000;

/// Settings for one collection run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionParams {
    /// Overall time budget for the run.
    pub total_time: Duration,
    /// Stop once this many distinct posts have been collected.
    pub target_posts: usize,
    /// Flush the active batch at least this often.
    pub batch_time: Duration,
    /// Flush the active batch once it holds this many posts.
    pub batch_size: usize,
    /// Pixels to advance the feed per cycle.
    pub scroll_distance: u32,
}

impl Default for CollectionParams {
    fn default() -> Self {
        Self {
            total_time: Duration::from_secs_f64(DEFAULT_TOTAL_MINUTES * 60.0),
            target_posts: DEFAULT_TARGET_POSTS,
            batch_time: Duration::from_secs_f64(DEFAULT_BATCH_MINUTES * 60.0),
            batch_size: DEFAULT_BATCH_SIZE,
            scroll_distance: DEFAULT_SCROLL_PX,
        }
    }
}

/// Operator-facing parameter values, as typed. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    pub total_minutes: Option<f64>,
    pub target_posts: Option<f64>,
    pub batch_minutes: Option<f64>,
    pub batch_size: Option<f64>,
    pub scroll_px: Option<f64>,
}

impl RawParams {
    /// Validate and convert. Missing values take their defaults; a present
    /// value that is zero, negative, NaN or infinite is rejected.
    pub fn build(&self) -> Result<CollectionParams, AppError> {
        let total = positive("total collection time", self.total_minutes, DEFAULT_TOTAL_MINUTES)?;
        let target = positive("target post count", self.target_posts, DEFAULT_TARGET_POSTS as f64)?;
        let batch = positive("batch time", self.batch_minutes, DEFAULT_BATCH_MINUTES)?;
        let size = positive("batch size", self.batch_size, DEFAULT_BATCH_SIZE as f64)?;
        let scroll = positive("scroll distance", self.scroll_px, DEFAULT_SCROLL_PX as f64)?;

        Ok(CollectionParams {
            total_time: minutes("total collection time", total)?,
            target_posts: whole("target post count", target)?,
            batch_time: minutes("batch time", batch)?,
            batch_size: whole("batch size", size)?,
            scroll_distance: pixels("scroll distance", scroll)?,
        })
    }
}

/// Check a single operator value. Shared by flag and prompt front ends.
pub fn validate_positive(name: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AppError::ConfigError(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn positive(name: &str, value: Option<f64>, default: f64) -> Result<f64, AppError> {
    match value {
        None => Ok(default),
        Some(v) => validate_positive(name, v),
    }
}

/// A positive whole number that fits a `usize`.
pub fn whole(name: &str, value: f64) -> Result<usize, AppError> {
    let value = validate_positive(name, value)?;
    if value.fract() != 0.0 {
        return Err(AppError::ConfigError(format!(
            "{name} must be a whole number, got {value}"
        )));
    }
    if value >= usize::MAX as f64 {
        return Err(AppError::ConfigError(format!("{name} is too large")));
    }
    Ok(value as usize)
}

/// A positive whole number of pixels.
pub fn pixels(name: &str, value: f64) -> Result<u32, AppError> {
    whole(name, value)?
        .try_into()
        .map_err(|_| AppError::ConfigError(format!("{name} is too large")))
}

/// A positive number of minutes that fits a `Duration`.
pub fn minutes(name: &str, value: f64) -> Result<Duration, AppError> {
    let value = validate_positive(name, value)?;
    Duration::try_from_secs_f64(value * 60.0)
        .map_err(|_| AppError::ConfigError(format!("{name} is too large")))
}

/// Where collection parameters come from (flags, prompts, a form...).
///
/// `Ok(None)` means the operator cancelled.
pub trait ParamsSource {
    fn acquire(&mut self) -> Result<Option<CollectionParams>, AppError>;
}

/// A source that always yields the same, already-built parameters.
#[derive(Debug, Clone)]
pub struct FixedParams(pub CollectionParams);

impl ParamsSource for FixedParams {
    fn acquire(&mut self) -> Result<Option<CollectionParams>, AppError> {
        Ok(Some(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let params = RawParams::default().build().unwrap();
        assert_eq!(params, CollectionParams::default());
        assert_eq!(params.total_time, Duration::from_secs(300));
        assert_eq!(params.batch_time, Duration::from_secs(60));
        assert_eq!(params.target_posts, 1000);
        assert_eq!(params.batch_size, 100);
        assert_eq!(params.scroll_distance, 2000);
    }

    #[test]
    fn fractional_minutes_are_allowed() {
        let params = RawParams {
            total_minutes: Some(0.5),
            batch_minutes: Some(0.25),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(params.total_time, Duration::from_secs(30));
        assert_eq!(params.batch_time, Duration::from_secs(15));
    }

    #[test]
    fn rejects_zero_negative_and_nan() {
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let raw = RawParams {
                batch_size: Some(bad),
                ..Default::default()
            };
            let err = raw.build().unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)), "{bad} accepted");
        }
    }

    #[test]
    fn rejects_fractional_counts() {
        let raw = RawParams {
            target_posts: Some(2.5),
            ..Default::default()
        };
        assert!(raw.build().unwrap_err().to_string().contains("whole number"));
    }

    #[test]
    fn rejects_overflowing_minutes() {
        for raw in [
            RawParams {
                total_minutes: Some(1e300),
                ..Default::default()
            },
            RawParams {
                batch_minutes: Some(f64::MAX),
                ..Default::default()
            },
        ] {
            let err = raw.build().unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)));
            assert!(err.to_string().contains("too large"));
        }
    }

    #[test]
    fn rejects_counts_out_of_range() {
        let raw = RawParams {
            target_posts: Some(1e300),
            ..Default::default()
        };
        assert!(raw.build().unwrap_err().to_string().contains("too large"));

        let raw = RawParams {
            scroll_px: Some(5_000_000_000.0),
            ..Default::default()
        };
        assert!(raw.build().unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn fixed_params_always_acquire() {
        let mut src = FixedParams(CollectionParams::default());
        assert_eq!(src.acquire().unwrap(), Some(CollectionParams::default()));
    }
}
