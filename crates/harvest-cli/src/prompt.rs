use std::io::{BufRead, Write};

use harvest_core::params::{
    DEFAULT_BATCH_MINUTES, DEFAULT_BATCH_SIZE, DEFAULT_SCROLL_PX, DEFAULT_TARGET_POSTS,
    DEFAULT_TOTAL_MINUTES, minutes, pixels, whole,
};
use harvest_core::{AppError, CollectionParams, ParamsSource, RawParams};

/// Checks one answer with the same rules `RawParams::build` applies.
type Check = fn(&str, f64) -> Result<(), AppError>;

/// Blocking terminal prompts for the collection parameters.
///
/// Blank input takes the default, invalid input asks again, and `q` or
/// end of input cancels.
pub struct PromptParams<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptParams<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// `Ok(None)` on cancel, `Ok(Some(None))` for blank input.
    fn ask(
        &mut self,
        label: &str,
        default: f64,
        check: Check,
    ) -> Result<Option<Option<f64>>, AppError> {
        loop {
            write!(self.output, "{label} [{default}]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            if line.is_empty() {
                return Ok(Some(None));
            }

            match line.parse::<f64>() {
                Ok(v) => match check(label, v) {
                    Ok(()) => return Ok(Some(Some(v))),
                    Err(e) => writeln!(self.output, "{e}")?,
                },
                Err(_) => writeln!(
                    self.output,
                    "Please enter a positive number, leave blank for the default, or q to cancel"
                )?,
            }
        }
    }
}

impl<R: BufRead, W: Write> ParamsSource for PromptParams<R, W> {
    fn acquire(&mut self) -> Result<Option<CollectionParams>, AppError> {
        let as_minutes: Check = |n, v| minutes(n, v).map(drop);
        let as_count: Check = |n, v| whole(n, v).map(drop);
        let as_pixels: Check = |n, v| pixels(n, v).map(drop);
        let questions = [
            ("Total collection time (minutes)", DEFAULT_TOTAL_MINUTES, as_minutes),
            ("Target post count", DEFAULT_TARGET_POSTS as f64, as_count),
            ("Batch time (minutes)", DEFAULT_BATCH_MINUTES, as_minutes),
            ("Batch size", DEFAULT_BATCH_SIZE as f64, as_count),
            ("Scroll distance (pixels)", DEFAULT_SCROLL_PX as f64, as_pixels),
        ];

        let mut answers = Vec::with_capacity(questions.len());
        for (label, default, check) in questions {
            match self.ask(label, default, check)? {
                Some(answer) => answers.push(answer),
                None => {
                    writeln!(self.output, "Collection cancelled")?;
                    return Ok(None);
                }
            }
        }

        RawParams {
            total_minutes: answers[0],
            target_posts: answers[1],
            batch_minutes: answers[2],
            batch_size: answers[3],
            scroll_px: answers[4],
        }
        .build()
        .map(Some)
    }
}
