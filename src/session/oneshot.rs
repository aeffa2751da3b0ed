use std::borrow::Borrow;

use super::Measure;
use crate::config::Opts;
use crate::error::{Error, Result};
use crate::event::Event;

/// Counts the events while running `work` once.
///
/// Returns what `work` returned together with one count per event, in
/// order. The counters are released on every path out of this function,
/// including a panic in `work`.
///
/// # Examples
///
/// ```rust
/// use std::hint::black_box;
///
/// use perf_measure::event::Hardware;
///
/// # if !perf_measure::is_supported() { return; }
/// let sum = |n: u64| (0..n).map(black_box).sum::<u64>();
///
/// let (_, small) = perf_measure::measure([Hardware::Instructions], || sum(1_000_000)).unwrap();
/// let (_, large) = perf_measure::measure([Hardware::Instructions], || sum(10_000_000)).unwrap();
///
/// let ratio = large[0] as f64 / small[0] as f64;
/// assert!(7.0 < ratio && ratio < 15.0);
/// ```
pub fn measure<I, F, R>(events: I, work: F) -> Result<(R, Vec<u64>)>
where
    I: IntoIterator,
    I::Item: Into<Event>,
    F: FnOnce() -> R,
{
    measure_with(events, Opts::default(), work)
}

/// Same as [`measure`], with explicit [`Opts`].
pub fn measure_with<I, F, R>(events: I, opts: impl Borrow<Opts>, work: F) -> Result<(R, Vec<u64>)>
where
    I: IntoIterator,
    I::Item: Into<Event>,
    F: FnOnce() -> R,
{
    try_measure_with(events, opts, || Ok::<_, Error>(work()))
}

/// Counts the events while running a fallible `work` once.
///
/// An error returned by `work` is passed through unchanged, after the
/// counters have been released. Errors of the counters themselves are
/// converted into `E`.
///
/// ```rust
/// use perf_measure::event::Hardware;
/// use perf_measure::try_measure;
///
/// #[derive(Debug)]
/// enum AppError {
///     Perf(perf_measure::Error),
///     Parse(std::num::ParseIntError),
/// }
///
/// impl From<perf_measure::Error> for AppError {
///     fn from(e: perf_measure::Error) -> Self {
///         AppError::Perf(e)
///     }
/// }
///
/// let result = try_measure([Hardware::Instructions], || {
///     "not a number".parse::<u64>().map_err(AppError::Parse)
/// });
/// // Without hardware counters the session itself fails first.
/// # if !perf_measure::is_supported() { return; }
/// assert!(matches!(result, Err(AppError::Parse(_))));
/// ```
pub fn try_measure<I, F, T, E>(events: I, work: F) -> std::result::Result<(T, Vec<u64>), E>
where
    I: IntoIterator,
    I::Item: Into<Event>,
    F: FnOnce() -> std::result::Result<T, E>,
    E: From<Error>,
{
    try_measure_with(events, Opts::default(), work)
}

/// Same as [`try_measure`], with explicit [`Opts`].
pub fn try_measure_with<I, F, T, E>(
    events: I,
    opts: impl Borrow<Opts>,
    work: F,
) -> std::result::Result<(T, Vec<u64>), E>
where
    I: IntoIterator,
    I::Item: Into<Event>,
    F: FnOnce() -> std::result::Result<T, E>,
    E: From<Error>,
{
    let mut session = Measure::with_opts(events, opts)?;
    session.enable()?;

    let output = match work() {
        Ok(output) => output,
        Err(e) => {
            if let Err(release) = session.release() {
                log::warn!("failed to release session after failed work: {}", release);
            }
            return Err(e);
        }
    };

    let counts = session.read()?;
    session.disable()?;
    session.release()?;

    Ok((output, counts))
}
