//! One handler per query kind.
//!
//! Handlers return `Err` for anything that should fail the query (missing
//! data, missing required columns, failed identification). Numeric
//! degeneracies are recovered locally with zero defaults.

pub(crate) mod anomaly;
pub(crate) mod counterfactual;
pub(crate) mod effect;
pub(crate) mod intervention;
pub(crate) mod shift;

/// Values at positions where `mask` is true.
pub(crate) fn masked(values: &[f64], mask: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(v, keep)| keep.then_some(*v))
        .collect()
}

/// Key with the largest `|score|`; the first one wins ties.
pub(crate) fn arg_max_abs<'a, T>(
    entries: impl IntoIterator<Item = (&'a String, &'a T)>,
    score: impl Fn(&T) -> f64,
) -> Option<&'a str>
where
    T: 'a,
{
    let mut best: Option<(&str, f64)> = None;
    for (name, entry) in entries {
        let s = score(entry).abs();
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((name.as_str(), s));
        }
    }
    best.map(|(name, _)| name)
}
