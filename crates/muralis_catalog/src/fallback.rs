// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

/// Opt-in degradation of failed fetches to neutral values.
///
/// Catalog operations surface failures as errors so callers can tell "no
/// data" from "fetch failed". Screens that want the classic behavior — a
/// failed fetch renders exactly like an empty one — call
/// [`or_empty`](Self::or_empty) at the call site, which logs the failure
/// and yields the type's neutral value (an empty list, `None`, zero).
///
/// # Examples
///
/// ```
/// use muralis_catalog::FallbackExt;
///
/// let degraded: Vec<u32> = Err::<Vec<u32>, &str>("boom").or_empty();
/// assert!(degraded.is_empty());
/// ```
pub trait FallbackExt {
    /// The value produced after degradation.
    type Value;

    /// Unwraps a success, or logs the failure and returns the neutral
    /// value.
    fn or_empty(self) -> Self::Value;
}

impl<T: Default, E: Display> FallbackExt for Result<T, E> {
    type Value = T;

    fn or_empty(self) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "degrading failed fetch to an empty result");
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        let value: Result<Vec<u32>, &str> = Ok(vec![1, 2]);
        assert_eq!(value.or_empty(), vec![1, 2]);
    }

    #[test]
    fn failure_becomes_the_neutral_value() {
        assert_eq!(Err::<Option<u32>, &str>("boom").or_empty(), None);
        assert_eq!(Err::<u64, &str>("boom").or_empty(), 0);
    }
}
