use crate::error::{Error, Result};

/// `vec![value; len]` that reports allocation failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T, name: &'static str) -> Result<Vec<T>> {
    let mut v = try_with_capacity(len, name)?;
    v.resize(len, value);
    Ok(v)
}

/// Empty vector with room for exactly `len` items, or `Error::Setup`.
pub(crate) fn try_with_capacity<T>(len: usize, name: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| Error::setup(name, format!("cannot allocate {len} entries: {e}")))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_filled() {
        assert_eq!(try_filled(3, 7u8, "n").unwrap(), vec![7, 7, 7]);
        assert!(try_filled::<u8>(0, 1, "n").unwrap().is_empty());
    }

    #[test]
    fn test_capacity_overflow_is_an_error() {
        assert!(matches!(
            try_with_capacity::<u64>(usize::MAX, "n_frames"),
            Err(Error::Setup { name: "n_frames", .. })
        ));
    }
}
