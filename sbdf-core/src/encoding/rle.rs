//! Run-length packing and expansion.
//!
//! Runs are capped at 256 values; each occurrence byte stores `run - 1`. The
//! packer closes a run the moment it reaches 256, so 257 equal values become
//! runs of 256 and 1 — peers depend on this exact split.

/// Packs `items` into `(occurrences, distinct_values)` using the supplied
/// equality.
pub(crate) fn pack_runs<T: Clone>(
    items: &[T],
    eq: impl Fn(&T, &T) -> bool,
) -> (Vec<u8>, Vec<T>) {
    let mut occurrences = Vec::new();
    let mut values = Vec::new();

    let Some(first) = items.first() else {
        return (occurrences, values);
    };

    let mut prev = first;
    let mut run: u32 = 1;

    for current in &items[1..] {
        if !eq(current, prev) || run == 256 {
            values.push(prev.clone());
            occurrences.push((run - 1) as u8);
            run = 1;
            prev = current;
        } else {
            run += 1;
        }
    }

    values.push(prev.clone());
    occurrences.push((run - 1) as u8);

    (occurrences, values)
}

/// Expands `(occurrences, values)` back into the full sequence. Each
/// occurrence byte contributes `occurrence + 1` copies.
pub(crate) fn unpack_runs<T: Clone>(count: usize, occurrences: &[u8], values: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(count);
    for (occurrence, value) in occurrences.iter().zip(values) {
        for _ in 0..=(*occurrence as usize) {
            out.push(value.clone());
        }
    }
    out
}
