/// Replaces each element with the running sum of all elements up to it.
pub fn decode_delta(deltas: &[i32]) -> Vec<i32> {
    deltas
        .iter()
        .scan(0i32, |acc, &d| {
            *acc = acc.wrapping_add(d);
            Some(*acc)
        })
        .collect()
}

/// Replaces each element with its difference from the previous one.
pub fn encode_delta(values: &[i32]) -> Vec<i32> {
    let mut prev = 0i32;
    values
        .iter()
        .map(|&v| {
            let d = v.wrapping_sub(prev);
            prev = v;
            d
        })
        .collect()
}
