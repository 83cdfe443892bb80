/// Compute the Euclidean distance `sqrt(sum((a_i - b_i)^2))` between two vectors.
///
/// Uses f64 intermediate precision, so a candidate at exactly the policy
/// threshold from the query reports exactly that threshold.
/// Returns `f32::INFINITY` for dimension mismatches.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    let mut sum: f64 = 0.0;
    for (&ai, &bi) in a.iter().zip(b.iter()) {
        let d = ai as f64 - bi as f64;
        sum += d * d;
    }
    sum.sqrt() as f32
}
