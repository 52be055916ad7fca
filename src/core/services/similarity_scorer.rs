use strsim::normalized_levenshtein;

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, counted in chars so Khmer
/// clusters are not split at byte boundaries. Two empty strings match perfectly.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}
