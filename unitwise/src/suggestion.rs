const MAX_DISTANCE: usize = 2;
const MIN_INPUT_LENGTH: usize = 3;

/// Suggest the known name closest to a misspelled one, for "did you mean"
/// hints in diagnostics. Comparison ignores case. Ties go to the name that
/// sorts first.
pub fn did_you_mean<S: AsRef<str>>(
    candidates: impl Iterator<Item = S>,
    input: &str,
) -> Option<String> {
    if input.chars().count() < MIN_INPUT_LENGTH {
        return None;
    }
    let input = input.to_lowercase();

    candidates
        .map(|candidate| {
            let distance =
                strsim::damerau_levenshtein(&candidate.as_ref().to_lowercase(), &input);
            (candidate.as_ref().to_string(), distance)
        })
        .filter(|(_, distance)| *distance <= MAX_DISTANCE)
        .min_by(|(a, dist_a), (b, dist_b)| dist_a.cmp(dist_b).then_with(|| a.cmp(b)))
        .map(|(name, _)| name)
}
