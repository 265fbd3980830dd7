//! Preset countdown durations offered for quick selection

/// Durations offered in edit mode, in seconds
pub const PRESET_SECONDS: [u64; 4] = [5, 30, 60, 100];

/// Milliseconds for a preset, or `None` if `seconds` is not one of them
pub fn preset_ms(seconds: u64) -> Option<u64> {
    PRESET_SECONDS
        .contains(&seconds)
        .then(|| seconds * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_presets_convert_to_ms() {
        assert_eq!(preset_ms(5), Some(5_000));
        assert_eq!(preset_ms(100), Some(100_000));
    }

    #[test]
    fn other_values_are_rejected() {
        assert_eq!(preset_ms(0), None);
        assert_eq!(preset_ms(10), None);
    }
}
