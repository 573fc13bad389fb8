//! Small helpers shared across modules.

pub mod path;

/// Format count with noun, handling pluralization
///
/// - `plural_count(0, "file")` -> `"0 files"`
/// - `plural_count(1, "file")` -> `"1 file"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "chunk"), "0 chunks");
        assert_eq!(plural_count(1, "chunk"), "1 chunk");
        assert_eq!(plural_count(5, "chunk"), "5 chunks");
    }
}
