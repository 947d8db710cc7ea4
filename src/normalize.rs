use serde::{Deserialize, Serialize};

/// Pairwise passes applied by legacy normalization.
pub const LEGACY_PASSES: u32 = 6;

fn default_passes() -> u32 {
    LEGACY_PASSES
}

/// How runs of spaces are squeezed before lines are tokenized.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Normalization {
    /// Replace every pair of adjacent spaces by one space, `passes` times.
    /// A run of n spaces shrinks to ceil(n/2) per pass, so six passes only
    /// fully collapse runs of up to 64 spaces.
    Legacy {
        #[serde(default = "default_passes")]
        passes: u32,
    },
    /// Collapse every run of spaces and tabs to one space in a single scan.
    #[default]
    Collapse,
}

impl Normalization {
    pub fn legacy() -> Self {
        Normalization::Legacy { passes: LEGACY_PASSES }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Normalization::Legacy { passes } => collapse_spaces_fixed(text, *passes),
            Normalization::Collapse => collapse_spaces(text),
        }
    }
}

pub fn collapse_spaces_fixed(text: &str, passes: u32) -> String {
    let mut out = text.to_string();
    for _ in 0..passes {
        if !out.contains("  ") {
            break;
        }
        out = out.replace("  ", " ");
    }
    out
}

/// Emit exactly one space per maximal run of spaces/tabs. Line breaks are
/// left alone.
pub fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaces(n: usize) -> String {
        " ".repeat(n)
    }

    #[test]
    fn test_fixed_pass_halves_runs() {
        assert_eq!(collapse_spaces_fixed("a     b", 1), "a   b");
        assert_eq!(collapse_spaces_fixed("a     b", 6), "a b");
        let sixty_four = format!("a{}b", spaces(64));
        assert_eq!(collapse_spaces_fixed(&sixty_four, LEGACY_PASSES), "a b");
    }

    #[test]
    fn test_fixed_pass_leaves_long_runs() {
        let input = format!("01{}02 \n", spaces(128));
        assert_eq!(collapse_spaces_fixed(&input, LEGACY_PASSES), "01  02 \n");
        assert_eq!(collapse_spaces(&input), "01 02 \n");
    }

    #[test]
    fn test_collapse_keeps_lines() {
        assert_eq!(collapse_spaces("00  01\t\t x\n\n02   03 y"), "00 01 x\n\n02 03 y");
    }

    #[test]
    fn test_idempotent() {
        let input = format!("1f{}2a   FF  \n  00{}01 x", spaces(40), spaces(64));
        for norm in [Normalization::legacy(), Normalization::Collapse] {
            let once = norm.apply(&input);
            assert_eq!(norm.apply(&once), once);
        }
    }

    #[test]
    fn test_serde_modes() {
        let legacy: Normalization = serde_json::from_str(r#"{"mode": "legacy"}"#).unwrap();
        assert_eq!(legacy, Normalization::legacy());
        let legacy: Normalization = serde_json::from_str(r#"{"mode": "legacy", "passes": 8}"#).unwrap();
        assert_eq!(legacy, Normalization::Legacy { passes: 8 });
        let collapse: Normalization = serde_json::from_str(r#"{"mode": "collapse"}"#).unwrap();
        assert_eq!(collapse, Normalization::Collapse);
    }
}
