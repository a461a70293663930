//! JSON string escaping.
//!
//! Two tiers: a fixed table mapping the handful of characters JSON gives
//! short escapes (plus vertical tab, which only has a numeric form), and a
//! process-wide cache of computed `\uXXXX` forms, populated lazily the
//! first time a given code unit needs one. The cache is the only shared
//! state in the crate; values are deterministic per key, so racing writers
//! are harmless.
//!
//! Which code units need the numeric form depends on the host: engines with
//! working BMP string indexing escape everything in `0x7F..=0xFFFF`, while
//! legacy engines only handle `0x7F..=0xFF` and pass higher units through
//! literally. That single boolean comes from the environment policy
//! ([`crate::env::EscapePolicy`]), resolved once per serializer, never per
//! character.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Computed `\uXXXX` escapes, keyed by UTF-16 code unit.
static COMPUTED: Lazy<RwLock<HashMap<u16, String>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Short escapes for the fixed special characters.
fn fixed_escape(ch: char) -> Option<&'static str> {
    Some(match ch {
        '"' => "\\\"",
        '\\' => "\\\\",
        '/' => "\\/",
        '\u{0008}' => "\\b",
        '\u{000C}' => "\\f",
        '\n' => "\\n",
        '\r' => "\\r",
        '\t' => "\\t",
        // JSON has no \v; vertical tab always takes the numeric form.
        '\u{000B}' => "\\u000b",
        _ => return None,
    })
}

/// Appends the cached `\uXXXX` form of a code unit, computing and caching
/// it on first encounter.
fn push_computed(out: &mut String, unit: u16) {
    {
        let cache = COMPUTED.read().unwrap_or_else(|e| e.into_inner());
        if let Some(esc) = cache.get(&unit) {
            out.push_str(esc);
            return;
        }
    }
    let esc = format!("\\u{:04x}", unit);
    out.push_str(&esc);
    // Last writer wins on a race; the value is the same either way.
    COMPUTED
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(unit, esc);
}

/// Appends the quoted, escaped JSON form of `s` to `out`.
pub(crate) fn escape_into(out: &mut String, s: &str, extended_unicode_safe: bool) {
    let threshold: u32 = if extended_unicode_safe { 0xFFFF } else { 0xFF };
    out.push('"');
    for ch in s.chars() {
        if let Some(esc) = fixed_escape(ch) {
            out.push_str(esc);
            continue;
        }
        let cp = ch as u32;
        if cp > 0xFFFF {
            if extended_unicode_safe {
                // Supplementary plane: escape both surrogate code units.
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    push_computed(out, *unit);
                }
            } else {
                out.push(ch);
            }
        } else if cp < 0x20 || (0x7F..=threshold).contains(&cp) {
            push_computed(out, cp as u16);
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(s: &str, extended: bool) -> String {
        let mut out = String::new();
        escape_into(&mut out, s, extended);
        out
    }

    #[test]
    fn test_plain_ascii_passes_through() {
        assert_eq!(escaped("hello world", true), "\"hello world\"");
    }

    #[test]
    fn test_fixed_table() {
        assert_eq!(
            escaped("a\"b\\c/d\u{8}e\u{c}f\ng\rh\ti\u{b}j", true),
            "\"a\\\"b\\\\c\\/d\\be\\ff\\ng\\rh\\ti\\u000bj\""
        );
    }

    #[test]
    fn test_control_characters_use_numeric_form() {
        assert_eq!(escaped("\u{1}\u{1f}", true), "\"\\u0001\\u001f\"");
        assert_eq!(escaped("\u{7f}", true), "\"\\u007f\"");
    }

    #[test]
    fn test_extended_policy_escapes_the_whole_bmp() {
        assert_eq!(escaped("\u{e9}", true), "\"\\u00e9\"");
        assert_eq!(escaped("\u{4e2d}", true), "\"\\u4e2d\"");
    }

    #[test]
    fn test_legacy_policy_stops_at_0xff() {
        assert_eq!(escaped("\u{e9}", false), "\"\\u00e9\"");
        // Above 0xFF the legacy host passes units through untouched.
        assert_eq!(escaped("\u{4e2d}", false), "\"\u{4e2d}\"");
    }

    #[test]
    fn test_supplementary_plane_escapes_as_surrogate_pair() {
        assert_eq!(escaped("\u{1f600}", true), "\"\\ud83d\\ude00\"");
        assert_eq!(escaped("\u{1f600}", false), "\"\u{1f600}\"");
    }

    #[test]
    fn test_cache_population_is_race_safe() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        // All threads race to populate the same uncached code units; every
        // one of them must still produce the same output.
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    escaped("\u{2603}\u{2764}\u{5}\u{9f8d}", true)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                "\"\\u2603\\u2764\\u0005\\u9f8d\""
            );
        }
    }

    #[test]
    fn test_cache_is_idempotent() {
        let first = escaped("\u{1}\u{2}\u{3}", true);
        let second = escaped("\u{3}\u{2}\u{1}", true);
        let third = escaped("\u{1}\u{2}\u{3}", true);
        assert_eq!(first, third);
        assert_eq!(second, "\"\\u0003\\u0002\\u0001\"");
    }
}
