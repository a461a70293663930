//! Environment identification and the escaping policy hook.
//!
//! The serializer core consumes exactly one fact about its host: whether
//! string indexing is safe across the whole basic multilingual plane, which
//! decides the numeric-escape threshold (see [`crate::escape`]). That fact
//! arrives through the [`EscapePolicy`] trait, resolved once per serializer.
//!
//! How the embedder answers is its own business. [`FixedPolicy`] gives a
//! constant; [`UserAgentPolicy`] reproduces the detection the automation
//! system historically used: browser-family sniffing over the user-agent
//! string plus dotted-version comparison, with ancient Android builds the
//! one family that gets the legacy threshold.
//!
//! ## Examples
//!
//! ```rust
//! use hostjson::env::{compare_versions, detect, Browser};
//! use std::cmp::Ordering;
//!
//! let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0";
//! let info = detect(ua);
//! assert_eq!(info.browser, Browser::Firefox);
//! assert_eq!(info.version, "89.0");
//!
//! assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
//! ```

use std::cmp::Ordering;

/// Answers the one question the serializer asks about its host.
pub trait EscapePolicy {
    /// Whether numeric escaping may use the full-BMP threshold. Legacy
    /// hosts with broken wide-character indexing answer `false` and only
    /// get escapes up to `0xFF`.
    fn extended_unicode_safe(&self) -> bool;
}

/// A policy with a constant answer, for embedders that know their host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPolicy(pub bool);

impl FixedPolicy {
    /// Modern hosts: escape the full BMP.
    #[must_use]
    pub const fn extended() -> Self {
        FixedPolicy(true)
    }

    /// Legacy hosts: numeric escapes stop at `0xFF`.
    #[must_use]
    pub const fn legacy() -> Self {
        FixedPolicy(false)
    }
}

impl EscapePolicy for FixedPolicy {
    fn extended_unicode_safe(&self) -> bool {
        self.0
    }
}

/// Browser family, as far as user-agent sniffing can tell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Browser {
    Firefox,
    Chrome,
    Safari,
    Iphone,
    Ipad,
    Ipod,
    Android,
    Other,
}

/// Detected browser family and version string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserInfo {
    pub browser: Browser,
    /// Dotted version, or empty when the user-agent gave none.
    pub version: String,
}

/// Detects the browser family and version from a user-agent string.
///
/// The exclusion rules matter more than the inclusion ones: almost every
/// user-agent claims to be Safari, Chrome-on-iOS spells itself `CriOS`,
/// and Android browsers that are really Chrome, Firefox, Opera or Silk
/// must not count as the stock Android browser.
#[must_use]
pub fn detect(user_agent: &str) -> BrowserInfo {
    let has = |token: &str| user_agent.contains(token);

    let chrome = (has("Chrome") || has("CriOS")) && !has("Edge");
    let iphone = has("iPhone") && !has("iPod") && !has("iPad");
    let ios_device = iphone || has("iPad") || has("iPod");
    let android = has("Android") && !(chrome || has("Firefox") || has("Opera") || has("Silk"));
    let safari = has("Safari")
        && !(chrome || has("Coast") || has("Opera") || has("Edge") || has("Silk") || android)
        && !ios_device;

    let (browser, version) = if has("Firefox") {
        (Browser::Firefox, version_after(user_agent, "Firefox/"))
    } else if chrome {
        let prefix = if ios_device { "CriOS/" } else { "Chrome/" };
        (Browser::Chrome, version_after(user_agent, prefix))
    } else if safari {
        (Browser::Safari, version_after(user_agent, "Version/"))
    } else if ios_device {
        let browser = if iphone {
            Browser::Iphone
        } else if has("iPad") {
            Browser::Ipad
        } else {
            Browser::Ipod
        };
        (browser, ios_version(user_agent))
    } else if android {
        let version = match android_version(user_agent) {
            v if v.is_empty() => version_after(user_agent, "Version/"),
            v => v,
        };
        (Browser::Android, version)
    } else {
        (Browser::Other, String::new())
    };

    BrowserInfo { browser, version }
}

/// Dotted-digit run following `prefix`, or empty if absent.
fn version_after(user_agent: &str, prefix: &str) -> String {
    let Some(start) = user_agent.find(prefix) else {
        return String::new();
    };
    user_agent[start + prefix.len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Dotted-digit run after the `Android` token and a whitespace run of any
/// length, or empty if absent.
fn android_version(user_agent: &str) -> String {
    let Some(start) = user_agent.find("Android") else {
        return String::new();
    };
    let rest = &user_agent[start + "Android".len()..];
    let trimmed = rest.trim_start();
    // At least one whitespace character must follow the token.
    if trimmed.len() == rest.len() {
        return String::new();
    }
    trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// iOS devices report `Version/X ... Mobile/Y`; the combined version is
/// `X.Y`, build token included.
fn ios_version(user_agent: &str) -> String {
    let Some(vi) = user_agent.find("Version/") else {
        return String::new();
    };
    let rest = &user_agent[vi + "Version/".len()..];
    let version: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
    let Some(mi) = rest.find("Mobile/") else {
        return String::new();
    };
    let build: String = rest[mi + "Mobile/".len()..]
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    if version.is_empty() || build.is_empty() {
        String::new()
    } else {
        format!("{}.{}", version, build)
    }
}

/// Compares two dotted version strings.
///
/// Each dot segment is compared piecewise: leading digits numerically
/// (missing digits count as zero, so `"1.0"` equals `"1"`), then a bare
/// number outranks the same number with a trailing word (`"4.0" > "4.0b"`),
/// then the words lexically. Surrounding whitespace is ignored.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.trim().split('.').collect();
    let right: Vec<&str> = b.trim().split('.').collect();

    for i in 0..left.len().max(right.len()) {
        let mut seg_a = left.get(i).copied().unwrap_or("");
        let mut seg_b = right.get(i).copied().unwrap_or("");
        loop {
            if seg_a.is_empty() && seg_b.is_empty() {
                break;
            }
            let (num_a, word_a, rest_a) = split_segment(seg_a);
            let (num_b, word_b, rest_b) = split_segment(seg_b);
            let x: u64 = num_a.parse().unwrap_or(0);
            let y: u64 = num_b.parse().unwrap_or(0);
            let ord = x
                .cmp(&y)
                .then(word_a.is_empty().cmp(&word_b.is_empty()))
                .then_with(|| word_a.cmp(word_b));
            if ord != Ordering::Equal {
                return ord;
            }
            seg_a = rest_a;
            seg_b = rest_b;
        }
    }
    Ordering::Equal
}

/// Splits a segment into (leading digits, following non-digits, remainder).
fn split_segment(s: &str) -> (&str, &str, &str) {
    let digit_end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (num, rest) = s.split_at(digit_end);
    let word_end = rest
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (word, tail) = rest.split_at(word_end);
    (num, word, tail)
}

/// Policy derived from user-agent detection.
///
/// Only the stock Android browser below version 4 predates reliable BMP
/// string indexing; every other family gets the extended threshold.
#[derive(Clone, Debug)]
pub struct UserAgentPolicy {
    info: BrowserInfo,
    extended: bool,
}

impl UserAgentPolicy {
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        let info = detect(user_agent);
        let extended = !(info.browser == Browser::Android
            && compare_versions(&info.version, "4") == Ordering::Less);
        UserAgentPolicy { info, extended }
    }

    /// The detection result this policy was derived from.
    #[must_use]
    pub fn info(&self) -> &BrowserInfo {
        &self.info
    }
}

impl EscapePolicy for UserAgentPolicy {
    fn extended_unicode_safe(&self) -> bool {
        self.extended
    }
}
