//! Device fingerprint probe.
//!
//! Derives a best-effort description of the calling environment from a
//! user-agent-like string plus locale and time-zone signals. The probe
//! itself is pure; [`Environment::from_process`] is the only place that
//! reads ambient state.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Platform tag reported for every probe.
pub const PLATFORM: &str = "web";

pub const DEFAULT_LOCALE: &str = "en-US";
pub const DEFAULT_TIMEZONE: &str = "UTC";

const UNKNOWN: &str = "Unknown";

// Patterns are hard-coded and known-valid.
macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| match Regex::new($pattern) {
            Ok(re) => re,
            Err(_) => unreachable!("static regex pattern"),
        });
    };
}

static_regex!(WINDOWS_RE, r"Windows NT (\d+(?:\.\d+)*)");
static_regex!(MACOS_RE, r"Mac OS X (\d+(?:[._]\d+)*)");
static_regex!(ANDROID_RE, r"Android (\d+(?:\.\d+)*)");
static_regex!(IOS_RE, r"(?:iPhone|iPad|iPod).*? OS (\d+(?:_\d+)*)");

static_regex!(EDGE_RE, r"Edg(?:e|A|iOS)?/(\d+(?:\.\d+)*)");
static_regex!(OPERA_RE, r"OPR/(\d+(?:\.\d+)*)");
static_regex!(SAMSUNG_RE, r"SamsungBrowser/(\d+(?:\.\d+)*)");
static_regex!(CHROME_RE, r"(?:Chrome|CriOS)/(\d+(?:\.\d+)*)");
static_regex!(FIREFOX_RE, r"(?:Firefox|FxiOS)/(\d+(?:\.\d+)*)");
static_regex!(SAFARI_RE, r"Version/(\d+(?:\.\d+)*).*Safari/");

/// Ambient signals the probe reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub user_agent: String,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

impl Environment {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            locale: None,
            timezone: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Capture the environment of the current process.
    ///
    /// The user agent names the host OS and this crate; locale comes from
    /// `LC_ALL` or `LANG` (`en_US.UTF-8` becomes `en-US`), the time zone
    /// from `TZ` or else the zone the host resolves.
    pub fn from_process(user_agent: Option<&str>) -> Self {
        let user_agent = user_agent.map(str::to_owned).unwrap_or_else(|| {
            format!(
                "{}/{} ({}; {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                host_os_token(),
                std::env::consts::ARCH,
            )
        });

        let locale = ["LC_ALL", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find_map(|raw| posix_locale_to_tag(&raw));

        let timezone = std::env::var("TZ")
            .ok()
            .map(|tz| tz.trim_start_matches(':').to_string())
            .filter(|tz| !tz.is_empty())
            .or_else(|| iana_time_zone::get_timezone().ok());

        Self {
            user_agent,
            locale,
            timezone,
        }
    }
}

/// OS token in the shape browsers use, so the probe recognizes it.
fn host_os_token() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows NT 10.0",
        "macos" => "Macintosh; Intel Mac OS X 10_15_7",
        "linux" => "X11; Linux",
        "android" => "Linux; Android",
        "ios" => "iPhone; CPU iPhone OS like Mac OS X",
        other => other,
    }
}

fn posix_locale_to_tag(raw: &str) -> Option<String> {
    let lang = raw.split(['.', '@']).next().unwrap_or_default();
    if lang.is_empty() || lang == "C" || lang == "POSIX" {
        return None;
    }
    Some(lang.replace('_', "-"))
}

/// What the probe reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    pub platform: String,
    pub os_version: String,
    /// Browser name and version.
    pub device_model: String,
    pub locale: String,
    pub timezone: String,
}

/// Probe an environment. Identical inputs always give identical output.
pub fn probe(env: &Environment) -> DeviceFingerprint {
    DeviceFingerprint {
        platform: PLATFORM.to_string(),
        os_version: detect_os(&env.user_agent),
        device_model: detect_browser(&env.user_agent),
        locale: non_empty(env.locale.as_deref()).unwrap_or(DEFAULT_LOCALE).to_string(),
        timezone: non_empty(env.timezone.as_deref())
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn version(re: &Regex, ua: &str) -> Option<String> {
    re.captures(ua)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace('_', "."))
}

/// OS name and version, e.g. `"Windows 10.0"` or `"iOS 17.4"`.
///
/// iOS is checked before macOS because iOS agents also say `like Mac OS X`.
pub fn detect_os(ua: &str) -> String {
    if let Some(v) = version(&WINDOWS_RE, ua) {
        return format!("Windows {}", v);
    }
    if let Some(v) = version(&IOS_RE, ua) {
        return format!("iOS {}", v);
    }
    if ua.contains("iPhone") || ua.contains("iPad") {
        return "iOS".to_string();
    }
    if let Some(v) = version(&MACOS_RE, ua) {
        return format!("macOS {}", v);
    }
    if let Some(v) = version(&ANDROID_RE, ua) {
        return format!("Android {}", v);
    }
    if ua.contains("Android") {
        return "Android".to_string();
    }
    if ua.contains("Linux") {
        return "Linux".to_string();
    }
    UNKNOWN.to_string()
}

/// Browser name and version, e.g. `"Edge 120.0.2210.91"`.
///
/// Chromium forks are matched before Chrome itself, and Safari only counts
/// when no Chrome token is present. Unrecognized agents are reported
/// verbatim; an empty agent is `"Unknown"`.
pub fn detect_browser(ua: &str) -> String {
    let ua = ua.trim();
    if ua.is_empty() {
        return UNKNOWN.to_string();
    }

    let ordered: [(&str, &Regex); 5] = [
        ("Edge", &*EDGE_RE),
        ("Opera", &*OPERA_RE),
        ("Samsung Internet", &*SAMSUNG_RE),
        ("Chrome", &*CHROME_RE),
        ("Firefox", &*FIREFOX_RE),
    ];
    for (name, re) in ordered {
        if let Some(v) = version(re, ua) {
            return format!("{} {}", name, v);
        }
    }

    if !CHROME_RE.is_match(ua) {
        if let Some(v) = version(&SAFARI_RE, ua) {
            return format!("Safari {}", v);
        }
    }

    ua.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    const SAFARI_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0";
    const OPERA_ANDROID: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/116.0.0.0 Mobile Safari/537.36 OPR/76.2.4027.73374";

    #[test]
    fn edge_is_not_reported_as_chrome() {
        assert_eq!(detect_browser(EDGE_WIN), "Edge 120.0.2210.91");
        assert_eq!(detect_browser(OPERA_ANDROID), "Opera 76.2.4027.73374");
    }

    #[test]
    fn safari_only_without_chrome_token() {
        assert_eq!(detect_browser(SAFARI_IOS), "Safari 17.4");
        assert_eq!(detect_browser(CHROME_MAC), "Chrome 124.0.0.0");
    }

    #[test]
    fn browser_fallbacks() {
        assert_eq!(detect_browser(""), "Unknown");
        assert_eq!(detect_browser("   "), "Unknown");
        assert_eq!(detect_browser("curl/8.5.0"), "curl/8.5.0");
        assert_eq!(detect_browser(FIREFOX_LINUX), "Firefox 126.0");
    }

    #[test]
    fn os_signatures() {
        assert_eq!(detect_os(EDGE_WIN), "Windows 10.0");
        assert_eq!(detect_os(CHROME_MAC), "macOS 10.15.7");
        assert_eq!(detect_os(SAFARI_IOS), "iOS 17.4");
        assert_eq!(detect_os(OPERA_ANDROID), "Android 13");
        assert_eq!(detect_os(FIREFOX_LINUX), "Linux");
        assert_eq!(detect_os("curl/8.5.0"), "Unknown");
    }

    #[test]
    fn probe_applies_defaults_and_is_deterministic() {
        let env = Environment::new(FIREFOX_LINUX);
        let first = probe(&env);
        assert_eq!(first.platform, "web");
        assert_eq!(first.locale, DEFAULT_LOCALE);
        assert_eq!(first.timezone, DEFAULT_TIMEZONE);
        assert_eq!(probe(&env), first);

        let env = env.with_locale("de-DE").with_timezone("Europe/Berlin");
        let fp = probe(&env);
        assert_eq!(fp.locale, "de-DE");
        assert_eq!(fp.timezone, "Europe/Berlin");
    }

    #[test]
    fn posix_locale_conversion() {
        assert_eq!(posix_locale_to_tag("en_US.UTF-8").as_deref(), Some("en-US"));
        assert_eq!(posix_locale_to_tag("pt_BR@euro").as_deref(), Some("pt-BR"));
        assert_eq!(posix_locale_to_tag("C"), None);
        assert_eq!(posix_locale_to_tag(""), None);
    }

    #[test]
    fn process_agent_is_recognized() {
        let env = Environment::from_process(None);
        assert!(env.user_agent.starts_with("support-client/"));
        assert!(!probe(&env).device_model.is_empty());
    }

    #[test]
    fn process_timezone_is_never_blank() {
        let env = Environment::from_process(None);
        match (std::env::var("TZ"), iana_time_zone::get_timezone()) {
            (Ok(tz), _) if !tz.trim_start_matches(':').is_empty() => {
                assert_eq!(env.timezone.as_deref(), Some(tz.trim_start_matches(':')))
            }
            (_, Ok(host)) => assert_eq!(env.timezone.as_deref(), Some(host.as_str())),
            _ => assert_eq!(probe(&env).timezone, DEFAULT_TIMEZONE),
        }
    }
}
