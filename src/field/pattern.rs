use crate::error::ParserError;
use fancy_regex::{escape, Regex};
use log::warn;

/// A string matcher compiled once when a query is parsed.
///
/// Literals without wildcards are compared directly, everything else is
/// turned into an anchored regular expression.
#[derive(Debug)]
pub(crate) enum Pattern {
    Exact { value: String, cased: bool },
    Regex(Regex),
}

impl Pattern {
    /// Exact comparison, no wildcard expansion
    pub(crate) fn exact(value: &str, cased: bool) -> Self {
        let value = match cased {
            true => value.to_string(),
            false => value.to_lowercase(),
        };
        Self::Exact { value, cased }
    }

    /// `*` matches any run of characters, including none
    pub(crate) fn wildcard(pattern: &str, cased: bool) -> Result<Self, ParserError> {
        if !pattern.contains('*') {
            return Ok(Self::exact(pattern, cased));
        }
        let body = pattern
            .split('*')
            .map(|part| escape(part).into_owned())
            .collect::<Vec<String>>()
            .join(".*");
        Self::compile(&body, cased)
    }

    pub(crate) fn starts_with(prefix: &str, cased: bool) -> Result<Self, ParserError> {
        Self::compile(&format!("{}.*", escape(prefix)), cased)
    }

    pub(crate) fn ends_with(suffix: &str, cased: bool) -> Result<Self, ParserError> {
        Self::compile(&format!(".*{}", escape(suffix)), cased)
    }

    pub(crate) fn contains(needle: &str, cased: bool) -> Result<Self, ParserError> {
        Self::compile(&format!(".*{}.*", escape(needle)), cased)
    }

    /// The expression has to match the whole value
    pub(crate) fn regex(pattern: &str, cased: bool) -> Result<Self, ParserError> {
        Self::compile(&format!("(?:{})", pattern), cased)
    }

    fn compile(body: &str, cased: bool) -> Result<Self, ParserError> {
        let flags = match cased {
            true => "(?s)",
            false => "(?si)",
        };
        match Regex::new(&format!("{}^{}$", flags, body)) {
            Ok(re) => Ok(Self::Regex(re)),
            Err(err) => Err(ParserError::RegexParsing(Box::new(err))),
        }
    }

    pub(crate) fn is_match(&self, target: &str) -> bool {
        match self {
            Self::Exact { value, cased: true } => value == target,
            Self::Exact { value, cased: false } => *value == target.to_lowercase(),
            Self::Regex(re) => match re.is_match(target) {
                Ok(b) => b,
                Err(err) => {
                    warn!("Failed to evaluate pattern '{}': {}", re.as_str(), err);
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        assert!(Pattern::exact("sc.exe", false).is_match("SC.EXE"));
        assert!(!Pattern::exact("sc.exe", true).is_match("SC.EXE"));
        assert!(!Pattern::exact("sc.exe", false).is_match("xsc.exe"));
    }

    #[test]
    fn test_wildcard_without_stars_is_exact() {
        assert!(matches!(
            Pattern::wildcard("net.exe", false).unwrap(),
            Pattern::Exact { .. }
        ));
    }

    #[test]
    fn test_wildcard() {
        let p = Pattern::wildcard("* start *", false).unwrap();
        assert!(p.is_match("sc.exe start MyService"));
        assert!(p.is_match("sc.exe START MyService"));
        assert!(!p.is_match("sc.exe start"));
        assert!(!p.is_match("sc.exe restart MyService"));

        let p = Pattern::wildcard("*service*call*startservice*", false).unwrap();
        assert!(p.is_match("wmic service where name='x' call StartService"));
        assert!(!p.is_match("wmic call service startservice"));
    }

    #[test]
    fn test_wildcard_escapes_regex_characters() {
        let p = Pattern::wildcard("*c:\\windows\\(x).exe", false).unwrap();
        assert!(p.is_match("C:\\Windows\\(x).exe"));
        assert!(!p.is_match("c:\\windows\\x.exe"));
    }

    #[test]
    fn test_wildcard_spans_lines() {
        let p = Pattern::wildcard("*Start-Service*", true).unwrap();
        assert!(p.is_match("line one\nStart-Service x\nline three"));
        assert!(!p.is_match("start-service x"));
    }

    #[test]
    fn test_prefix_suffix_contains() {
        assert!(Pattern::starts_with("net", false).unwrap().is_match("NET start x"));
        assert!(!Pattern::starts_with("*", true).unwrap().is_match("net"));
        assert!(Pattern::ends_with(".exe", true).unwrap().is_match("sc.exe"));
        assert!(!Pattern::ends_with(".exe", true).unwrap().is_match("sc.EXE"));
        assert!(Pattern::contains("call", false).unwrap().is_match("wmic CALL"));
    }

    #[test]
    fn test_regex_full_match() {
        let p = Pattern::regex(r".*\sstart\s+.+", false).unwrap();
        assert!(p.is_match("net start \"Print Spooler\""));
        assert!(p.is_match("net START spooler"));
        assert!(!p.is_match("net restart spooler"));
        assert!(!p.is_match("net start "));

        let p = Pattern::regex("start|stop", true).unwrap();
        assert!(p.is_match("stop"));
        assert!(!p.is_match("net stop"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = Pattern::regex("(unclosed", true).unwrap_err();
        assert!(matches!(err, ParserError::RegexParsing(_)));
    }
}
