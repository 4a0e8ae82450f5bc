//! Capability detector: keyword-family scan over normalized agent content.
//!
//! Each known capability owns a family of keywords. The detector counts how
//! many *distinct* keywords of a family occur in the text and turns that
//! density into a detection confidence that saturates at 1.0.
//!
//! `pattern_enforcement` is mandatory: it is always reported, even for
//! empty content, at a baseline confidence.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Capability id every agent carries.
pub const MANDATORY_CAPABILITY: &str = "pattern_enforcement";

/// Starting point before any keyword step is added.
const DETECTION_BASE: f64 = 0.30;
/// Confidence added per distinct matched keyword.
const DETECTION_STEP: f64 = 0.15;
/// Baseline for the mandatory capability with no supporting keywords.
const MANDATORY_BASE: f64 = 0.50;
const MANDATORY_STEP: f64 = 0.10;

/// (capability id, keyword family). Keywords are matched case-insensitively
/// on word boundaries; a trailing `*` allows any word suffix.
const KEYWORD_FAMILIES: &[(&str, &[&str])] = &[
    (
        MANDATORY_CAPABILITY,
        &[
            "pattern*", "convention*", "standard*", "guideline*", "lint*", "enforce*", "consisten*",
            "best practice*",
        ],
    ),
    (
        "testing",
        &[
            "test*", "unit test*", "integration test*", "e2e", "jest", "vitest", "pytest",
            "coverage", "tdd", "assert*", "mock*", "fixture*",
        ],
    ),
    (
        "security",
        &[
            "security", "secure", "vulnerab*", "xss", "csrf", "injection", "authenticat*",
            "authoriz*", "oauth*", "jwt", "access control", "encrypt*", "owasp", "sanitiz*",
            "penetration", "secret*",
        ],
    ),
    (
        "design_token_compliance",
        &[
            "design token*", "token*", "design system*", "theme*", "color palette*",
            "spacing scale*", "typography",
        ],
    ),
    (
        "pagelayout_architecture",
        &[
            "pagelayout", "page layout*", "layout*", "grid*", "sidebar*", "header*", "footer*",
            "responsive",
        ],
    ),
    (
        "nextjs_architecture",
        &[
            "next.js", "nextjs", "app router", "server component*", "getserversideprops",
            "getstaticprops", "middleware", "route handler*",
        ],
    ),
    (
        "performance_optimization",
        &[
            "performance", "optimi*", "latency", "cach*", "lazy load*", "memoiz*", "bundle size",
            "profil*", "throughput", "benchmark*",
        ],
    ),
    (
        "accessibility",
        &[
            "accessibility", "a11y", "aria", "screen reader*", "wcag", "keyboard navigation",
            "contrast",
        ],
    ),
    (
        "api_design",
        &[
            "api", "apis", "rest api*", "restful", "graphql", "endpoint*", "openapi", "http",
            "http request*", "api request*", "request handler*", "response code*", "status code*",
            "versioning",
        ],
    ),
    (
        "database_design",
        &[
            "database*", "sql", "schema*", "migration*", "index*", "query", "queries", "postgres*",
            "orm", "normaliz*",
        ],
    ),
    (
        "documentation",
        &[
            "documentation", "document*", "readme", "docstring*", "jsdoc", "changelog", "tutorial*",
            "guide*",
        ],
    ),
    (
        "code_review",
        &[
            "code review*", "review*", "pull request*", "feedback", "critique", "maintainab*",
            "readab*",
        ],
    ),
    (
        "refactoring",
        &[
            "refactor*", "clean code", "technical debt", "restructur*", "simplif*", "dead code",
            "duplication",
        ],
    ),
    (
        "devops",
        &[
            "devops", "ci/cd", "ci cd", "continuous integration", "continuous deploy*",
            "continuous delivery", "pipeline*", "docker*", "kubernetes", "deploy*", "terraform",
            "github actions", "infrastructure",
        ],
    ),
    (
        "typescript",
        &[
            "typescript", "type safety", "generic*", "interface*", "tsconfig", "type guard*",
            "strict mode",
        ],
    ),
    (
        "react_components",
        &["react", "component*", "jsx", "tsx", "props", "hook*", "usestate", "useeffect"],
    ),
    (
        "state_management",
        &[
            "state management", "redux", "zustand", "context api", "store*", "reducer*",
            "global state",
        ],
    ),
    (
        "data_analysis",
        &[
            "data analysis", "analy*", "statistic*", "metric*", "dataset*", "visualiz*", "pandas",
            "report*",
        ],
    ),
    (
        "error_handling",
        &[
            "error handling", "error*", "exception*", "retry", "retries", "fallback*", "recover*",
            "resilien*",
        ],
    ),
    (
        "internationalization",
        &[
            "internationalization", "i18n", "l10n", "locali*", "translation*", "locale*",
            "multilingual",
        ],
    ),
];

struct KeywordFamily {
    capability_id: &'static str,
    pattern: Regex,
}

static FAMILIES: Lazy<Vec<KeywordFamily>> = Lazy::new(|| {
    KEYWORD_FAMILIES
        .iter()
        .map(|&(capability_id, keywords)| KeywordFamily {
            capability_id,
            pattern: compile_family(keywords),
        })
        .collect()
});

/// Build one alternation regex for a keyword family.
fn compile_family(keywords: &[&str]) -> Regex {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|keyword| {
            let (stem, wildcard) = match keyword.strip_suffix('*') {
                Some(stem) => (stem, true),
                None => (*keyword, false),
            };
            let escaped = regex::escape(stem).replace(' ', r"[\s_-]+");
            if wildcard {
                format!(r"{}\w*", escaped)
            } else {
                escaped
            }
        })
        .collect();
    // Keyword families are compile-time constants, so this cannot fail.
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).unwrap()
}

/// One detected capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityMatch {
    pub capability_id: String,
    /// Density-derived confidence in [0, 1].
    pub detection_confidence: f64,
    /// Distinct keywords found, lowercased, sorted.
    pub matched_keywords: Vec<String>,
}

/// Output of one detector run. The mandatory capability is always first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub capabilities: Vec<CapabilityMatch>,
}

impl DetectionResult {
    pub fn get(&self, capability_id: &str) -> Option<&CapabilityMatch> {
        self.capabilities.iter().find(|c| c.capability_id == capability_id)
    }

    /// Matches other than the mandatory capability.
    pub fn domain_capabilities(&self) -> impl Iterator<Item = &CapabilityMatch> {
        self.capabilities
            .iter()
            .filter(|c| c.capability_id != MANDATORY_CAPABILITY)
    }
}

/// Stateless keyword-family detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityDetector;

impl CapabilityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Every capability id this detector can report.
    pub fn known_capabilities(&self) -> Vec<&'static str> {
        KEYWORD_FAMILIES.iter().map(|(id, _)| *id).collect()
    }

    /// Scan `content` and return confidence-scored matches.
    pub fn detect(&self, content: &str) -> DetectionResult {
        let mut capabilities = Vec::new();

        for family in FAMILIES.iter() {
            let matched: BTreeSet<String> = family
                .pattern
                .find_iter(content)
                .map(|m| normalize_keyword(m.as_str()))
                .collect();

            let mandatory = family.capability_id == MANDATORY_CAPABILITY;
            if matched.is_empty() && !mandatory {
                continue;
            }

            let detection_confidence = if mandatory {
                saturate(MANDATORY_BASE + MANDATORY_STEP * matched.len() as f64)
            } else {
                saturate(DETECTION_BASE + DETECTION_STEP * matched.len() as f64)
            };

            capabilities.push(CapabilityMatch {
                capability_id: family.capability_id.to_string(),
                detection_confidence,
                matched_keywords: matched.into_iter().collect(),
            });
        }

        log::debug!(
            "Detected {} capabilities in {} chars of content",
            capabilities.len(),
            content.len()
        );

        DetectionResult { capabilities }
    }
}

fn normalize_keyword(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn saturate(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_mandatory_always_present() {
        let result = CapabilityDetector::new().detect("");
        assert_eq!(result.capabilities.len(), 1);
        assert_eq!(result.capabilities[0].capability_id, MANDATORY_CAPABILITY);
        assert!((result.capabilities[0].detection_confidence - MANDATORY_BASE).abs() < 1e-9);
    }

    #[test]
    fn test_density_raises_confidence() {
        let detector = CapabilityDetector::new();
        let sparse = detector.detect("Runs the test suite.");
        let dense =
            detector.detect("Writes unit tests with jest, mocks and fixtures; tracks coverage.");

        let sparse_conf = sparse.get("testing").unwrap().detection_confidence;
        let dense_conf = dense.get("testing").unwrap().detection_confidence;
        assert!(dense_conf > sparse_conf);
        assert!(dense_conf <= 1.0);
    }

    #[test]
    fn test_saturates_at_one() {
        let text = "security vulnerability xss csrf injection authentication encryption owasp \
                    sanitize penetration secrets";
        let result = CapabilityDetector::new().detect(text);
        assert_eq!(result.get("security").unwrap().detection_confidence, 1.0);
    }

    #[test]
    fn test_word_boundaries() {
        // "latest" must not count as a testing keyword.
        let result = CapabilityDetector::new().detect("Always use the latest release.");
        assert!(result.get("testing").is_none());
    }

    #[test]
    fn test_prose_does_not_trigger_domains() {
        let result = CapabilityDetector::new()
            .detect("The author has the authority to approve the request. Use the CD player.");
        assert!(result.get("security").is_none());
        assert!(result.get("api_design").is_none());
        assert!(result.get("devops").is_none());
        assert_eq!(result.domain_capabilities().count(), 0);
    }

    #[test]
    fn test_narrowed_keywords_still_match() {
        let result = CapabilityDetector::new().detect(
            "Handles OAuth2 authorization and authentication. \
             Ships via CI/CD with continuous integration. \
             Designs RESTful APIs with clear status codes.",
        );
        let security = result.get("security").unwrap();
        assert!(security.matched_keywords.contains(&"authorization".to_string()));
        assert!(security.matched_keywords.contains(&"authentication".to_string()));
        let devops = result.get("devops").unwrap();
        assert!(devops.matched_keywords.contains(&"ci/cd".to_string()));
        assert!(devops.matched_keywords.contains(&"continuous integration".to_string()));
        let api = result.get("api_design").unwrap();
        assert!(api.matched_keywords.contains(&"restful".to_string()));
        assert!(api.matched_keywords.contains(&"status codes".to_string()));
    }

    #[test]
    fn test_multiword_keywords() {
        let result =
            CapabilityDetector::new().detect("Follows design_tokens and the Next.js app-router.");
        assert!(result.get("design_token_compliance").is_some());
        let nextjs = result.get("nextjs_architecture").unwrap();
        assert!(nextjs.matched_keywords.contains(&"app router".to_string()));
    }

    #[test]
    fn test_known_capabilities() {
        let known = CapabilityDetector::new().known_capabilities();
        assert_eq!(known.len(), 20);
        assert_eq!(known[0], MANDATORY_CAPABILITY);
        assert!(known.contains(&"pagelayout_architecture"));
    }

    #[test]
    fn test_large_content_is_fast() {
        let paragraph = "Reviews React components for accessibility, performance and security. ";
        let content = paragraph.repeat(800);
        assert!(content.len() > 50_000);

        let start = Instant::now();
        let result = CapabilityDetector::new().detect(&content);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(result.get("react_components").is_some());
    }
}
