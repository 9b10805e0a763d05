//! ATT&CK coverage of a set of analytics, built from their `tactics` and
//! `techniques` metadata.

use crate::analytic::Analytic;
use std::collections::{BTreeMap, BTreeSet};

/// Analytics grouped by the ATT&CK techniques and tactics they cover.
///
/// Technique ids are compared upper-cased (`t1035` and `T1035` are the same),
/// tactic names as written.
///
/// # Example
/// ```rust
/// use eql_analytic::{library, AttackCoverage};
/// let coverage = AttackCoverage::build(library::analytics());
/// assert_eq!(coverage.technique("T1569.002").len(), 1);
/// assert!(coverage.matrix()["Execution"].contains("T1035"));
/// ```
#[derive(Debug, Default)]
pub struct AttackCoverage<'a> {
    techniques: BTreeMap<String, Vec<&'a Analytic>>,
    tactics: BTreeMap<String, Vec<&'a Analytic>>,
    matrix: BTreeMap<String, BTreeSet<String>>,
}

fn push_unique<'a>(analytics: &mut Vec<&'a Analytic>, analytic: &'a Analytic) {
    if !analytics
        .iter()
        .any(|a| a.metadata.id == analytic.metadata.id)
    {
        analytics.push(analytic);
    }
}

impl<'a> AttackCoverage<'a> {
    pub fn build<I>(analytics: I) -> Self
    where
        I: IntoIterator<Item = &'a Analytic>,
    {
        let mut coverage = Self::default();
        for analytic in analytics {
            let techniques: Vec<String> = analytic
                .metadata
                .techniques
                .iter()
                .map(|t| t.trim().to_ascii_uppercase())
                .collect();
            for technique in techniques.iter() {
                push_unique(
                    coverage.techniques.entry(technique.clone()).or_default(),
                    analytic,
                );
            }
            for tactic in analytic.metadata.tactics.iter() {
                let tactic = tactic.trim();
                push_unique(coverage.tactics.entry(tactic.to_string()).or_default(), analytic);
                coverage
                    .matrix
                    .entry(tactic.to_string())
                    .or_default()
                    .extend(techniques.iter().cloned());
            }
        }
        coverage
    }

    /// Analytics listing the technique
    pub fn technique(&self, id: &str) -> &[&'a Analytic] {
        self.techniques
            .get(&id.trim().to_ascii_uppercase())
            .map(|a| a.as_slice())
            .unwrap_or_default()
    }

    /// Analytics listing the tactic
    pub fn tactic(&self, name: &str) -> &[&'a Analytic] {
        self.tactics
            .get(name.trim())
            .map(|a| a.as_slice())
            .unwrap_or_default()
    }

    /// Covered technique ids with their analytics, sorted by id
    pub fn techniques(&self) -> impl Iterator<Item = (&str, &[&'a Analytic])> {
        self.techniques
            .iter()
            .map(|(id, analytics)| (id.as_str(), analytics.as_slice()))
    }

    /// Covered tactics with their analytics, sorted by name
    pub fn tactics(&self) -> impl Iterator<Item = (&str, &[&'a Analytic])> {
        self.tactics
            .iter()
            .map(|(name, analytics)| (name.as_str(), analytics.as_slice()))
    }

    /// Tactic to the techniques covered under it
    pub fn matrix(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.matrix
    }

    /// Number of analytics per technique id
    pub fn summary(&self) -> BTreeMap<&str, usize> {
        self.techniques().map(|(id, a)| (id, a.len())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analytic(id: &str, tactics: &str, techniques: &str) -> Analytic {
        serde_yml::from_str(&format!(
            r#"
            metadata:
                id: {}
                name: Analytic {}
                tactics: {}
                techniques: {}
            query: process where true
            "#,
            id, id, tactics, techniques
        ))
        .unwrap()
    }

    #[test]
    fn test_build() {
        let analytics = [
            analytic(
                "00000000-0000-0000-0000-000000000001",
                "[Execution, Persistence]",
                "[T1035, t1569.002]",
            ),
            analytic(
                "00000000-0000-0000-0000-000000000002",
                "[Execution]",
                "[T1035, T1035]",
            ),
            analytic("00000000-0000-0000-0000-000000000003", "[]", "[]"),
        ];
        let coverage = AttackCoverage::build(analytics.iter());

        assert_eq!(coverage.technique("T1035").len(), 2);
        assert_eq!(coverage.technique("T1569.002").len(), 1);
        assert!(coverage.technique("T1086").is_empty());
        assert_eq!(coverage.tactic("Execution").len(), 2);
        assert_eq!(coverage.tactic("Persistence").len(), 1);

        let summary = coverage.summary();
        assert_eq!(summary.get("T1035"), Some(&2));
        assert_eq!(summary.get("T1569.002"), Some(&1));
        assert_eq!(summary.len(), 2);

        let matrix = coverage.matrix();
        assert_eq!(
            matrix["Persistence"].iter().collect::<Vec<&String>>(),
            vec!["T1035", "T1569.002"]
        );
        assert_eq!(
            coverage.tactics().map(|(t, _)| t).collect::<Vec<&str>>(),
            vec!["Execution", "Persistence"]
        );
    }
}
