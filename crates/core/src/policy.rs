//! Corpus partition policies and payload templates.
//!
//! A policy says, per provenance label, whether the label's partition is
//! always read in full or excluded from similarity search, how the
//! retrieved material is grouped into headed sections, and how many ranked
//! chunks to fetch. Policies are plain data supplied by the caller and are
//! validated once at construction.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::PolicyError;
use crate::label::Label;

/// How a labelled partition participates in context assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionMode {
    /// Every chunk with this label is read, bypassing top-k and filters.
    AlwaysIncludeAll,
    /// Chunks with this label never appear in the ranked supplement.
    ExcludeFromRankedSearch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRule {
    pub label: Label,
    pub mode: InclusionMode,
}

/// Where a section's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionSource {
    /// Always-included partitions, joined in the order listed.
    Partitions { labels: Vec<Label> },
    /// The similarity-ranked supplement.
    Ranked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub header: String,
    #[serde(flatten)]
    pub source: SectionSource,
}

impl Section {
    pub fn partitions(header: impl Into<String>, labels: Vec<Label>) -> Self {
        Self {
            header: header.into(),
            source: SectionSource::Partitions { labels },
        }
    }

    pub fn ranked(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            source: SectionSource::Ranked,
        }
    }
}

/// How the supplement outside the always-included partitions is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// Top-k nearest neighbours of the prompt.
    #[default]
    Ranked,
    /// Every eligible chunk in store order, no cutoff.
    FullDump,
}

/// A validated corpus partition policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusPartitionPolicy {
    rules: Vec<PartitionRule>,
    sections: Vec<Section>,
    top_k: usize,
    strategy: RetrievalStrategy,
}

impl CorpusPartitionPolicy {
    pub fn new(
        rules: Vec<PartitionRule>,
        sections: Vec<Section>,
        top_k: usize,
        strategy: RetrievalStrategy,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            rules,
            sections,
            top_k,
            strategy,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    fn validate(&self) -> Result<(), PolicyError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(&rule.label) {
                return Err(PolicyError::DuplicateLabel(rule.label.to_string()));
            }
        }

        let always: HashSet<&Label> = self.always_included().collect();
        let mut placed = HashSet::new();
        let mut ranked_sections = 0;

        for section in &self.sections {
            match &section.source {
                SectionSource::Ranked => ranked_sections += 1,
                SectionSource::Partitions { labels } => {
                    for label in labels {
                        if !always.contains(label) {
                            return Err(PolicyError::NotAlwaysIncluded {
                                header: section.header.clone(),
                                label: label.to_string(),
                            });
                        }
                        if !placed.insert(label) {
                            return Err(PolicyError::LabelInMultipleSections(label.to_string()));
                        }
                    }
                }
            }
        }

        if ranked_sections > 1 {
            return Err(PolicyError::MultipleRankedSections);
        }

        if let Some(label) = self.always_included().find(|l| !placed.contains(l)) {
            return Err(PolicyError::UnplacedLabel(label.to_string()));
        }

        if self.strategy == RetrievalStrategy::Ranked && self.top_k == 0 {
            return Err(PolicyError::ZeroTopK);
        }

        Ok(())
    }

    pub fn rules(&self) -> &[PartitionRule] {
        &self.rules
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn strategy(&self) -> RetrievalStrategy {
        self.strategy
    }

    /// Always-included labels, in rule order.
    pub fn always_included(&self) -> impl Iterator<Item = &Label> {
        self.rules
            .iter()
            .filter(|r| r.mode == InclusionMode::AlwaysIncludeAll)
            .map(|r| &r.label)
    }

    /// Labels kept out of the ranked supplement: the explicit exclusions
    /// plus every always-included label, so no chunk shows up twice.
    pub fn ranked_exclusions(&self) -> Vec<Label> {
        self.rules.iter().map(|r| r.label.clone()).collect()
    }

    pub fn has_ranked_section(&self) -> bool {
        self.sections
            .iter()
            .any(|s| s.source == SectionSource::Ranked)
    }
}

/// Incremental construction of a [`CorpusPartitionPolicy`].
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    rules: Vec<PartitionRule>,
    sections: Vec<Section>,
    top_k: usize,
    strategy: RetrievalStrategy,
}

impl PolicyBuilder {
    pub fn always_include(mut self, label: Label) -> Self {
        self.rules.push(PartitionRule {
            label,
            mode: InclusionMode::AlwaysIncludeAll,
        });
        self
    }

    pub fn exclude(mut self, label: Label) -> Self {
        self.rules.push(PartitionRule {
            label,
            mode: InclusionMode::ExcludeFromRankedSearch,
        });
        self
    }

    pub fn section(mut self, header: impl Into<String>, labels: Vec<Label>) -> Self {
        self.sections.push(Section::partitions(header, labels));
        self
    }

    pub fn ranked_section(mut self, header: impl Into<String>) -> Self {
        self.sections.push(Section::ranked(header));
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn strategy(mut self, strategy: RetrievalStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> Result<CorpusPartitionPolicy, PolicyError> {
        CorpusPartitionPolicy::new(self.rules, self.sections, self.top_k, self.strategy)
    }
}

/// Instruction text with `{context}`, `{history}` and `{prompt}` slots.
///
/// `{{` and `}}` render as literal braces. Any other `{name}` is left as is,
/// so templates can mention placeholders in prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PayloadTemplate(String);

impl PayloadTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, PolicyError> {
        let template = template.into();
        if !template.contains("{prompt}") {
            return Err(PolicyError::InvalidProfile(
                "payload template must contain a {prompt} placeholder".into(),
            ));
        }
        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fill the slots. Absent history renders as an empty string.
    pub fn render(&self, context: &str, history: Option<&str>, prompt: &str) -> String {
        let src = self.0.as_str();
        let mut out = String::with_capacity(src.len() + context.len() + prompt.len());
        let mut rest = src;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if let Some(r) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = r;
            } else if let Some(r) = tail.strip_prefix("{history}") {
                out.push_str(history.unwrap_or_default());
                rest = r;
            } else if let Some(r) = tail.strip_prefix("{prompt}") {
                out.push_str(prompt);
                rest = r;
            } else {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemma_like() -> PolicyBuilder {
        CorpusPartitionPolicy::builder()
            .always_include(Label::TAILWIND)
            .always_include(Label::TAILWIND_UI_KIT)
            .always_include(Label::TAILWIND_TEMPLATES)
            .section("TAILWIND CSS DOCS", vec![Label::TAILWIND])
            .section(
                "STYLING REFERENCE",
                vec![Label::TAILWIND_UI_KIT, Label::TAILWIND_TEMPLATES],
            )
            .ranked_section("OTHER RELEVANT DOCS")
            .top_k(5)
    }

    #[test]
    fn valid_policy_builds() {
        let p = gemma_like().build().unwrap();
        assert_eq!(p.top_k(), 5);
        assert_eq!(p.sections().len(), 3);
        assert!(p.has_ranked_section());
        let always: Vec<_> = p.always_included().cloned().collect();
        assert_eq!(
            always,
            [Label::TAILWIND, Label::TAILWIND_UI_KIT, Label::TAILWIND_TEMPLATES]
        );
    }

    #[test]
    fn exclusions_cover_always_included_labels() {
        let p = CorpusPartitionPolicy::builder()
            .always_include(Label::TAILWIND_UI_KIT)
            .exclude(Label::TAILWIND)
            .section("STYLING", vec![Label::TAILWIND_UI_KIT])
            .ranked_section("OTHER")
            .top_k(6)
            .build()
            .unwrap();
        let ex = p.ranked_exclusions();
        assert!(ex.contains(&Label::TAILWIND));
        assert!(ex.contains(&Label::TAILWIND_UI_KIT));
        assert!(!ex.contains(&Label::REACT));
    }

    #[test]
    fn duplicate_rule_rejected() {
        let err = CorpusPartitionPolicy::builder()
            .always_include(Label::REACT)
            .exclude(Label::REACT)
            .section("R", vec![Label::REACT])
            .top_k(1)
            .build()
            .unwrap_err();
        assert_eq!(err, PolicyError::DuplicateLabel("React".into()));
    }

    #[test]
    fn unplaced_always_label_rejected() {
        let err = CorpusPartitionPolicy::builder()
            .always_include(Label::TAILWIND)
            .ranked_section("OTHER")
            .top_k(3)
            .build()
            .unwrap_err();
        assert_eq!(err, PolicyError::UnplacedLabel("Tailwind".into()));
    }

    #[test]
    fn section_with_non_always_label_rejected() {
        let err = CorpusPartitionPolicy::builder()
            .section("R", vec![Label::REACT])
            .top_k(3)
            .build()
            .unwrap_err();
        assert!(matches!(err, PolicyError::NotAlwaysIncluded { .. }));
    }

    #[test]
    fn label_in_two_sections_rejected() {
        let err = CorpusPartitionPolicy::builder()
            .always_include(Label::TAILWIND)
            .section("A", vec![Label::TAILWIND])
            .section("B", vec![Label::TAILWIND])
            .top_k(3)
            .build()
            .unwrap_err();
        assert_eq!(err, PolicyError::LabelInMultipleSections("Tailwind".into()));
    }

    #[test]
    fn two_ranked_sections_rejected() {
        let err = CorpusPartitionPolicy::builder()
            .ranked_section("A")
            .ranked_section("B")
            .top_k(3)
            .build()
            .unwrap_err();
        assert_eq!(err, PolicyError::MultipleRankedSections);
    }

    #[test]
    fn zero_top_k_only_matters_for_ranked() {
        assert_eq!(
            gemma_like().top_k(0).build().unwrap_err(),
            PolicyError::ZeroTopK
        );
        assert!(
            gemma_like()
                .top_k(0)
                .strategy(RetrievalStrategy::FullDump)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn section_serde_shape() {
        let s = Section::partitions("STYLING", vec![Label::TAILWIND_UI_KIT]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "partitions");
        assert_eq!(json["labels"][0], "Tailwind-UI-Kit");

        let r: Section = serde_json::from_str(r#"{"header":"OTHER","kind":"ranked"}"#).unwrap();
        assert_eq!(r.source, SectionSource::Ranked);
    }

    #[test]
    fn template_fills_slots() {
        let t = PayloadTemplate::new("CTX:\n{context}\nHIST:\n{history}\nREQ: {prompt}").unwrap();
        let out = t.render("docs", Some("USER: hi"), "build a navbar");
        assert_eq!(out, "CTX:\ndocs\nHIST:\nUSER: hi\nREQ: build a navbar");
    }

    #[test]
    fn template_escapes_and_unknown_slots() {
        let t = PayloadTemplate::new("use `{{context}}` wisely {other} {prompt}").unwrap();
        let out = t.render("IGNORED", None, "p");
        assert_eq!(out, "use `{context}` wisely {other} p");
    }

    #[test]
    fn template_absent_history_is_empty() {
        let t = PayloadTemplate::new("[{history}] {prompt}").unwrap();
        assert_eq!(t.render("", None, "x"), "[] x");
    }

    #[test]
    fn template_does_not_reexpand_inserted_text() {
        let t = PayloadTemplate::new("{context}|{prompt}").unwrap();
        assert_eq!(t.render("{prompt}", None, "p"), "{prompt}|p");
    }

    #[test]
    fn template_requires_prompt_slot() {
        assert!(PayloadTemplate::new("no slot here").is_err());
    }
}
