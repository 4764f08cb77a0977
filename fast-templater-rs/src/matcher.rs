//! Preset recommendation.
//!
//! Each preset is scored against a template from a few independent signals:
//!
//! | signal | weight | measures |
//! |---|---|---|
//! | field overlap | 0.6 | preset keys present in the template's frontmatter keys or body |
//! | keywords | 0.2 | preset labels/keys mentioned in the template body |
//! | field count | 0.2 | how close the preset's field count is to the template's key count |
//!
//! A preset the template binds explicitly through `fast-templater-config`
//! always scores 1.0.

use crate::library::bound_preset_ids;
use crate::parser::parse_frontmatter;
use crate::types::{FrontmatterPreset, RESERVED_CONFIG_KEY, Template};
use serde::Serialize;
use serde_yaml::Value;
use std::collections::HashSet;

pub const STRONG_MATCH: f64 = 0.8;
pub const RECOMMENDED_MATCH: f64 = 0.5;
pub const WORTH_CONSIDERING: f64 = 0.3;

const OVERLAP_WEIGHT: f64 = 0.6;
const KEYWORD_WEIGHT: f64 = 0.2;
const COUNT_WEIGHT: f64 = 0.2;

/// How strongly a preset is recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    Weak,
    WorthConsidering,
    Recommended,
    Strong,
}

impl MatchTier {
    pub fn from_score(score: f64) -> Self {
        if score >= STRONG_MATCH {
            MatchTier::Strong
        } else if score >= RECOMMENDED_MATCH {
            MatchTier::Recommended
        } else if score >= WORTH_CONSIDERING {
            MatchTier::WorthConsidering
        } else {
            MatchTier::Weak
        }
    }
}

/// A scored preset.
#[derive(Debug, Clone, Serialize)]
pub struct PresetMatch<'a> {
    pub preset: &'a FrontmatterPreset,
    /// In `[0, 1]`.
    pub score: f64,
    pub tier: MatchTier,
    pub reasons: Vec<String>,
}

struct TemplateSignals {
    keys: HashSet<String>,
    body: String,
    bound: Vec<String>,
}

impl TemplateSignals {
    fn from_template(template: &Template) -> Self {
        let parsed = parse_frontmatter(&template.content);
        let keys = parsed
            .frontmatter
            .keys()
            .filter_map(Value::as_str)
            .filter(|k| *k != RESERVED_CONFIG_KEY)
            .map(str::to_lowercase)
            .collect();
        Self {
            keys,
            body: parsed.body.to_lowercase(),
            bound: bound_preset_ids(&parsed.frontmatter),
        }
    }
}

/// Score every preset against `template`, best first.
pub fn match_presets<'a>(template: &Template, presets: &'a [FrontmatterPreset]) -> Vec<PresetMatch<'a>> {
    let signals = TemplateSignals::from_template(template);
    let mut matches: Vec<PresetMatch<'a>> = presets
        .iter()
        .map(|preset| score_preset(preset, &signals))
        .collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

/// The highest-scoring preset, if it is at least worth considering.
pub fn best_match<'a>(template: &Template, presets: &'a [FrontmatterPreset]) -> Option<PresetMatch<'a>> {
    match_presets(template, presets)
        .into_iter()
        .next()
        .filter(|m| m.score >= WORTH_CONSIDERING)
}

fn score_preset<'a>(preset: &'a FrontmatterPreset, signals: &TemplateSignals) -> PresetMatch<'a> {
    if signals.bound.iter().any(|id| *id == preset.id) {
        return PresetMatch {
            preset,
            score: 1.0,
            tier: MatchTier::Strong,
            reasons: vec!["Bound to this template".to_string()],
        };
    }

    let total = preset.fields.len();
    if total == 0 {
        return PresetMatch {
            preset,
            score: 0.0,
            tier: MatchTier::Weak,
            reasons: Vec::new(),
        };
    }

    let mut overlap = 0usize;
    let mut keywords = 0usize;
    for field in &preset.fields {
        let key = field.key.to_lowercase();
        let label = field.label.trim().to_lowercase();
        if signals.keys.contains(&key) || signals.body.contains(&key) {
            overlap += 1;
        }
        if signals.body.contains(&key) || (!label.is_empty() && signals.body.contains(&label)) {
            keywords += 1;
        }
    }
    let overlap_ratio = overlap as f64 / total as f64;
    let keyword_ratio = keywords as f64 / total as f64;

    let template_keys = signals.keys.len();
    let count_ratio = if template_keys == 0 {
        0.0
    } else {
        let diff = total.abs_diff(template_keys) as f64;
        1.0 - diff / total.max(template_keys) as f64
    };

    let mut reasons = Vec::new();
    if overlap_ratio >= 0.5 {
        reasons.push(format!("{} of {} fields already used by the template", overlap, total));
    }
    if keyword_ratio >= 0.3 {
        reasons.push(format!("Template mentions {} of the preset's fields", keywords));
    }
    if count_ratio >= 0.7 {
        reasons.push(format!(
            "Similar number of fields ({} vs {})",
            total, template_keys
        ));
    }

    let score = (OVERLAP_WEIGHT * overlap_ratio
        + KEYWORD_WEIGHT * keyword_ratio
        + COUNT_WEIGHT * count_ratio)
        .clamp(0.0, 1.0);

    PresetMatch {
        preset,
        score,
        tier: MatchTier::from_score(score),
        reasons,
    }
}
