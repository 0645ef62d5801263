//! Category matching
//!
//! Categories are tried in declared order and the first whose predicate
//! accepts the host wins. A category whose effective predicate carries no
//! rule at all is never selected, so an empty definition cannot turn into
//! an accidental catch-all.

use regex::Regex;
use std::collections::HashSet;

use super::config::{CategoryDefine, CategoryMatch, CategoryScope};
use super::types::{HostType, LayerId, ParsedHostname};
use crate::error::ConfigError;

pub const FALLBACK_CATEGORY_ID: &str = "unclassified-category";
pub const FALLBACK_CATEGORY_ORDER: i32 = 999;
pub const FALLBACK_COLOR: &str = "#9aa5b1";

/// Fields of a host that category predicates look at
#[derive(Debug, Clone, Copy)]
pub struct CategoryTarget<'a> {
    pub hostname: &'a str,
    pub host_type: &'a str,
    pub parsed: &'a ParsedHostname,
    pub layer_id: &'a str,
}

/// Synthetic category for hosts no rule accepts
pub fn fallback_category(host_type: &str) -> CategoryDefine {
    CategoryDefine {
        id: FALLBACK_CATEGORY_ID.to_string(),
        label: "Unclassified".to_string(),
        order: FALLBACK_CATEGORY_ORDER,
        host_types: Some(vec![host_type.to_string()]),
        match_rule: None,
        scope: CategoryScope::Global,
        color: FALLBACK_COLOR.to_string(),
        cluster_ring_radius: 0.0,
        local_ring_radius: 120.0,
        local_ring_step: 40.0,
    }
}

/// Effective predicate of one category, with patterns compiled
#[derive(Debug, Clone)]
struct CompiledMatch {
    host_types: Vec<HostType>,
    exclude_host_types: Vec<HostType>,
    layer_ids: Vec<LayerId>,
    exclude_layer_ids: Vec<LayerId>,
    hostname: Option<Regex>,
    prefecture: Option<Regex>,
    building: Option<Regex>,
    unit: Option<Regex>,
}

impl CompiledMatch {
    fn compile(category: &CategoryDefine) -> Result<Self, ConfigError> {
        let empty = CategoryMatch::default();
        let rule = category.match_rule.as_ref().unwrap_or(&empty);

        let compile = |field: &str, pattern: &Option<String>| {
            pattern
                .as_deref()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        ConfigError::invalid_pattern(
                            &format!("category:{}.{}", category.id, field),
                            p,
                            e,
                        )
                    })
                })
                .transpose()
        };

        Ok(Self {
            host_types: rule
                .host_types
                .clone()
                .or_else(|| category.host_types.clone())
                .unwrap_or_default(),
            exclude_host_types: rule.exclude_host_types.clone(),
            layer_ids: rule.layer_ids.clone(),
            exclude_layer_ids: rule.exclude_layer_ids.clone(),
            hostname: compile("hostnameRegexp", &rule.hostname_regexp)?,
            prefecture: compile("prefectureRegexp", &rule.prefecture_regexp)?,
            building: compile("buildingRegexp", &rule.building_regexp)?,
            unit: compile("unitRegexp", &rule.unit_regexp)?,
        })
    }

    fn has_rule(&self) -> bool {
        !self.host_types.is_empty()
            || !self.exclude_host_types.is_empty()
            || !self.layer_ids.is_empty()
            || !self.exclude_layer_ids.is_empty()
            || self.hostname.is_some()
            || self.prefecture.is_some()
            || self.building.is_some()
            || self.unit.is_some()
    }

    fn accepts(&self, target: &CategoryTarget<'_>) -> bool {
        let contains = |list: &[String], value: &str| list.iter().any(|item| item == value);
        let pattern_ok =
            |re: &Option<Regex>, value: &str| re.as_ref().map_or(true, |re| re.is_match(value));

        if !self.host_types.is_empty() && !contains(&self.host_types, target.host_type) {
            return false;
        }
        if contains(&self.exclude_host_types, target.host_type) {
            return false;
        }
        if !self.layer_ids.is_empty() && !contains(&self.layer_ids, target.layer_id) {
            return false;
        }
        if contains(&self.exclude_layer_ids, target.layer_id) {
            return false;
        }

        pattern_ok(&self.hostname, target.hostname)
            && pattern_ok(&self.prefecture, &target.parsed.prefecture_code)
            && pattern_ok(&self.building, &target.parsed.building_code)
            && pattern_ok(&self.unit, &target.parsed.unit_code)
    }
}

/// A category definition paired with its compiled predicate
#[derive(Debug, Clone)]
pub struct CompiledCategory {
    pub define: CategoryDefine,
    matcher: CompiledMatch,
    has_rule: bool,
}

impl CompiledCategory {
    pub fn compile(define: &CategoryDefine) -> Result<Self, ConfigError> {
        let matcher = CompiledMatch::compile(define)?;
        let has_rule = matcher.has_rule();
        Ok(Self {
            define: define.clone(),
            matcher,
            has_rule,
        })
    }

    /// Whether the category can ever be selected
    pub fn has_rule(&self) -> bool {
        self.has_rule
    }

    pub fn matches(&self, target: &CategoryTarget<'_>) -> bool {
        self.has_rule && self.matcher.accepts(target)
    }
}

/// Ordered category table
#[derive(Debug, Clone, Default)]
pub struct CategoryMatcher {
    categories: Vec<CompiledCategory>,
}

impl CategoryMatcher {
    /// Compile every category; ids must be unique
    pub fn compile(categories: &[CategoryDefine]) -> Result<Self, ConfigError> {
        let mut ids: HashSet<&str> = HashSet::new();
        if let Some(duplicate) = categories.iter().find(|c| !ids.insert(c.id.as_str())) {
            return Err(ConfigError::DuplicateCategory(duplicate.id.clone()));
        }

        let categories = categories
            .iter()
            .map(CompiledCategory::compile)
            .collect::<Result<Vec<_>, _>>()?;

        for category in categories.iter().filter(|c| !c.has_rule()) {
            tracing::warn!(
                category = %category.define.id,
                "category has no match rule and will never be selected"
            );
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryDefine> {
        self.categories.iter().map(|c| &c.define)
    }

    pub fn get(&self, id: &str) -> Option<&CategoryDefine> {
        self.categories().find(|c| c.id == id)
    }

    /// First category accepting the target, or the fallback category
    pub fn find_category_for_host(&self, target: &CategoryTarget<'_>) -> CategoryDefine {
        self.categories
            .iter()
            .find(|category| category.matches(target))
            .map(|category| category.define.clone())
            .unwrap_or_else(|| fallback_category(target.host_type))
    }
}
