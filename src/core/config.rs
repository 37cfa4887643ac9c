use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::query::types::ValidationConfig;

/// Ordered "how many to score" limits for the paginated executor.
/// A trailing `0` stands for "everything remaining".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrowthBudgets(pub Vec<usize>);

impl Default for GrowthBudgets {
    fn default() -> Self {
        GrowthBudgets(vec![100, 1000, 10000, 0])
    }
}

impl GrowthBudgets {
    pub fn new(budgets: Vec<usize>) -> Result<Self> {
        let budgets = GrowthBudgets(budgets);
        budgets.validate()?;
        Ok(budgets)
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "growth budgets must not be empty"));
        }
        let last = self.0.len() - 1;
        let mut previous = 0;
        for (i, &budget) in self.0.iter().enumerate() {
            if budget == 0 {
                if i != last {
                    return Err(Error::new(
                        ErrorKind::InvalidArgument,
                        "unbounded growth budget (0) is only allowed as the last entry",
                    ));
                }
                continue;
            }
            if budget <= previous {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("growth budgets must be strictly increasing ({} after {})", budget, previous),
                ));
            }
            previous = budget;
        }
        Ok(())
    }

    /// Round sizes to try when at least `needed` hits are wanted. Starts at the
    /// smallest budget that can satisfy `needed`; unbounded rounds become
    /// `usize::MAX`. When every configured budget is too small a single round
    /// of exactly `needed` is returned.
    pub fn schedule(&self, needed: usize) -> Vec<usize> {
        let start = self.0.iter().position(|&b| b == 0 || b >= needed);
        match start {
            Some(i) => self.0[i..]
                .iter()
                .map(|&b| if b == 0 { usize::MAX } else { b })
                .collect(),
            None => vec![needed],
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.last() == Some(&0)
    }
}

/// Field names used by the automatic filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofilterConfig {
    pub system_field: String,
    pub lifespan_enabled_field: String,
    pub valid_from_field: String,
    pub valid_till_field: String,
}

impl Default for AutofilterConfig {
    fn default() -> Self {
        AutofilterConfig {
            system_field: "IsSystemContent".to_string(),
            lifespan_enabled_field: "EnableLifespan".to_string(),
            valid_from_field: "ValidFrom".to_string(),
            valid_till_field: "ValidTill".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub growth_budgets: GrowthBudgets,
    pub validation: ValidationConfig,
    pub autofilter: AutofilterConfig,
    pub fuzzy_default_similarity: f32,   // used by a bare `~`
    pub max_fuzzy_edits: u8,             // Levenshtein DFA limit
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            growth_budgets: GrowthBudgets::default(),
            validation: ValidationConfig::default(),
            autofilter: AutofilterConfig::default(),
            fuzzy_default_similarity: 0.5,
            max_fuzzy_edits: 2,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.growth_budgets.validate()?;
        if !(0.0..=1.0).contains(&self.fuzzy_default_similarity) {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("fuzzy_default_similarity {} is outside 0..=1", self.fuzzy_default_similarity),
            ));
        }
        if self.max_fuzzy_edits > 2 {
            return Err(Error::new(ErrorKind::InvalidArgument, "max_fuzzy_edits must be 0, 1 or 2"));
        }
        if self.validation.max_depth == 0 || self.validation.max_clause_count == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument, "validation limits must be positive"));
        }
        Ok(())
    }
}
