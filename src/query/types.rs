use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::Predicate;

/// Query validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_clause_count: usize,  // all clauses in the tree
    pub max_depth: usize,         // nested parenthesis levels
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            max_clause_count: 1024,
            max_depth: 32,
        }
    }
}

/// Rejects predicate trees the compiler should not lower
pub struct QueryValidator {
    config: ValidationConfig,
}

impl QueryValidator {
    pub fn new(config: ValidationConfig) -> Self {
        QueryValidator { config }
    }

    /// Validate query structure and constraints
    pub fn validate(&self, predicate: &Predicate) -> Result<()> {
        let mut clauses = 0;
        self.walk(predicate, 0, &mut clauses)
    }

    fn walk(&self, predicate: &Predicate, depth: usize, clauses: &mut usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::new(
                ErrorKind::TooComplex,
                format!("Query depth {} exceeds maximum {}", depth, self.config.max_depth),
            ));
        }

        if let Predicate::Logical(logical) = predicate {
            *clauses += logical.clauses.len();
            if *clauses > self.config.max_clause_count {
                return Err(Error::new(
                    ErrorKind::TooComplex,
                    format!("Query has more than {} clauses", self.config.max_clause_count),
                ));
            }
            for clause in &logical.clauses {
                self.walk(&clause.predicate, depth + 1, clauses)?;
            }
        }
        Ok(())
    }
}
