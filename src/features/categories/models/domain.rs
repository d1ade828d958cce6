use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the independent category namespaces of the back office.
///
/// Trees, caches and views are always scoped to a single domain. Each variant
/// knows the table holding its categories and the table whose rows reference
/// them (those references block deletion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryDomain {
    /// Categories of quiz questions
    Question,
    /// Categories of knowledge-base articles
    KnowledgeBase,
    /// Categories of shop items
    Shop,
}

impl CategoryDomain {
    #[cfg(test)]
    pub const ALL: [CategoryDomain; 3] = [
        CategoryDomain::Question,
        CategoryDomain::KnowledgeBase,
        CategoryDomain::Shop,
    ];

    /// Path segment / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryDomain::Question => "question",
            CategoryDomain::KnowledgeBase => "knowledge-base",
            CategoryDomain::Shop => "shop",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            CategoryDomain::Question => "question_categories",
            CategoryDomain::KnowledgeBase => "knowledge_base_categories",
            CategoryDomain::Shop => "shop_categories",
        }
    }

    pub fn dependents_table(&self) -> &'static str {
        match self {
            CategoryDomain::Question => "questions",
            CategoryDomain::KnowledgeBase => "knowledge_base_articles",
            CategoryDomain::Shop => "shop_items",
        }
    }

    /// What a dependent record is called in user-facing messages
    pub fn dependent_label(&self) -> &'static str {
        match self {
            CategoryDomain::Question => "questions",
            CategoryDomain::KnowledgeBase => "articles",
            CategoryDomain::Shop => "shop items",
        }
    }
}

impl fmt::Display for CategoryDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_wire_names_match_serde() {
        for domain in CategoryDomain::ALL {
            let json = serde_json::to_string(&domain).unwrap();
            assert_eq!(json, format!("\"{}\"", domain.as_str()));
        }
    }

    #[test]
    fn test_domains_use_distinct_tables() {
        let tables: std::collections::HashSet<_> =
            CategoryDomain::ALL.iter().map(|d| d.table()).collect();
        assert_eq!(tables.len(), 3);
    }
}
