use datadef_core::GenericEntity;
use serde::Serialize;

use crate::criteria::SearchCriteria;

/// One page of a search with its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    entities: Vec<GenericEntity>,
    criteria: SearchCriteria,
    total_count: u64,
}

impl ResultPage {
    /// `total_count` is raised to the page length when it is smaller.
    pub fn new(entities: Vec<GenericEntity>, criteria: SearchCriteria, total_count: u64) -> Self {
        let total_count = total_count.max(entities.len() as u64);
        Self {
            entities,
            criteria,
            total_count,
        }
    }

    pub fn entities(&self) -> &[GenericEntity] {
        &self.entities
    }

    /// The criteria this page was searched with.
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// Live records matching the restrictions, regardless of paging.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(self.criteria.max_results())
    }

    /// Whether records remain after this page.
    pub fn has_next(&self) -> bool {
        self.criteria.first_result() + (self.entities.len() as u64) < self.total_count
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_entities(self) -> Vec<GenericEntity> {
        self.entities
    }
}
