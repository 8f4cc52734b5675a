//! Section context: serializable rendering payload built from an
//! [`ActivityFact`] and a deployment status token.

use serde::{Deserialize, Serialize};

use marksync_core::types::ActivityFact;

use crate::error::PatchError;

/// Values available to the section template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    /// `YYYY-MM-DD HH:MM:SS`, no timezone suffix.
    pub last_updated: String,
    /// First line of the latest qualifying commit, if known.
    pub commit_message: Option<String>,
    /// Deployment status token, `success` unless the caller says otherwise.
    pub status: String,
}

impl SectionContext {
    pub fn new(fact: &ActivityFact, status: impl Into<String>) -> Self {
        Self {
            last_updated: fact.formatted_timestamp(),
            commit_message: fact.message.clone(),
            status: status.into(),
        }
    }

    /// Convert to a [`tera::Context`].
    pub fn to_tera_context(&self) -> Result<tera::Context, PatchError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}
