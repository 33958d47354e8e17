//! Campaign aggregate: per-record and per-page crowdsourcing statistics.
//!
//! The aggregate is loaded, mutated in memory, and handed back to the
//! storage collaborator as a whole. Concurrent loads/stores of the same
//! campaign are the store's problem (row-level locking); nothing here is
//! shared between requests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{transition, Attribution, CrowdsourcingStatus};
use crate::types::DbId;

/// Whether campaign progress is tracked per whole record or per page.
///
/// Immutable for the lifetime of a campaign so that status semantics stay
/// consistent. Modeled as a closed enum: an unhandled mode is a compile
/// error, not a silently ignored branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatisticMode {
    Record,
    Page,
}

impl StatisticMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "RECORD",
            Self::Page => "PAGE",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "RECORD" => Ok(Self::Record),
            "PAGE" => Ok(Self::Page),
            _ => Err(CoreError::Validation(format!(
                "Invalid statistic mode '{s}'. Must be one of: RECORD, PAGE"
            ))),
        }
    }
}

/// A question the campaign asks its annotators. The metadata field names
/// are opaque to this engine; the viewer uses them to map answers onto
/// record metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(default)]
    pub metadata_fields: Vec<String>,
}

/// Per-page crowdsourcing status and attribution.
///
/// The annotator/reviewer sets only grow; removal happens through explicit
/// user anonymization, which is an external operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStatistic {
    /// 1-based page order within the record.
    pub page_order: i32,
    pub status: CrowdsourcingStatus,
    pub annotators: BTreeSet<String>,
    pub reviewers: BTreeSet<String>,
}

impl PageStatistic {
    pub fn new(page_order: i32) -> Self {
        Self {
            page_order,
            status: CrowdsourcingStatus::Annotate,
            annotators: BTreeSet::new(),
            reviewers: BTreeSet::new(),
        }
    }

    /// Apply a requested transition, recording the acting user in the
    /// attribution set the transition implies.
    pub fn apply(
        &mut self,
        requested: CrowdsourcingStatus,
        acting_user: &str,
    ) -> Result<CrowdsourcingStatus, CoreError> {
        match transition(self.status, requested)? {
            Some(Attribution::Annotator) => {
                self.annotators.insert(acting_user.to_string());
            }
            Some(Attribution::Reviewer) => {
                self.reviewers.insert(acting_user.to_string());
            }
            None => {}
        }
        self.status = requested;
        Ok(self.status)
    }
}

/// Per-record crowdsourcing status, keyed by the record's PI within a
/// campaign.
///
/// In RECORD mode only `status` plus the record-level attribution sets are
/// authoritative and `pages` stays empty; in PAGE mode each page's
/// statistic is independent and the record-level status is not used for UI
/// purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatistic {
    pub pi: String,
    pub status: CrowdsourcingStatus,
    pub annotators: BTreeSet<String>,
    pub reviewers: BTreeSet<String>,
    pub pages: BTreeMap<i32, PageStatistic>,
}

impl RecordStatistic {
    pub fn new(pi: impl Into<String>) -> Self {
        Self {
            pi: pi.into(),
            status: CrowdsourcingStatus::Annotate,
            annotators: BTreeSet::new(),
            reviewers: BTreeSet::new(),
            pages: BTreeMap::new(),
        }
    }

    /// Apply a record-level transition with attribution.
    pub fn apply(
        &mut self,
        requested: CrowdsourcingStatus,
        acting_user: &str,
    ) -> Result<CrowdsourcingStatus, CoreError> {
        match transition(self.status, requested)? {
            Some(Attribution::Annotator) => {
                self.annotators.insert(acting_user.to_string());
            }
            Some(Attribution::Reviewer) => {
                self.reviewers.insert(acting_user.to_string());
            }
            None => {}
        }
        self.status = requested;
        Ok(self.status)
    }

    /// Get or create the statistic for a page (default status ANNOTATE).
    pub fn page_mut(&mut self, page_order: i32) -> &mut PageStatistic {
        self.pages
            .entry(page_order)
            .or_insert_with(|| PageStatistic::new(page_order))
    }
}

/// A crowdsourcing campaign over a set of records.
///
/// Created and edited by campaign administration, which is external; this
/// engine reads it and mutates its statistics when annotation or review
/// activity happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: DbId,
    pub name: String,
    pub statistic_mode: StatisticMode,
    pub questions: Vec<Question>,
    /// When set, saved annotations carry `access_condition` so the viewer
    /// can restrict who sees them.
    pub restrict_annotation_access: bool,
    /// Whether the record item snapshot includes the campaign log.
    pub show_log: bool,
    pub access_condition: Option<String>,
    /// Record statistics keyed by PI.
    pub statistics: HashMap<String, RecordStatistic>,
}

impl Campaign {
    /// Get or create the record statistic for a PI.
    pub fn record_mut(&mut self, pi: &str) -> &mut RecordStatistic {
        self.statistics
            .entry(pi.to_string())
            .or_insert_with(|| RecordStatistic::new(pi))
    }

    /// Apply a record-level status change. Only valid in RECORD mode.
    pub fn set_record_status(
        &mut self,
        pi: &str,
        requested: CrowdsourcingStatus,
        acting_user: &str,
    ) -> Result<CrowdsourcingStatus, CoreError> {
        match self.statistic_mode {
            StatisticMode::Record => self.record_mut(pi).apply(requested, acting_user),
            StatisticMode::Page => Err(CoreError::InvalidMode(
                "this campaign tracks status per page, not per record".to_string(),
            )),
        }
    }

    /// Apply a page-level status change. Only valid in PAGE mode.
    pub fn set_page_status(
        &mut self,
        pi: &str,
        page_order: i32,
        requested: CrowdsourcingStatus,
        acting_user: &str,
    ) -> Result<CrowdsourcingStatus, CoreError> {
        if page_order < 1 {
            return Err(CoreError::Validation(format!(
                "page order must be >= 1, got {page_order}"
            )));
        }
        match self.statistic_mode {
            StatisticMode::Page => self
                .record_mut(pi)
                .page_mut(page_order)
                .apply(requested, acting_user),
            StatisticMode::Record => Err(CoreError::InvalidMode(
                "this campaign tracks status per record, not per page".to_string(),
            )),
        }
    }

    /// Current record-level status for a PI; ANNOTATE if never touched.
    pub fn record_status(&self, pi: &str) -> CrowdsourcingStatus {
        self.statistics
            .get(pi)
            .map_or(CrowdsourcingStatus::Annotate, |stat| stat.status)
    }

    /// Per-page statuses for a PI (touched pages only).
    pub fn page_statuses(&self, pi: &str) -> BTreeMap<i32, CrowdsourcingStatus> {
        self.statistics
            .get(pi)
            .map(|stat| {
                stat.pages
                    .iter()
                    .map(|(order, page)| (*order, page.status))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The access condition copied onto annotations saved for this
    /// campaign, if annotation access is restricted.
    pub fn annotation_access_condition(&self) -> Option<&str> {
        if self.restrict_annotation_access {
            self.access_condition.as_deref()
        } else {
            None
        }
    }
}
