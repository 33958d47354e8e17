//! Campaign aggregate rows and assembly.
//!
//! A campaign is stored across three tables (`campaigns`,
//! `record_statistics`, `page_statistics`); `assemble` folds the rows back
//! into the in-memory aggregate.

use std::collections::HashMap;

use sqlx::FromRow;

use quire_core::campaign::{Campaign, PageStatistic, RecordStatistic, StatisticMode};
use quire_core::error::CoreError;
use quire_core::status::CrowdsourcingStatus;
use quire_core::types::{DbId, Timestamp};

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow)]
pub struct CampaignRow {
    pub id: DbId,
    pub name: String,
    pub statistic_mode: String,
    pub questions: serde_json::Value,
    pub restrict_annotation_access: bool,
    pub show_log: bool,
    pub access_condition: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `record_statistics` table.
#[derive(Debug, Clone, FromRow)]
pub struct RecordStatisticRow {
    pub id: DbId,
    pub campaign_id: DbId,
    pub pi: String,
    pub status: String,
    pub annotators: Vec<String>,
    pub reviewers: Vec<String>,
}

/// A row from the `page_statistics` table.
#[derive(Debug, Clone, FromRow)]
pub struct PageStatisticRow {
    pub id: DbId,
    pub record_statistic_id: DbId,
    pub page_order: i32,
    pub status: String,
    pub annotators: Vec<String>,
    pub reviewers: Vec<String>,
}

/// Fold campaign, record-statistic, and page-statistic rows into the
/// aggregate. Page rows are joined to their record rows via
/// `record_statistic_id`.
pub fn assemble(
    campaign: CampaignRow,
    records: Vec<RecordStatisticRow>,
    pages: Vec<PageStatisticRow>,
) -> Result<Campaign, CoreError> {
    let questions = serde_json::from_value(campaign.questions).map_err(|e| {
        CoreError::Storage(format!(
            "campaign {} has malformed questions JSON: {e}",
            campaign.id
        ))
    })?;

    let mut statistics = HashMap::with_capacity(records.len());
    let mut record_pis: HashMap<DbId, String> = HashMap::with_capacity(records.len());

    for row in records {
        let mut stat = RecordStatistic::new(row.pi.clone());
        stat.status = CrowdsourcingStatus::from_str(&row.status)?;
        stat.annotators = row.annotators.into_iter().collect();
        stat.reviewers = row.reviewers.into_iter().collect();
        record_pis.insert(row.id, row.pi.clone());
        statistics.insert(row.pi, stat);
    }

    for row in pages {
        let pi = record_pis.get(&row.record_statistic_id).ok_or_else(|| {
            CoreError::Storage(format!(
                "page statistic {} references unknown record statistic {}",
                row.id, row.record_statistic_id
            ))
        })?;
        let stat = statistics
            .get_mut(pi)
            .ok_or_else(|| CoreError::Storage(format!("missing record statistic for {pi}")))?;

        let mut page = PageStatistic::new(row.page_order);
        page.status = CrowdsourcingStatus::from_str(&row.status)?;
        page.annotators = row.annotators.into_iter().collect();
        page.reviewers = row.reviewers.into_iter().collect();
        stat.pages.insert(row.page_order, page);
    }

    Ok(Campaign {
        id: campaign.id,
        name: campaign.name,
        statistic_mode: StatisticMode::from_str(&campaign.statistic_mode)?,
        questions,
        restrict_annotation_access: campaign.restrict_annotation_access,
        show_log: campaign.show_log,
        access_condition: campaign.access_condition,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn campaign_row() -> CampaignRow {
        CampaignRow {
            id: 1,
            name: "Postcards".to_string(),
            statistic_mode: "PAGE".to_string(),
            questions: json!([{"text": "Transcribe", "metadata_fields": ["MD_TEXT"]}]),
            restrict_annotation_access: true,
            show_log: true,
            access_condition: Some("campaign_1".to_string()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn assembles_nested_statistics() {
        let records = vec![RecordStatisticRow {
            id: 10,
            campaign_id: 1,
            pi: "PPN1".to_string(),
            status: "ANNOTATE".to_string(),
            annotators: vec![],
            reviewers: vec![],
        }];
        let pages = vec![PageStatisticRow {
            id: 100,
            record_statistic_id: 10,
            page_order: 2,
            status: "REVIEW".to_string(),
            annotators: vec!["u1".to_string()],
            reviewers: vec![],
        }];

        let campaign = assemble(campaign_row(), records, pages).unwrap();

        assert_eq!(campaign.statistic_mode, StatisticMode::Page);
        assert_eq!(campaign.questions.len(), 1);
        let stat = &campaign.statistics["PPN1"];
        assert_eq!(stat.pages[&2].status, CrowdsourcingStatus::Review);
        assert!(stat.pages[&2].annotators.contains("u1"));
    }

    #[test]
    fn orphan_page_row_is_a_storage_error() {
        let pages = vec![PageStatisticRow {
            id: 100,
            record_statistic_id: 99,
            page_order: 1,
            status: "ANNOTATE".to_string(),
            annotators: vec![],
            reviewers: vec![],
        }];

        let err = assemble(campaign_row(), vec![], pages).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        let records = vec![RecordStatisticRow {
            id: 10,
            campaign_id: 1,
            pi: "PPN1".to_string(),
            status: "WEIRD".to_string(),
            annotators: vec![],
            reviewers: vec![],
        }];

        assert!(assemble(campaign_row(), records, vec![]).is_err());
    }
}
