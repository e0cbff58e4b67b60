//! # Index Queries
//!
//! Predicate, sort and pagination over index entries.

use super::entry::IndexEntry;
use crate::errors::IndexError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, OutputKind};
use std::cmp::Ordering;

/// Page size used when `page` is given without `page_size`.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Filter over index entries. Every `None` criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexFilter {
    /// Entries must carry all of these tags (any of them with `tags_or`).
    pub tags: Vec<String>,
    /// Match any tag instead of all tags.
    pub tags_or: bool,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: Option<OutputKind>,
    /// Producing module (case-insensitive).
    pub module: Option<String>,
    /// Input sender.
    pub msg_sender: Option<Address>,
    /// Timestamp lower bound (inclusive).
    pub timestamp_gte: Option<u64>,
    /// Timestamp upper bound (inclusive).
    pub timestamp_lte: Option<u64>,
    /// Exact input index.
    pub input_index: Option<u64>,
    /// Input index lower bound (inclusive).
    pub input_index_gte: Option<u64>,
    /// Input index upper bound (inclusive).
    pub input_index_lte: Option<u64>,
    /// Application contract.
    pub app_contract: Option<Address>,
    /// Comma-separated sort fields.
    pub order_by: Option<String>,
    /// Comma-separated `asc`/`desc`, matched to `order_by` by position.
    pub order_dir: Option<String>,
    /// 1-based page number; no pagination when absent.
    pub page: Option<u64>,
    /// Page size (defaults to [`DEFAULT_PAGE_SIZE`]).
    pub page_size: Option<u64>,
}

impl IndexFilter {
    /// Returns true if `entry` satisfies every predicate.
    #[must_use]
    pub fn matches(&self, entry: &IndexEntry) -> bool {
        if !self.tags.is_empty() {
            let hit = if self.tags_or {
                self.tags.iter().any(|t| entry.tags.contains(t))
            } else {
                self.tags.iter().all(|t| entry.tags.contains(t))
            };
            if !hit {
                return false;
            }
        }
        if self.kind.is_some_and(|k| k != entry.kind) {
            return false;
        }
        if let Some(module) = &self.module {
            if !module.eq_ignore_ascii_case(&entry.module) {
                return false;
            }
        }
        if self.msg_sender.is_some_and(|s| s != entry.msg_sender) {
            return false;
        }
        if self.timestamp_gte.is_some_and(|t| entry.timestamp < t)
            || self.timestamp_lte.is_some_and(|t| entry.timestamp > t)
        {
            return false;
        }
        if self.input_index.is_some_and(|i| entry.input_index != i)
            || self.input_index_gte.is_some_and(|i| entry.input_index < i)
            || self.input_index_lte.is_some_and(|i| entry.input_index > i)
        {
            return false;
        }
        if self.app_contract.is_some() && self.app_contract != entry.app_contract {
            return false;
        }
        true
    }

    /// Parses `order_by` / `order_dir` into sort keys.
    pub fn sort_keys(&self) -> Result<Vec<(OrderField, bool)>, IndexError> {
        let Some(order_by) = self.order_by.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let dirs: Vec<&str> = self
            .order_dir
            .as_deref()
            .map(|d| d.split(',').map(str::trim).collect())
            .unwrap_or_default();

        order_by
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(i, name)| {
                let field = OrderField::parse(name)?;
                let descending = match dirs.get(i).copied() {
                    None | Some("asc") => false,
                    Some("desc") => true,
                    Some(other) => return Err(IndexError::InvalidOrderDir(other.to_string())),
                };
                Ok((field, descending))
            })
            .collect()
    }

    /// Filters, sorts and paginates `entries` (assumed in insertion order).
    pub fn apply(&self, entries: Vec<IndexEntry>) -> Result<IndexPage, IndexError> {
        let keys = self.sort_keys()?;
        let mut hits: Vec<IndexEntry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        let total = hits.len();

        if !keys.is_empty() {
            hits.sort_by(|a, b| {
                keys.iter()
                    .map(|(field, desc)| {
                        let ord = field.compare(a, b);
                        if *desc {
                            ord.reverse()
                        } else {
                            ord
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let Some(page) = self.page else {
            return Ok(IndexPage {
                entries: hits,
                total,
                page: 1,
            });
        };
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 || page_size == 0 {
            return Err(IndexError::InvalidPage(format!(
                "page={page} page_size={page_size}"
            )));
        }
        let skip = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        Ok(IndexPage {
            entries: hits.into_iter().skip(skip).take(take).collect(),
            total,
            page,
        })
    }
}

/// Fields entries can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    /// Insertion order.
    Id,
    /// Entry kind.
    Kind,
    /// Module name.
    Module,
    /// Payload type name.
    ClassName,
    /// Input sender.
    MsgSender,
    /// Block number.
    BlockNumber,
    /// Block timestamp.
    Timestamp,
    /// Epoch.
    EpochIndex,
    /// Input index.
    InputIndex,
    /// Output index.
    OutputIndex,
    /// Numeric value.
    Value,
}

impl OrderField {
    /// Parses a field name.
    pub fn parse(name: &str) -> Result<Self, IndexError> {
        Ok(match name {
            "id" => Self::Id,
            "type" | "kind" => Self::Kind,
            "module" => Self::Module,
            "class_name" => Self::ClassName,
            "msg_sender" => Self::MsgSender,
            "block_number" => Self::BlockNumber,
            "timestamp" => Self::Timestamp,
            "epoch_index" => Self::EpochIndex,
            "input_index" => Self::InputIndex,
            "output_index" => Self::OutputIndex,
            "value" => Self::Value,
            other => return Err(IndexError::UnknownOrderField(other.to_string())),
        })
    }

    fn compare(self, a: &IndexEntry, b: &IndexEntry) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Kind => a.kind.cmp(&b.kind),
            Self::Module => a.module.cmp(&b.module),
            Self::ClassName => a.class_name.cmp(&b.class_name),
            Self::MsgSender => a.msg_sender.cmp(&b.msg_sender),
            Self::BlockNumber => a.block_number.cmp(&b.block_number),
            Self::Timestamp => a.timestamp.cmp(&b.timestamp),
            Self::EpochIndex => a.epoch_index.cmp(&b.epoch_index),
            Self::InputIndex => a.input_index.cmp(&b.input_index),
            Self::OutputIndex => a.output_index.cmp(&b.output_index),
            Self::Value => a.value.cmp(&b.value),
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPage {
    /// Entries on this page.
    #[serde(rename = "data")]
    pub entries: Vec<IndexEntry>,
    /// Number of matches across all pages.
    pub total: usize,
    /// Page number.
    pub page: u64,
}
