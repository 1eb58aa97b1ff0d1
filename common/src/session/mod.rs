//! Review/edit staging store for one import session.
//!
//! The session owns the candidate records between parsing and dispatch and
//! drives the phase machine:
//!
//! ```text
//! input --load--> review --begin_dispatch--> sending --complete--> done
//!   ^               |                           |                   |
//!   +----reset------+        review <--fail-----+                   |
//!   +------------------------------reset----------------------------+
//! ```
//!
//! Records are only mutable in `review`. While `sending`, the selected
//! records handed to the dispatcher are a snapshot (the tentative batch); the
//! staged collection itself is never touched, so a failed dispatch returns to
//! `review` with every edit and selection intact.

mod summary;

pub use summary::StagingSummary;

use crate::error::ImportError;
use crate::model::batch::BatchResult;
use crate::model::resident::{CandidateRecord, ParsedResident, RecordValues, dedupe};
use crate::quick_add::parse_email_list;
use crate::report::{Completion, ResultReport};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Input,
    Review,
    Sending,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Input => "waiting for input",
            Phase::Review => "reviewing",
            Phase::Sending => "sending",
            Phase::Done => "done",
        };
        f.write_str(label)
    }
}

/// The single record currently in inline-edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub id: u64,
    pub draft: RecordValues,
}

#[derive(Debug, Clone)]
pub struct ImporterSession {
    phase: Phase,
    records: Vec<CandidateRecord>,
    next_id: u64,
    all_selected: bool,
    editing: Option<EditState>,
    error: Option<String>,
    in_flight: Option<Vec<ParsedResident>>,
    progress: Option<(u32, u32)>,
    last_report: Option<ResultReport>,
    /// Free text pasted by the manager, sent to the organizer.
    pub paste_text: String,
    /// Comma/semicolon/newline separated addresses for quick-add.
    pub quick_add_text: String,
}

impl Default for ImporterSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImporterSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Input,
            records: Vec::new(),
            next_id: 1,
            all_selected: true,
            editing: None,
            error: None,
            in_flight: None,
            progress: None,
            last_report: None,
            paste_text: String::new(),
            quick_add_text: String::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn record(&self, id: u64) -> Option<&CandidateRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn all_selected(&self) -> bool {
        self.all_selected
    }

    pub fn editing(&self) -> Option<&EditState> {
        self.editing.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Residents handed to the running dispatch, if any.
    pub fn pending_batch(&self) -> Option<&[ParsedResident]> {
        self.in_flight.as_deref()
    }

    /// Latest `(sent, total)` reported by the running dispatch.
    pub fn progress(&self) -> Option<(u32, u32)> {
        self.progress
    }

    pub fn last_report(&self) -> Option<&ResultReport> {
        self.last_report.as_ref()
    }

    pub fn summary(&self) -> StagingSummary {
        StagingSummary::of(&self.records)
    }

    /// Shows a parse-phase failure without changing phase.
    pub fn report_error(&mut self, err: &ImportError) {
        self.error = Some(err.to_string());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn guard(&self, expected: Phase, action: &str) -> Result<(), ImportError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidPhase {
                action: action.to_string(),
                phase: self.phase.to_string(),
            })
        }
    }

    /// Stages parsed rows and moves to `review`.
    ///
    /// Rows are normalized and deduplicated first. If nothing survives, the
    /// session stays in `input` and shows an `EmptyResult` message.
    pub fn load_parsed(&mut self, rows: Vec<ParsedResident>) -> Result<usize, ImportError> {
        self.guard(Phase::Input, "load residents")?;

        let rows = dedupe(rows);
        if rows.is_empty() {
            self.report_error(&ImportError::EmptyResult);
            return Err(ImportError::EmptyResult);
        }

        self.records = rows
            .into_iter()
            .map(|row| {
                let id = self.next_id;
                self.next_id += 1;
                CandidateRecord::new(id, row)
            })
            .collect();
        self.all_selected = true;
        self.editing = None;
        self.error = None;
        self.phase = Phase::Review;
        Ok(self.records.len())
    }

    /// Parses `quick_add_text` locally and stages the result.
    pub fn quick_add(&mut self) -> Result<usize, ImportError> {
        let rows = parse_email_list(&self.quick_add_text);
        self.load_parsed(rows)
    }

    fn record_mut(&mut self, id: u64) -> Option<&mut CandidateRecord> {
        if self.phase != Phase::Review {
            return None;
        }
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn toggle_select(&mut self, id: u64) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.selected = !record.selected;
                true
            }
            None => false,
        }
    }

    /// Flips the session-wide flag and forces every record to match it.
    pub fn toggle_select_all(&mut self) -> bool {
        if self.phase != Phase::Review {
            return false;
        }
        self.all_selected = !self.all_selected;
        let selected = self.all_selected;
        self.records.iter_mut().for_each(|r| r.selected = selected);
        true
    }

    /// Opens `id` for editing, discarding any other open draft.
    pub fn start_edit(&mut self, id: u64) -> bool {
        let Some(values) = self.record_mut(id).map(|r| r.values()) else {
            return false;
        };
        self.editing = Some(EditState { id, draft: values });
        true
    }

    /// Keeps the in-progress draft without touching the record.
    pub fn update_draft(&mut self, values: RecordValues) -> bool {
        match self.editing.as_mut() {
            Some(edit) => {
                edit.draft = values;
                true
            }
            None => false,
        }
    }

    /// Applies `values` to the record being edited and closes the editor.
    pub fn save_edit(&mut self, values: RecordValues) -> bool {
        let Some(id) = self.editing.as_ref().map(|e| e.id) else {
            return false;
        };
        match self.record_mut(id) {
            Some(record) => {
                record.apply(&values);
                self.editing = None;
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.editing.take().is_some()
    }

    pub fn delete_record(&mut self, id: u64) -> bool {
        if self.phase != Phase::Review {
            return false;
        }
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.editing.as_ref().is_some_and(|e| e.id == id) {
            self.editing = None;
        }
        self.records.len() != before
    }

    /// Moves `review -> sending` and returns the selected residents to dispatch.
    pub fn begin_dispatch(&mut self) -> Result<Vec<ParsedResident>, ImportError> {
        self.guard(Phase::Review, "send")?;

        let batch: Vec<ParsedResident> = self
            .records
            .iter()
            .filter(|r| r.selected)
            .map(CandidateRecord::to_parsed)
            .collect();
        if batch.is_empty() {
            self.report_error(&ImportError::NothingSelected);
            return Err(ImportError::NothingSelected);
        }

        self.error = None;
        self.progress = None;
        self.in_flight = Some(batch.clone());
        self.phase = Phase::Sending;
        Ok(batch)
    }

    /// Records dispatch progress. Late or out-of-order updates are ignored so
    /// the reported count never moves backwards.
    pub fn record_progress(&mut self, sent: u32, total: u32) {
        if self.phase != Phase::Sending {
            return;
        }
        match self.progress {
            Some((seen, _)) if sent < seen => {}
            _ => self.progress = Some((sent, total)),
        }
    }

    /// Confirms the dispatch, moves to `done` and hands the completion to the
    /// hosting screen.
    pub fn complete_dispatch<F>(&mut self, result: BatchResult, on_complete: F) -> Result<(), ImportError>
    where
        F: FnOnce(Completion),
    {
        self.guard(Phase::Sending, "complete a dispatch")?;

        let report = ResultReport::from(&result);
        let completion = report.completion();
        self.last_report = Some(report);
        self.in_flight = None;
        self.progress = None;
        self.phase = Phase::Done;
        on_complete(completion);
        Ok(())
    }

    /// The whole batch failed: back to `review` with staged data untouched.
    pub fn fail_dispatch(&mut self, err: &ImportError) -> Result<(), ImportError> {
        self.guard(Phase::Sending, "fail a dispatch")?;

        self.in_flight = None;
        self.progress = None;
        self.report_error(err);
        self.phase = Phase::Review;
        Ok(())
    }

    /// Discards staged records, inputs and the last result and returns to
    /// `input`. Ids keep counting so none is reused within the session.
    pub fn reset(&mut self) -> Result<(), ImportError> {
        if self.phase == Phase::Sending {
            return Err(ImportError::InvalidPhase {
                action: "start over".to_string(),
                phase: self.phase.to_string(),
            });
        }
        self.records.clear();
        self.all_selected = true;
        self.editing = None;
        self.error = None;
        self.in_flight = None;
        self.progress = None;
        self.last_report = None;
        self.paste_text.clear();
        self.quick_add_text.clear();
        self.phase = Phase::Input;
        Ok(())
    }
}
