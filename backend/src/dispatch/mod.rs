//! Batch dispatcher.
//!
//! Takes the residents selected in review and performs the side effects of the
//! chosen [`DispatchMode`], one awaited call at a time so progress only ever
//! moves forward.
//!
//! Failure policy:
//! - a persistence error aborts the batch and is returned as `Err`; rows
//!   persisted before it stay persisted (no rollback). Rows are upserted, by
//!   email or by name and unit when there is none, so a retry adds no duplicates;
//! - a failed invitation is counted in `emails_failed` and the batch goes on.

pub mod mailer;
pub mod store;

use common::error::ImportError;
use common::model::batch::{BatchResult, DispatchMode};
use common::model::resident::ParsedResident;
use common::requests::ImporterContext;
use log::{error, info, warn};
use mailer::{Invite, Mailer};
use std::sync::Arc;
use store::{ResidentStore, StoreError};

#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn ResidentStore>,
    mailer: Arc<dyn Mailer>,
}

fn store_failure(e: StoreError) -> ImportError {
    error!("batch aborted: {}", e);
    ImportError::upstream(Some(e.to_string().as_str()))
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl Dispatcher {
    pub fn new(store: Arc<dyn ResidentStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Runs one dispatch in `mode`. `on_progress(sent, total)` fires after every
    /// attempted invitation; modes that send nothing never call it.
    pub async fn dispatch<F>(
        &self,
        ctx: &ImporterContext,
        mode: DispatchMode,
        residents: &[ParsedResident],
        on_progress: F,
    ) -> Result<BatchResult, ImportError>
    where
        F: FnMut(u32, u32) + Send,
    {
        if residents.is_empty() {
            return Err(ImportError::NothingSelected);
        }
        let result = match mode {
            DispatchMode::Invite => self.persist_and_invite(ctx, residents, on_progress).await,
            DispatchMode::SaveOnly => self.persist_only(ctx, residents).await,
            DispatchMode::Roster => self.add_to_roster(ctx, residents).await,
        }?;
        info!(
            "dispatch for building {} finished: {:?} saved={} sent={} failed={}",
            ctx.building_id, mode, result.total_saved, result.emails_sent, result.emails_failed
        );
        Ok(result)
    }

    /// Persists every resident and invites those with an address.
    pub async fn persist_and_invite<F>(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
        mut on_progress: F,
    ) -> Result<BatchResult, ImportError>
    where
        F: FnMut(u32, u32) + Send,
    {
        let (addressed, unaddressed): (Vec<&ParsedResident>, Vec<&ParsedResident>) =
            residents.iter().partition(|r| !r.email.trim().is_empty());

        if !unaddressed.is_empty() {
            let rows: Vec<ParsedResident> = unaddressed.iter().map(|r| (*r).clone()).collect();
            self.store
                .save_invitations(ctx, &rows)
                .await
                .map_err(store_failure)?;
        }

        let total = count(addressed.len());
        let mut result = BatchResult {
            saved_without_email: count(unaddressed.len()),
            total_saved: count(unaddressed.len()),
            ..Default::default()
        };

        for (i, resident) in addressed.iter().enumerate() {
            self.store
                .save_invitations(ctx, std::slice::from_ref(*resident))
                .await
                .map_err(store_failure)?;
            result.total_saved += 1;

            let invite = Invite {
                to: &resident.email,
                name: &resident.name,
                unit: &resident.unit,
                building_id: &ctx.building_id,
                building_name: &ctx.building_name,
                invited_by: &ctx.actor_id,
            };
            match self.mailer.send_invite(&invite).await {
                Ok(()) => {
                    result.emails_sent += 1;
                    if let Err(e) = self.store.mark_invited(ctx, &resident.email).await {
                        warn!("invitation to {} sent but not marked: {}", resident.email, e);
                    }
                }
                Err(e) => {
                    warn!("invitation to {} failed: {}", resident.email, e);
                    result.emails_failed += 1;
                }
            }
            on_progress(count(i + 1), total);
        }

        Ok(result)
    }

    /// Persists every resident without sending anything.
    pub async fn persist_only(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<BatchResult, ImportError> {
        self.store
            .save_invitations(ctx, residents)
            .await
            .map_err(store_failure)?;
        Ok(BatchResult {
            total_saved: count(residents.len()),
            saved_without_email: count(residents.iter().filter(|r| r.email.trim().is_empty()).count()),
            ..Default::default()
        })
    }

    /// Adds every resident to the building roster.
    pub async fn add_to_roster(
        &self,
        ctx: &ImporterContext,
        residents: &[ParsedResident],
    ) -> Result<BatchResult, ImportError> {
        self.store
            .save_roster(ctx, residents)
            .await
            .map_err(store_failure)?;
        Ok(BatchResult {
            total_saved: count(residents.len()),
            saved_without_email: count(residents.iter().filter(|r| r.email.trim().is_empty()).count()),
            is_roster: true,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::mailer::InMemoryMailer;
    use super::store::InMemoryStore;
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> ImporterContext {
        ImporterContext {
            building_id: "b1".into(),
            actor_id: "manager-1".into(),
            building_name: "Maple Court".into(),
        }
    }

    fn resident(name: &str, email: &str) -> ParsedResident {
        ParsedResident {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    fn three_selected() -> Vec<ParsedResident> {
        vec![
            resident("Ann Lee", "ann@x.com"),
            resident("Bob Roy", "bob@x.com"),
            resident("Cy Dahl", ""),
        ]
    }

    /// Fails every write after `ok_calls` successful ones, or only the next
    /// one when `recovers` is set.
    struct FlakyStore {
        inner: InMemoryStore,
        ok_calls: usize,
        recovers: bool,
        calls: AtomicUsize,
    }

    impl FlakyStore {
        fn failing_after(ok_calls: usize) -> Self {
            Self {
                inner: InMemoryStore::new(),
                ok_calls,
                recovers: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_once_after(ok_calls: usize) -> Self {
            Self {
                recovers: true,
                ..Self::failing_after(ok_calls)
            }
        }

        fn tick(&self) -> Result<(), StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let failing = if self.recovers {
                call == self.ok_calls
            } else {
                call >= self.ok_calls
            };
            if failing {
                Err(StoreError::Unavailable("connection reset".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ResidentStore for FlakyStore {
        async fn save_invitations(
            &self,
            ctx: &ImporterContext,
            residents: &[ParsedResident],
        ) -> Result<(), StoreError> {
            self.tick()?;
            self.inner.save_invitations(ctx, residents).await
        }

        async fn mark_invited(&self, ctx: &ImporterContext, email: &str) -> Result<(), StoreError> {
            self.inner.mark_invited(ctx, email).await
        }

        async fn save_roster(
            &self,
            ctx: &ImporterContext,
            residents: &[ParsedResident],
        ) -> Result<(), StoreError> {
            self.tick()?;
            self.inner.save_roster(ctx, residents).await
        }
    }

    #[tokio::test]
    async fn invite_counts_send_failures_without_aborting() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(InMemoryMailer::failing_for(["bob@x.com"]));
        let dispatcher = Dispatcher::new(store.clone(), mailer.clone());

        let mut progress = Vec::new();
        let result = dispatcher
            .dispatch(&ctx(), DispatchMode::Invite, &three_selected(), |sent, total| {
                progress.push((sent, total))
            })
            .await
            .unwrap();

        assert_eq!(
            result,
            BatchResult {
                total_saved: 3,
                emails_sent: 1,
                emails_failed: 1,
                saved_without_email: 1,
                is_roster: false,
            }
        );
        assert_eq!(progress, [(1, 2), (2, 2)]);
        assert_eq!(mailer.sent(), ["ann@x.com"]);

        let stored = store.invitations();
        assert_eq!(stored.len(), 3);
        let invited: Vec<_> = stored.iter().filter(|s| s.invited).map(|s| s.resident.email.as_str()).collect();
        assert_eq!(invited, ["ann@x.com"]);
    }

    #[tokio::test]
    async fn save_only_sends_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(InMemoryMailer::new());
        let dispatcher = Dispatcher::new(store.clone(), mailer.clone());

        let mut calls = 0;
        let result = dispatcher
            .dispatch(&ctx(), DispatchMode::SaveOnly, &three_selected(), |_, _| calls += 1)
            .await
            .unwrap();

        assert_eq!(result.total_saved, 3);
        assert_eq!(result.emails_sent, 0);
        assert_eq!(result.saved_without_email, 1);
        assert!(!result.is_roster);
        assert_eq!(calls, 0);
        assert!(mailer.sent().is_empty());
        assert_eq!(store.invitations().len(), 3);
    }

    #[tokio::test]
    async fn roster_mode_uses_the_roster_table() {
        let store = Arc::new(InMemoryStore::new());
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(InMemoryMailer::new()));

        let result = dispatcher
            .dispatch(&ctx(), DispatchMode::Roster, &three_selected(), |_, _| {})
            .await
            .unwrap();

        assert!(result.is_roster);
        assert_eq!(result.total_saved, 3);
        assert_eq!(store.roster().len(), 3);
        assert!(store.invitations().is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_aborts_and_keeps_earlier_rows() {
        // unaddressed batch and Ann succeed, Bob's write fails
        let store = Arc::new(FlakyStore::failing_after(2));
        let mailer = Arc::new(InMemoryMailer::new());
        let dispatcher = Dispatcher::new(store.clone(), mailer.clone());

        let err = dispatcher
            .dispatch(&ctx(), DispatchMode::Invite, &three_selected(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Upstream(ref m) if m.contains("connection reset")));
        assert_eq!(store.inner.invitations().len(), 2);
        assert_eq!(mailer.sent(), ["ann@x.com"]);
    }

    #[tokio::test]
    async fn retry_after_persistence_failure_does_not_duplicate_rows() {
        let store = Arc::new(FlakyStore::failing_once_after(2));
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(InMemoryMailer::new()));
        let mut batch = three_selected();
        batch[2].unit = "7".into();

        dispatcher
            .dispatch(&ctx(), DispatchMode::Invite, &batch, |_, _| {})
            .await
            .unwrap_err();
        let result = dispatcher
            .dispatch(&ctx(), DispatchMode::Invite, &batch, |_, _| {})
            .await
            .unwrap();

        assert_eq!(result.total_saved, 3);
        let stored = store.inner.invitations();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored.iter().filter(|s| s.resident.name == "Cy Dahl").count(), 1);
        assert!(stored.iter().filter(|s| !s.resident.email.is_empty()).all(|s| s.invited));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let dispatcher = Dispatcher::new(Arc::new(InMemoryStore::new()), Arc::new(InMemoryMailer::new()));
        let err = dispatcher
            .dispatch(&ctx(), DispatchMode::Invite, &[], |_, _| {})
            .await
            .unwrap_err();
        assert_eq!(err, ImportError::NothingSelected);
    }
}
