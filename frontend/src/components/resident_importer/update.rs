//! Update function for the resident importer.
//!
//! Every staging rule (phases, selection, edits, dispatch reconciliation) is
//! delegated to `ImporterSession`; this function only wires messages to it and
//! runs the backend calls on `spawn_local`.

use common::error::ImportError;
use common::jobs::JobStatus;
use common::requests::DispatchRequest;
use common::session::Phase;
use gloo_console::{log, warn};
use yew::platform::spawn_local;
use yew::prelude::*;

use super::helpers::{job_status, organize_text, show_toast, start_dispatch, upload_file};
use super::messages::{Field, Msg};
use super::state::{poll_delay_ms, ResidentImporter};

pub fn update(component: &mut ResidentImporter, ctx: &Context<ResidentImporter>, msg: Msg) -> bool {
    match msg {
        Msg::SetPasteText(text) => {
            component.session.paste_text = text;
            false
        }
        Msg::SetQuickAddText(text) => {
            component.session.quick_add_text = text;
            false
        }
        Msg::OpenFileDialog => {
            if let Some(input) = component.file_input_ref.cast::<web_sys::HtmlInputElement>() {
                input.click();
            }
            false
        }
        Msg::FileSelected(file) => {
            if component.parsing || component.session.phase() != Phase::Input {
                return false;
            }
            component.parsing = true;
            component.session.dismiss_error();
            let link = ctx.link().clone();
            spawn_local(async move {
                link.send_message(Msg::Parsed(upload_file(file).await));
            });
            true
        }
        Msg::Organize => {
            if component.parsing || component.session.phase() != Phase::Input {
                return false;
            }
            let text = component.session.paste_text.clone();
            if text.trim().is_empty() {
                component.session.report_error(&ImportError::EmptyResult);
                return true;
            }
            component.parsing = true;
            component.session.dismiss_error();
            let link = ctx.link().clone();
            spawn_local(async move {
                link.send_message(Msg::Parsed(organize_text(text).await));
            });
            true
        }
        Msg::QuickAdd => {
            if let Ok(count) = component.session.quick_add() {
                component.columns.clear();
                component.interpreted = false;
                log!(format!("quick-add staged {} residents", count));
            }
            true
        }
        Msg::Parsed(result) => {
            component.parsing = false;
            match result {
                Ok(response) => {
                    if let Ok(count) = component.session.load_parsed(response.residents) {
                        component.columns = response.columns;
                        component.interpreted = response.interpreted;
                        log!(format!("staged {} residents", count));
                    }
                }
                Err(e) => component.session.report_error(&e),
            }
            true
        }
        Msg::ToggleSelect(id) => component.session.toggle_select(id),
        Msg::ToggleSelectAll => component.session.toggle_select_all(),
        Msg::StartEdit(id) => component.session.start_edit(id),
        Msg::EditField(field, value) => {
            let Some(mut draft) = component.session.editing().map(|e| e.draft.clone()) else {
                return false;
            };
            match field {
                Field::Name => draft.name = value,
                Field::Email => draft.email = value,
                Field::Unit => draft.unit = value,
                Field::Phone => draft.phone = value,
            }
            component.session.update_draft(draft);
            false
        }
        Msg::SaveEdit => {
            let Some(draft) = component.session.editing().map(|e| e.draft.clone()) else {
                return false;
            };
            component.session.save_edit(draft)
        }
        Msg::CancelEdit => component.session.cancel_edit(),
        Msg::Delete(id) => component.session.delete_record(id),
        Msg::Send => {
            let Ok(residents) = component.session.begin_dispatch() else {
                return true;
            };
            let props = ctx.props();
            let request = DispatchRequest {
                context: props.context.clone(),
                mode: props.mode,
                residents,
            };
            component.poll_failures = 0;
            let link = ctx.link().clone();
            spawn_local(async move {
                link.send_message(Msg::DispatchStarted(start_dispatch(request).await));
            });
            true
        }
        Msg::DispatchStarted(Ok(job_id)) => {
            component.job_id = Some(job_id);
            schedule_poll(ctx, poll_delay_ms(0));
            false
        }
        Msg::DispatchStarted(Err(e)) => {
            if component.session.fail_dispatch(&e).is_err() {
                warn!("dispatch start answered outside of sending");
            }
            true
        }
        Msg::Poll => {
            let Some(job_id) = component.job_id.clone() else {
                return false;
            };
            let link = ctx.link().clone();
            spawn_local(async move {
                link.send_message(Msg::JobPolled(job_status(job_id).await));
            });
            false
        }
        Msg::JobPolled(Ok(status)) => {
            let reconnected = component.poll_failures > 0;
            component.poll_failures = 0;
            on_job_status(component, ctx, status) || reconnected
        }
        Msg::JobPolled(Err(e)) => {
            // the job keeps running server side; keep following it
            if component.job_id.is_none() {
                return false;
            }
            warn!(format!("status poll failed: {}", e));
            component.poll_failures = component.poll_failures.saturating_add(1);
            schedule_poll(ctx, poll_delay_ms(component.poll_failures));
            component.poll_failures == 1
        }
        Msg::DismissError => {
            component.session.dismiss_error();
            true
        }
        Msg::Reset => {
            if component.session.reset().is_ok() {
                component.clear_import();
            }
            true
        }
    }
}

fn on_job_status(component: &mut ResidentImporter, ctx: &Context<ResidentImporter>, status: JobStatus) -> bool {
    match status {
        JobStatus::Pending => {
            schedule_poll(ctx, poll_delay_ms(0));
            false
        }
        JobStatus::InProgress { sent, total } => {
            component.session.record_progress(sent, total);
            schedule_poll(ctx, poll_delay_ms(0));
            true
        }
        JobStatus::Completed(result) => {
            component.job_id = None;
            let on_complete = ctx.props().on_complete.clone();
            if component
                .session
                .complete_dispatch(result, |completion| on_complete.emit(completion))
                .is_ok()
            {
                if let Some(report) = component.session.last_report() {
                    show_toast(&report.headline);
                }
            }
            true
        }
        JobStatus::Failed(message) => {
            component.job_id = None;
            let _ = component
                .session
                .fail_dispatch(&ImportError::upstream(Some(message.as_str())));
            true
        }
    }
}

fn schedule_poll(ctx: &Context<ResidentImporter>, delay_ms: u32) {
    let link = ctx.link().clone();
    spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(delay_ms).await;
        link.send_message(Msg::Poll);
    });
}
