//! View rendering for the resident importer.
//!
//! One pane per phase: the input pane (upload, paste, quick-add), the review
//! table with its summary, the sending progress and the done report. The
//! error banner sits above whichever pane is shown.

use common::model::batch::DispatchMode;
use common::model::columns::ColumnRole;
use common::model::resident::CandidateRecord;
use common::session::{EditState, Phase};
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::prelude::*;

use super::helpers::residents_label;
use super::messages::{Field, Msg};
use super::state::ResidentImporter;

const ACCEPTED_FILES: &str = ".csv,.tsv,.txt,.xlsx,.xlsm,.xlsb,.xls,.ods";

pub fn view(component: &ResidentImporter, ctx: &Context<ResidentImporter>) -> Html {
    let link = ctx.link();
    html! {
        <div class="resident-importer">
            { error_banner(component, link) }
            {
                match component.session.phase() {
                    Phase::Input => input_pane(component, link),
                    Phase::Review => review_pane(component, ctx),
                    Phase::Sending => sending_pane(component),
                    Phase::Done => done_pane(component, link),
                }
            }
        </div>
    }
}

fn error_banner(component: &ResidentImporter, link: &Scope<ResidentImporter>) -> Html {
    match component.session.error() {
        Some(message) => html! {
            <div class="importer-error" role="alert">
                <span>{ message.to_string() }</span>
                <button class="icon-btn" title="Dismiss" onclick={link.callback(|_| Msg::DismissError)}>
                    <i class="material-icons">{"close"}</i>
                </button>
            </div>
        },
        None => html! {},
    }
}

fn input_pane(component: &ResidentImporter, link: &Scope<ResidentImporter>) -> Html {
    let busy = component.parsing;
    let on_file = link.batch_callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = input.files().and_then(|files| files.get(0));
        input.set_value("");
        file.map(Msg::FileSelected)
    });
    let on_paste = link.callback(|e: InputEvent| {
        let area: HtmlTextAreaElement = e.target_unchecked_into();
        Msg::SetPasteText(area.value())
    });
    let on_quick_add = link.callback(|e: InputEvent| {
        let area: HtmlTextAreaElement = e.target_unchecked_into();
        Msg::SetQuickAddText(area.value())
    });

    html! {
        <div class="importer-input">
            <section>
                <h3>{"Upload a file"}</h3>
                <p>{"CSV or spreadsheet with names, emails and units."}</p>
                <input
                    ref={component.file_input_ref.clone()}
                    type="file"
                    accept={ACCEPTED_FILES}
                    style="display: none;"
                    onchange={on_file}
                />
                <button class="icon-btn" disabled={busy} onclick={link.callback(|_| Msg::OpenFileDialog)}>
                    <i class="material-icons">{"upload_file"}</i>
                    <span class="icon-label">{"Choose file"}</span>
                </button>
            </section>
            <section>
                <h3>{"Paste anything"}</h3>
                <textarea
                    rows={8}
                    placeholder="Ann Lee, Unit 4B, ann@example.com"
                    value={component.session.paste_text.clone()}
                    oninput={on_paste}
                />
                <button disabled={busy} onclick={link.callback(|_| Msg::Organize)}>{"Organize"}</button>
            </section>
            <section>
                <h3>{"Quick add by email"}</h3>
                <textarea
                    rows={3}
                    placeholder="john.doe@example.com, jane_smith@example.com"
                    value={component.session.quick_add_text.clone()}
                    oninput={on_quick_add}
                />
                <button disabled={busy} onclick={link.callback(|_| Msg::QuickAdd)}>{"Add"}</button>
            </section>
            {
                if busy {
                    html! { <div class="importer-busy">{"Reading your residents..."}</div> }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn send_label(mode: DispatchMode, selected: usize) -> String {
    match mode {
        DispatchMode::Invite => format!("Send invitations to {}", residents_label(selected)),
        DispatchMode::SaveOnly => format!("Save {}", residents_label(selected)),
        DispatchMode::Roster => format!("Add {} to the roster", residents_label(selected)),
    }
}

fn role_label(role: Option<ColumnRole>) -> &'static str {
    match role {
        Some(ColumnRole::Name) => "name",
        Some(ColumnRole::FirstName) => "first name",
        Some(ColumnRole::LastName) => "last name",
        Some(ColumnRole::Email) => "email",
        Some(ColumnRole::Unit) => "unit",
        Some(ColumnRole::Phone) => "phone",
        None => "ignored",
    }
}

fn review_pane(component: &ResidentImporter, ctx: &Context<ResidentImporter>) -> Html {
    let link = ctx.link();
    let summary = component.session.summary();
    let editing = component.session.editing();

    html! {
        <div class="importer-review">
            <div class="importer-summary">
                <span>{ format!("{} ready to invite", summary.ready_count) }</span>
                {
                    if summary.no_email_count > 0 {
                        html! {
                            <span class="warning">
                                { format!("{} without an email address", summary.no_email_count) }
                            </span>
                        }
                    } else {
                        html! {}
                    }
                }
                <span>{ format!("{} of {} selected", summary.selected_count, summary.total) }</span>
            </div>
            {
                if component.interpreted {
                    html! { <p class="importer-note">{"We could not match the columns, so the rows were read as free text. Check them before sending."}</p> }
                } else if !component.columns.is_empty() {
                    html! {
                        <p class="importer-note">
                            {
                                component.columns.iter()
                                    .map(|c| format!("{} \u{2192} {}", c.title, role_label(c.role)))
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            }
                        </p>
                    }
                } else {
                    html! {}
                }
            }
            <table class="importer-table">
                <thead>
                    <tr>
                        <th>
                            <input
                                type="checkbox"
                                checked={component.session.all_selected()}
                                onclick={link.callback(|_| Msg::ToggleSelectAll)}
                            />
                        </th>
                        <th>{"Name"}</th>
                        <th>{"Email"}</th>
                        <th>{"Unit"}</th>
                        <th>{"Phone"}</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    {
                        for component.session.records().iter().map(|record| match editing {
                            Some(edit) if edit.id == record.id => edit_row(edit, link),
                            _ => record_row(record, link),
                        })
                    }
                </tbody>
            </table>
            <div class="importer-actions">
                <button onclick={link.callback(|_| Msg::Reset)}>{"Start over"}</button>
                <button
                    class="primary"
                    disabled={summary.selected_count == 0}
                    onclick={link.callback(|_| Msg::Send)}
                >
                    { send_label(ctx.props().mode, summary.selected_count) }
                </button>
            </div>
        </div>
    }
}

fn record_row(record: &CandidateRecord, link: &Scope<ResidentImporter>) -> Html {
    let id = record.id;
    html! {
        <tr key={id.to_string()} class={classes!((!record.has_email()).then_some("no-email"))}>
            <td>
                <input type="checkbox" checked={record.selected} onclick={link.callback(move |_| Msg::ToggleSelect(id))} />
            </td>
            <td>{ record.name.clone() }</td>
            <td>
                {
                    if record.has_email() {
                        html! { { record.email.clone() } }
                    } else {
                        html! { <span class="warning">{"No email"}</span> }
                    }
                }
            </td>
            <td>{ record.unit.clone() }</td>
            <td>{ record.phone.clone() }</td>
            <td>
                <button class="icon-btn" title="Edit" onclick={link.callback(move |_| Msg::StartEdit(id))}>
                    <i class="material-icons">{"edit"}</i>
                </button>
                <button class="icon-btn" title="Remove" onclick={link.callback(move |_| Msg::Delete(id))}>
                    <i class="material-icons">{"delete"}</i>
                </button>
            </td>
        </tr>
    }
}

fn edit_input(value: &str, field: Field, link: &Scope<ResidentImporter>) -> Html {
    let oninput = link.callback(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::EditField(field, input.value())
    });
    html! { <input type="text" value={value.to_string()} {oninput} /> }
}

fn edit_row(edit: &EditState, link: &Scope<ResidentImporter>) -> Html {
    let draft = &edit.draft;
    html! {
        <tr key={edit.id.to_string()} class="editing">
            <td></td>
            <td>{ edit_input(&draft.name, Field::Name, link) }</td>
            <td>{ edit_input(&draft.email, Field::Email, link) }</td>
            <td>{ edit_input(&draft.unit, Field::Unit, link) }</td>
            <td>{ edit_input(&draft.phone, Field::Phone, link) }</td>
            <td>
                <button class="icon-btn" title="Save" onclick={link.callback(|_| Msg::SaveEdit)}>
                    <i class="material-icons">{"check"}</i>
                </button>
                <button class="icon-btn" title="Cancel" onclick={link.callback(|_| Msg::CancelEdit)}>
                    <i class="material-icons">{"close"}</i>
                </button>
            </td>
        </tr>
    }
}

fn sending_pane(component: &ResidentImporter) -> Html {
    let batch = component.session.pending_batch().map(<[_]>::len).unwrap_or(0);
    html! {
        <div class="importer-sending">
            {
                match component.session.progress() {
                    Some((sent, total)) => html! {
                        <>
                            <p>{ format!("Sending {} of {}...", sent, total) }</p>
                            <progress max={total.to_string()} value={sent.to_string()} />
                        </>
                    },
                    None => html! { <p>{ format!("Saving {}...", residents_label(batch)) }</p> },
                }
            }
            {
                if component.connection_lost() {
                    html! {
                        <p class="warning" role="status">
                            {"Connection lost. Your residents are still being sent, reconnecting..."}
                        </p>
                    }
                } else {
                    html! {}
                }
            }
            <p class="importer-note">{"Keep this page open until sending finishes."}</p>
        </div>
    }
}

fn done_pane(component: &ResidentImporter, link: &Scope<ResidentImporter>) -> Html {
    let headline = component
        .session
        .last_report()
        .map(|r| r.headline.clone())
        .unwrap_or_default();
    html! {
        <div class="importer-done">
            <p>{ headline }</p>
            <button onclick={link.callback(|_| Msg::Reset)}>{"Import more residents"}</button>
        </div>
    }
}
