//! Resident importer: upload, paste or quick-add residents, review them, then
//! invite, save or add them to the roster in one batch.
//!
//! Elm-style layout: `state` holds the component, `messages` the `Msg` enum,
//! `update` applies messages, `view` renders the current phase and `helpers`
//! talks to the backend.

use yew::prelude::*;

mod helpers;
mod messages;
mod props;
mod state;
mod update;
mod view;

pub use messages::Msg;
pub use props::ResidentImporterProps;
pub use state::ResidentImporter;

impl Component for ResidentImporter {
    type Message = Msg;
    type Properties = ResidentImporterProps;

    fn create(_ctx: &Context<Self>) -> Self {
        ResidentImporter::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }
}
