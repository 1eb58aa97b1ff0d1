use crate::components::resident_importer::ResidentImporter;
use common::report::Completion;
use common::requests::ImporterContext;
use gloo_console::log;
use yew::{html, Callback, Component, Context, Html};

pub struct App;

impl Component for App {
    type Message = ();
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self
    }

    fn view(&self, _ctx: &Context<Self>) -> Html {
        let context = ImporterContext {
            building_id: "demo-building".to_string(),
            actor_id: "demo-manager".to_string(),
            building_name: "Demo Building".to_string(),
        };
        let on_complete = Callback::from(|c: Completion| {
            log!(format!("import finished: {} sent, {} saved", c.sent_count, c.saved_count));
        });
        html! {
            <div>
                <ResidentImporter {context} {on_complete} />
            </div>
        }
    }
}
