use common::model::batch::DispatchMode;
use common::report::Completion;
use common::requests::ImporterContext;
use yew::prelude::*;

/// Properties for the `ResidentImporter`.
#[derive(Properties, PartialEq, Clone)]
pub struct ResidentImporterProps {
    /// Building and acting manager. Sent with every dispatch.
    pub context: ImporterContext,

    /// What sending does with the selected residents.
    #[prop_or_default]
    pub mode: DispatchMode,

    /// Fired once when a dispatch completes.
    #[prop_or_default]
    pub on_complete: Callback<Completion>,
}
