use common::error::ImportError;
use common::jobs::JobStatus;
use common::requests::UploadResponse;

/// Field of the record being edited inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Unit,
    Phone,
}

#[derive(Clone)]
pub enum Msg {
    SetPasteText(String),
    SetQuickAddText(String),
    OpenFileDialog,
    FileSelected(web_sys::File),
    Organize,
    QuickAdd,
    Parsed(Result<UploadResponse, ImportError>),
    ToggleSelect(u64),
    ToggleSelectAll,
    StartEdit(u64),
    EditField(Field, String),
    SaveEdit,
    CancelEdit,
    Delete(u64),
    Send,
    DispatchStarted(Result<String, ImportError>),
    Poll,
    JobPolled(Result<JobStatus, ImportError>),
    DismissError,
    Reset,
}
