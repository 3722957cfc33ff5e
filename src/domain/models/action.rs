use super::Submission;

pub enum Action {
    CancelJob(),
    SessionCreate(Option<String>),
    SessionList(),
    SessionRename(String, String),
    Submit(Submission),
}
