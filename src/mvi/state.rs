/// Snapshot type published to watchers.
///
/// `PartialEq` lets the machine skip no-op transitions; `Default` is the
/// state before anything happened.
pub trait UiState: Clone + PartialEq + Default + Send + 'static {}
