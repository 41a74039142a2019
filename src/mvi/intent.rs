/// An event a reducer can apply. Sent across tasks, so owned and `Send`.
pub trait Intent: Send + 'static {}
