#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The run was accepted and may begin.
    Started,
    /// Raw HTML is available (fetch finished).
    Fetched,
    /// The cleaned document is available.
    Cleaned,
    /// A conversion attempt finished; `empty` when it produced only whitespace.
    Converted { empty: bool },
    /// A stage failed in a way no fallback can recover from.
    Failed { message: String },
}
