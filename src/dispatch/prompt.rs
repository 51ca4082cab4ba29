//! The interactive prompting interface.

/// Asks the user to make routing decisions.
///
/// Calls are synchronous and may block for as long as the user takes; the
/// gate only ever calls them from a blocking worker. `None` from `choose` or
/// `prompt_text` means the user cancelled.
pub trait Prompter: Send + Sync {
    /// Pick one of `options`, preselecting `default`.
    fn choose(&self, label: &str, options: &[String], default: Option<&str>) -> Option<String>;

    /// Enter free text, prefilled with `default`.
    fn prompt_text(&self, label: &str, default: &str) -> Option<String>;

    /// Yes/no question.
    fn confirm(&self, message: &str) -> bool;

    /// Informational message; must not wait for acknowledgement.
    fn notify(&self, message: &str);
}
