mod filter_bar;
mod input;
mod prompt;

pub use filter_bar::render_filter_bar;
pub use prompt::{Prompt, PromptEvent, PromptKind};

/// Result of offering a key event to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed, parent should try the next handler
  NotHandled,
}
