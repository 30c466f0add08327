//! Post body editing: the document buffer and the toolbar dispatcher.

mod buffer;
mod dispatcher;

pub use buffer::{ChangeListener, EditorBuffer, LoadOutcome};
pub use dispatcher::{
    CommandDispatcher, CommandError, DispatchOutcome, DispatcherState, FormatCommand,
};
