use crate::traits::SelectionSource;
use loculate_core::protocol::{Message, SelectedTextReply};

/// Page listener: answers `GET_SELECTED_TEXT` with the live selection.
///
/// Any other message is not ours and gets no reply.
pub fn handle_page_message(
    msg: &Message,
    source: &dyn SelectionSource,
) -> Option<SelectedTextReply> {
    match msg {
        Message::GetSelectedText => Some(SelectedTextReply {
            text: source.current_selection().unwrap_or_default(),
        }),
        _ => None,
    }
}
