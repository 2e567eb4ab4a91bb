use std::any::Any;

/// Extracts a readable message from a thread panic payload.
///
/// `panic!` with a literal produces `&'static str`, with format arguments a
/// `String`. Anything else is reported generically.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return (*msg).to_string();
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return msg.clone();
	}
	"non-string panic payload".to_string()
}
