//! Clipboard used by the authoring flow to hand out edited group configs

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::ClipboardError;

pub trait Clipboard {
    /// Fire-and-forget write. Errors are reported, never retried.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// `navigator.clipboard` in the browser
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClipboard;

#[cfg(target_arch = "wasm32")]
impl Clipboard for BrowserClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::JsValue;

        let window = web_sys::window().ok_or(ClipboardError::Unavailable)?;
        let promise = window.navigator().clipboard().write_text(text);
        // The write resolves later; a rejection is only logged.
        let on_error = Closure::wrap(Box::new(|err: JsValue| {
            log::error!("Could not copy text: {:?}", err);
        }) as Box<dyn FnMut(JsValue)>);
        let _ = promise.catch(&on_error);
        on_error.forget();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clipboard for BrowserClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// Keeps the last written text; shares its buffer between clones
#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    last: Rc<RefCell<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_text(&self) -> Option<String> {
        self.last.borrow().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.last.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

/// Always unavailable
#[derive(Clone, Copy, Debug, Default)]
pub struct NullClipboard;

impl Clipboard for NullClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}
