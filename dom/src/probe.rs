//! Helper functions probing the browser environment
use chartwait_core::recovery::ElementProbe;
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use web_sys::{Document, Window};

/// Return the current browser [`web_sys::Window`], if any
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Return the current browser [`web_sys::Document`], if any
pub fn document() -> Option<Document> {
    window().and_then(|window| window.document())
}

/// Look up `globalThis[name]`, `None` when it is `undefined` or `null`
pub fn global(name: &str) -> Option<JsValue> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// Whether a global with this name is defined (for example `Chart`)
pub fn global_exists(name: &str) -> bool {
    global(name).is_some()
}

/// Read `globalThis[name].version` as a string
pub fn library_version(name: &str) -> Option<String> {
    let library = global(name)?;
    Reflect::get(&library, &JsValue::from_str("version"))
        .ok()
        .and_then(|version| version.as_string())
}

/// [`ElementProbe`] resolving ids with `document.getElementById()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentProbe;

impl ElementProbe for DocumentProbe {
    fn exists(&self, id: &str) -> bool {
        document()
            .map(|document| document.get_element_by_id(id).is_some())
            .unwrap_or(false)
    }
}
