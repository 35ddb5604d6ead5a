//!
//! Script injection, used to pull in a charting library that the page
//! failed to load by itself.
//!

use crate::probe::{document, global_exists};
use crate::result::Result;
use chartwait_log::*;
use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type Notifier = Rc<RefCell<Option<oneshot::Sender<std::result::Result<(), String>>>>>;

fn notify(notifier: &Notifier, outcome: std::result::Result<(), String>) {
    if let Some(sender) = notifier.borrow_mut().take() {
        sender.send(outcome).ok();
    }
}

/// Append a `<script src="...">` element to the document head (or body)
/// and resolve once the browser fires its `load` event.
pub async fn load_script(url: &str) -> Result<()> {
    let document = document().ok_or("document is not available")?;
    let root = {
        let heads = document.get_elements_by_tag_name("head");
        match heads.item(0) {
            Some(head) => head,
            None => document
                .get_elements_by_tag_name("body")
                .item(0)
                .ok_or("unable to locate head or body element")?,
        }
    };

    let (sender, receiver) = oneshot::channel();
    let notifier: Notifier = Rc::new(RefCell::new(Some(sender)));

    let notifier_ = notifier.clone();
    let on_load = Closure::<dyn FnMut()>::new(move || notify(&notifier_, Ok(())));
    let url_ = url.to_string();
    let on_error = Closure::<dyn FnMut()>::new(move || {
        notify(&notifier, Err(format!("unable to load script `{url_}`")))
    });

    let script = document.create_element("script")?;
    script.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
    script.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;
    script.set_attribute("src", url)?;
    root.append_child(&script)?;

    log_debug!(target: "inject", "loading script {url}");
    // both closures stay alive until one of them fired
    let outcome = receiver.await?;
    drop(on_load);
    drop(on_error);
    outcome?;
    Ok(())
}

/// Load `url` unless the global `name` is already defined
pub async fn ensure_library(name: &str, url: &str) -> Result<()> {
    if global_exists(name) {
        return Ok(());
    }
    log_info!(target: "inject", "`{name}` is not loaded, injecting {url}");
    load_script(url).await
}
