use log::{debug, error, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use texpand_core::keyboard::{translate, EnigoInjector};
use texpand_core::{EngineConfig, EngineController, EngineHandle, Result, SnippetStore, TexpandError};

const MAX_RETRIES: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Run the global keyboard hook on its own thread, feeding every event to an
/// [`EngineController`] bound to `handle`.
///
/// The thread ends with a `Keyboard` error once the hook has failed
/// `MAX_RETRIES` times in a row.
pub fn start_keyboard_listener(
    handle: EngineHandle,
    config: EngineConfig,
    store: Arc<SnippetStore>,
) -> JoinHandle<Result<()>> {
    thread::spawn(move || {
        // The input simulator is created on the thread that uses it
        let injector = EnigoInjector::new()?;
        let controller = Rc::new(RefCell::new(EngineController::new(
            &handle, &config, store, injector,
        )));

        let callback = move |event: rdev::Event| {
            let Some(key) = translate(&event) else {
                return;
            };
            match controller.try_borrow_mut() {
                Ok(mut controller) => {
                    controller.on_key_event(key);
                }
                Err(_) => debug!("Dropped {:?} delivered during an expansion", key),
            }
        };

        let mut retry_count = 0;
        while retry_count < MAX_RETRIES {
            match rdev::listen(callback.clone()) {
                // listen() only returns on failure; treat a clean return as shutdown
                Ok(()) => return Ok(()),
                Err(e) => {
                    retry_count += 1;
                    warn!(
                        "Keyboard listener failed: {:?}. Retrying ({}/{})...",
                        e, retry_count, MAX_RETRIES
                    );
                    thread::sleep(RETRY_DELAY);
                }
            }
        }

        error!(
            "Failed to start keyboard listener after {} attempts",
            MAX_RETRIES
        );
        Err(TexpandError::Keyboard(format!(
            "keyboard hook unavailable after {} attempts",
            MAX_RETRIES
        )))
    })
}
