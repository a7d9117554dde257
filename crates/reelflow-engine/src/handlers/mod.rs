//! Concrete action handlers: one seam each, fixed operational policy.

mod capture;
mod interaction;
mod manual_gate;
mod message;
mod navigation;
mod script;
mod waits;

use std::sync::Arc;

use crate::registry::{ActionRegistry, RegistryError};

pub use capture::ScreenshotHandler;
pub use interaction::{
    CheckHandler, ClickHandler, FillHandler, HoverHandler, PressHandler, SelectOptionHandler,
    TypeHandler, UncheckHandler,
};
pub use manual_gate::{ManualGateHandler, GATE_MARKER_FILE};
pub use message::ShowMessageHandler;
pub use navigation::GotoHandler;
pub use script::EvaluateHandler;
pub use waits::{WaitForSelectorHandler, WaitForTimeoutHandler};

/// Bind the default handler for every declared action tag, making dispatch
/// total over the action model.
pub fn register_default_handlers(registry: &ActionRegistry) -> Result<(), RegistryError> {
    registry.register("goto", Arc::new(GotoHandler))?;
    registry.register("click", Arc::new(ClickHandler))?;
    registry.register("fill", Arc::new(FillHandler))?;
    registry.register("type", Arc::new(TypeHandler))?;
    registry.register("press", Arc::new(PressHandler))?;
    registry.register("hover", Arc::new(HoverHandler))?;
    registry.register("screenshot", Arc::new(ScreenshotHandler))?;
    registry.register("waitForSelector", Arc::new(WaitForSelectorHandler))?;
    registry.register("waitForTimeout", Arc::new(WaitForTimeoutHandler))?;
    registry.register("waitForManualAction", Arc::new(ManualGateHandler::new()))?;
    registry.register("selectOption", Arc::new(SelectOptionHandler))?;
    registry.register("check", Arc::new(CheckHandler))?;
    registry.register("uncheck", Arc::new(UncheckHandler))?;
    registry.register("evaluate", Arc::new(EvaluateHandler))?;
    registry.register("showMessage", Arc::new(ShowMessageHandler))?;
    Ok(())
}
