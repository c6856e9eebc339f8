//! Errors at the edges of the crate: config/JSON loading and mounting the
//! canvas. The builder, the layout engine and the interaction controller
//! never fail; they clamp and degrade instead.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong outside the layout core.
#[derive(Debug, Error)]
pub enum Error {
	/// A simulation config value is out of its accepted range.
	#[error("invalid simulation config: {0}")]
	InvalidConfig(String),

	/// A record snapshot or config document is not valid JSON for its shape.
	#[error("malformed json: {0}")]
	Json(#[from] serde_json::Error),

	/// No `window` global, e.g. when running outside a browser.
	#[error("no browser window available")]
	NoWindow,

	/// The canvas element is not (or no longer) mounted.
	#[error("canvas element is not mounted")]
	NoCanvas,

	/// The canvas refused to hand out a 2d context.
	#[error("canvas 2d context unavailable")]
	NoContext,

	/// A DOM call threw.
	#[error("javascript error: {0}")]
	Js(String),
}

impl From<JsValue> for Error {
	fn from(value: JsValue) -> Self {
		Error::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

/// Crate result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
