pub mod artifact;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod render;

pub use editor::{DisplayMode, InvoiceEditor};
pub use error::{Error, Result};
pub use model::{Document, ItemField, LineItem, Party, PartyField, PartySide, TAX_RATE};
