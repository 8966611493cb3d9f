pub mod button;
pub mod modal;

pub use button::{Button, Size, Variant};
pub use modal::{Modal, ModalSize};
