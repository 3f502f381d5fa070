pub mod archiver;
pub mod receipt_compositor;

pub use archiver::build_archive;
pub use receipt_compositor::ReceiptCompositor;
