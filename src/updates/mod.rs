pub mod bitmap;
pub mod registry;
pub mod scanner;

pub use bitmap::{pack_updates, unpack_updates, UpdatedDocuments, BANK_SIZE};
pub use registry::MaskedDocumentsRegistry;
pub use scanner::UpdatedDocumentsScanner;
