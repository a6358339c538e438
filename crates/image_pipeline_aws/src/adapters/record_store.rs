use crate::runtime::contract::ImageRecord;
use crate::runtime::error::ProviderError;

/// Key-value persistence for processed images. A put replaces any prior
/// record under the same `id_archivo`.
pub trait RecordStore {
    fn put_record(&self, record: &ImageRecord) -> Result<(), ProviderError>;
}
