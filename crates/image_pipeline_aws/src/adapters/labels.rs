use crate::runtime::contract::LabelRequest;
use crate::runtime::error::ProviderError;

/// Image-labeling capability. Confidence filtering and the label cap are
/// applied by the capability; callers receive names in its ranking order.
pub trait LabelDetector {
    fn detect_labels(&self, request: &LabelRequest) -> Result<Vec<String>, ProviderError>;
}
