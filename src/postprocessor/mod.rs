//! PII masking postprocessor
//!
//! For each node: render the masking prompt, call the model, split the
//! response on `Output Mapping:`, parse the JSON half, and emit a copy of
//! the node with masked text and the mapping stored in metadata.

mod error;
mod mapping;
mod pii;
mod response;
mod traits;

pub use error::{MaskError, MaskFailure, MaskStage};
pub use mapping::MaskMapping;
pub use pii::{PiiNodePostprocessor, DEFAULT_NODE_INFO_KEY};
pub use response::{
    parse_mapping, parse_response, split_response, MaskedResponse, ResponseError,
    OUTPUT_MAPPING_DELIMITER,
};
pub use traits::NodePostprocessor;
