//! Two-stage parser for the model's masking response
//!
//! Stage 1 splits on the first `Output Mapping:`; stage 2 deserializes the
//! remainder as a flat string-to-string JSON object.

use super::mapping::MaskMapping;
use thiserror::Error;

/// Literal separating masked text from the mapping JSON.
pub const OUTPUT_MAPPING_DELIMITER: &str = "Output Mapping:";

/// Errors from parsing a model response
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response has no \"Output Mapping:\" delimiter")]
    MissingDelimiter,

    #[error("mapping is not a flat JSON object of strings: {0}")]
    InvalidMapping(#[from] serde_json::Error),
}

/// A successfully parsed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedResponse {
    pub text: String,
    pub mapping: MaskMapping,
}

/// Split at the first delimiter, trimming both halves.
///
/// Anything after the first occurrence, including further delimiters,
/// belongs to the mapping half.
pub fn split_response(response: &str) -> Result<(&str, &str), ResponseError> {
    response
        .split_once(OUTPUT_MAPPING_DELIMITER)
        .map(|(before, after)| (before.trim(), after.trim()))
        .ok_or(ResponseError::MissingDelimiter)
}

pub fn parse_mapping(json: &str) -> Result<MaskMapping, ResponseError> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_response(response: &str) -> Result<MaskedResponse, ResponseError> {
    let (text, json) = split_response(response)?;
    let mapping = parse_mapping(json)?;
    Ok(MaskedResponse {
        text: text.to_string(),
        mapping,
    })
}
