//! KEP document parsing.
//!
//! New-style KEPs keep their metadata in `kep.yaml`. Legacy KEPs are a single
//! Markdown file with the metadata as YAML front matter between two `---`
//! lines. Both are lowered to a [`Record`], validated, then deserialized into
//! a [`Proposal`].

use std::path::Path;

use kep_registry::Registry;
use serde_yaml::Value;

use crate::domain::error::{KepError, Result};
use crate::domain::proposal::Proposal;
use crate::domain::record::{FieldValue, Record};
use crate::domain::validation::validate;

/// File name of new-style KEP metadata.
pub const METADATA_FILE: &str = "kep.yaml";

const FRONT_MATTER_DELIMITER: &str = "---";

/// Serialization a KEP document is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Markdown,
}

impl DocumentFormat {
    /// `.md` files are Markdown, everything else YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") => DocumentFormat::Markdown,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Extract the YAML front matter of a Markdown document.
pub fn front_matter(contents: &str) -> Result<&str> {
    let mut lines = contents.split_inclusive('\n');
    let mut offset = 0;

    // Skip leading blank lines; the first non-blank line must open the block.
    loop {
        let line = lines.next().ok_or(KepError::MissingFrontMatter)?;
        offset += line.len();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed != FRONT_MATTER_DELIMITER {
            return Err(KepError::MissingFrontMatter);
        }
        break;
    }

    let start = offset;
    for line in lines {
        if line.trim() == FRONT_MATTER_DELIMITER {
            return Ok(&contents[start..offset]);
        }
        offset += line.len();
    }
    Err(KepError::MissingFrontMatter)
}

/// Parse the metadata block of a document into a YAML value.
pub fn parse_metadata(contents: &str, format: DocumentFormat) -> Result<Value> {
    let yaml = match format {
        DocumentFormat::Yaml => contents,
        DocumentFormat::Markdown => front_matter(contents)?,
    };
    Ok(serde_yaml::from_str(yaml)?)
}

/// Parse and validate a KEP document.
///
/// # Errors
///
/// - `KepError::MissingFrontMatter`: Markdown without a metadata block.
/// - `KepError::Yaml`: metadata is not valid YAML.
/// - `KepError::NotAMapping`: metadata is not a key/value mapping.
/// - `KepError::Validation`: metadata violates a field rule.
pub fn parse_proposal(
    contents: &str,
    format: DocumentFormat,
    registry: &Registry,
) -> Result<Proposal> {
    let value = parse_metadata(contents, format)?;
    let record = Record::from_yaml(&value)
        .ok_or_else(|| KepError::NotAMapping(FieldValue::from_yaml(&value).type_name()))?;
    validate(&record, registry)?;
    Ok(serde_yaml::from_value(value)?)
}

/// Read, parse and validate a KEP file. The proposal name is taken from the
/// path: the parent directory for `kep.yaml`, the file stem otherwise.
pub fn read_proposal(path: &Path, registry: &Registry) -> Result<Proposal> {
    let contents = std::fs::read_to_string(path).map_err(|source| KepError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut proposal = parse_proposal(&contents, DocumentFormat::from_path(path), registry)?;
    proposal.name = proposal_name(path);
    Ok(proposal)
}

/// Name of the proposal stored at `path`.
pub fn proposal_name(path: &Path) -> String {
    let is_metadata = path.file_name().and_then(|n| n.to_str()) == Some(METADATA_FILE);
    let named = if is_metadata {
        path.parent().and_then(|p| p.file_name())
    } else {
        path.file_stem()
    };
    named
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
