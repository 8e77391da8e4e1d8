//! Copy marker effect

use super::params::ParamBlock;

/// Marker effect without a program.
///
/// It takes part in composition as a plain copy and never requests a shader
/// pass, so on its own it leaves the pipeline on the pass-through path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyEffect {
    params: ParamBlock,
}

impl CopyEffect {
    pub fn params(&self) -> &ParamBlock {
        &self.params
    }
}
